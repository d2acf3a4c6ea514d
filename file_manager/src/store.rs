use crate::aws_config::AwsConfig;
use crate::aws_credentials::AwsCredentials;
use crate::serde_support::FileName;
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tracing::debug;

/// A profile setting this tool manages, each one lives in exactly one of the two files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    AccessKeyId,
    SecretAccessKey,
    SessionToken,
    Expiration,
    DeviceArn,
    RoleArn,
    SourceProfile,
    Region,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::AccessKeyId,
        Attribute::SecretAccessKey,
        Attribute::SessionToken,
        Attribute::Expiration,
        Attribute::DeviceArn,
        Attribute::RoleArn,
        Attribute::SourceProfile,
        Attribute::Region,
    ];

    pub const SESSION: [Attribute; 4] = [
        Attribute::AccessKeyId,
        Attribute::SecretAccessKey,
        Attribute::SessionToken,
        Attribute::Expiration,
    ];

    pub fn file(&self) -> FileName {
        match self {
            Attribute::AccessKeyId
            | Attribute::SecretAccessKey
            | Attribute::SessionToken
            | Attribute::Expiration => FileName::Credentials,
            Attribute::DeviceArn
            | Attribute::RoleArn
            | Attribute::SourceProfile
            | Attribute::Region => FileName::Config,
        }
    }

    /// The key as written to the file, these are the names the AWS CLI reads
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::AccessKeyId => "aws_access_key_id",
            Attribute::SecretAccessKey => "aws_secret_access_key",
            Attribute::SessionToken => "aws_session_token",
            Attribute::Expiration => "aws_expiration",
            Attribute::DeviceArn => "mfa_serial",
            Attribute::RoleArn => "role_arn",
            Attribute::SourceProfile => "source_profile",
            Attribute::Region => "region",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Attribute::SecretAccessKey | Attribute::SessionToken)
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribute::AccessKeyId => write!(f, "access_key_id"),
            Attribute::SecretAccessKey => write!(f, "secret_access_key"),
            Attribute::SessionToken => write!(f, "session_token"),
            Attribute::Expiration => write!(f, "expiration"),
            Attribute::DeviceArn => write!(f, "device_arn"),
            Attribute::RoleArn => write!(f, "role_arn"),
            Attribute::SourceProfile => write!(f, "source_profile"),
            Attribute::Region => write!(f, "region"),
        }
    }
}

/// Key/value access to named profiles, changes are held in memory until saved
pub trait ProfileStore {
    fn get(&self, profile_name: &str, attribute: Attribute) -> Option<String>;

    fn set(&mut self, profile_name: &str, attribute: Attribute, value: &str);

    fn unset(&mut self, profile_name: &str, attribute: Attribute);

    fn list_profile_names(&self) -> BTreeSet<String>;

    fn contains(&self, profile_name: &str) -> bool {
        self.list_profile_names().contains(profile_name)
    }

    fn save(&mut self, file_name: FileName) -> Result<()>;
}

/// The store backed by the AWS config and credentials files
#[derive(Clone, Debug)]
pub struct AwsProfileStore {
    config: AwsConfig,
    credentials: AwsCredentials,
}

impl AwsProfileStore {
    /// Paths that are not given fall back to the files under `~/.aws`
    pub fn open(config_path: Option<PathBuf>, credentials_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => AwsConfig::default_path()?,
        };
        let credentials_path = match credentials_path {
            Some(path) => path,
            None => AwsCredentials::default_path()?,
        };

        debug!(
            "Using AWS config file {} and credentials file {}",
            config_path.display(),
            credentials_path.display()
        );

        Ok(Self {
            config: AwsConfig::read_file(&config_path)?,
            credentials: AwsCredentials::read_file(&credentials_path)?,
        })
    }

    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    pub fn credentials(&self) -> &AwsCredentials {
        &self.credentials
    }
}

impl ProfileStore for AwsProfileStore {
    fn get(&self, profile_name: &str, attribute: Attribute) -> Option<String> {
        let value = match attribute.file() {
            FileName::Config => self.config.get_value(profile_name, attribute.key()),
            FileName::Credentials => self.credentials.get_value(profile_name, attribute.key()),
        };

        value.map(str::to_owned)
    }

    fn set(&mut self, profile_name: &str, attribute: Attribute, value: &str) {
        match attribute.file() {
            FileName::Config => self.config.upsert(profile_name, attribute.key(), value),
            FileName::Credentials => self.credentials.upsert(profile_name, attribute.key(), value),
        }
    }

    fn unset(&mut self, profile_name: &str, attribute: Attribute) {
        match attribute.file() {
            FileName::Config => self.config.remove(profile_name, attribute.key()),
            FileName::Credentials => self.credentials.remove(profile_name, attribute.key()),
        }
    }

    fn list_profile_names(&self) -> BTreeSet<String> {
        self.config
            .profile_names()
            .chain(self.credentials.profile_names())
            .map(str::to_owned)
            .collect()
    }

    fn save(&mut self, file_name: FileName) -> Result<()> {
        match file_name {
            FileName::Config => self.config.write(),
            FileName::Credentials => self.credentials.write(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> AwsProfileStore {
        AwsProfileStore::open(
            Some(temp_dir.path().join("config")),
            Some(temp_dir.path().join("credentials")),
        )
        .unwrap()
    }

    #[test]
    fn attributes_are_routed_to_their_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        store.set("work:mfa", Attribute::DeviceArn, "arn:aws:iam::0:mfa/x");
        store.set("work:iam", Attribute::AccessKeyId, "AKIA");
        store.save(FileName::Config).unwrap();
        store.save(FileName::Credentials).unwrap();

        let config = std::fs::read_to_string(temp_dir.path().join("config")).unwrap();
        let credentials = std::fs::read_to_string(temp_dir.path().join("credentials")).unwrap();
        assert!(config.contains("[profile work:mfa]"));
        assert!(config.contains("mfa_serial"));
        assert!(credentials.contains("[work:iam]"));
        assert!(credentials.contains("aws_access_key_id"));

        let store = open_store(&temp_dir);
        assert_eq!(
            store.get("work:mfa", Attribute::DeviceArn).as_deref(),
            Some("arn:aws:iam::0:mfa/x")
        );
        assert_eq!(store.get("work:mfa", Attribute::AccessKeyId), None);
    }

    #[test]
    fn profile_names_merge_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        store.set("work:mfa", Attribute::DeviceArn, "arn");
        store.set("work:mfa", Attribute::SessionToken, "token");
        store.set("work:iam", Attribute::AccessKeyId, "AKIA");

        let names: Vec<String> = store.list_profile_names().into_iter().collect();
        assert_eq!(names, vec!["work:iam", "work:mfa"]);
        assert!(store.contains("work:iam"));
        assert!(!store.contains("work:dev"));
    }

    #[test]
    fn unsaved_changes_are_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        store.set("work:iam", Attribute::AccessKeyId, "AKIA");
        store.save(FileName::Config).unwrap();

        let store = open_store(&temp_dir);
        assert!(!store.contains("work:iam"));
    }

    #[test]
    fn unset_drops_empty_profiles() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        store.set("work:mfa", Attribute::DeviceArn, "arn");
        store.set("work:mfa", Attribute::SessionToken, "token");
        store.unset("work:mfa", Attribute::SessionToken);

        assert_eq!(store.get("work:mfa", Attribute::SessionToken), None);
        assert!(store.credentials().get("work:mfa").is_none());
        assert!(store.contains("work:mfa"));

        store.unset("work:mfa", Attribute::DeviceArn);
        store.unset("work:dev", Attribute::RoleArn);
        assert!(!store.contains("work:mfa"));
    }

    #[test]
    fn secret_attributes() {
        assert!(Attribute::SecretAccessKey.is_secret());
        assert!(Attribute::SessionToken.is_secret());
        assert!(!Attribute::AccessKeyId.is_secret());
        assert_eq!(Attribute::DeviceArn.to_string(), "device_arn");
    }
}
