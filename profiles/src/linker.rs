use file_manager::serde_support::FileName;
use file_manager::store::{Attribute, ProfileStore};
use shared::error::ProfileError;
use shared::naming::{self, KindFilter, ProfileKind, ProfileName};
use shared::secret::{mask, Secret};
use std::collections::BTreeSet;
use tracing::info;

/// A profile and the managed settings it holds, secrets masked
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileSummary {
    pub name: ProfileName,
    pub kind: ProfileKind,
    pub attributes: Vec<(Attribute, String)>,
}

fn require_value(what: &str, value: &str) -> Result<(), ProfileError> {
    if value.trim().is_empty() {
        return Err(ProfileError::InvalidArgument(format!(
            "{} cannot be empty",
            what
        )));
    }

    Ok(())
}

pub fn create_iam_profile<S: ProfileStore>(
    store: &mut S,
    domain: &str,
    access_key_id: &str,
    secret_access_key: &Secret,
) -> Result<ProfileName, ProfileError> {
    let name = ProfileName::iam(domain)?;
    require_value("access key ID", access_key_id)?;
    if secret_access_key.is_empty() {
        return Err(ProfileError::InvalidArgument(
            "secret access key cannot be empty".to_string(),
        ));
    }

    let profile_name = name.to_string();
    store.set(&profile_name, Attribute::AccessKeyId, access_key_id.trim());
    store.set(
        &profile_name,
        Attribute::SecretAccessKey,
        secret_access_key.expose().trim(),
    );
    store.save(FileName::Credentials)?;

    info!("Profile {} saved", profile_name);

    Ok(name)
}

/// Only the device goes to the config file, session credentials appear after the first refresh
pub fn create_mfa_profile<S: ProfileStore>(
    store: &mut S,
    domain: &str,
    device_arn: &str,
) -> Result<ProfileName, ProfileError> {
    let name = ProfileName::mfa(domain)?;
    require_value("device ARN", device_arn)?;

    let profile_name = name.to_string();
    store.set(&profile_name, Attribute::DeviceArn, device_arn.trim());
    store.save(FileName::Config)?;

    info!("Profile {} saved", profile_name);

    Ok(name)
}

pub fn create_assume_role_profile<S: ProfileStore>(
    store: &mut S,
    role_name: &str,
    role_arn: &str,
    region: &str,
    source_profile: &str,
) -> Result<ProfileName, ProfileError> {
    require_value("role ARN", role_arn)?;
    require_value("region", region)?;

    let source: ProfileName = source_profile.parse()?;
    if !store.contains(source_profile) {
        return Err(ProfileError::SourceProfileNotFound(
            source_profile.to_owned(),
        ));
    }
    if !source.kind().is_user() {
        return Err(ProfileError::InvalidArgument(format!(
            "source profile '{}' must be an IAM or MFA profile",
            source_profile
        )));
    }

    let name = ProfileName::new(source.domain(), role_name)?;
    if name.kind().is_user() {
        return Err(ProfileError::InvalidArgument(format!(
            "role name '{}' is reserved",
            role_name
        )));
    }

    let profile_name = name.to_string();
    store.set(&profile_name, Attribute::RoleArn, role_arn.trim());
    store.set(&profile_name, Attribute::SourceProfile, source_profile);
    store.set(&profile_name, Attribute::Region, region.trim());
    store.save(FileName::Config)?;

    info!("Profile {} saved, sourced from {}", profile_name, source_profile);

    Ok(name)
}

/// Profiles following the `domain:role` convention, sorted
pub fn list_profiles<S: ProfileStore>(
    store: &S,
    kind: KindFilter,
    domain: Option<&str>,
) -> BTreeSet<String> {
    store
        .list_profile_names()
        .into_iter()
        .filter(|name| match naming::parse(name) {
            Ok((profile_domain, role)) => {
                kind.matches(naming::classify_kind(role))
                    && domain.map_or(true, |domain| domain == profile_domain)
            }
            Err(_) => false,
        })
        .collect()
}

pub fn list_domains<S: ProfileStore>(store: &S) -> BTreeSet<String> {
    store
        .list_profile_names()
        .iter()
        .filter_map(|name| naming::parse(name).ok())
        .map(|(domain, _)| domain.to_owned())
        .collect()
}

pub fn describe<S: ProfileStore>(store: &S, profile_name: &str) -> Result<ProfileSummary, ProfileError> {
    let name: ProfileName = profile_name.parse()?;
    if !store.contains(profile_name) {
        return Err(ProfileError::InvalidArgument(format!(
            "profile '{}' not found",
            profile_name
        )));
    }

    let attributes = Attribute::ALL
        .iter()
        .filter_map(|attribute| {
            store.get(profile_name, *attribute).map(|value| {
                if attribute.is_secret() {
                    (*attribute, mask(&value))
                } else {
                    (*attribute, value)
                }
            })
        })
        .collect();

    Ok(ProfileSummary {
        kind: name.kind(),
        name,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_manager::store::AwsProfileStore;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> AwsProfileStore {
        AwsProfileStore::open(
            Some(temp_dir.path().join("config")),
            Some(temp_dir.path().join("credentials")),
        )
        .unwrap()
    }

    fn seeded_store(temp_dir: &TempDir) -> AwsProfileStore {
        let mut store = open_store(temp_dir);
        create_iam_profile(&mut store, "work", "AKIAWORK", &Secret::new("work-secret")).unwrap();
        create_mfa_profile(&mut store, "work", "arn:aws:iam::000000000000:mfa/x").unwrap();
        create_iam_profile(&mut store, "home", "AKIAHOME", &Secret::new("home-secret")).unwrap();
        create_assume_role_profile(
            &mut store,
            "dev",
            "arn:aws:iam::0:role/P",
            "ap-southeast-2",
            "work:mfa",
        )
        .unwrap();
        store
    }

    #[test]
    fn iam_profile_is_written_to_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let name =
            create_iam_profile(&mut store, "work", "AKIAEXAMPLE", &Secret::new("secret")).unwrap();
        assert_eq!(name.to_string(), "work:iam");

        let store = open_store(&temp_dir);
        assert_eq!(
            store.get("work:iam", Attribute::AccessKeyId).as_deref(),
            Some("AKIAEXAMPLE")
        );
        assert_eq!(
            store.get("work:iam", Attribute::SecretAccessKey).as_deref(),
            Some("secret")
        );
        assert!(store.config().get("work:iam").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn iam_profile_keeps_private_credentials_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials");
        std::fs::write(&path, "[other]\naws_access_key_id=AKIAOTHER\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        let mut store = open_store(&temp_dir);

        create_iam_profile(&mut store, "work", "AKIA", &Secret::new("s")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        let store = open_store(&temp_dir);
        assert!(store.contains("other"));
        assert!(store.contains("work:iam"));
    }

    #[test]
    fn iam_profile_upsert_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        create_iam_profile(&mut store, "work", "k1", &Secret::new("s1")).unwrap();
        create_iam_profile(&mut store, "work", "k2", &Secret::new("s2")).unwrap();

        let store = open_store(&temp_dir);
        let iam_profiles = list_profiles(&store, KindFilter::Iam, None);
        assert_eq!(iam_profiles.into_iter().collect::<Vec<_>>(), vec!["work:iam"]);
        assert_eq!(store.get("work:iam", Attribute::AccessKeyId).as_deref(), Some("k2"));
        assert_eq!(
            store.get("work:iam", Attribute::SecretAccessKey).as_deref(),
            Some("s2")
        );
    }

    #[test]
    fn mfa_profile_has_no_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        create_mfa_profile(&mut store, "work", "arn:aws:iam::000000000000:mfa/x").unwrap();

        let store = open_store(&temp_dir);
        assert_eq!(
            store.get("work:mfa", Attribute::DeviceArn).as_deref(),
            Some("arn:aws:iam::000000000000:mfa/x")
        );
        assert_eq!(store.get("work:mfa", Attribute::AccessKeyId), None);
        assert!(store.credentials().get("work:mfa").is_none());
    }

    #[test]
    fn assume_role_profile_takes_source_domain() {
        let temp_dir = TempDir::new().unwrap();
        seeded_store(&temp_dir);

        let store = open_store(&temp_dir);
        assert_eq!(
            store.get("work:dev", Attribute::SourceProfile).as_deref(),
            Some("work:mfa")
        );
        assert_eq!(
            store.get("work:dev", Attribute::Region).as_deref(),
            Some("ap-southeast-2")
        );
        assert_eq!(
            store.get("work:dev", Attribute::RoleArn).as_deref(),
            Some("arn:aws:iam::0:role/P")
        );
    }

    #[test]
    fn assume_role_requires_existing_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let result = create_assume_role_profile(
            &mut store,
            "dev",
            "arn:aws:iam::0:role/P",
            "ap-southeast-2",
            "work:mfa",
        );

        assert!(matches!(
            result,
            Err(ProfileError::SourceProfileNotFound(ref name)) if name == "work:mfa"
        ));
        assert!(!store.contains("work:dev"));
    }

    #[test]
    fn assume_role_rejects_role_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = seeded_store(&temp_dir);

        let result = create_assume_role_profile(
            &mut store,
            "prod",
            "arn:aws:iam::0:role/Q",
            "ap-southeast-2",
            "work:dev",
        );
        assert!(matches!(result, Err(ProfileError::InvalidArgument(_))));

        let result = create_assume_role_profile(
            &mut store,
            "prod",
            "arn:aws:iam::0:role/Q",
            "ap-southeast-2",
            "default",
        );
        assert!(matches!(result, Err(ProfileError::InvalidFormat(_))));

        let result = create_assume_role_profile(
            &mut store,
            "mfa",
            "arn:aws:iam::0:role/Q",
            "ap-southeast-2",
            "work:iam",
        );
        assert!(matches!(result, Err(ProfileError::InvalidArgument(_))));
    }

    #[test]
    fn upsert_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config"),
            "[profile work:mfa]\nmfa_serial=arn:old\noutput=json\n",
        )
        .unwrap();
        let mut store = open_store(&temp_dir);

        create_mfa_profile(&mut store, "work", "arn:new").unwrap();

        let store = open_store(&temp_dir);
        assert_eq!(store.get("work:mfa", Attribute::DeviceArn).as_deref(), Some("arn:new"));
        assert_eq!(store.config().get_value("work:mfa", "output"), Some("json"));
    }

    #[test]
    fn invalid_domain() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        assert!(matches!(
            create_iam_profile(&mut store, "", "k", &Secret::new("s")),
            Err(ProfileError::InvalidArgument(_))
        ));
        assert!(matches!(
            create_mfa_profile(&mut store, "wo:rk", "arn"),
            Err(ProfileError::InvalidArgument(_))
        ));
        assert!(matches!(
            create_mfa_profile(&mut store, "work", " "),
            Err(ProfileError::InvalidArgument(_))
        ));
    }

    #[test]
    fn list_filters() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("config"), "[default]\nregion=us-east-1\n").unwrap();
        let mut store = open_store(&temp_dir);
        create_iam_profile(&mut store, "work", "k", &Secret::new("s")).unwrap();
        create_mfa_profile(&mut store, "work", "arn").unwrap();
        create_iam_profile(&mut store, "home", "k", &Secret::new("s")).unwrap();
        create_assume_role_profile(&mut store, "dev", "arn:role", "us-east-1", "work:mfa")
            .unwrap();

        let list = |kind, domain| -> Vec<String> {
            list_profiles(&store, kind, domain).into_iter().collect()
        };

        assert_eq!(
            list(KindFilter::All, None),
            vec!["home:iam", "work:dev", "work:iam", "work:mfa"]
        );
        assert_eq!(list(KindFilter::User, Some("work")), vec!["work:iam", "work:mfa"]);
        assert_eq!(list(KindFilter::Mfa, None), vec!["work:mfa"]);
        assert_eq!(list(KindFilter::AssumeRole, None), vec!["work:dev"]);
        assert_eq!(list(KindFilter::Iam, Some("home")), vec!["home:iam"]);
        assert!(list(KindFilter::All, Some("nope")).is_empty());

        let domains: Vec<String> = list_domains(&store).into_iter().collect();
        assert_eq!(domains, vec!["home", "work"]);
    }

    #[test]
    fn describe_masks_secrets() {
        let temp_dir = TempDir::new().unwrap();
        let store = seeded_store(&temp_dir);

        let summary = describe(&store, "work:iam").unwrap();
        assert_eq!(summary.kind, ProfileKind::Iam);
        assert_eq!(
            summary.attributes,
            vec![
                (Attribute::AccessKeyId, "AKIAWORK".to_string()),
                (Attribute::SecretAccessKey, "***********".to_string()),
            ]
        );

        assert!(matches!(
            describe(&store, "work:prod"),
            Err(ProfileError::InvalidArgument(_))
        ));
    }
}
