use crate::serde_support::{read_sections, serialize_write_ordered, FileName, Section, Sections};
use anyhow::{anyhow, Result};
use directories::UserDirs;
use std::path::{Path, PathBuf};

/// The AWS credentials file, section names are the bare profile names
#[derive(Clone, Debug)]
pub struct AwsCredentials {
    path: PathBuf,
    profiles: Sections,
}

impl AwsCredentials {
    pub fn default_path() -> Result<PathBuf> {
        match UserDirs::new() {
            Some(user_dirs) => Ok(user_dirs.home_dir().join(".aws/credentials")),
            None => Err(anyhow!("Unable to get user directories")),
        }
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            profiles: read_sections(path, FileName::Credentials)?,
        })
    }

    pub fn write(&self) -> Result<()> {
        serialize_write_ordered(&self.profiles, &self.path, FileName::Credentials)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, profile_name: &str) -> Option<&Section> {
        self.profiles.get(profile_name)
    }

    pub fn get_value(&self, profile_name: &str, key: &str) -> Option<&str> {
        self.get(profile_name)
            .and_then(|profile| profile.get(key))
            .map(String::as_str)
    }

    pub fn upsert(&mut self, profile_name: &str, key: &str, value: &str) {
        self.profiles
            .entry(profile_name.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Removes a single key, a profile left without keys is removed too
    pub fn remove(&mut self, profile_name: &str, key: &str) {
        if let Some(profile) = self.profiles.get_mut(profile_name) {
            profile.remove(key);
            if profile.is_empty() {
                self.profiles.remove(profile_name);
            }
        }
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
