use crate::serde_support::{read_sections, serialize_write_ordered, FileName, Section, Sections};
use anyhow::{anyhow, Result};
use directories::UserDirs;
use std::path::{Path, PathBuf};

const PROFILE_PREFIX: &str = "profile ";
const DEFAULT_PROFILE: &str = "default";

/// The AWS config file, sections are `[profile <name>]` apart from `[default]`
#[derive(Clone, Debug)]
pub struct AwsConfig {
    path: PathBuf,
    profiles: Sections,
}

impl AwsConfig {
    pub fn default_path() -> Result<PathBuf> {
        match UserDirs::new() {
            Some(user_dirs) => Ok(user_dirs.home_dir().join(".aws/config")),
            None => Err(anyhow!("Unable to get user directories")),
        }
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            profiles: read_sections(path, FileName::Config)?,
        })
    }

    pub fn write(&self) -> Result<()> {
        serialize_write_ordered(&self.profiles, &self.path, FileName::Config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, profile_name: &str) -> Option<&Section> {
        self.profiles.get(&Self::sanitize_profile_name(profile_name))
    }

    pub fn get_value(&self, profile_name: &str, key: &str) -> Option<&str> {
        self.get(profile_name)
            .and_then(|profile| profile.get(key))
            .map(String::as_str)
    }

    /// Sets a single key, other keys of the profile are kept
    pub fn upsert(&mut self, profile_name: &str, key: &str, value: &str) {
        self.profiles
            .entry(Self::sanitize_profile_name(profile_name))
            .or_default()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Removes a single key, a profile left without keys is removed too
    pub fn remove(&mut self, profile_name: &str, key: &str) {
        let section = Self::sanitize_profile_name(profile_name);
        if let Some(profile) = self.profiles.get_mut(&section) {
            profile.remove(key);
            if profile.is_empty() {
                self.profiles.remove(&section);
            }
        }
    }

    /// Profile names without the section prefix, other section types such as `sso-session` are skipped
    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().filter_map(|section| {
            if section == DEFAULT_PROFILE {
                Some(section.as_str())
            } else {
                section.strip_prefix(PROFILE_PREFIX).map(str::trim)
            }
        })
    }

    pub fn sanitize_profile_name(profile_name: &str) -> String {
        if profile_name != DEFAULT_PROFILE && !profile_name.starts_with(PROFILE_PREFIX) {
            format!("{}{}", PROFILE_PREFIX, profile_name)
        } else {
            profile_name.to_string()
        }
    }
}
