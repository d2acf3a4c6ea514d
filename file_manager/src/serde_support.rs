use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions, Permissions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The key/value pairs of one INI section, ordered by key
pub type Section = BTreeMap<String, String>;

/// All sections of one INI file, ordered by section name
pub type Sections = BTreeMap<String, Section>;

const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileName {
    Config,
    Credentials,
}

impl Display for FileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FileName::Config => write!(f, "Config"),
            FileName::Credentials => write!(f, "Credentials"),
        }
    }
}

pub fn format_expiration(expiration: &DateTime<Utc>) -> String {
    expiration.format(EXPIRATION_FORMAT).to_string()
}

pub fn parse_expiration(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Failed to parse expiration '{}'", value))
}

/// A missing file reads as an empty set of sections
pub fn read_sections(path: &Path, file_name: FileName) -> Result<Sections> {
    if !path.exists() {
        debug!("AWS {} file not found at {}", file_name, path.display());
        return Ok(Sections::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open AWS {} file {}", file_name, path.display()))?;
    let reader = BufReader::new(file);
    let sections: Sections = serde_ini::from_bufread(reader)
        .with_context(|| format!("Failed to parse AWS {} file {}", file_name, path.display()))?;

    Ok(sections)
}

pub fn serialize_write_ordered<T>(
    profiles: &BTreeMap<String, T>,
    path: &Path,
    file_name: FileName,
) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    // A symlinked file is replaced at its destination, the link itself stays
    let target = resolve_target(path)?;
    let permissions = match std::fs::metadata(&target) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => private_permissions(),
    };

    // Written next to the target and renamed over it, a failed write leaves the old file intact
    let temp_path = target.with_extension("tmp");
    let file = create_temp_file(&temp_path, permissions)?;
    let mut writer = BufWriter::new(file);

    for (key, profile) in profiles {
        writeln!(writer, "[{}]", key)?;
        serde_ini::to_writer(&mut writer, profile)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    drop(writer);

    std::fs::rename(&temp_path, &target).with_context(|| {
        format!(
            "Failed to replace AWS {} file {}",
            file_name,
            target.display()
        )
    })?;

    info!("AWS {} file modified", file_name);

    Ok(())
}

fn resolve_target(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Files holding credentials are only readable by their owner unless the existing file says otherwise
#[cfg(unix)]
fn private_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn private_permissions() -> Option<Permissions> {
    None
}

fn create_temp_file(temp_path: &Path, permissions: Option<Permissions>) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options
        .open(temp_path)
        .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;

    // A leftover temp file keeps its old mode, so the mode is always set explicitly
    if let Some(permissions) = permissions {
        file.set_permissions(permissions)
            .with_context(|| format!("Failed to set permissions on {}", temp_path.display()))?;
    }

    Ok(file)
}
