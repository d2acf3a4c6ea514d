use crate::error::ProfileError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const SEPARATOR: char = ':';
pub const IAM_ROLE: &str = "iam";
pub const MFA_ROLE: &str = "mfa";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileKind {
    Iam,
    Mfa,
    AssumeRole,
}

impl ProfileKind {
    pub fn classify(role: &str) -> Self {
        match role {
            IAM_ROLE => ProfileKind::Iam,
            MFA_ROLE => ProfileKind::Mfa,
            _ => ProfileKind::AssumeRole,
        }
    }

    /// IAM and MFA profiles carry credentials of their own and can act as a `source_profile`
    pub fn is_user(&self) -> bool {
        matches!(self, ProfileKind::Iam | ProfileKind::Mfa)
    }
}

impl Display for ProfileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Iam => write!(f, "IAM"),
            ProfileKind::Mfa => write!(f, "MFA"),
            ProfileKind::AssumeRole => write!(f, "Assume Role"),
        }
    }
}

/// Which profile kinds a listing should include
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindFilter {
    Iam,
    Mfa,
    AssumeRole,
    /// IAM and MFA profiles
    User,
    #[default]
    All,
}

impl KindFilter {
    pub fn matches(&self, kind: ProfileKind) -> bool {
        match self {
            KindFilter::Iam => kind == ProfileKind::Iam,
            KindFilter::Mfa => kind == ProfileKind::Mfa,
            KindFilter::AssumeRole => kind == ProfileKind::AssumeRole,
            KindFilter::User => kind.is_user(),
            KindFilter::All => true,
        }
    }
}

/// A `domain:role` profile identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileName {
    domain: String,
    role: String,
}

impl ProfileName {
    pub fn new(domain: &str, role: &str) -> Result<Self, ProfileError> {
        validate_part("domain", domain)?;
        validate_part("role", role)?;

        Ok(Self {
            domain: domain.to_owned(),
            role: role.to_owned(),
        })
    }

    pub fn iam(domain: &str) -> Result<Self, ProfileError> {
        Self::new(domain, IAM_ROLE)
    }

    pub fn mfa(domain: &str) -> Result<Self, ProfileError> {
        Self::new(domain, MFA_ROLE)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn kind(&self) -> ProfileKind {
        ProfileKind::classify(&self.role)
    }
}

impl Display for ProfileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.domain, SEPARATOR, self.role)
    }
}

impl FromStr for ProfileName {
    type Err = ProfileError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let (domain, role) = parse(name)?;
        Ok(Self {
            domain: domain.to_owned(),
            role: role.to_owned(),
        })
    }
}

fn validate_part(what: &str, value: &str) -> Result<(), ProfileError> {
    if value.is_empty() {
        return Err(ProfileError::InvalidArgument(format!(
            "{} cannot be empty",
            what
        )));
    }

    if value.contains(SEPARATOR) {
        return Err(ProfileError::InvalidArgument(format!(
            "{} '{}' cannot contain '{}'",
            what, value, SEPARATOR
        )));
    }

    Ok(())
}

pub fn compose(domain: &str, role: &str) -> Result<String, ProfileError> {
    Ok(ProfileName::new(domain, role)?.to_string())
}

/// Splits on the first separator, the role keeps anything after it
pub fn parse(name: &str) -> Result<(&str, &str), ProfileError> {
    match name.split_once(SEPARATOR) {
        Some((domain, role)) if !domain.is_empty() && !role.is_empty() => Ok((domain, role)),
        _ => Err(ProfileError::InvalidFormat(name.to_owned())),
    }
}

pub fn classify_kind(role: &str) -> ProfileKind {
    ProfileKind::classify(role)
}
