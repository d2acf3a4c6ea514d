use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid profile name '{0}', expected the form <domain>:<role>")]
    InvalidFormat(String),

    #[error("Source profile '{0}' not found, create it with add-iam or add-mfa first")]
    SourceProfileNotFound(String),

    #[error("No active profile, run with --profile or select one with `use`")]
    NoActiveProfile,

    #[error("No MFA code provided for profile '{0}'")]
    MissingCode(String),

    #[error("Profile '{0}' has no MFA device ARN, run add-mfa for this domain first")]
    MissingDeviceArn(String),

    #[error("Profile '{0}' has no access key credentials, run add-iam for this domain first")]
    MissingIamCredentials(String),

    #[error("Failed to get a session token for profile '{profile}'")]
    SessionTokenExchangeFailed {
        profile: String,
        #[source]
        source: anyhow::Error,
    },

    /// File, parse and prompt failures
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}
