use file_manager::serde_support::format_expiration;
use profiles::sts::SessionCredentials;
use serde::Serialize;

/// The document the AWS CLI expects from a `credential_process`
#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct JsonCredential {
    pub version: u8,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: String,
}

impl JsonCredential {
    pub fn convert(credentials: &SessionCredentials) -> Self {
        Self {
            version: 1,
            access_key_id: credentials.access_key_id.clone(),
            secret_access_key: credentials.secret_access_key.expose().to_owned(),
            session_token: credentials.session_token.expose().to_owned(),
            expiration: format_expiration(&credentials.expiration),
        }
    }
}
