use anyhow::{anyhow, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_smithy_types::date_time::Format;
use chrono::{DateTime, Utc};
use file_manager::serde_support::parse_expiration;
use shared::secret::Secret;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// 36 hours, the longest session STS issues for IAM user credentials
pub const SESSION_DURATION_SECONDS: i32 = 129_600;

/// GetSessionToken is global, a region is only needed to pick an endpoint
const FALLBACK_REGION: &str = "us-east-1";

const PROVIDER_NAME: &str = "aws-profile-manager";

#[derive(Clone, Debug)]
pub struct SourceCredentials {
    pub access_key_id: String,
    pub secret_access_key: Secret,
}

#[derive(Clone, Debug)]
pub struct SessionTokenRequest {
    pub device_arn: String,
    pub code: Secret,
    pub source: SourceCredentials,
    pub duration_seconds: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: Secret,
    pub session_token: Secret,
    pub expiration: DateTime<Utc>,
}

/// Exchanges an MFA code and long lived credentials for a session
pub trait IdentityProvider {
    fn get_session_token(
        &self,
        request: &SessionTokenRequest,
    ) -> impl Future<Output = Result<SessionCredentials>> + Send;
}

#[derive(Clone, Debug)]
pub struct StsIdentityProvider {
    region: Option<String>,
    timeout: Duration,
}

impl StsIdentityProvider {
    pub fn new(region: Option<String>, timeout: Duration) -> Self {
        Self { region, timeout }
    }
}

impl IdentityProvider for StsIdentityProvider {
    async fn get_session_token(&self, request: &SessionTokenRequest) -> Result<SessionCredentials> {
        let region_provider = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_REGION));

        let credentials = Credentials::new(
            request.source.access_key_id.clone(),
            request.source.secret_access_key.expose().to_owned(),
            None,
            None,
            PROVIDER_NAME,
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .credentials_provider(credentials)
            .load()
            .await;

        let sts_client = aws_sdk_sts::Client::new(&config);

        debug!(
            "Calling GetSessionToken for device {} with a duration of {}s",
            request.device_arn, request.duration_seconds
        );

        let session_token_request = sts_client
            .get_session_token()
            .serial_number(&request.device_arn)
            .token_code(request.code.expose())
            .duration_seconds(request.duration_seconds);

        let session_token_response = tokio::time::timeout(self.timeout, session_token_request.send())
            .await
            .map_err(|_| anyhow!("STS did not respond within {}s", self.timeout.as_secs()))?
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;

        let credentials = session_token_response
            .credentials()
            .ok_or(anyhow!("No credentials found in session token response"))?;

        let expiration = credentials.expiration().fmt(Format::DateTime)?;

        Ok(SessionCredentials {
            access_key_id: credentials.access_key_id().to_owned(),
            secret_access_key: Secret::new(credentials.secret_access_key()),
            session_token: Secret::new(credentials.session_token()),
            expiration: parse_expiration(&expiration)?,
        })
    }
}
