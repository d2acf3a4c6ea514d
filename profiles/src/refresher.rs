use crate::active::ActiveProfile;
use crate::sts::{
    IdentityProvider, SessionCredentials, SessionTokenRequest, SourceCredentials,
    SESSION_DURATION_SECONDS,
};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use file_manager::serde_support::{format_expiration, parse_expiration, FileName};
use file_manager::store::{Attribute, ProfileStore};
use shared::error::ProfileError;
use shared::naming::{self, ProfileName};
use shared::secret::Secret;
use tracing::{info, warn};

/// A session closer than this to its expiry is refreshed
const REFRESH_MARGIN_MINUTES: i64 = 60;

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    NoSession,
    Valid(DateTime<Utc>),
    ExpiredOrNearExpiry(DateTime<Utc>),
}

impl SessionState {
    pub fn at(expiration: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expiration {
            None => SessionState::NoSession,
            Some(expiration)
                if expiration.signed_duration_since(now)
                    > Duration::minutes(REFRESH_MARGIN_MINUTES) =>
            {
                SessionState::Valid(expiration)
            }
            Some(expiration) => SessionState::ExpiredOrNearExpiry(expiration),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    AlreadyValid {
        profile: String,
        expiration: DateTime<Utc>,
    },
    Refreshed {
        profile: String,
        credentials: SessionCredentials,
    },
}

impl RefreshOutcome {
    pub fn profile(&self) -> &str {
        match self {
            RefreshOutcome::AlreadyValid { profile, .. } => profile,
            RefreshOutcome::Refreshed { profile, .. } => profile,
        }
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        match self {
            RefreshOutcome::AlreadyValid { expiration, .. } => *expiration,
            RefreshOutcome::Refreshed { credentials, .. } => credentials.expiration,
        }
    }
}

/// Where the MFA code comes from, an interactive prompt or a value given up front
pub trait MfaCodeProvider {
    fn mfa_code(&mut self, profile_name: &str) -> Result<Option<Secret>>;
}

impl<F> MfaCodeProvider for F
where
    F: FnMut(&str) -> Result<Option<Secret>>,
{
    fn mfa_code(&mut self, profile_name: &str) -> Result<Option<Secret>> {
        self(profile_name)
    }
}

/// The session expiry recorded on an MFA profile, unreadable values count as no session
pub fn current_expiration<S: ProfileStore>(store: &S, mfa_profile: &str) -> Option<DateTime<Utc>> {
    let value = store.get(mfa_profile, Attribute::Expiration)?;

    match parse_expiration(&value) {
        Ok(expiration) => Some(expiration),
        Err(e) => {
            warn!("Ignoring the expiration of profile {}: {:#}", mfa_profile, e);
            None
        }
    }
}

/// The session last written to an MFA profile, if all of its parts are present
pub fn stored_session<S: ProfileStore>(store: &S, mfa_profile: &str) -> Option<SessionCredentials> {
    Some(SessionCredentials {
        access_key_id: store.get(mfa_profile, Attribute::AccessKeyId)?,
        secret_access_key: Secret::new(store.get(mfa_profile, Attribute::SecretAccessKey)?),
        session_token: Secret::new(store.get(mfa_profile, Attribute::SessionToken)?),
        expiration: current_expiration(store, mfa_profile)?,
    })
}

pub fn session_state<S: ProfileStore>(store: &S, mfa_profile: &str) -> SessionState {
    SessionState::at(current_expiration(store, mfa_profile), Utc::now())
}

pub struct SessionRefresher<'a, S, P> {
    store: &'a mut S,
    provider: &'a P,
}

impl<'a, S, P> SessionRefresher<'a, S, P>
where
    S: ProfileStore,
    P: IdentityProvider,
{
    pub fn new(store: &'a mut S, provider: &'a P) -> Self {
        Self { store, provider }
    }

    /// Refreshes the MFA session of the active profile's domain.
    ///
    /// Nothing is written unless the identity provider returned a complete session.
    pub async fn refresh<C>(
        &mut self,
        active: &ActiveProfile,
        codes: &mut C,
        force: bool,
    ) -> Result<RefreshOutcome, ProfileError>
    where
        C: MfaCodeProvider + ?Sized,
    {
        let active_profile = active.get_active().ok_or(ProfileError::NoActiveProfile)?;
        let (domain, _) = naming::parse(active_profile)?;

        let iam_profile = ProfileName::iam(domain)?.to_string();
        let mfa_profile = ProfileName::mfa(domain)?.to_string();

        if !force {
            if let SessionState::Valid(expiration) =
                session_state(&*self.store, &mfa_profile)
            {
                info!(
                    "Session of profile {} is valid until {}",
                    mfa_profile,
                    format_expiration(&expiration)
                );
                return Ok(RefreshOutcome::AlreadyValid {
                    profile: mfa_profile,
                    expiration,
                });
            }
        }

        let code = codes
            .mfa_code(&mfa_profile)?
            .map(|code| Secret::new(code.expose().trim()))
            .filter(|code| !code.is_empty())
            .ok_or_else(|| ProfileError::MissingCode(mfa_profile.clone()))?;

        let device_arn = self
            .store
            .get(&mfa_profile, Attribute::DeviceArn)
            .ok_or_else(|| ProfileError::MissingDeviceArn(mfa_profile.clone()))?;

        let source = self.source_credentials(&iam_profile)?;

        let request = SessionTokenRequest {
            device_arn,
            code,
            source,
            duration_seconds: SESSION_DURATION_SECONDS,
        };

        info!(
            "Requesting a session token for profile {} with device {}",
            mfa_profile, request.device_arn
        );

        let credentials = self
            .provider
            .get_session_token(&request)
            .await
            .map_err(|source| ProfileError::SessionTokenExchangeFailed {
                profile: mfa_profile.clone(),
                source,
            })?;

        self.persist(&mfa_profile, &credentials)?;

        info!(
            "Session of profile {} refreshed, valid until {}",
            mfa_profile,
            format_expiration(&credentials.expiration)
        );

        Ok(RefreshOutcome::Refreshed {
            profile: mfa_profile,
            credentials,
        })
    }

    fn source_credentials(&self, iam_profile: &str) -> Result<SourceCredentials, ProfileError> {
        let access_key_id = self.store.get(iam_profile, Attribute::AccessKeyId);
        let secret_access_key = self.store.get(iam_profile, Attribute::SecretAccessKey);

        match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(SourceCredentials {
                access_key_id,
                secret_access_key: Secret::new(secret_access_key),
            }),
            _ => Err(ProfileError::MissingIamCredentials(iam_profile.to_owned())),
        }
    }

    /// The in-memory store is put back as it was when the file can't be written
    fn persist(
        &mut self,
        mfa_profile: &str,
        credentials: &SessionCredentials,
    ) -> Result<(), ProfileError> {
        let previous: Vec<(Attribute, Option<String>)> = Attribute::SESSION
            .iter()
            .map(|attribute| (*attribute, self.store.get(mfa_profile, *attribute)))
            .collect();

        self.store
            .set(mfa_profile, Attribute::AccessKeyId, &credentials.access_key_id);
        self.store.set(
            mfa_profile,
            Attribute::SecretAccessKey,
            credentials.secret_access_key.expose(),
        );
        self.store.set(
            mfa_profile,
            Attribute::SessionToken,
            credentials.session_token.expose(),
        );
        self.store.set(
            mfa_profile,
            Attribute::Expiration,
            &format_expiration(&credentials.expiration),
        );

        if let Err(e) = self.store.save(FileName::Credentials) {
            for (attribute, value) in previous {
                match value {
                    Some(value) => self.store.set(mfa_profile, attribute, &value),
                    None => self.store.unset(mfa_profile, attribute),
                }
            }
            return Err(e.into());
        }

        Ok(())
    }
}
