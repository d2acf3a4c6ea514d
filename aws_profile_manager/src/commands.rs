use crate::json::JsonCredential;
use crate::prompts;
use anyhow::{bail, Result};
use file_manager::serde_support::format_expiration;
use file_manager::store::{AwsProfileStore, Attribute, ProfileStore};
use profiles::active::ActiveProfile;
use profiles::linker;
use profiles::refresher::{self, RefreshOutcome, SessionRefresher, SessionState};
use profiles::sts::StsIdentityProvider;
use shared::args::ExportShell;
use shared::naming::{self, KindFilter, ProfileName};
use shared::secret::Secret;
use std::time::Duration;
use tracing::{info, warn};

pub fn add_iam(store: &mut AwsProfileStore, domain: &str, access_key_id: Option<String>) -> Result<()> {
    let profile_name = ProfileName::iam(domain)?;

    let access_key_id = match access_key_id {
        Some(access_key_id) => access_key_id,
        None => prompts::access_key_id(domain)?,
    };
    let secret_access_key = prompts::secret_access_key(domain)?;

    if !prompts::confirm_iam(&profile_name.to_string(), &access_key_id, &secret_access_key)? {
        info!("Nothing saved");
        return Ok(());
    }

    linker::create_iam_profile(store, domain, &access_key_id, &secret_access_key)?;

    Ok(())
}

pub fn add_mfa(store: &mut AwsProfileStore, domain: &str, device_arn: &str) -> Result<()> {
    let name = linker::create_mfa_profile(store, domain, device_arn)?;
    info!("Run refresh with a profile of domain {} to start a session", name.domain());

    Ok(())
}

pub fn add_role(
    store: &mut AwsProfileStore,
    name: &str,
    role_arn: &str,
    region: &str,
    source_profile: &str,
) -> Result<()> {
    linker::create_assume_role_profile(store, name, role_arn, region, source_profile)?;

    Ok(())
}

/// Prints only the export statement so the output can be passed to eval
pub fn use_profile(store: &AwsProfileStore, name: &str, shell: ExportShell) -> Result<()> {
    if !store.contains(name) {
        warn!("Profile {} is not in the AWS config or credentials file yet", name);
    }

    let mut active = ActiveProfile::default();
    active.set_active(name);

    match active.export_command(shell) {
        Some(command) => println!("{}", command),
        None => bail!("Profile name cannot be empty"),
    }

    Ok(())
}

pub fn current(store: &AwsProfileStore, active: &ActiveProfile) -> Result<()> {
    let Some(name) = active.get_active() else {
        println!("No active profile");
        return Ok(());
    };

    println!("{}", name);

    if let Ok((domain, _)) = naming::parse(name) {
        let mfa_profile = ProfileName::mfa(domain)?.to_string();
        match refresher::session_state(store, &mfa_profile) {
            SessionState::NoSession => println!("{}: no session", mfa_profile),
            SessionState::Valid(expiration) => println!(
                "{}: session valid until {}",
                mfa_profile,
                format_expiration(&expiration)
            ),
            SessionState::ExpiredOrNearExpiry(expiration) => println!(
                "{}: session expires at {}, refresh needed",
                mfa_profile,
                format_expiration(&expiration)
            ),
        }
    }

    Ok(())
}

pub async fn refresh(
    store: &mut AwsProfileStore,
    active: &ActiveProfile,
    code: Option<String>,
    force: bool,
    json: bool,
    timeout: u64,
) -> Result<()> {
    let region = active
        .get_active()
        .and_then(|name| store.get(name, Attribute::Region));
    let provider = StsIdentityProvider::new(region, Duration::from_secs(timeout));

    let outcome = {
        let mut refresher = SessionRefresher::new(&mut *store, &provider);
        match code {
            Some(code) => {
                let mut given_code =
                    move |_: &str| -> Result<Option<Secret>> { Ok(Some(Secret::new(code.clone()))) };
                refresher.refresh(active, &mut given_code, force).await?
            }
            None => refresher.refresh(active, &mut prompts::mfa_code, force).await?,
        }
    };

    if let RefreshOutcome::AlreadyValid { .. } = outcome {
        info!("Use --force to refresh anyway");
    }

    if json {
        let credentials = match outcome {
            RefreshOutcome::Refreshed { credentials, .. } => Some(credentials),
            RefreshOutcome::AlreadyValid { profile, .. } => refresher::stored_session(store, &profile),
        };

        match credentials {
            Some(credentials) => {
                let json_credentials = JsonCredential::convert(&credentials);
                let json = serde_json::to_string_pretty(&json_credentials)?;
                println!("{}", json);
            }
            None => bail!("The stored session is incomplete, run again with --force"),
        }
    }

    Ok(())
}

pub fn list(store: &AwsProfileStore, kind: KindFilter, domain: Option<&str>) -> Result<()> {
    for name in linker::list_profiles(store, kind, domain) {
        println!("{}", name);
    }

    Ok(())
}

pub fn domains(store: &AwsProfileStore) -> Result<()> {
    for domain in linker::list_domains(store) {
        println!("{}", domain);
    }

    Ok(())
}

pub fn show(store: &AwsProfileStore, name: &str) -> Result<()> {
    let summary = linker::describe(store, name)?;

    println!("{} ({})", summary.name, summary.kind);
    for (attribute, value) in &summary.attributes {
        println!("  {} = {}", attribute, value);
    }

    Ok(())
}
