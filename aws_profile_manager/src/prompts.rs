use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password};
use shared::secret::Secret;

pub fn access_key_id(domain: &str) -> Result<String> {
    let access_key_id: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Access Key ID for {}", domain))
        .allow_empty(false)
        .interact_text()?;

    Ok(access_key_id)
}

pub fn secret_access_key(domain: &str) -> Result<Secret> {
    let secret_access_key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Secret Access Key for {}", domain))
        .interact()?;

    Ok(Secret::new(secret_access_key))
}

/// Shows what is about to be saved, the secret only as placeholders
pub fn confirm_iam(profile_name: &str, access_key_id: &str, secret_access_key: &Secret) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Save {} with access key {} and secret {}?",
            profile_name,
            access_key_id,
            secret_access_key.masked()
        ))
        .default(true)
        .interact()?;

    Ok(confirmed)
}

pub fn mfa_code(profile_name: &str) -> Result<Option<Secret>> {
    let code: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("MFA code for {}", profile_name))
        .allow_empty(true)
        .interact_text()?;

    Ok(Some(Secret::new(code)))
}
