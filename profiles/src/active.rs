use shared::args::ExportShell;

/// The variable the AWS CLI and SDKs read their default profile from
pub const AWS_PROFILE_VAR: &str = "AWS_PROFILE";

/// The profile downstream tooling uses when none is given per call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveProfile {
    name: Option<String>,
}

impl ActiveProfile {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.filter(|name| !name.trim().is_empty()),
        }
    }

    /// The name is not checked against the store, a profile may be selected before it is created
    pub fn set_active(&mut self, name: &str) {
        self.name = Some(name.to_owned()).filter(|name| !name.trim().is_empty());
    }

    pub fn get_active(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The statement that sets the variable in the calling shell, a child process can't change it itself
    pub fn export_command(&self, shell: ExportShell) -> Option<String> {
        let name = self.get_active()?;

        let command = match shell {
            ExportShell::Sh => format!(
                "export {}='{}'",
                AWS_PROFILE_VAR,
                name.replace('\'', r"'\''")
            ),
            ExportShell::Fish => format!(
                "set -gx {} '{}'",
                AWS_PROFILE_VAR,
                name.replace('\\', r"\\").replace('\'', r"\'")
            ),
            ExportShell::Powershell => format!(
                "$Env:{} = '{}'",
                AWS_PROFILE_VAR,
                name.replace('\'', "''")
            ),
        };

        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut active = ActiveProfile::default();
        assert_eq!(active.get_active(), None);

        active.set_active("work:dev");
        assert_eq!(active.get_active(), Some("work:dev"));

        active.set_active("home:admin");
        assert_eq!(active.get_active(), Some("home:admin"));
    }

    #[test]
    fn blank_names_are_absent() {
        assert_eq!(ActiveProfile::new(Some("  ".to_string())).get_active(), None);
        assert_eq!(ActiveProfile::new(None).get_active(), None);
    }

    #[test]
    fn export_commands() {
        let active = ActiveProfile::new(Some("work:dev".to_string()));
        assert_eq!(
            active.export_command(ExportShell::Sh).unwrap(),
            "export AWS_PROFILE='work:dev'"
        );
        assert_eq!(
            active.export_command(ExportShell::Fish).unwrap(),
            "set -gx AWS_PROFILE 'work:dev'"
        );
        assert_eq!(
            active.export_command(ExportShell::Powershell).unwrap(),
            "$Env:AWS_PROFILE = 'work:dev'"
        );
        assert_eq!(ActiveProfile::default().export_command(ExportShell::Sh), None);
    }

    #[test]
    fn export_quotes_single_quotes() {
        let active = ActiveProfile::new(Some("it's:dev".to_string()));
        assert_eq!(
            active.export_command(ExportShell::Sh).unwrap(),
            r"export AWS_PROFILE='it'\''s:dev'"
        );
        assert_eq!(
            active.export_command(ExportShell::Powershell).unwrap(),
            "$Env:AWS_PROFILE = 'it''s:dev'"
        );
    }
}
