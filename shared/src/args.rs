use crate::naming::KindFilter;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the AWS config file [default: ~/.aws/config]
    #[arg(long, global = true, env = "AWS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Path to the AWS credentials file [default: ~/.aws/credentials]
    #[arg(long, global = true, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Enables verbose logging to the console
    #[arg(short, long, global = true, default_value_t = false)]
    pub debug: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Create or update the IAM user profile <domain>:iam
    AddIam {
        /// The domain grouping the profiles, e.g. work
        #[arg(long)]
        domain: String,

        /// The access key ID, prompted for if not given
        #[arg(long)]
        access_key_id: Option<String>,
    },

    /// Create or update the MFA profile <domain>:mfa
    AddMfa {
        /// The domain grouping the profiles, e.g. work
        #[arg(long)]
        domain: String,

        /// The ARN of the MFA device, e.g. arn:aws:iam::123456789012:mfa/user
        #[arg(long)]
        device_arn: String,
    },

    /// Create or update the assume role profile <domain>:<name>, the domain is taken from the source profile
    AddRole {
        /// The role part of the new profile name
        #[arg(long)]
        name: String,

        /// The ARN of the role to assume
        #[arg(long)]
        role_arn: String,

        /// The region used by the profile
        #[arg(long)]
        region: String,

        /// The IAM or MFA profile the role is assumed from, e.g. work:mfa
        #[arg(long)]
        source_profile: String,
    },

    /// Print the shell statement that makes a profile active, use with eval
    Use {
        /// The profile to activate
        name: String,

        /// The shell syntax to print
        #[arg(long, value_enum, default_value_t = ExportShell::Sh)]
        shell: ExportShell,
    },

    /// Show the active profile
    Current {
        /// The active profile, defaults to AWS_PROFILE
        #[arg(short, long, env = "AWS_PROFILE")]
        profile: Option<String>,
    },

    /// Refresh the MFA session token of the active profile's domain
    Refresh {
        /// The active profile, defaults to AWS_PROFILE
        #[arg(short, long, env = "AWS_PROFILE")]
        profile: Option<String>,

        /// The MFA code, prompted for if not given
        #[arg(long)]
        code: Option<String>,

        /// Force a session refresh, even if the current one is still valid
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Additionally returns the JSON credentials to stdout, for consumption by AWS Config [credential_process]
        #[arg(short, long, default_value_t = false)]
        json: bool,

        /// Seconds to wait for STS before giving up
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// List profiles following the <domain>:<role> convention
    List {
        /// Only list profiles of this kind
        #[arg(long, value_enum, default_value_t = KindFilter::All)]
        kind: KindFilter,

        /// Only list profiles of this domain
        #[arg(long)]
        domain: Option<String>,
    },

    /// List known domains
    Domains,

    /// Show the settings of a profile, secrets are masked
    Show {
        /// The profile to show
        name: String,
    },

    /// Generate a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportShell {
    /// POSIX shells such as bash and zsh
    Sh,
    Fish,
    Powershell,
}

impl Args {
    /// Commands whose stdout is read by another program, logging goes to stderr for these
    pub fn machine_output(&self) -> bool {
        matches!(
            self.command,
            Command::Use { .. } | Command::Completions { .. } | Command::Refresh { json: true, .. }
        )
    }
}
