use clap::{CommandFactory, Parser};
use file_manager::store::AwsProfileStore;
use profiles::active::ActiveProfile;
use shared::args::{Args, Command};
use tracing_subscriber::EnvFilter;

mod commands;
mod json;
mod prompts;

const BIN_NAME: &str = "awsprof";

/// Required due to using the stderr writer vs no writer specified
/// SubscriberBuilder<fn() -> Stderr> vs SubscriberBuilder
#[macro_export]
macro_rules! init_tracing {
    ($builder:expr, $debug:expr) => {
        let logging = $builder;
        let level = if $debug { "debug" } else { "info" };

        logging
            .with_target($debug)
            .with_line_number($debug)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    EnvFilter::new(format!(
                        "{},aws_config=warn,aws_smithy_runtime=warn,hyper=warn",
                        level
                    ))
                }),
            )
            .init();
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.machine_output() {
        let logging = tracing_subscriber::fmt().with_writer(std::io::stderr);
        init_tracing!(logging, args.debug);
    } else {
        let logging = tracing_subscriber::fmt();
        init_tracing!(logging, args.debug);
    }

    if let Command::Completions { shell } = args.command {
        clap_complete::generate(shell, &mut Args::command(), BIN_NAME, &mut std::io::stdout());
        return Ok(());
    }

    let mut store = AwsProfileStore::open(args.config_file, args.credentials_file)?;

    match args.command {
        Command::AddIam {
            domain,
            access_key_id,
        } => commands::add_iam(&mut store, &domain, access_key_id),
        Command::AddMfa { domain, device_arn } => {
            commands::add_mfa(&mut store, &domain, &device_arn)
        }
        Command::AddRole {
            name,
            role_arn,
            region,
            source_profile,
        } => commands::add_role(&mut store, &name, &role_arn, &region, &source_profile),
        Command::Use { name, shell } => commands::use_profile(&store, &name, shell),
        Command::Current { profile } => commands::current(&store, &ActiveProfile::new(profile)),
        Command::Refresh {
            profile,
            code,
            force,
            json,
            timeout,
        } => {
            let active = ActiveProfile::new(profile);
            commands::refresh(&mut store, &active, code, force, json, timeout).await
        }
        Command::List { kind, domain } => commands::list(&store, kind, domain.as_deref()),
        Command::Domains => commands::domains(&store),
        Command::Show { name } => commands::show(&store, &name),
        Command::Completions { .. } => Ok(()),
    }
}
