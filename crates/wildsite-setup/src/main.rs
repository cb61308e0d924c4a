use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use wildsite_setup::config::{HostPaths, RunContext, SetupDefaults};
use wildsite_setup::prompt::{self, MenuChoice};
use wildsite_setup::renew::RenewArgs;
use wildsite_setup::setup::SetupArgs;
use wildsite_setup::subdomain::AddSubdomainArgs;
use wildsite_setup::uninstall::UninstallArgs;

/// Provision nginx with a wildcard Let's Encrypt certificate for a domain and its subdomains.
#[derive(Debug, Parser)]
#[command(name = "wildsite-setup", version, about)]
struct Cli {
    /// Run without interactive prompts (use defaults, the config file or CLI flags)
    #[arg(long, global = true)]
    non_interactive: bool,

    /// TOML file with default answers (default: ~/.config/wildsite/setup.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Operator home holding SERVER/ and the renewal note (default: the invoking user's home, also under sudo)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Action to run; without one an interactive menu is shown
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Install nginx and certbot, issue the wildcard certificate and write the site
    Setup(SetupArgs),
    /// Remove packages, the certificate store and every generated file
    Uninstall(UninstallArgs),
    /// Re-issue the wildcard certificate through a new DNS challenge
    Renew(RenewArgs),
    /// Create the content directory for another subdomain
    AddSubdomain(AddSubdomainArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    wildsite_setup::logging::init_tracing("info", cli.log_json);

    let (command, command_from_menu) = match cli.command {
        Some(command) => (command, false),
        None if cli.non_interactive => {
            bail!("a command (setup, uninstall, renew, add-subdomain) is required with --non-interactive")
        }
        None => match prompt::prompt_menu()? {
            MenuChoice::Setup => (Commands::Setup(SetupArgs::default()), true),
            MenuChoice::Uninstall => (Commands::Uninstall(UninstallArgs::default()), true),
        },
    };

    let paths = match cli.home {
        Some(home) => HostPaths::system(home),
        None => HostPaths::detect()?,
    };
    let defaults = SetupDefaults::resolve(cli.config.as_deref(), &paths.home)?;
    let ctx = RunContext {
        non_interactive: cli.non_interactive,
        command_from_menu,
        paths,
        defaults,
    };

    match command {
        Commands::Setup(args) => wildsite_setup::setup::run(args, &ctx)?,
        Commands::Uninstall(args) => wildsite_setup::uninstall::run(args, &ctx)?,
        Commands::Renew(args) => wildsite_setup::renew::run(args, &ctx)?,
        Commands::AddSubdomain(args) => wildsite_setup::subdomain::run(args, &ctx)?,
    }

    Ok(())
}
