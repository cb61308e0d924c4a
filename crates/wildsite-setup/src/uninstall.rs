use anyhow::{Result, bail};
use clap::Args;

use crate::cmd::run_cmd_best_effort;
use crate::config::{HostPaths, RunContext, validate_domain};
use crate::fsutil::remove_path;
use crate::{firewall, nginx, prompt};

/// Packages purged on uninstall. ufw and openssl are left installed.
const PURGED_PACKAGES: &[&str] = &["nginx", "nginx-common", "certbot"];

/// Arguments for the `uninstall` subcommand.
#[derive(Debug, Default, Args)]
pub struct UninstallArgs {
    /// Apex domain that was set up
    #[arg(long)]
    pub domain: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run the uninstall flow.
pub fn run(args: UninstallArgs, ctx: &RunContext) -> Result<()> {
    let mut answers = Vec::new();
    let domain = match args.domain {
        Some(d) => crate::config::normalize_domain(&d),
        None => {
            let domain =
                prompt::prompt_domain(ctx.non_interactive, ctx.defaults.domain.as_deref())?;
            answers.extend(["--domain".to_string(), domain.clone()]);
            domain
        }
    };
    validate_domain(&domain)?;

    if !args.yes {
        if !prompt::confirm_uninstall(ctx.non_interactive, &domain)? {
            bail!("uninstall cancelled");
        }
        answers.push("--yes".to_string());
    }

    crate::escalate::escalate_if_needed(ctx, "uninstall", &answers)?;

    tracing::info!("uninstall: domain={domain}");

    stop_and_purge();
    remove_files(&domain, &ctx.paths)?;

    #[allow(clippy::print_stdout)]
    {
        println!();
        println!("Uninstall complete. nginx, certbot and all files for {domain} were removed.");
        println!("Remember to delete the DNS records for {domain} and *.{domain} if unused.");
    }
    Ok(())
}

/// Service, firewall and package teardown. Each step may fail on a partially
/// configured host; failures are logged and the run continues.
fn stop_and_purge() {
    run_cmd_best_effort("stopping nginx", "systemctl", &["stop", "nginx"]);
    run_cmd_best_effort("disabling nginx", "systemctl", &["disable", "nginx"]);
    firewall::remove_web_rules();

    let mut args = vec!["purge", "-y"];
    args.extend_from_slice(PURGED_PACKAGES);
    run_cmd_best_effort("purging nginx and certbot", "apt-get", &args);
    run_cmd_best_effort("removing unused dependencies", "apt-get", &["autoremove", "-y"]);
}

/// Remove every file setup created for `domain`. Already-missing files are fine.
pub fn remove_files(domain: &str, paths: &HostPaths) -> Result<()> {
    remove_path(&paths.letsencrypt)?;
    nginx::remove_site(paths, domain)?;
    paths.layout().remove()?;
    remove_path(&paths.renewal_note())
}
