use anyhow::{Result, bail};
use chrono::Utc;
use clap::Args;

use crate::config::{RunContext, validate_domain};
use crate::{certbot, nginx, prompt, setup};

/// Arguments for the `renew` subcommand.
#[derive(Debug, Default, Args)]
pub struct RenewArgs {
    /// Apex domain whose certificate should be renewed
    #[arg(long)]
    pub domain: Option<String>,

    /// Email for Let's Encrypt expiry notices
    #[arg(long)]
    pub email: Option<String>,
}

/// Re-issue the wildcard certificate through a fresh DNS challenge.
pub fn run(args: RenewArgs, ctx: &RunContext) -> Result<()> {
    let prompted = args.domain.is_none();
    let domain = match args.domain {
        Some(d) => crate::config::normalize_domain(&d),
        None => prompt::prompt_domain(ctx.non_interactive, ctx.defaults.domain.as_deref())?,
    };
    validate_domain(&domain)?;

    let answers = if prompted {
        vec!["--domain".to_string(), domain.clone()]
    } else {
        Vec::new()
    };
    crate::escalate::escalate_if_needed(ctx, "renew", &answers)?;

    if !ctx.paths.site_config(&domain).exists() {
        bail!(
            "no site configured for {domain} at {} — run setup first",
            ctx.paths.site_config(&domain).display()
        );
    }

    let email = args.email.or_else(|| ctx.defaults.email.clone());
    tracing::info!("renewing certificate for {domain}");

    certbot::request_wildcard_certificate(&domain, email.as_deref(), true)?;
    setup::write_final_files(&domain, &ctx.paths, Utc::now())?;
    setup::hand_over_to_operator(&ctx.paths)?;
    nginx::test_and_reload()?;

    let subdomains = ctx.paths.layout().list_subdomains()?;

    #[allow(clippy::print_stdout)]
    {
        println!();
        println!("Certificate for {domain} renewed. Covered sites:");
        println!("  {domain}, www.{domain}");
        for name in &subdomains {
            println!("  {name}.{domain}");
        }
        println!("Updated reminder: {}", ctx.paths.renewal_note().display());
    }
    Ok(())
}
