use anyhow::{Result, bail};
use clap::Args;

use crate::config::{RunContext, validate_domain, validate_subdomain};
use crate::prompt;

/// Arguments for the `add-subdomain` subcommand.
#[derive(Debug, Args)]
pub struct AddSubdomainArgs {
    /// Subdomain label to create (e.g. blog)
    pub name: String,

    /// Apex domain the subdomain belongs to
    #[arg(long)]
    pub domain: Option<String>,
}

/// Create the content directory for a new subdomain. The final nginx site
/// routes every subdomain by name, so no reload is needed.
pub fn run(args: AddSubdomainArgs, ctx: &RunContext) -> Result<()> {
    let name = args.name.trim().to_ascii_lowercase();
    validate_subdomain(&name)?;

    let domain = match args.domain {
        Some(d) => crate::config::normalize_domain(&d),
        None => prompt::prompt_domain(ctx.non_interactive, ctx.defaults.domain.as_deref())?,
    };
    validate_domain(&domain)?;

    let dir = add_subdomain(ctx, &domain, &name)?;

    #[allow(clippy::print_stdout)]
    {
        println!("https://{name}.{domain} is served from {}", dir.display());
    }
    Ok(())
}

fn add_subdomain(ctx: &RunContext, domain: &str, name: &str) -> Result<std::path::PathBuf> {
    let layout = ctx.paths.layout();
    if !layout.root_dir().exists() {
        bail!(
            "content tree {} not found — run setup first",
            layout.base().display()
        );
    }

    let dir = layout.subdomain_dir(name);
    if layout.add_subdomain(domain, name)? {
        tracing::info!("created {name}.{domain}");
    } else {
        tracing::info!("{name}.{domain} already exists; nothing to do");
    }
    Ok(dir)
}
