use std::os::unix::fs::MetadataExt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::cmd::run_cmd;
use crate::config::{HostPaths, RunContext, SiteSetupConfig};
use crate::renewal::RenewalNote;
use crate::{certbot, firewall, ip, nginx, prompt};

/// Packages installed on setup and purged on uninstall.
pub const PACKAGES: &[&str] = &["nginx", "certbot", "ufw", "openssl"];

/// Arguments for the `setup` subcommand.
#[derive(Debug, Default, Args)]
pub struct SetupArgs {
    /// Apex domain (e.g. example.com); the wildcard is added automatically
    #[arg(long)]
    pub domain: Option<String>,

    /// Public IP of this server, shown in the DNS instructions
    #[arg(long)]
    pub server_ip: Option<String>,

    /// Email for Let's Encrypt expiry notices
    #[arg(long)]
    pub email: Option<String>,

    /// Subdomains to create content directories for (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub subdomains: Option<Vec<String>>,
}

/// Run the setup flow.
pub fn run(args: SetupArgs, ctx: &RunContext) -> Result<()> {
    let Prepared { config, answers } = prepare(args, ctx)?;

    crate::escalate::escalate_if_needed(ctx, "setup", &answers)?;
    crate::os::ensure_apt_based()?;

    tracing::info!(
        "setup: domain={}, subdomains=[{}]",
        config.domain,
        config.subdomains.join(", ")
    );

    install_packages()?;
    firewall::allow_web()?;
    nginx::enable_service()?;

    write_initial_files(&config, &ctx.paths)?;
    hand_over_to_operator(&ctx.paths)?;
    nginx::test_and_reload()?;

    print_dns_instructions(&config);
    prompt::wait_for_dns(ctx.non_interactive)?;

    certbot::request_wildcard_certificate(&config.domain, config.email.as_deref(), false)?;
    write_final_files(&config.domain, &ctx.paths, Utc::now())?;
    hand_over_to_operator(&ctx.paths)?;
    nginx::test_and_reload()?;

    print_summary(&config, &ctx.paths);
    Ok(())
}

/// A validated configuration, ready to apply.
#[derive(Debug)]
pub struct Prepared {
    pub config: SiteSetupConfig,
    /// Flags reproducing the answers that were not given on the command line.
    pub answers: Vec<String>,
}

/// Collect and validate the configuration. Nothing on the host is changed.
pub fn prepare(args: SetupArgs, ctx: &RunContext) -> Result<Prepared> {
    let given = (
        args.domain.is_some(),
        args.server_ip.is_some(),
        args.email.is_some(),
        args.subdomains.is_some(),
    );
    let config = collect_config(args, ctx)?;
    config.validate()?;

    let (domain, server_ip, email, subdomains) = given;
    let mut answers = Vec::new();
    if !domain {
        answers.extend(["--domain".to_string(), config.domain.clone()]);
    }
    if !server_ip {
        answers.extend(["--server-ip".to_string(), config.server_ip.clone()]);
    }
    if let (false, Some(e)) = (email, &config.email) {
        answers.extend(["--email".to_string(), e.clone()]);
    }
    if !subdomains {
        answers.push(format!("--subdomains={}", config.subdomains.join(",")));
    }

    Ok(Prepared { config, answers })
}

/// Merge flags, the defaults file, detection and prompts into one config.
fn collect_config(args: SetupArgs, ctx: &RunContext) -> Result<SiteSetupConfig> {
    let defaults = &ctx.defaults;
    let ni = ctx.non_interactive;

    let domain = match args.domain {
        Some(d) => crate::config::normalize_domain(&d),
        None => prompt::prompt_domain(ni, defaults.domain.as_deref())?,
    };

    let server_ip = match args.server_ip {
        Some(ip) => ip.trim().to_string(),
        None => {
            let default = defaults.server_ip.clone().or_else(ip::detect_public_ip);
            prompt::prompt_server_ip(ni, default.as_deref())?
        }
    };

    let subdomains = match args.subdomains {
        Some(list) => crate::config::parse_subdomains(&list.join(",")),
        None => prompt::prompt_subdomains(ni, &defaults.subdomains)?,
    };

    let email = match args.email {
        Some(e) => Some(e),
        None => prompt::prompt_email(ni, defaults.email.as_deref())?,
    };

    Ok(SiteSetupConfig {
        domain,
        server_ip,
        email,
        subdomains,
    })
}

fn install_packages() -> Result<()> {
    run_cmd("updating package lists", "apt-get", &["update"])?;
    let mut args = vec!["install", "-y"];
    args.extend_from_slice(PACKAGES);
    run_cmd(
        &format!("installing {}", PACKAGES.join(", ")),
        "apt-get",
        &args,
    )
}

/// Content tree plus the HTTP-only site used during issuance.
pub fn write_initial_files(config: &SiteSetupConfig, paths: &HostPaths) -> Result<()> {
    paths.layout().create(&config.domain, &config.subdomains)?;
    crate::layout::ensure_traversable(&paths.home)?;
    nginx::install_temporary_site(paths, &config.domain)
}

/// Everything that depends on the issued certificate. The final site is
/// written only once the certificate and the DH parameters it references exist.
pub fn write_final_files(domain: &str, paths: &HostPaths, issued: DateTime<Utc>) -> Result<()> {
    certbot::verify_certificate(paths, domain)?;
    certbot::ensure_dhparams(paths)?;
    certbot::write_ssl_options(paths)?;
    nginx::install_final_site(paths, domain)?;

    let expires = certbot::certificate_expiry(paths, domain);
    RenewalNote::new(domain, issued, expires).write(paths)
}

/// Files created under the operator's home while running as root are handed
/// back to the home directory's owner.
pub(crate) fn hand_over_to_operator(paths: &HostPaths) -> Result<()> {
    if !crate::escalate::is_root() {
        return Ok(());
    }
    let meta = std::fs::metadata(&paths.home)
        .with_context(|| format!("failed to stat {}", paths.home.display()))?;
    if meta.uid() == 0 {
        return Ok(());
    }

    let owner = format!("{}:{}", meta.uid(), meta.gid());
    let layout = paths.layout();
    let note = paths.renewal_note();
    for path in [layout.base(), note.as_path()] {
        if path.exists() {
            let target = path.to_string_lossy();
            run_cmd(
                &format!("handing {} to {owner}", path.display()),
                "chown",
                &["-R", &owner, &target],
            )?;
        }
    }
    Ok(())
}

/// DNS records the operator has to create before the certificate request.
pub fn dns_instructions(domain: &str, server_ip: &str) -> String {
    format!(
        r"Create these DNS records at your DNS provider:

    {domain:<28} A    {server_ip}
    {wildcard:<28} A    {server_ip}

(Use AAAA instead of A for an IPv6 address.)

certbot will then print a TXT record for _acme-challenge.{domain}.
Publish it, wait until it resolves, and only then press Enter in certbot.
",
        wildcard = format!("*.{domain}"),
    )
}

fn print_dns_instructions(config: &SiteSetupConfig) {
    #[allow(clippy::print_stdout)]
    {
        println!();
        println!("{}", dns_instructions(&config.domain, &config.server_ip));
    }
}

fn print_summary(config: &SiteSetupConfig, paths: &HostPaths) {
    let layout = paths.layout();
    let domain = &config.domain;

    #[allow(clippy::print_stdout)]
    {
        println!();
        println!("Setup complete!");
        println!();
        println!("  https://{domain}  -> {}", layout.root_dir().display());
        println!("  https://www.{domain}");
        for name in &config.subdomains {
            println!(
                "  https://{name}.{domain}  -> {}",
                layout.subdomain_dir(name).display()
            );
        }
        println!();
        println!("Add more subdomains with:");
        println!("  wildsite-setup add-subdomain <name> --domain {domain}");
        println!();
        println!(
            "Renewal reminder: {} (the certificate must be renewed by hand)",
            paths.renewal_note().display()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SetupError;

    #[test]
    fn dns_instructions_list_apex_and_wildcard() {
        let text = dns_instructions("example.com", "203.0.113.7");
        let records: Vec<&str> = text
            .lines()
            .filter(|l| l.trim_end().ends_with("203.0.113.7"))
            .map(str::trim)
            .collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].starts_with("example.com "));
        assert!(records[1].starts_with("*.example.com "));
        assert!(text.contains("_acme-challenge.example.com"));
    }

    #[test]
    fn packages_cover_web_and_certificate_tools() {
        assert!(PACKAGES.contains(&"nginx"));
        assert!(PACKAGES.contains(&"certbot"));
    }

    #[test]
    fn non_interactive_config_from_flags() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext {
            non_interactive: true,
            command_from_menu: false,
            paths: HostPaths::rooted_at(dir.path()),
            defaults: crate::config::SetupDefaults::default(),
        };
        let args = SetupArgs {
            domain: Some("Example.COM".into()),
            server_ip: Some(" 203.0.113.7 ".into()),
            email: None,
            subdomains: Some(vec!["Blog".into(), "api".into(), "blog".into()]),
        };

        let config = collect_config(args, &ctx).unwrap();
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.server_ip, "203.0.113.7");
        assert_eq!(config.subdomains, vec!["blog", "api"]);
        assert!(config.email.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_interactive_config_from_defaults_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext {
            non_interactive: true,
            command_from_menu: false,
            paths: HostPaths::rooted_at(dir.path()),
            defaults: crate::config::SetupDefaults {
                domain: Some("example.org".into()),
                server_ip: Some("198.51.100.2".into()),
                email: Some("ops@example.org".into()),
                subdomains: vec!["docs".into()],
            },
        };

        let config = collect_config(SetupArgs::default(), &ctx).unwrap();
        assert_eq!(config.domain, "example.org");
        assert_eq!(config.server_ip, "198.51.100.2");
        assert_eq!(config.email.as_deref(), Some("ops@example.org"));
        assert_eq!(config.subdomains, vec!["docs"]);
    }

    fn empty_host_ctx(root: &std::path::Path) -> RunContext {
        RunContext {
            non_interactive: true,
            command_from_menu: false,
            paths: HostPaths::rooted_at(root),
            defaults: crate::config::SetupDefaults::default(),
        }
    }

    #[test]
    fn prepare_rejects_missing_domain_before_touching_host() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = empty_host_ctx(dir.path());
        let args = SetupArgs {
            server_ip: Some("203.0.113.7".into()),
            ..SetupArgs::default()
        };

        let err = prepare(args, &ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::MissingDomain)
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn prepare_rejects_missing_ip_before_touching_host() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = empty_host_ctx(dir.path());
        let args = SetupArgs {
            domain: Some("example.com".into()),
            server_ip: Some(String::new()),
            ..SetupArgs::default()
        };

        let err = prepare(args, &ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::MissingServerIp(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn prepare_forwards_only_answers_missing_from_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = empty_host_ctx(dir.path());
        ctx.defaults = crate::config::SetupDefaults {
            domain: None,
            server_ip: Some("198.51.100.2".into()),
            email: Some("ops@example.org".into()),
            subdomains: vec!["docs".into(), "api".into()],
        };
        let args = SetupArgs {
            domain: Some("example.org".into()),
            ..SetupArgs::default()
        };

        let prepared = prepare(args, &ctx).unwrap();
        assert_eq!(prepared.config.domain, "example.org");
        assert_eq!(
            prepared.answers,
            vec![
                "--server-ip",
                "198.51.100.2",
                "--email",
                "ops@example.org",
                "--subdomains=docs,api"
            ]
        );
    }
}
