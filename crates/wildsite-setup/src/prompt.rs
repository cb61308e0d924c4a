use anyhow::{Result, bail};
use dialoguer::{Confirm, Input};

use crate::config::{normalize_domain, parse_subdomains};

/// Top-level action picked from the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Setup,
    Uninstall,
}

/// Parse the menu answer. Only `1` and `2` are accepted.
pub fn parse_menu_choice(input: &str) -> Result<MenuChoice> {
    match input.trim() {
        "1" => Ok(MenuChoice::Setup),
        "2" => Ok(MenuChoice::Uninstall),
        other => bail!("invalid choice {other:?} (expected 1 or 2)"),
    }
}

/// Show the action menu.
pub fn prompt_menu() -> Result<MenuChoice> {
    #[allow(clippy::print_stdout)]
    {
        println!();
        println!("  1) Setup     install nginx + certbot and provision a wildcard site");
        println!("  2) Uninstall remove everything setup created");
        println!();
    }
    let answer: String = Input::new()
        .with_prompt("Choose an action [1/2]")
        .allow_empty(true)
        .interact_text()?;
    parse_menu_choice(&answer)
}

/// Free-text input with an optional default. Empty answers are allowed so the
/// caller's validation reports them.
fn input_with_default(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(d) = default {
        input = input.default(d.to_string());
    }
    Ok(input.interact_text()?)
}

/// Prompt for the apex domain.
pub fn prompt_domain(non_interactive: bool, default: Option<&str>) -> Result<String> {
    let raw = if non_interactive {
        default.unwrap_or_default().to_string()
    } else {
        input_with_default("Apex domain (e.g. example.com)", default)?
    };
    Ok(normalize_domain(&raw))
}

/// Prompt for the server's public IP, offering the detected address.
pub fn prompt_server_ip(non_interactive: bool, default: Option<&str>) -> Result<String> {
    if non_interactive {
        return Ok(default.unwrap_or_default().to_string());
    }
    let ip = input_with_default("Public IP of this server", default)?;
    Ok(ip.trim().to_string())
}

/// Prompt for the subdomains to create, comma or space separated.
pub fn prompt_subdomains(non_interactive: bool, default: &[String]) -> Result<Vec<String>> {
    if non_interactive {
        return Ok(default.to_vec());
    }
    let joined = default.join(", ");
    let default = (!joined.is_empty()).then_some(joined.as_str());
    let raw = input_with_default("Subdomains to create (comma separated, empty for none)", default)?;
    Ok(parse_subdomains(&raw))
}

/// Prompt for the ACME account email. Empty means register without email.
pub fn prompt_email(non_interactive: bool, default: Option<&str>) -> Result<Option<String>> {
    let raw = if non_interactive {
        default.unwrap_or_default().to_string()
    } else {
        input_with_default("Email for Let's Encrypt notices (empty to skip)", default)?
    };
    let email = raw.trim();
    Ok((!email.is_empty()).then(|| email.to_string()))
}

/// Block until the operator confirms the DNS records are published.
pub fn wait_for_dns(non_interactive: bool) -> Result<()> {
    if non_interactive {
        tracing::info!("non-interactive mode — assuming DNS records are already published");
        return Ok(());
    }
    let ready = Confirm::new()
        .with_prompt("Are the A records in place and propagated? Continue to certificate request")
        .default(true)
        .interact()?;
    if !ready {
        bail!("aborted before certificate request; re-run setup once DNS is ready");
    }
    Ok(())
}

/// Ask before removing packages and files.
pub fn confirm_uninstall(non_interactive: bool, domain: &str) -> Result<bool> {
    if non_interactive {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(format!(
            "Remove nginx, certbot, the certificate store and all content for {domain}?"
        ))
        .default(false)
        .interact()?)
}
