use anyhow::Result;

use crate::cmd::{run_cmd, run_cmd_best_effort};

/// ufw application profile installed by the nginx package (ports 80 and 443).
const NGINX_PROFILE: &str = "Nginx Full";

/// Open SSH and HTTP/HTTPS, then enable the firewall.
/// SSH must be allowed before ufw is enabled.
pub fn allow_web() -> Result<()> {
    run_cmd("allowing SSH through ufw", "ufw", &["allow", "OpenSSH"])?;
    run_cmd(
        "allowing HTTP and HTTPS through ufw",
        "ufw",
        &["allow", NGINX_PROFILE],
    )?;
    run_cmd("enabling ufw", "ufw", &["--force", "enable"])
}

/// Drop the web rule added by setup. SSH stays open.
pub fn remove_web_rules() {
    run_cmd_best_effort(
        "removing HTTP and HTTPS ufw rule",
        "ufw",
        &["delete", "allow", NGINX_PROFILE],
    );
}
