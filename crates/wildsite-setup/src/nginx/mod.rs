pub(crate) mod templates;

use anyhow::Result;

use crate::cmd::run_cmd;
use crate::config::HostPaths;
use crate::fsutil::{remove_path, replace_symlink, write_file};

/// Write and enable the HTTP-only site, replacing the stock default site.
pub fn install_temporary_site(paths: &HostPaths, domain: &str) -> Result<()> {
    let content = templates::temporary_site(domain, &paths.layout().root_dir());
    write_file(&paths.site_config(domain), &content)?;
    enable_site(paths, domain)?;
    remove_path(&paths.default_site_link())
}

/// Write and enable the final HTTPS site.
pub fn install_final_site(paths: &HostPaths, domain: &str) -> Result<()> {
    let content = templates::final_site(domain, paths);
    write_file(&paths.site_config(domain), &content)?;
    enable_site(paths, domain)
}

fn enable_site(paths: &HostPaths, domain: &str) -> Result<()> {
    replace_symlink(&paths.site_config(domain), &paths.site_link(domain))
}

/// Remove the site symlink and its configuration file.
pub fn remove_site(paths: &HostPaths, domain: &str) -> Result<()> {
    remove_path(&paths.site_link(domain))?;
    remove_path(&paths.site_config(domain))
}

/// Validate the configuration and reload the running server.
pub fn test_and_reload() -> Result<()> {
    run_cmd("validating nginx configuration", "nginx", &["-t"])?;
    run_cmd("reloading nginx", "systemctl", &["reload-or-restart", "nginx"])
}

/// Make sure nginx starts on boot and is running now.
pub fn enable_service() -> Result<()> {
    run_cmd(
        "enabling and starting nginx",
        "systemctl",
        &["enable", "--now", "nginx"],
    )
}
