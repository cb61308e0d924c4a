use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result, bail};

/// Parse `/etc/os-release` content into key-value pairs.
fn parse_os_release(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim_matches('"');
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

/// Whether the release is Debian, Ubuntu, or a derivative of either.
fn is_apt_based(release: &HashMap<String, String>) -> bool {
    let id = release.get("ID").map_or("", String::as_str);
    let like = release.get("ID_LIKE").map_or("", String::as_str);
    std::iter::once(id)
        .chain(like.split_whitespace())
        .any(|name| name == "debian" || name == "ubuntu")
}

/// Ensure the host uses apt and the Debian nginx layout. Bails with a clear message otherwise.
pub fn ensure_apt_based() -> Result<()> {
    let content =
        fs::read_to_string("/etc/os-release").context("failed to read /etc/os-release")?;
    let release = parse_os_release(&content);
    let id = release.get("ID").map_or("unknown", String::as_str);
    if !is_apt_based(&release) {
        bail!(
            "wildsite-setup supports Debian and Ubuntu hosts only (detected OS: {id}); \
             it relies on apt-get, ufw and nginx's sites-available layout"
        );
    }
    let version = release.get("VERSION_ID").map_or("unknown", String::as_str);
    tracing::info!("detected {id} ({version})");
    Ok(())
}
