use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use nix::unistd::User;
use regex::Regex;
use serde::Deserialize;

use crate::error::SetupError;
use crate::layout::SiteLayout;

/// Defaults file looked up under the operator's home when `--config` is not given.
pub const DEFAULTS_FILE: &str = ".config/wildsite/setup.toml";

/// Name of the renewal reminder written to the operator's home.
pub const RENEWAL_NOTE_FILE: &str = "ssl-renewal-info.txt";

/// One DNS label: alphanumerics and inner hyphens, at most 63 characters.
#[allow(clippy::expect_used)]
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("static regex is valid")
});

/// Configuration collected for a site setup.
#[derive(Debug, Clone)]
pub struct SiteSetupConfig {
    pub domain: String,
    /// Shown in the DNS instructions only; never checked against the host.
    pub server_ip: String,
    pub email: Option<String>,
    pub subdomains: Vec<String>,
}

impl SiteSetupConfig {
    /// Validate the configuration. Returns an error on missing or malformed input.
    pub fn validate(&self) -> Result<(), SetupError> {
        validate_domain(&self.domain)?;
        if self.server_ip.trim().parse::<IpAddr>().is_err() {
            return Err(SetupError::MissingServerIp(self.server_ip.clone()));
        }
        for name in &self.subdomains {
            validate_subdomain(name)?;
        }
        Ok(())
    }
}

/// Check that `domain` is an apex DNS name such as `example.com`.
pub fn validate_domain(domain: &str) -> Result<(), SetupError> {
    let invalid = |reason| SetupError::InvalidDomain {
        domain: domain.to_string(),
        reason,
    };

    if domain.is_empty() {
        return Err(SetupError::MissingDomain);
    }
    if domain.len() > 253 {
        return Err(invalid("longer than 253 characters"));
    }
    if domain.starts_with("*.") {
        return Err(invalid("enter the apex domain; the wildcard is added automatically"));
    }
    if domain.starts_with("www.") {
        return Err(invalid("enter the apex domain; www is served automatically"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid("expected at least two labels (e.g. example.com)"));
    }
    if labels.iter().any(|label| !LABEL_RE.is_match(label)) {
        return Err(invalid("labels must be 1-63 chars of a-z, 0-9 and inner hyphens"));
    }
    Ok(())
}

/// Check that `name` is a single DNS label usable as a subdomain directory.
pub fn validate_subdomain(name: &str) -> Result<(), SetupError> {
    let invalid = |reason| SetupError::InvalidSubdomain {
        name: name.to_string(),
        reason,
    };

    if name == "www" {
        return Err(invalid("www is served from the root directory"));
    }
    if !LABEL_RE.is_match(name) {
        return Err(invalid("must be one label of a-z, 0-9 and inner hyphens"));
    }
    Ok(())
}

/// Normalize operator-entered domain text.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Split a comma/whitespace separated subdomain list, dropping empties and duplicates.
pub fn parse_subdomains(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let name = name.trim().to_ascii_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Values read from the optional TOML defaults file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupDefaults {
    pub domain: Option<String>,
    pub server_ip: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub subdomains: Vec<String>,
}

impl SetupDefaults {
    /// Load defaults from an explicit file. A missing explicit file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let defaults: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::debug!("loaded defaults from {}", path.display());
        Ok(defaults)
    }

    /// Load `--config` if given, otherwise `~/.config/wildsite/setup.toml` when present.
    pub fn resolve(explicit: Option<&Path>, home: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = home.join(DEFAULTS_FILE);
        if fallback.exists() {
            return Self::load(&fallback);
        }
        Ok(Self::default())
    }
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub non_interactive: bool,
    /// The command was picked from the interactive menu rather than argv.
    pub command_from_menu: bool,
    pub paths: HostPaths,
    pub defaults: SetupDefaults,
}

/// Filesystem locations touched on the host.
#[derive(Debug, Clone)]
pub struct HostPaths {
    /// Operator home; holds the content tree and the renewal note.
    pub home: PathBuf,
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
    /// certbot configuration directory (certificate store).
    pub letsencrypt: PathBuf,
}

impl HostPaths {
    /// Standard Debian/Ubuntu locations for the given operator home.
    pub fn system(home: PathBuf) -> Self {
        Self {
            home,
            sites_available: PathBuf::from("/etc/nginx/sites-available"),
            sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            letsencrypt: PathBuf::from("/etc/letsencrypt"),
        }
    }

    /// Standard locations for the operator's home directory.
    pub fn detect() -> Result<Self> {
        Ok(Self::system(operator_home()?))
    }

    /// Every location re-rooted under `root`, mirroring the system layout.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            home: root.join("home"),
            sites_available: root.join("etc/nginx/sites-available"),
            sites_enabled: root.join("etc/nginx/sites-enabled"),
            letsencrypt: root.join("etc/letsencrypt"),
        }
    }

    pub fn layout(&self) -> SiteLayout {
        SiteLayout::new(&self.home)
    }

    pub fn site_config(&self, domain: &str) -> PathBuf {
        self.sites_available.join(domain)
    }

    pub fn site_link(&self, domain: &str) -> PathBuf {
        self.sites_enabled.join(domain)
    }

    /// The stock site shipped by the nginx package.
    pub fn default_site_link(&self) -> PathBuf {
        self.sites_enabled.join("default")
    }

    pub fn live_dir(&self, domain: &str) -> PathBuf {
        self.letsencrypt.join("live").join(domain)
    }

    pub fn fullchain(&self, domain: &str) -> PathBuf {
        self.live_dir(domain).join("fullchain.pem")
    }

    pub fn privkey(&self, domain: &str) -> PathBuf {
        self.live_dir(domain).join("privkey.pem")
    }

    pub fn cert(&self, domain: &str) -> PathBuf {
        self.live_dir(domain).join("cert.pem")
    }

    pub fn ssl_options(&self) -> PathBuf {
        self.letsencrypt.join("options-ssl-nginx.conf")
    }

    pub fn dhparams(&self) -> PathBuf {
        self.letsencrypt.join("ssl-dhparams.pem")
    }

    pub fn renewal_note(&self) -> PathBuf {
        self.home.join(RENEWAL_NOTE_FILE)
    }
}

/// Home of the operator who invoked the tool.
///
/// `sudo` sets `HOME` to root's home on Debian/Ubuntu, so when running as root
/// on behalf of `SUDO_USER` that user's passwd entry wins over `$HOME`.
pub fn operator_home() -> Result<PathBuf> {
    let sudo_user = std::env::var("SUDO_USER").ok();
    resolve_operator_home(
        crate::escalate::is_root(),
        sudo_user.as_deref(),
        passwd_home,
        dirs::home_dir(),
    )
}

fn passwd_home(name: &str) -> Result<Option<PathBuf>> {
    let user = User::from_name(name).with_context(|| format!("failed to look up user {name}"))?;
    Ok(user.map(|u| u.dir))
}

pub(crate) fn resolve_operator_home(
    is_root: bool,
    sudo_user: Option<&str>,
    lookup: impl Fn(&str) -> Result<Option<PathBuf>>,
    home_env: Option<PathBuf>,
) -> Result<PathBuf> {
    let invoker = sudo_user.filter(|n| is_root && !n.is_empty() && *n != "root");
    if let Some(name) = invoker {
        let home =
            lookup(name)?.ok_or_else(|| anyhow!("sudo user {name} has no passwd entry"))?;
        tracing::debug!("running for sudo user {name}, home {}", home.display());
        return Ok(home);
    }
    home_env.ok_or_else(|| anyhow!("cannot determine home directory"))
}
