//! Content directory tree served by nginx.
//!
//! ```text
//! $HOME/SERVER/
//! ├── root/index.html                 example.com, www.example.com
//! └── subdomains/<name>/index.html    <name>.example.com
//! ```

use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Top-level directory created under the operator's home.
pub const SERVER_DIR: &str = "SERVER";

/// Paths of the content tree for one host.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    base: PathBuf,
}

impl SiteLayout {
    pub fn new(home: &Path) -> Self {
        Self {
            base: home.join(SERVER_DIR),
        }
    }

    /// `$HOME/SERVER`
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Document root for the apex domain and `www`.
    pub fn root_dir(&self) -> PathBuf {
        self.base.join("root")
    }

    /// Parent of all subdomain document roots.
    pub fn subdomains_dir(&self) -> PathBuf {
        self.base.join("subdomains")
    }

    pub fn subdomain_dir(&self, name: &str) -> PathBuf {
        self.subdomains_dir().join(name)
    }

    /// Create the tree with a placeholder page per site.
    /// Existing `index.html` files are left untouched.
    pub fn create(&self, domain: &str, subdomains: &[String]) -> Result<()> {
        create_site_dir(&self.base)?;
        create_site_dir(&self.subdomains_dir())?;
        write_placeholder(&self.root_dir(), domain)?;
        for name in subdomains {
            write_placeholder(&self.subdomain_dir(name), &format!("{name}.{domain}"))?;
        }
        Ok(())
    }

    /// Create a single subdomain directory. Returns `false` if it already existed.
    pub fn add_subdomain(&self, domain: &str, name: &str) -> Result<bool> {
        let dir = self.subdomain_dir(name);
        if dir.exists() {
            return Ok(false);
        }
        create_site_dir(&self.subdomains_dir())?;
        write_placeholder(&dir, &format!("{name}.{domain}"))?;
        Ok(true)
    }

    /// Names of the subdomain directories currently on disk, sorted.
    pub fn list_subdomains(&self) -> Result<Vec<String>> {
        let dir = self.subdomains_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", dir.display()));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove the whole tree. A missing tree is not an error.
    pub fn remove(&self) -> Result<()> {
        crate::fsutil::remove_path(&self.base)
    }
}

/// Grant others search permission on `home` so nginx workers can reach the
/// tree. Returns `true` if the mode was changed.
pub fn ensure_traversable(home: &Path) -> Result<bool> {
    let mode = fs::metadata(home)
        .with_context(|| format!("failed to stat {}", home.display()))?
        .permissions()
        .mode();
    if mode & 0o001 != 0 {
        return Ok(false);
    }
    tracing::warn!(
        "{} is not searchable by nginx; adding o+x (mode {:o} -> {:o})",
        home.display(),
        mode & 0o7777,
        (mode | 0o001) & 0o7777
    );
    fs::set_permissions(home, fs::Permissions::from_mode(mode | 0o001))
        .with_context(|| format!("failed to set permissions on {}", home.display()))?;
    Ok(true)
}

fn create_site_dir(dir: &Path) -> Result<()> {
    tracing::info!("creating directory: {}", dir.display());
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    // nginx workers must be able to traverse and read the tree.
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to set permissions on {}", dir.display()))?;
    Ok(())
}

fn write_placeholder(dir: &Path, host: &str) -> Result<()> {
    create_site_dir(dir)?;
    let index = dir.join("index.html");
    if index.exists() {
        tracing::info!("keeping existing {}", index.display());
        return Ok(());
    }

    tracing::info!("writing {}", index.display());
    fs::write(&index, placeholder_page(host))
        .with_context(|| format!("failed to write {}", index.display()))?;
    fs::set_permissions(&index, fs::Permissions::from_mode(0o644))
        .with_context(|| format!("failed to set permissions on {}", index.display()))?;
    Ok(())
}

/// Placeholder page served until the operator uploads real content.
pub fn placeholder_page(host: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{host}</title>
</head>
<body>
    <h1>{host}</h1>
    <p>This site is served over HTTPS with a wildcard certificate.</p>
</body>
</html>
"#
    )
}
