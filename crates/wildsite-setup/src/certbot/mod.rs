//! Wildcard certificate issuance through certbot's manual DNS challenge.

pub(crate) mod templates;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::cmd::{run_cmd, run_cmd_interactive, run_cmd_output};
use crate::config::HostPaths;
use crate::error::SetupError;
use crate::fsutil::write_file;
use crate::renewal::parse_not_after;

/// Size of the generated Diffie-Hellman parameters.
const DHPARAM_BITS: &str = "2048";

/// Run certbot attached to the terminal. certbot prints the TXT record to
/// publish and waits for the operator before validating.
pub fn request_wildcard_certificate(
    domain: &str,
    email: Option<&str>,
    force_renewal: bool,
) -> Result<()> {
    let args = templates::certonly_args(domain, email, force_renewal);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_cmd_interactive(
        &format!("requesting wildcard certificate for {domain} and *.{domain}"),
        "certbot",
        &args,
    )
}

/// Fail unless certbot left `fullchain.pem` where the nginx config expects it.
pub fn verify_certificate(paths: &HostPaths, domain: &str) -> Result<(), SetupError> {
    let fullchain = paths.fullchain(domain);
    if !fullchain.is_file() {
        return Err(SetupError::CertificateMissing(fullchain));
    }
    tracing::info!("certificate present: {}", fullchain.display());
    Ok(())
}

/// Write the shared TLS options file unless one already exists.
pub fn write_ssl_options(paths: &HostPaths) -> Result<()> {
    let path = paths.ssl_options();
    if path.exists() {
        tracing::info!("keeping existing {}", path.display());
        return Ok(());
    }
    write_file(&path, templates::ssl_options())
}

/// Generate Diffie-Hellman parameters unless they already exist.
pub fn ensure_dhparams(paths: &HostPaths) -> Result<()> {
    let path = paths.dhparams();
    if path.exists() {
        tracing::info!("keeping existing {}", path.display());
        return Ok(());
    }
    let out = path.to_string_lossy();
    run_cmd(
        "generating Diffie-Hellman parameters (this can take a minute)",
        "openssl",
        &["dhparam", "-out", &out, DHPARAM_BITS],
    )
}

/// Read the certificate's `notAfter` date with openssl.
pub fn certificate_expiry(paths: &HostPaths, domain: &str) -> Option<DateTime<Utc>> {
    let cert = paths.cert(domain);
    let cert = cert.to_string_lossy();
    let output = run_cmd_output("openssl", &["x509", "-enddate", "-noout", "-in", &cert])
        .with_context(|| format!("failed to read expiry of {cert}"));
    match output {
        Ok(text) => parse_not_after(&text),
        Err(e) => {
            tracing::warn!("{e:#}");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_certificate_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::rooted_at(dir.path());

        let err = verify_certificate(&paths, "example.com").unwrap_err();
        match err {
            SetupError::CertificateMissing(path) => {
                assert_eq!(path, paths.fullchain("example.com"));
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[test]
    fn present_certificate_passes() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::rooted_at(dir.path());
        fs::create_dir_all(paths.live_dir("example.com")).unwrap();
        fs::write(paths.fullchain("example.com"), "pem").unwrap();

        assert!(verify_certificate(&paths, "example.com").is_ok());
    }

    #[test]
    fn ssl_options_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::rooted_at(dir.path());
        fs::create_dir_all(&paths.letsencrypt).unwrap();
        fs::write(paths.ssl_options(), "custom").unwrap();

        write_ssl_options(&paths).unwrap();

        assert_eq!(fs::read_to_string(paths.ssl_options()).unwrap(), "custom");
    }

    #[test]
    fn existing_dhparams_skip_openssl() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::rooted_at(dir.path());
        fs::create_dir_all(&paths.letsencrypt).unwrap();
        fs::write(paths.dhparams(), "params").unwrap();

        ensure_dhparams(&paths).unwrap();
        assert_eq!(fs::read_to_string(paths.dhparams()).unwrap(), "params");
    }

    #[test]
    fn expiry_of_missing_cert_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::rooted_at(dir.path());
        assert!(certificate_expiry(&paths, "example.com").is_none());
    }
}
