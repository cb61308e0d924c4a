//! Typed failures for operator input and certificate issuance.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a run before (or instead of) touching the host.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No domain was entered or configured.
    #[error("domain is required")]
    MissingDomain,

    /// No usable server IP was entered, detected, or configured.
    #[error("server IP is required (got {0:?})")]
    MissingServerIp(String),

    /// The domain is not a valid apex DNS name.
    #[error("invalid domain {domain:?}: {reason}")]
    InvalidDomain { domain: String, reason: &'static str },

    /// A subdomain is not a single valid DNS label.
    #[error("invalid subdomain {name:?}: {reason}")]
    InvalidSubdomain { name: String, reason: &'static str },

    /// certbot finished but the expected certificate file is absent.
    #[error("certificate not found at {} — was the DNS TXT record published?", .0.display())]
    CertificateMissing(PathBuf),
}
