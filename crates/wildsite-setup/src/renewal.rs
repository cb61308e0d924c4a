//! Plain-text renewal reminder left in the operator's home.
//!
//! Manual DNS-challenge certificates cannot be renewed unattended, so the
//! note records when the certificate expires and exactly how to renew it.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::config::HostPaths;
use crate::fsutil::write_file;

/// Let's Encrypt certificate lifetime, used when the real expiry is unreadable.
pub const CERT_LIFETIME_DAYS: i64 = 90;

/// How long before expiry the note tells the operator to renew.
pub const RENEW_AHEAD_DAYS: i64 = 30;

/// Contents of `ssl-renewal-info.txt`.
#[derive(Debug, Clone)]
pub struct RenewalNote {
    pub domain: String,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl RenewalNote {
    /// Build a note; without a known expiry, assume a full Let's Encrypt lifetime.
    pub fn new(domain: &str, issued: DateTime<Utc>, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            domain: domain.to_string(),
            issued,
            expires: expires.unwrap_or_else(|| issued + Duration::days(CERT_LIFETIME_DAYS)),
        }
    }

    pub fn renew_by(&self) -> DateTime<Utc> {
        self.expires - Duration::days(RENEW_AHEAD_DAYS)
    }

    pub fn render(&self, paths: &HostPaths) -> String {
        let domain = &self.domain;
        let date = |d: DateTime<Utc>| d.format("%Y-%m-%d").to_string();
        format!(
            r"SSL certificate renewal reminder
================================

Domain:        {domain} (and *.{domain})
Issued:        {issued}
Expires:       {expires}
Renew before:  {renew_by}

This wildcard certificate was validated with a manual DNS challenge.
`certbot renew` cannot renew it unattended; renew it by hand before it expires.

To renew, run:

    sudo wildsite-setup renew --domain {domain}

or directly:

    sudo certbot certonly --manual --preferred-challenges dns --cert-name {domain} -d {domain} -d '*.{domain}' --force-renewal
    sudo nginx -t && sudo systemctl reload nginx

certbot will ask you to publish a new _acme-challenge.{domain} TXT record.

Certificate files: {live}
",
            issued = date(self.issued),
            expires = date(self.expires),
            renew_by = date(self.renew_by()),
            live = paths.live_dir(domain).display(),
        )
    }

    pub fn write(&self, paths: &HostPaths) -> Result<()> {
        write_note(&paths.renewal_note(), &self.render(paths))
    }
}

fn write_note(path: &Path, content: &str) -> Result<()> {
    write_file(path, content)?;
    tracing::info!("renewal reminder saved to {}", path.display());
    Ok(())
}

/// Parse `openssl x509 -enddate -noout` output, e.g.
/// `notAfter=Jan  9 08:15:02 2027 GMT`.
pub fn parse_not_after(output: &str) -> Option<DateTime<Utc>> {
    let value = output
        .lines()
        .find_map(|l| l.trim().strip_prefix("notAfter="))?;
    let mut parts: Vec<&str> = value.split_whitespace().collect();
    if parts.last() != Some(&"GMT") {
        return None;
    }
    parts.pop();
    let normalized = parts.join(" ");
    NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_openssl_enddate() {
        let expires = parse_not_after("notAfter=Jan  9 08:15:02 2027 GMT\n").unwrap();
        assert_eq!(
            expires,
            Utc.with_ymd_and_hms(2027, 1, 9, 8, 15, 2).unwrap()
        );
        let expires = parse_not_after("notAfter=Dec 25 23:59:59 2026 GMT").unwrap();
        assert_eq!(expires.format("%Y-%m-%d").to_string(), "2026-12-25");
    }

    #[test]
    fn rejects_unexpected_output() {
        assert!(parse_not_after("").is_none());
        assert!(parse_not_after("unable to load certificate").is_none());
        assert!(parse_not_after("notAfter=Jan  9 08:15:02 2027 PST").is_none());
    }

    #[test]
    fn missing_expiry_defaults_to_ninety_days() {
        let note = RenewalNote::new("example.com", issued(), None);
        assert_eq!(note.expires.format("%Y-%m-%d").to_string(), "2027-01-16");
        assert_eq!(note.renew_by().format("%Y-%m-%d").to_string(), "2026-12-17");
    }

    #[test]
    fn note_lists_dates_and_commands() {
        let paths = HostPaths::system("/home/ops".into());
        let expires = Utc.with_ymd_and_hms(2027, 1, 9, 8, 15, 2).unwrap();
        let text = RenewalNote::new("example.com", issued(), Some(expires)).render(&paths);

        assert!(text.contains("Issued:        2026-10-18"));
        assert!(text.contains("Expires:       2027-01-09"));
        assert!(text.contains("Renew before:  2026-12-10"));
        assert!(text.contains("sudo wildsite-setup renew --domain example.com"));
        assert!(text.contains("-d example.com -d '*.example.com' --force-renewal"));
        assert!(text.contains("/etc/letsencrypt/live/example.com"));
    }

    #[test]
    fn write_puts_note_in_home() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::rooted_at(dir.path());
        RenewalNote::new("example.com", issued(), None)
            .write(&paths)
            .unwrap();
        let text = std::fs::read_to_string(paths.renewal_note()).unwrap();
        assert!(text.starts_with("SSL certificate renewal reminder"));
    }
}
