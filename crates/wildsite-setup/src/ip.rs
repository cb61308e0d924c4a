use std::net::IpAddr;

use crate::cmd::{command_exists, run_cmd_output};

/// Echo services queried in order; each returns the caller's address as plain text.
const ECHO_SERVICES: &[&str] = &["https://api.ipify.org", "https://ifconfig.me"];

/// Best-effort public IP detection. Returns `None` when `curl` is missing or
/// no service answered with a parseable address.
pub fn detect_public_ip() -> Option<String> {
    if !command_exists("curl") {
        tracing::info!("curl not found — skipping public IP detection");
        return None;
    }

    for url in ECHO_SERVICES {
        match run_cmd_output("curl", &["-fsS", "--max-time", "10", url]) {
            Ok(body) => {
                if let Some(ip) = parse_echo_response(&body) {
                    tracing::info!("detected public IP {ip} via {url}");
                    return Some(ip);
                }
                tracing::debug!("unexpected response from {url}: {body:?}");
            }
            Err(e) => tracing::debug!("{url} unavailable: {e:#}"),
        }
    }
    tracing::warn!("could not detect the public IP; enter it manually");
    None
}

/// Accept a response only if it is exactly one IP address.
fn parse_echo_response(body: &str) -> Option<String> {
    body.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_addresses() {
        assert_eq!(
            parse_echo_response("203.0.113.7\n").as_deref(),
            Some("203.0.113.7")
        );
        assert_eq!(
            parse_echo_response("2001:db8::1").as_deref(),
            Some("2001:db8::1")
        );
    }

    #[test]
    fn rejects_html_and_empty_bodies() {
        assert!(parse_echo_response("").is_none());
        assert!(parse_echo_response("<html>rate limited</html>").is_none());
    }
}
