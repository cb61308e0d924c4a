/// TLS settings included by every HTTPS server block.
pub const fn ssl_options() -> &'static str {
    r#"# Managed by wildsite-setup.
ssl_session_cache shared:le_nginx_SSL:10m;
ssl_session_timeout 1440m;
ssl_session_tickets off;

ssl_protocols TLSv1.2 TLSv1.3;
ssl_prefer_server_ciphers off;

ssl_ciphers "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:DHE-RSA-AES128-GCM-SHA256:DHE-RSA-AES256-GCM-SHA384";
"#
}

/// Arguments for a manual DNS-challenge wildcard request.
pub fn certonly_args(domain: &str, email: Option<&str>, force_renewal: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "certonly",
        "--manual",
        "--preferred-challenges",
        "dns",
        "--agree-tos",
        "--cert-name",
        domain,
        "-d",
        domain,
        "-d",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    args.push(format!("*.{domain}"));

    match email {
        Some(email) => {
            args.push("-m".into());
            args.push(email.into());
        }
        None => args.push("--register-unsafely-without-email".into()),
    }
    if force_renewal {
        args.push("--force-renewal".into());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_apex_and_wildcard() {
        let args = certonly_args("example.com", None, false);
        let line = args.join(" ");
        assert!(line.starts_with("certonly --manual --preferred-challenges dns"));
        assert!(line.contains("-d example.com -d *.example.com"));
        assert!(line.contains("--cert-name example.com"));
        assert!(line.ends_with("--register-unsafely-without-email"));
    }

    #[test]
    fn email_and_force_renewal() {
        let args = certonly_args("example.com", Some("ops@example.com"), true);
        let line = args.join(" ");
        assert!(line.contains("-m ops@example.com"));
        assert!(!line.contains("--register-unsafely-without-email"));
        assert!(line.ends_with("--force-renewal"));
    }

    #[test]
    fn ssl_options_restrict_protocols() {
        assert!(ssl_options().contains("ssl_protocols TLSv1.2 TLSv1.3;"));
    }
}
