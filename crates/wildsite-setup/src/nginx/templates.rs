use std::path::Path;

use crate::config::HostPaths;

/// nginx `server_name` regex capturing the first label of any subdomain.
pub fn subdomain_pattern(domain: &str) -> String {
    format!(r"~^(?<subdomain>[^.]+)\.{}$", domain.replace('.', r"\."))
}

/// Plain-HTTP site used until the certificate exists.
pub fn temporary_site(domain: &str, root: &Path) -> String {
    format!(
        r"# Managed by wildsite-setup: temporary HTTP-only site for {domain}.
server {{
    listen 80;
    listen [::]:80;
    server_name {domain} *.{domain};

    root {root};
    index index.html;

    location / {{
        try_files $uri $uri/ =404;
    }}
}}
",
        root = root.display(),
    )
}

/// TLS directives shared by both HTTPS server blocks.
fn tls_directives(domain: &str, paths: &HostPaths) -> String {
    format!(
        r"    ssl_certificate {fullchain};
    ssl_certificate_key {privkey};
    include {options};
    ssl_dhparam {dhparams};
",
        fullchain = paths.fullchain(domain).display(),
        privkey = paths.privkey(domain).display(),
        options = paths.ssl_options().display(),
        dhparams = paths.dhparams().display(),
    )
}

/// Final site: HTTP redirect, apex + www over HTTPS, and regex-routed subdomains.
pub fn final_site(domain: &str, paths: &HostPaths) -> String {
    let pattern = subdomain_pattern(domain);
    let tls = tls_directives(domain, paths);
    let layout = paths.layout();
    let root = layout.root_dir();
    let subdomains = layout.subdomains_dir();

    format!(
        r"# Managed by wildsite-setup for {domain}.
server {{
    listen 80;
    listen [::]:80;
    server_name {domain} www.{domain} {pattern};

    return 301 https://$host$request_uri;
}}

server {{
    listen 443 ssl http2;
    listen [::]:443 ssl http2;
    server_name {domain} www.{domain};

{tls}
    root {root};
    index index.html;

    location / {{
        try_files $uri $uri/ =404;
    }}
}}

server {{
    listen 443 ssl http2;
    listen [::]:443 ssl http2;
    server_name {pattern};

{tls}
    root {subdomains}/$subdomain;
    index index.html;

    location / {{
        try_files $uri $uri/ =404;
    }}
}}
",
        root = root.display(),
        subdomains = subdomains.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_names(config: &str) -> Vec<&str> {
        config
            .lines()
            .filter_map(|l| l.trim().strip_prefix("server_name "))
            .map(|l| l.trim_end_matches(';'))
            .collect()
    }

    #[test]
    fn pattern_escapes_dots() {
        assert_eq!(
            subdomain_pattern("example.co.uk"),
            r"~^(?<subdomain>[^.]+)\.example\.co\.uk$"
        );
    }

    #[test]
    fn temporary_site_names_apex_and_wildcard() {
        let site = temporary_site("example.com", Path::new("/home/ops/SERVER/root"));
        assert_eq!(server_names(&site), vec!["example.com *.example.com"]);
        assert!(site.contains("root /home/ops/SERVER/root;"));
        assert!(!site.contains("443"));
    }

    #[test]
    fn final_site_server_names() {
        let paths = HostPaths::system("/home/ops".into());
        let site = final_site("example.com", &paths);
        let pattern = r"~^(?<subdomain>[^.]+)\.example\.com$";
        assert_eq!(
            server_names(&site),
            vec![
                format!("example.com www.example.com {pattern}").as_str(),
                "example.com www.example.com",
                pattern,
            ]
        );
    }

    #[test]
    fn final_site_references_certificate_and_roots() {
        let paths = HostPaths::system("/home/ops".into());
        let site = final_site("example.com", &paths);
        assert!(site.contains("return 301 https://$host$request_uri;"));
        assert!(site.contains("ssl_certificate /etc/letsencrypt/live/example.com/fullchain.pem;"));
        assert!(site.contains("ssl_certificate_key /etc/letsencrypt/live/example.com/privkey.pem;"));
        assert!(site.contains("include /etc/letsencrypt/options-ssl-nginx.conf;"));
        assert!(site.contains("ssl_dhparam /etc/letsencrypt/ssl-dhparams.pem;"));
        assert!(site.contains("root /home/ops/SERVER/root;"));
        assert!(site.contains("root /home/ops/SERVER/subdomains/$subdomain;"));
        assert_eq!(site.matches("listen 443 ssl http2;").count(), 2);
    }
}
