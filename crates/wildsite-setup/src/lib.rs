pub mod certbot;
pub mod cmd;
pub mod config;
pub mod error;
pub mod escalate;
pub mod firewall;
pub mod fsutil;
pub mod ip;
pub mod layout;
pub mod logging;
pub mod nginx;
pub mod os;
pub mod prompt;
pub mod renew;
pub mod renewal;
pub mod setup;
pub mod subdomain;
pub mod uninstall;
