//! Service configuration.
//!
//! Loaded once at startup from TOML, validated, then read-only. Every field
//! has a default so a minimal file only names what differs:
//!
//! ```toml
//! bind_address    = "127.0.0.1:8080"
//! allowed_origin  = "https://vault.example.com"
//! identity_cookie = "user"
//! log_filter      = "hush=debug,info"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use http::HeaderValue;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Socket address the server binds to.
    pub bind_address: String,

    /// The single origin allowed to make credentialed cross-origin requests.
    pub allowed_origin: String,

    /// Name of the cookie carrying the caller identity.
    pub identity_cookie: String,

    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_owned(),
            allowed_origin: "http://localhost:8080".to_owned(),
            identity_cookie: "user".to_owned(),
            log_filter: "info".to_owned(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<(), Error> {
        let mut problems = Vec::new();

        if self.bind_address.parse::<SocketAddr>().is_err() {
            problems.push(format!("bind_address `{}` is not a socket address", self.bind_address));
        }
        if let Err(reason) = check_origin(&self.allowed_origin) {
            problems.push(format!("allowed_origin `{}` {reason}", self.allowed_origin));
        }
        if self.identity_cookie.is_empty() || !self.identity_cookie.chars().all(is_token_char) {
            problems.push(format!("identity_cookie `{}` is not a valid cookie name", self.identity_cookie));
        }
        if EnvFilter::try_new(&self.log_filter).is_err() {
            problems.push(format!("log_filter `{}` is not a valid filter", self.log_filter));
        }

        if problems.is_empty() { Ok(()) } else { Err(Error::ConfigInvalid(problems)) }
    }
}

fn check_origin(origin: &str) -> Result<(), &'static str> {
    if origin == "*" {
        return Err("cannot be a wildcard when credentials are allowed");
    }
    let host = origin.strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .ok_or("must start with http:// or https://")?;
    if host.is_empty() || host.contains('/') {
        return Err("must be scheme and host only");
    }
    HeaderValue::from_str(origin).map_err(|_| "is not a valid header value")?;
    Ok(())
}

/// RFC 6265 cookie-name: an RFC 2616 token.
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
}
