//! Repository version probe: a single `GET <repo>/version` that must answer 200.
//!
//! No payload contract beyond the status code. No retries.

use std::net::IpAddr;
use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, HarnessResult};

/// Probes the configured repository service.
pub fn check_repo(config: &HarnessConfig) -> HarnessResult<()> {
    let url = config.version_url();
    let parsed = Url::parse(&url).map_err(|e| HarnessError::Config {
        message: format!("invalid repository URL {url}: {e}"),
    })?;

    // A timeout too large to be a deadline means no timeout at all.
    let timeout = Instant::now()
        .checked_add(config.timeout)
        .map(|_| config.timeout);
    let mut builder = Client::builder().timeout(timeout);
    // Local development services are never reached through a proxy.
    if is_loopback(&parsed) {
        builder = builder.no_proxy();
    }
    let client = builder.build().map_err(|e| HarnessError::Config {
        message: format!("failed to build HTTP client: {e}"),
    })?;

    debug!(url = %url, "checking repository version endpoint");
    let response = client
        .get(parsed)
        .send()
        .map_err(|e| HarnessError::Connectivity {
            url: url.clone(),
            message: e.to_string(),
        })?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(HarnessError::VersionStatus { url, status });
    }
    Ok(())
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_hosts() {
        assert!(is_loopback(&Url::parse("http://localhost:3500/version").unwrap()));
        assert!(is_loopback(&Url::parse("http://127.0.0.1:3500/version").unwrap()));
        assert!(is_loopback(&Url::parse("http://[::1]:3500/version").unwrap()));
        assert!(!is_loopback(
            &Url::parse("https://playground.data-container.net/version").unwrap()
        ));
    }

    #[test]
    fn malformed_url_is_a_config_error() {
        let config = HarnessConfig {
            repo_url: "not a url".to_string(),
            ..HarnessConfig::default()
        };
        assert_eq!(check_repo(&config).unwrap_err().kind(), "config");
    }
}
