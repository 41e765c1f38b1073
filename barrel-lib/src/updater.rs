//! Application update check against the project's GitHub releases

use crate::config::Config;
use crate::error::Result;
use crate::release::{Release, ReleaseClient};
use std::cmp::Ordering;
use tracing::info;

/// Whether `new` is a later version than `current`.
///
/// Versions compare by their digits only (`v1.10` is `110`). If either side
/// has no digits, the strings are compared as-is.
pub fn is_newer_version(new: &str, current: &str) -> bool {
    let digits = |v: &str| -> String { v.chars().filter(char::is_ascii_digit).collect() };
    let (new_digits, current_digits) = (digits(new), digits(current));

    if new_digits.is_empty() || current_digits.is_empty() {
        return new > current;
    }

    let new_digits = new_digits.trim_start_matches('0');
    let current_digits = current_digits.trim_start_matches('0');
    match new_digits.len().cmp(&current_digits.len()) {
        Ordering::Equal => new_digits > current_digits,
        longer => longer == Ordering::Greater,
    }
}

/// The newest published release, if it is newer than `current`
pub async fn check_for_update(config: &Config, current: &str) -> Result<Option<Release>> {
    let client = ReleaseClient::new(config)?;
    let latest = client
        .github_releases(&config.app_repo, None)
        .await
        .into_iter()
        .next();

    Ok(match latest {
        Some(release) if is_newer_version(&release.tag, current) => {
            info!("Update available: {} (running {})", release.tag, current);
            Some(release)
        }
        _ => {
            info!("No update available (running {})", current);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_comparison() {
        assert!(is_newer_version("v1.2.1", "v1.2.0"));
        assert!(is_newer_version("1.10", "1.9"));
        assert!(!is_newer_version("v1.2.0", "1.2.0"));
        assert!(!is_newer_version("0.9", "1.0"));
    }

    #[test]
    fn test_lexical_fallback() {
        assert!(is_newer_version("beta", "alpha"));
        assert!(!is_newer_version("latest", "v1.0"));
    }
}
