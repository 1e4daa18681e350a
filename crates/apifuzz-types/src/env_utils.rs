//! Environment variable helpers used for configuration defaults.
//!
//! Every CLI flag of the fuzzer has an `APIFUZZ_*` fallback; these helpers
//! keep the parsing of those fallbacks in one place.
//!
//! # Example
//!
//! ```
//! use apifuzz_types::env_utils::{env_list, env_var_or};
//!
//! let timeout: u64 = env_var_or("APIFUZZ_TIMEOUT_SECS", 10);
//! let skipped: Vec<String> = env_list("APIFUZZ_SKIP_FUZZERS");
//! # let _ = (timeout, skipped);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable, falling back to `default`.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Get an environment variable as a string with a default value.
pub fn env_string_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Parse a comma-separated environment variable, dropping empty entries.
pub fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .ok()
        .map(|v| split_list(&v))
        .unwrap_or_default()
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("APIFUZZ_TEST_U64", " 42 ");
        let val: Option<u64> = env_var("APIFUZZ_TEST_U64");
        assert_eq!(val, Some(42));

        let missing: Option<u64> = env_var("APIFUZZ_NONEXISTENT_12345");
        assert_eq!(missing, None);

        std::env::remove_var("APIFUZZ_TEST_U64");
    }

    #[test]
    fn test_env_var_or() {
        std::env::set_var("APIFUZZ_TEST_WITH_DEFAULT", "not-a-number");
        let val: u64 = env_var_or("APIFUZZ_TEST_WITH_DEFAULT", 50);
        assert_eq!(val, 50);
        std::env::remove_var("APIFUZZ_TEST_WITH_DEFAULT");
    }

    #[test]
    fn test_env_string_or_ignores_blank() {
        std::env::set_var("APIFUZZ_TEST_BLANK", "  ");
        assert_eq!(env_string_or("APIFUZZ_TEST_BLANK", "default"), "default");
        std::env::remove_var("APIFUZZ_TEST_BLANK");
    }

    #[test]
    fn test_env_list() {
        std::env::set_var("APIFUZZ_TEST_LIST", "a, b,,c ");
        assert_eq!(env_list("APIFUZZ_TEST_LIST"), vec!["a", "b", "c"]);
        assert!(env_list("APIFUZZ_NONEXISTENT_12349").is_empty());
        std::env::remove_var("APIFUZZ_TEST_LIST");
    }
}
