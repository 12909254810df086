use std::sync::{Mutex, MutexGuard, PoisonError};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Safety
/// Callers hold `ENV_LOCK` so no other test touches these variables.
unsafe fn clear_wiki_env() {
    unsafe {
        std::env::remove_var("WIKI_STORE_BASE_URL");
        std::env::remove_var("WIKI_STORE_TOKEN");
        std::env::remove_var("WIKI_USER_ID");
        std::env::remove_var("WIKI_CACHE_DIR");
        std::env::remove_var("WIKI_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("WIKI_POLL_INTERVAL_MS");
    }
}

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: u64 = env_parse("__WIKI_TEST_NONEXISTENT_KEY__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__WIKI_TEST_EP_INVALID__", "soon") };
    let val: u64 = env_parse("__WIKI_TEST_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__WIKI_TEST_EP_INVALID__") };
}

// =============================================================================
// StoreConfig
// =============================================================================

#[test]
fn from_env_defaults() {
    let _env = env_lock();
    unsafe {
        clear_wiki_env();
        std::env::set_var("WIKI_USER_ID", "uid-1");
    }

    let cfg = StoreConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, DEFAULT_STORE_BASE_URL);
    assert_eq!(cfg.user_id, "uid-1");
    assert_eq!(cfg.token, None);
    assert_eq!(cfg.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    assert_eq!(cfg.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);

    unsafe { clear_wiki_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _env = env_lock();
    unsafe {
        clear_wiki_env();
        std::env::set_var("WIKI_USER_ID", "uid-2");
        std::env::set_var("WIKI_STORE_BASE_URL", "https://wiki.example.test/api/");
        std::env::set_var("WIKI_STORE_TOKEN", "tok");
        std::env::set_var("WIKI_CACHE_DIR", "/tmp/wiki-cache");
        std::env::set_var("WIKI_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("WIKI_POLL_INTERVAL_MS", "250");
    }

    let cfg = StoreConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "https://wiki.example.test/api");
    assert_eq!(cfg.token.as_deref(), Some("tok"));
    assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/wiki-cache"));
    assert_eq!(cfg.request_timeout_secs, 5);
    assert_eq!(cfg.poll_interval_ms, 250);

    unsafe { clear_wiki_env() };
}

#[test]
fn from_env_requires_user_id() {
    let _env = env_lock();
    unsafe { clear_wiki_env() };
    let err = StoreConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing("WIKI_USER_ID")));
}

#[test]
fn base_url_must_be_http() {
    let err = parse_base_url(Some("ftp://files")).unwrap_err().to_string();
    assert!(err.contains("WIKI_STORE_BASE_URL"));
    assert_eq!(parse_base_url(None).unwrap(), DEFAULT_STORE_BASE_URL);
}

#[test]
fn with_overrides_uses_explicit_values() {
    let _env = env_lock();
    unsafe { clear_wiki_env() };

    let cfg = StoreConfig::with_overrides(Some("https://wiki.example.test/"), " uid-3 ", Some(" ".into())).unwrap();
    assert_eq!(cfg.base_url, "https://wiki.example.test");
    assert_eq!(cfg.user_id, "uid-3");
    assert_eq!(cfg.token, None);

    assert!(matches!(StoreConfig::with_overrides(None, "", None), Err(ConfigError::Missing("WIKI_USER_ID"))));
}

#[test]
fn zero_intervals_are_rejected() {
    let _env = env_lock();
    unsafe {
        clear_wiki_env();
        std::env::set_var("WIKI_USER_ID", "uid-4");
        std::env::set_var("WIKI_POLL_INTERVAL_MS", "0");
    }
    let err = StoreConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "WIKI_POLL_INTERVAL_MS", .. }));

    unsafe {
        std::env::remove_var("WIKI_POLL_INTERVAL_MS");
        std::env::set_var("WIKI_REQUEST_TIMEOUT_SECS", "0");
    }
    let err = StoreConfig::with_overrides(None, "uid-4", None).unwrap_err();
    assert!(err.to_string().contains("WIKI_REQUEST_TIMEOUT_SECS"));

    unsafe { clear_wiki_env() };
}
