use super::*;
use std::sync::Mutex;

// Env vars are process-global; serialize every test that touches them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers must hold `ENV_LOCK`.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("MEDCARE_API_BASE_URL");
        std::env::remove_var("GOOGLE_CLIENT_ID");
        std::env::remove_var("GOOGLE_REDIRECT_URI");
        std::env::remove_var("MEDCARE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("MEDCARE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("MEDCARE_SESSION_FILE");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_client_env() };

    let cfg = ClientConfig::from_env();
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert!(cfg.google.is_none());
    assert_eq!(cfg.timeouts, RequestTimeouts::default());
    assert!(cfg.session_file.ends_with(".medcare/session.json"));
}

#[test]
fn from_env_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("MEDCARE_API_BASE_URL", "https://api.medcare.test/");
        std::env::set_var("GOOGLE_CLIENT_ID", "client-123");
        std::env::set_var("GOOGLE_REDIRECT_URI", "https://medcare.test/auth/google/callback");
        std::env::set_var("MEDCARE_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("MEDCARE_CONNECT_TIMEOUT_SECS", "3");
        std::env::set_var("MEDCARE_SESSION_FILE", "/tmp/medcare-session.json");
    }

    let cfg = ClientConfig::from_env();
    assert_eq!(cfg.api_base_url, "https://api.medcare.test");
    let google = cfg.google.expect("google config should be present");
    assert_eq!(google.client_id, "client-123");
    assert_eq!(google.redirect_uri, "https://medcare.test/auth/google/callback");
    assert_eq!(cfg.timeouts, RequestTimeouts { request_secs: 30, connect_secs: 3 });
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/medcare-session.json"));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_google_redirect_defaults_when_only_client_id_set() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("GOOGLE_CLIENT_ID", "client-abc");
    }

    let cfg = ClientConfig::from_env();
    assert_eq!(cfg.google.map(|g| g.redirect_uri).as_deref(), Some(DEFAULT_GOOGLE_REDIRECT_URI));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_blank_client_id_disables_google() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("GOOGLE_CLIENT_ID", "   ");
    }

    assert!(ClientConfig::from_env().google.is_none());

    unsafe { clear_client_env() };
}

#[test]
fn from_env_invalid_timeouts_fall_back() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("MEDCARE_REQUEST_TIMEOUT_SECS", "soon");
        std::env::set_var("MEDCARE_CONNECT_TIMEOUT_SECS", "0");
    }

    let cfg = ClientConfig::from_env();
    assert_eq!(cfg.timeouts, RequestTimeouts::default());

    unsafe { clear_client_env() };
}

// =============================================================================
// normalize_base_url
// =============================================================================

#[test]
fn normalize_base_url_trims_slashes_and_whitespace() {
    assert_eq!(normalize_base_url(" http://host:8000// "), "http://host:8000");
}

#[test]
fn normalize_base_url_empty_uses_default() {
    assert_eq!(normalize_base_url(""), DEFAULT_API_BASE_URL);
    assert_eq!(normalize_base_url("/"), DEFAULT_API_BASE_URL);
}

#[test]
fn default_session_file_without_home_is_relative() {
    assert_eq!(default_session_file(None), PathBuf::from(".medcare/session.json"));
}

#[test]
fn default_session_file_under_home() {
    assert_eq!(
        default_session_file(Some(PathBuf::from("/home/alice"))),
        PathBuf::from("/home/alice/.medcare/session.json")
    );
}
