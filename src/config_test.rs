use super::*;

/// # Safety
/// Tests touching `FACEAUTH_*` run serialized through `ENV_LOCK`.
unsafe fn clear_faceauth_env() {
    unsafe {
        std::env::remove_var("FACEAUTH_BACKEND_URL");
        std::env::remove_var("FACEAUTH_STATE_FILE");
        std::env::remove_var("FACEAUTH_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("FACEAUTH_REQUEST_TIMEOUT_SECS");
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_faceauth_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.backend_url, DEFAULT_BACKEND_URL);
    assert!(cfg.state_file.ends_with(".faceauth/session.json"));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
    assert_eq!(cfg.request_timeout, None);
}

#[test]
fn from_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_faceauth_env();
        std::env::set_var("FACEAUTH_BACKEND_URL", " https://auth.example.test/ ");
        std::env::set_var("FACEAUTH_STATE_FILE", "/tmp/fa/state.json");
        std::env::set_var("FACEAUTH_CONNECT_TIMEOUT_SECS", "3");
        std::env::set_var("FACEAUTH_REQUEST_TIMEOUT_SECS", "30");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.backend_url, "https://auth.example.test");
    assert_eq!(cfg.state_file, PathBuf::from("/tmp/fa/state.json"));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(3));
    assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));

    unsafe { clear_faceauth_env() };
}

#[test]
fn from_env_bad_timeout_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_faceauth_env();
        std::env::set_var("FACEAUTH_CONNECT_TIMEOUT_SECS", "soon");
    }

    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("FACEAUTH_CONNECT_TIMEOUT_SECS"));

    unsafe { clear_faceauth_env() };
}

#[test]
fn builder_overrides_normalize() {
    let cfg = ClientConfig::default()
        .with_backend_url("http://localhost:9000///")
        .with_state_file("state.json");
    assert_eq!(cfg.backend_url, "http://localhost:9000");
    assert_eq!(cfg.state_file, PathBuf::from("state.json"));
}

#[test]
fn default_state_file_falls_back_to_cwd() {
    assert_eq!(default_state_file(None), PathBuf::from("./.faceauth/session.json"));
    assert_eq!(
        default_state_file(Some(PathBuf::from("/home/ann"))),
        PathBuf::from("/home/ann/.faceauth/session.json")
    );
}
