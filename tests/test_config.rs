use coinvault::config::{Config, DEFAULT_LISTEN_ADDR};
use std::io::Write;
use std::sync::Mutex;

// Tests below mutate process-wide environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_config_default_address() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        std::env::remove_var("LISTEN");
        std::env::remove_var("COINVAULT_CONFIG");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, DEFAULT_LISTEN_ADDR);
    assert!(!cfg.server.concurrent);
    assert!(!cfg.http.strict_body_length);
    assert!(cfg.http.expose_error_details);
}

#[test]
fn test_config_custom_address_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        std::env::remove_var("COINVAULT_CONFIG");
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    unsafe {
        std::env::remove_var("LISTEN");
    }
}

#[test]
fn test_config_no_timeouts_by_default() {
    let cfg = Config::default();
    assert_eq!(cfg.server.read_timeout(), None);
    assert_eq!(cfg.server.write_timeout(), None);
    assert_eq!(cfg.server.idle_timeout(), None);
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        r#"
server:
  listen_addr: "127.0.0.1:9000"
  concurrent: true
  read_timeout_ms: 1500
http:
  max_header_bytes: 1024
  max_body_bytes: 2048
  expose_error_details: false
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert!(cfg.server.concurrent);
    assert_eq!(
        cfg.server.read_timeout(),
        Some(std::time::Duration::from_millis(1500))
    );
    assert_eq!(cfg.http.max_header_bytes, 1024);
    assert_eq!(cfg.http.max_body_bytes, 2048);
    assert!(!cfg.http.expose_error_details);
    assert!(!cfg.http.strict_body_length);
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml_str("").unwrap();
    assert_eq!(cfg.server.listen_addr, DEFAULT_LISTEN_ADDR);
}

#[test]
fn test_config_invalid_yaml_is_error() {
    assert!(Config::from_yaml_str("server: 42").is_err());
}

#[test]
fn test_config_file_then_env_override() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let path = std::env::temp_dir().join(format!("coinvault-test-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "server:\n  listen_addr: \"127.0.0.1:7000\"\nhttp:\n  strict_body_length: true").unwrap();

    unsafe {
        std::env::set_var("COINVAULT_CONFIG", &path);
        std::env::remove_var("LISTEN");
    }
    let from_file = Config::load().unwrap();
    assert_eq!(from_file.server.listen_addr, "127.0.0.1:7000");
    assert!(from_file.http.strict_body_length);

    unsafe {
        std::env::set_var("LISTEN", "127.0.0.1:7001");
    }
    let overridden = Config::load().unwrap();
    assert_eq!(overridden.server.listen_addr, "127.0.0.1:7001");
    assert!(overridden.http.strict_body_length);

    unsafe {
        std::env::remove_var("LISTEN");
        std::env::remove_var("COINVAULT_CONFIG");
    }
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_config_missing_file_is_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        std::env::set_var("COINVAULT_CONFIG", "/nonexistent/coinvault.yaml");
    }
    let result = Config::load();
    unsafe {
        std::env::remove_var("COINVAULT_CONFIG");
    }
    assert!(result.is_err());
}
