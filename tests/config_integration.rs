use huddle::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("HUDDLE_SERVER__PORT");
        env::remove_var("HUDDLE_BACKEND__BASE_URL");
        env::remove_var("BACKEND_URL");
        env::remove_var("BACKEND_API_KEY");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["huddle"]).expect("defaults load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.backend.request_timeout_secs, 30);
    assert_eq!(config.session.idle_timeout_minutes, 30);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("HUDDLE_SERVER__PORT", "9090");
        env::set_var("HUDDLE_BACKEND__BASE_URL", "https://proj.backend.example/");
    }

    let config = AppConfig::load_from_args(["huddle"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.backend.base_url, "https://proj.backend.example/");

    clear_env_vars();
}

#[test]
#[serial]
fn test_direct_env_names_still_work() {
    clear_env_vars();
    unsafe {
        env::set_var("BACKEND_URL", "https://legacy.backend.example/");
        env::set_var("BACKEND_API_KEY", "legacy-key");
    }

    let config = AppConfig::load_from_args(["huddle"]).expect("Failed to load config");
    assert_eq!(config.backend.base_url, "https://legacy.backend.example/");
    assert_eq!(config.backend.api_key, "legacy-key");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_win() {
    clear_env_vars();
    unsafe {
        env::set_var("HUDDLE_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["huddle", "--port", "7171"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 7171);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 7070
backend:
  base_url: "https://file.backend.example/"
    "#;

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("config.yaml");
    fs::write(&file_path, config_content).expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", file_path.to_str().unwrap());
    }

    let config = AppConfig::load_from_args(["huddle"]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.backend.base_url, "https://file.backend.example/");

    clear_env_vars();
}
