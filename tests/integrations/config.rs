use reqalert::cli::Cli;
use reqalert::config::Config;
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_config(toml_content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    file
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    let file = write_config(
        r#"
        log_level = "debug"
        [server]
        listen_address = "0.0.0.0:9000"
        watched_paths = ["/admin", "/wp-login.php"]
        alert_on_server_error = false
        [geo]
        enabled = false
        base_url = "http://geo.internal"
        [telegram]
        bot_token = "123:abc"
        chat_id = -100987
        api_base_url = "http://telegram.internal"
        [metrics]
        enabled = true
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.server.listen_address, "0.0.0.0:9000");
    assert_eq!(config.server.watched_paths, vec!["/admin", "/wp-login.php"]);
    assert!(!config.server.alert_on_server_error);
    assert!(!config.geo.enabled);
    assert_eq!(config.geo.base_url, "http://geo.internal");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
    assert_eq!(config.telegram.chat_id.as_deref(), Some("-100987"));
    assert_eq!(config.telegram.api_base_url, "http://telegram.internal");
    assert!(config.metrics.enabled);
}

#[test]
#[serial]
fn test_load_partial_config_uses_defaults() {
    let file = write_config(
        r#"
        [telegram]
        chat_id = "@alerts"
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.telegram.chat_id.as_deref(), Some("@alerts"));
    assert_eq!(config.telegram.bot_token, None);
    assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.server, Config::default().server);
    assert!(config.geo.enabled);
}

#[test]
#[serial]
fn test_no_config_file_gives_defaults() {
    let config = Config::load(&Cli::default()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_invalid_value_type() {
    let file = write_config(
        r#"
        [server]
        alert_on_server_error = "sometimes"
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let result = Config::load(&cli);

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("alert_on_server_error"));
}

#[test]
#[serial]
fn test_non_existent_config_file() {
    let cli = Cli {
        config: Some(PathBuf::from("/path/to/non/existent/reqalert.toml")),
        ..Default::default()
    };
    let result = Config::load(&cli);

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Config file not found at specified path"));
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let file = write_config(
        r#"
        [telegram]
        bot_token = "from-file"
    "#,
    );
    std::env::set_var("REQALERT_TELEGRAM__BOT_TOKEN", "from-env");
    std::env::set_var("REQALERT_TELEGRAM__CHAT_ID", "-42");

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let result = Config::load(&cli);

    std::env::remove_var("REQALERT_TELEGRAM__BOT_TOKEN");
    std::env::remove_var("REQALERT_TELEGRAM__CHAT_ID");

    let config = result.unwrap();
    assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
    assert_eq!(config.telegram.chat_id.as_deref(), Some("-42"));
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    let file = write_config(
        r#"
        log_level = "warn"
        [server]
        listen_address = "127.0.0.1:1111"
        [geo]
        enabled = true
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        listen: Some("127.0.0.1:2222".to_string()),
        log_level: Some("trace".to_string()),
        no_geo: true,
        metrics: true,
    };
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "trace");
    assert_eq!(config.server.listen_address, "127.0.0.1:2222");
    assert!(!config.geo.enabled);
    assert!(config.metrics.enabled);
    // Untouched sibling keys survive the CLI merge.
    assert_eq!(config.server.watched_paths, vec!["/admin"]);
}
