use super::{load_settings_from, normalize_server_url, parse_size, Settings};

use std::{
    collections::HashMap,
    env, fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("cropdesk_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("cropdesk.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let path = env::temp_dir().join("cropdesk_config_test_absent/cropdesk.toml");
    assert_eq!(load_settings_from(&path, no_env), Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
server_url = "http://crops.local:8080"
unprocessed_only = "yes"
landscape_size = "2560x1440"
portrait_size = "not a size"
"#,
    );

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.server_url, "http://crops.local:8080");
    assert!(settings.unprocessed_only);
    assert_eq!(settings.landscape_size, (2560, 1440));
    assert_eq!(settings.portrait_size, (1080, 1920));
    assert_eq!(settings.log_filter, "info");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_overrides_file() {
    let path = temp_config("server_url = \"http://from-file:1\"\nlog_filter = \"warn\"\n");
    let vars: HashMap<&str, &str> = [
        ("CROPDESK_SERVER_URL", "http://from-env:2"),
        ("APP__SERVER_URL", "http://from-app-env:3"),
        ("APP__UNPROCESSED_ONLY", "true"),
    ]
    .into_iter()
    .collect();

    let settings = load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));
    assert_eq!(settings.server_url, "http://from-app-env:3");
    assert_eq!(settings.log_filter, "warn");
    assert!(settings.unprocessed_only);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn parses_sizes_with_either_separator() {
    assert_eq!(parse_size("1080x1920"), Some((1080, 1920)));
    assert_eq!(parse_size(" 1920 × 1080 "), Some((1920, 1080)));
    assert_eq!(parse_size("1920"), None);
    assert_eq!(parse_size("wide x tall"), None);
}

#[test]
fn normalizes_server_urls() {
    assert_eq!(
        normalize_server_url("http://127.0.0.1:5000").expect("url"),
        "http://127.0.0.1:5000/"
    );
    assert_eq!(
        normalize_server_url(" https://crops.example.com/api ").expect("url"),
        "https://crops.example.com/api/"
    );
    assert_eq!(
        normalize_server_url("").expect("url"),
        "http://127.0.0.1:5000/"
    );
    assert!(normalize_server_url("localhost:5000").is_err());
    assert!(normalize_server_url("mailto:someone@example.com").is_err());
}
