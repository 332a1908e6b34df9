//! Configuration loading and resolution

use std::fs;
use std::time::Duration;

use devlens_engine::{
    App, BASE_URL_ENV, DevlensConfig, EDIT_TRIGGER_ENV, EditTrigger, ServiceVariant, Settings,
};

#[test]
fn config_file_drives_app_variant_and_trigger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[service]
base_url = "http://lab-host:8000/"
variant = "meeting"
timeout_secs = 90

[app]
edit_trigger = "direct"
ascii_only = true
"#,
    )
    .unwrap();

    let config = DevlensConfig::load_from(&path).unwrap();
    let settings = Settings::resolve(config.as_ref(), |_| None);
    assert_eq!(settings.base_url, "http://lab-host:8000");
    assert_eq!(settings.timeout, Some(Duration::from_secs(90)));

    let app = App::new(settings).unwrap();
    assert_eq!(app.variant(), ServiceVariant::MeetingSummary);
    assert_eq!(app.editor().trigger(), EditTrigger::Direct);
    assert!(app.ui_options().ascii_only);
    assert_eq!(app.submit_label(), "Summarize");
}

#[test]
fn environment_wins_over_file() {
    let config: DevlensConfig = toml_config("[service]\nbase_url = \"http://file\"\n");
    let settings = Settings::resolve(Some(&config), |key| match key {
        BASE_URL_ENV => Some("http://env/".to_string()),
        EDIT_TRIGGER_ENV => Some("DIRECT".to_string()),
        _ => None,
    });
    assert_eq!(settings.base_url, "http://env");
    assert_eq!(settings.edit_trigger, EditTrigger::Direct);
}

#[test]
fn broken_config_is_an_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[app]\nascii_only = \"maybe\"\n").unwrap();

    let err = DevlensConfig::load_from(&path).unwrap_err();
    assert_eq!(err.path(), &path);
    assert!(err.to_string().contains("failed to parse config"));
}

fn toml_config(raw: &str) -> DevlensConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, raw).unwrap();
    DevlensConfig::load_from(&path).unwrap().unwrap()
}
