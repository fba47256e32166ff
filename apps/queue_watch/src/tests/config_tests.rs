use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
        server_url = "https://queue.example.edu"
        queue_id = 42
        user_id = 7
        instructor = true
        "#,
    )
    .expect("parse");

    assert_eq!(settings.server_url, "https://queue.example.edu");
    assert_eq!(settings.queue_id(), QueueId(42));
    assert_eq!(settings.session(), SessionContext::instructor(UserId(7)));
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "queue_id = 3\nuser_id = 9").expect("parse");
    apply_env(
        &mut settings,
        env_from(&[
            ("QUEUE_ID", "4"),
            ("APP__QUEUE_ID", "5"),
            ("QUEUE_INSTRUCTOR", "yes"),
            ("APP__USER_ID", "not-a-number"),
        ]),
    );

    assert_eq!(settings.queue_id, 5);
    assert_eq!(settings.current_user_id, 9);
    assert!(settings.current_user_is_instructor);
}

#[test]
fn rejects_malformed_file() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "queue_id = \"three\"").is_err());
}

#[test]
fn validate_requires_http_scheme() {
    let mut settings = Settings::default();
    settings.validate().expect("default is valid");

    settings.server_url = "ws://queue.example.edu".into();
    assert!(settings.validate().is_err());
}

#[test]
fn explicit_config_path_must_exist() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let missing = env::temp_dir().join(format!("queue_watch_missing_{suffix}.toml"));

    let err = load_settings(Some(&missing)).expect_err("must fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn loads_explicit_config_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("queue_watch_test_{suffix}.toml"));
    fs::write(&path, "queue_id = 11\ntemplates_path = \"templates.toml\"").expect("write");

    let settings = load_settings(Some(&path)).expect("load");
    assert_eq!(settings.templates_path, Some(PathBuf::from("templates.toml")));

    fs::remove_file(path).expect("cleanup");
}
