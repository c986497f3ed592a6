use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn defaults_match_the_contact_page() {
    let settings = WizardSettings::default();
    assert_eq!(settings.endpoint, "/api/submit-contact");
    assert_eq!(settings.mode, SubmissionMode::Asynchronous);
    assert_eq!(settings.file_limit(), Some(5 * 1024 * 1024));
    assert_eq!(settings.success_fade(), Some(Duration::from_millis(300)));
    assert_eq!(
        settings.payment_sections.get("paper-check").map(String::as_str),
        Some("paper-check-section")
    );
    assert_eq!(settings.payment_sections.len(), 3);
}

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let settings = WizardSettings::from_toml_str(
        r#"
        endpoint = "/api/submit-application"
        mode = "navigation"
        max_file_bytes = 0
        success_fade_ms = 0
        "#,
    )
    .expect("parse");

    assert_eq!(settings.endpoint, "/api/submit-application");
    assert_eq!(settings.mode, SubmissionMode::Navigation);
    assert_eq!(settings.file_limit(), None);
    assert_eq!(settings.success_fade(), None);
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    assert_eq!(settings.generic_error_message, GENERIC_ERROR_MESSAGE);
}

#[test]
fn rejects_unusable_values() {
    assert!(matches!(
        WizardSettings::from_toml_str(r#"endpoint = "  ""#),
        Err(SettingsError::Invalid(_))
    ));
    assert!(matches!(
        WizardSettings::from_toml_str("request_timeout_secs = 0"),
        Err(SettingsError::Invalid(_))
    ));
    assert!(matches!(
        WizardSettings::from_toml_str(r#"mode = "carrier-pigeon""#),
        Err(SettingsError::Parse(_))
    ));
}

#[cfg(feature = "native")]
#[test]
fn loads_file_then_applies_environment_overrides() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("form_wizard_settings_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("wizard.toml");
    fs::write(
        &path,
        r#"
        endpoint = "/api/submit-application"
        max_file_bytes = 2097152

        [payment_sections]
        ffg-card = "card-details"
        "#,
    )
    .expect("write settings");

    let from_file = load_settings_from(&path).expect("load");
    assert_eq!(from_file.endpoint, "/api/submit-application");
    assert_eq!(from_file.file_limit(), Some(2 * 1024 * 1024));
    assert_eq!(from_file.payment_sections.len(), 1);

    env::set_var("WIZARD__MAX_FILE_BYTES", "1048576");
    let overridden = load_settings_from(&path);
    env::remove_var("WIZARD__MAX_FILE_BYTES");
    assert_eq!(
        overridden.expect("load with env").file_limit(),
        Some(1024 * 1024)
    );

    let missing = load_settings_from(&temp_root.join("absent.toml")).expect("optional file");
    assert_eq!(missing, WizardSettings::default());

    fs::remove_dir_all(temp_root).expect("cleanup");
}
