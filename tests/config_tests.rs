// Tests for configuration loading and validation

use anyhow::Result;
use std::io::Write;
use wearable_gate::dispatch::DispatcherKind;
use wearable_gate::{AmbiguousOutput, Config};

fn write_config(dir: &tempfile::TempDir, contents: &str) -> Result<String> {
    let path = dir.path().join("wearable-gate.toml");
    let mut file = std::fs::File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn test_missing_file_uses_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("absent");

    let cfg = Config::load(&path.to_string_lossy())?;

    assert_eq!(cfg.service.name, "wearable-gate");
    assert_eq!(cfg.service.http.port, 5100);
    assert_eq!(cfg.buffer.max_messages, 24);
    assert_eq!(cfg.buffer.word_flush_threshold, 8);
    assert_eq!(cfg.buffer.flush_timeout_secs, 5.0);
    assert_eq!(cfg.buffer.retention_secs, 600.0);
    assert_eq!(cfg.gate.min_user_sentences, 2);
    assert_eq!(cfg.gate.cooldown_after_action_secs, 120.0);
    assert_eq!(cfg.gate.min_accumulation_window_secs, 15.0);
    assert_eq!(cfg.gate.min_silence_after_user_secs, 3.0);
    assert_eq!(cfg.gate.analysis_cooldown_secs, 60.0);
    assert_eq!(cfg.dispatcher.kind, DispatcherKind::Keyword);
    assert_eq!(cfg.dispatcher.ambiguous_output, AmbiguousOutput::NoAction);

    Ok(())
}

#[test]
fn test_file_overrides_selected_values() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        r#"
[service.http]
port = 8080

[buffer]
word_flush_threshold = 12

[gate]
min_user_sentences = 3
analysis_cooldown_secs = 30.0

[dispatcher]
kind = "http"
endpoint = "http://localhost:9000/decide"
ambiguous_output = "act"
"#,
    )?;

    let cfg = Config::load(&path)?;

    assert_eq!(cfg.service.http.port, 8080);
    assert_eq!(cfg.service.http.bind, "0.0.0.0", "unset keys keep defaults");
    assert_eq!(cfg.buffer.word_flush_threshold, 12);
    assert_eq!(cfg.buffer.max_messages, 24);
    assert_eq!(cfg.gate.min_user_sentences, 3);
    assert_eq!(cfg.gate.analysis_cooldown_secs, 30.0);
    assert_eq!(cfg.dispatcher.kind, DispatcherKind::Http);
    assert_eq!(cfg.dispatcher.endpoint.as_deref(), Some("http://localhost:9000/decide"));
    assert_eq!(cfg.dispatcher.ambiguous_output, AmbiguousOutput::Act);

    Ok(())
}

#[test]
fn test_http_dispatcher_requires_endpoint() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(&dir, "[dispatcher]\nkind = \"http\"\n")?;

    let err = Config::load(&path).expect_err("endpoint is mandatory");
    assert!(err.to_string().contains("dispatcher.endpoint"));

    Ok(())
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut cfg = Config::default();
    assert!(cfg.validate().is_ok());

    cfg.buffer.word_flush_threshold = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.gate.min_silence_after_user_secs = -1.0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.dispatcher.timeout_secs = f64::NAN;
    assert!(cfg.validate().is_err());
}
