//! Configuration file loading.

use ai_services_client::config::ServicesConfig;
use ai_services_client::transcription::WhisperModelSize;
use ai_services_client::ErrorKind;
use std::time::Duration;

fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{}.yaml", name, std::process::id()));
    std::fs::write(&path, content).expect("write temp config");
    path
}

#[test]
fn test_load_yaml_file() {
    let path = temp_file(
        "ai-services-config",
        r#"
generation:
  base_url: http://gpu-box:11434
  model: phi4
  timeout_secs: 60
transcription:
  model_size: medium
readiness:
  max_attempts: 10
  interval_ms: 500
assistant:
  system_prompt: You are terse.
"#,
    );
    let cfg = tokio_test::block_on(ServicesConfig::from_yaml_file(&path)).unwrap();
    let _ = std::fs::remove_file(&path);

    let ep = cfg.generation_endpoint();
    assert_eq!(ep.base_url(), "http://gpu-box:11434");
    assert_eq!(ep.model(), "phi4");
    assert_eq!(ep.timeout(), Duration::from_secs(60));
    assert_eq!(cfg.transcription.model_size, WhisperModelSize::Medium);
    assert_eq!(cfg.transcription.base_url, "http://localhost:8000");

    let gate = cfg.readiness_gate();
    assert_eq!(gate.max_attempts, 10);
    assert_eq!(gate.interval, Duration::from_millis(500));

    let assistant = cfg.assistant_config();
    assert_eq!(assistant.system_prompt, "You are terse.");
    assert_eq!(assistant.options.max_tokens, 2048);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_missing_file_is_configuration_error() {
    let err = tokio_test::block_on(ServicesConfig::from_yaml_file("/no/such/services.yaml"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_config_builds_clients() {
    let cfg = ServicesConfig::default();
    let generation = cfg.generation_client().unwrap();
    assert_eq!(generation.endpoint().model(), "phi3");
    let transcription = cfg.transcription_client().unwrap();
    assert_eq!(transcription.model_size(), WhisperModelSize::Base);
    assert!(!transcription.is_loaded());
}
