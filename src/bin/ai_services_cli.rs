//! ai-services-cli: poke at a local model server and transcription engine.
//!
//! Usage:
//!   ai-services-cli health                                   Service status roll-up
//!   ai-services-cli wait-ready [--attempts N] [--interval-ms M]
//!   ai-services-cli models                                   Installed models
//!   ai-services-cli generate <prompt> [--model <name>]       Free-form completion
//!   ai-services-cli structured <prompt> --schema <file>      Schema-constrained JSON
//!   ai-services-cli transcribe <audio-file>                  Speech to text
//!   ai-services-cli ask <audio-file>                         Transcribe, then answer

use ai_services_client::client::{GenerationOptions, StructuredGenerationRequest};
use ai_services_client::config::ServicesConfig;
use ai_services_client::facade::ServiceFacade;
use ai_services_client::structured::ResponseSchema;
use ai_services_client::transcription::AudioSource;
use ai_services_client::ReadinessGate;
use anyhow::{bail, Context};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "health" => cmd_health().await,
        "wait-ready" => cmd_wait_ready(&args[2..]).await,
        "models" => cmd_models().await,
        "generate" => cmd_generate(&args[2..]).await,
        "structured" => cmd_structured(&args[2..]).await,
        "transcribe" => cmd_transcribe(&args[2..]).await,
        "ask" => cmd_ask(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"ai-services-cli: local AI service client

USAGE:
    ai-services-cli <COMMAND> [OPTIONS]

COMMANDS:
    health                                  Probe both services and print the roll-up
    wait-ready [--attempts N] [--interval-ms M]
                                            Poll the model server until it answers
    models                                  List models installed on the model server
    generate <prompt> [--model <name>]      Free-form text completion
    structured <prompt> --schema <file>     JSON output constrained by a JSON Schema file
    transcribe <audio-file>                 Transcribe an audio file
    ask <audio-file>                        Transcribe, then answer as the assistant
    version                                 Show version information
    help                                    Show this help message

ENVIRONMENT:
    AI_SERVICES_CONFIG                      YAML config file
    OLLAMA_HOST, OLLAMA_MODEL               Model server address and default model
    AI_SERVICES_TIMEOUT_SECS                Per-call timeout for the model server
    WHISPER_URL, WHISPER_MODEL              Transcription server address and model size
    AI_SERVICES_READY_ATTEMPTS              Readiness probe budget
    AI_SERVICES_READY_INTERVAL_MS           Delay between readiness probes
    RUST_LOG                                Log filter (default: warn)"#
    );
}

fn cmd_version() {
    println!("ai-services-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Positional words, skipping `--flag value` pairs.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip = false;
    for a in args {
        if skip {
            skip = false;
        } else if a.starts_with("--") {
            skip = true;
        } else {
            out.push(a.as_str());
        }
    }
    out
}

async fn facade() -> anyhow::Result<(ServicesConfig, ServiceFacade)> {
    let cfg = ServicesConfig::load().await?;
    let facade = ServiceFacade::from_config(&cfg)?;
    Ok((cfg, facade))
}

async fn cmd_health() -> anyhow::Result<()> {
    let (cfg, facade) = facade().await?;
    let status = facade.status().await;
    println!("status:        {}", status.status);
    println!(
        "generation:    {} ({} / {})",
        up(status.generation),
        cfg.generation.base_url,
        cfg.generation.model
    );
    println!(
        "transcription: {} ({} / {})",
        up(status.transcription),
        cfg.transcription.base_url,
        cfg.transcription.model_size
    );
    Ok(())
}

fn up(ok: bool) -> &'static str {
    if ok {
        "up"
    } else {
        "down"
    }
}

async fn cmd_wait_ready(args: &[String]) -> anyhow::Result<()> {
    let (cfg, facade) = facade().await?;
    let mut gate = cfg.readiness_gate();
    if let Some(n) = flag_value(args, "--attempts") {
        gate.max_attempts = n.parse().context("--attempts must be an integer")?;
    }
    if let Some(ms) = flag_value(args, "--interval-ms") {
        gate = ReadinessGate::new(
            gate.max_attempts,
            Duration::from_millis(ms.parse().context("--interval-ms must be an integer")?),
        );
    }
    let status = facade.wait_until_ready(&gate).await;
    if !status.ready {
        bail!("model server not ready after {} attempts", status.attempts);
    }
    println!("ready after {} attempt(s)", status.attempts);
    Ok(())
}

async fn cmd_models() -> anyhow::Result<()> {
    let (_, facade) = facade().await?;
    let models = facade.generation().list_model_details().await?;
    if models.is_empty() {
        println!("(no models installed)");
    }
    for m in models {
        println!("{:<40} {:>8.1} MB", m.name, m.size as f64 / 1_048_576.0);
    }
    Ok(())
}

async fn cmd_generate(args: &[String]) -> anyhow::Result<()> {
    let prompt = positional(args).join(" ");
    if prompt.is_empty() {
        bail!("usage: ai-services-cli generate <prompt> [--model <name>]");
    }
    let (_, facade) = facade().await?;
    let mut options = GenerationOptions::default();
    if let Some(model) = flag_value(args, "--model") {
        options = options.model(model);
    }
    let text = facade.generation().generate_text(&prompt, &options).await?;
    println!("{}", text.trim());
    Ok(())
}

async fn cmd_structured(args: &[String]) -> anyhow::Result<()> {
    let prompt = positional(args).join(" ");
    let schema_path = flag_value(args, "--schema")
        .context("usage: ai-services-cli structured <prompt> --schema <file>")?;
    let raw = tokio::fs::read_to_string(schema_path)
        .await
        .with_context(|| format!("reading {}", schema_path))?;
    let doc: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", schema_path))?;
    let schema = ResponseSchema::from_json(&doc)?;

    let (_, facade) = facade().await?;
    let mut request = StructuredGenerationRequest::new(prompt, schema);
    if let Some(model) = flag_value(args, "--model") {
        request.options = request.options.model(model);
    }
    let result = facade.generation().generate_structured(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_transcribe(args: &[String]) -> anyhow::Result<()> {
    let Some(path) = positional(args).first().copied() else {
        bail!("usage: ai-services-cli transcribe <audio-file>");
    };
    let (_, facade) = facade().await?;
    let result = facade
        .transcription()
        .transcribe(&AudioSource::from_path(path))
        .await?;
    println!("{}", result.text);
    eprintln!(
        "language={} confidence={:.2} duration={:.1}s words={} took={:.2}s",
        result.language,
        result.language_confidence,
        result.duration_seconds,
        result.word_count,
        result.processing_time.as_secs_f64()
    );
    Ok(())
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let Some(path) = positional(args).first().copied() else {
        bail!("usage: ai-services-cli ask <audio-file>");
    };
    let (_, facade) = facade().await?;
    let reply = facade
        .respond_to_audio(&AudioSource::from_path(path))
        .await?;
    if !reply.user_text.is_empty() {
        println!("you:       {}", reply.user_text);
    }
    println!("assistant: {}", reply.text.trim());
    eprintln!("took {:.2}s", reply.processing_time.as_secs_f64());
    Ok(())
}
