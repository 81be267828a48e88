//! aitext: host-side wiring for the `ai_generate_text` function.
//!
//! Loads configuration, opens the keystore, installs the default API key and
//! evaluates the function once from the command line.

mod admin;
mod config;
mod keystore;

use aitext_llm::{AiTextGenerator, GenerateTextParams, ReqwestTransport};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "aitext", version, about = "Evaluate ai_generate_text against an OpenAI endpoint")]
struct Cli {
    /// Config file (default: ~/.aitext/config.toml).
    #[arg(long, global = true, env = "AITEXT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate text for a prompt and print the result (or error string).
    Generate {
        prompt: Option<String>,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Keystore name of the API key to use for this call.
        #[arg(long)]
        api_key_secret: Option<String>,
        /// JSON object merged into the request payload.
        #[arg(long)]
        params: Option<String>,
        /// Print the request that would be sent instead of sending it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate config and report the effective defaults.
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    let cfg = config::AppConfig::load(cli.config).await?;
    let keystore = Arc::new(keystore::KeystoreSecretResolver::from_config(&cfg.keystore));

    let mut generator = AiTextGenerator::new(
        cfg.ai.clone(),
        keystore.clone(),
        Arc::new(ReqwestTransport::new(cfg.ai.connection_timeout())),
    );
    let key_source = admin::install_default_api_key(
        &mut generator,
        keystore.as_ref(),
        std::env::var(admin::OPERATOR_API_KEY_ENV).ok(),
    )
    .await?;
    let generator = Arc::new(generator);

    match cli.command {
        Command::Generate {
            prompt,
            endpoint,
            model,
            api_key_secret,
            params,
            dry_run,
        } => {
            let params = GenerateTextParams {
                endpoint,
                prompt,
                model,
                api_key_secret,
                params,
            };
            let out = if dry_run {
                generator.generate_text_dry_run(&params).await
            } else {
                generator.generate_text(&params).await
            };
            println!("{out}");
            Ok(())
        }
        Command::Doctor => {
            let ai = generator.config();
            println!("endpoint={}", display_or_unset(&ai.endpoint));
            println!("model={}", display_or_unset(&ai.model));
            println!("connection_timeout_s={}", ai.connection_timeout_s);
            println!(
                "api_key_secret={}",
                ai.api_key_secret.as_deref().unwrap_or("<unset>")
            );
            let source = match &key_source {
                admin::DefaultKeySource::Operator => admin::OPERATOR_API_KEY_ENV.to_string(),
                admin::DefaultKeySource::Keystore(name) => format!("keystore:{name}"),
                admin::DefaultKeySource::Unset => "<unset>".to_string(),
            };
            println!("default_api_key={source}");
            if ai.endpoint.is_empty() {
                println!("warning: no default endpoint; every call must pass --endpoint");
            }
            if let Some(warning) = cfg.endpoint_warning() {
                println!("warning: {warning}");
            }
            Ok(())
        }
    }
}

fn display_or_unset(v: &str) -> &str {
    if v.is_empty() { "<unset>" } else { v }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("info,aitext=debug,aitext_app=debug,aitext_llm=debug"),
    };
    let log_format = std::env::var("AITEXT_LOG_FORMAT")
        .unwrap_or_else(|_| "json".to_string())
        .to_ascii_lowercase();

    // Logs go to stderr; stdout carries the function result.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported AITEXT_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_command_parses_all_arguments() {
        let cli = Cli::try_parse_from([
            "aitext",
            "--config",
            "/tmp/aitext.toml",
            "generate",
            "hello",
            "--endpoint",
            "https://api.openai.com/v1/chat/completions",
            "--model",
            "gpt-4o",
            "--api-key-secret",
            "team-key",
            "--params",
            r#"{"temperature":0.2}"#,
            "--dry-run",
        ])
        .expect("cli parses");

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/aitext.toml")));
        match cli.command {
            Command::Generate {
                prompt,
                model,
                api_key_secret,
                params,
                dry_run,
                ..
            } => {
                assert_eq!(prompt.as_deref(), Some("hello"));
                assert_eq!(model.as_deref(), Some("gpt-4o"));
                assert_eq!(api_key_secret.as_deref(), Some("team-key"));
                assert_eq!(params.as_deref(), Some(r#"{"temperature":0.2}"#));
                assert!(dry_run);
            }
            Command::Doctor => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_prompt_is_optional() {
        let cli = Cli::try_parse_from(["aitext", "generate"]).expect("cli parses");
        assert!(matches!(
            cli.command,
            Command::Generate { prompt: None, dry_run: false, .. }
        ));
    }

    #[test]
    fn panic_payloads_are_stringified() {
        assert_eq!(panic_payload_to_string(&"boom"), "boom");
        assert_eq!(panic_payload_to_string(&"boom".to_string()), "boom");
        assert_eq!(panic_payload_to_string(&42_u8), "non-string panic payload");
    }
}
