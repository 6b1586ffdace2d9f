// Maman & Bébé console host
// Reads one question per line on stdin, writes one JSON answer per line on stdout.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mamanbebe_core::consultation::Consultation;
use mamanbebe_core::fs_manager::PortablePathManager;
use mamanbebe_core::{HealthProcessor, ProcessorConfig};

const RELOAD_COMMAND: &str = "/reload";
const LOG_FORMAT_ENV: &str = "MAMANBEBE_LOG_FORMAT";
const USER_ENV: &str = "MAMANBEBE_USER";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Initialize File System (Portable)
    if let Err(e) = PortablePathManager::init() {
        error!("Failed to initialize portable file system: {}", e);
    }

    let config = ProcessorConfig::from_env();
    let processor = HealthProcessor::from_config(&config);
    if processor.intent_count() == 0 {
        warn!(
            "No intents loaded from {}; every question gets the default answer",
            config.intents_path.display()
        );
    }

    let user_id = std::env::var(USER_ENV).ok();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;

        if line.trim() == RELOAD_COMMAND {
            match processor.reload_from_config_path() {
                Ok(count) => info!("Reloaded {} intents", count),
                Err(e) => error!("Reload failed, keeping current intents: {}", e),
            }
            continue;
        }

        let result = processor.process_question(Some(&line), user_id.as_deref());
        if !line.trim().is_empty() {
            let consultation = Consultation::from_result(&line, user_id.as_deref(), &result);
            if consultation.requires_escalation() {
                warn!("{}", consultation.alert_text());
            }
        }
        info!("{}", result.summary());

        let json = serde_json::to_string(&result).context("Failed to serialize answer")?;
        writeln!(out, "{}", json).context("Failed to write stdout")?;
        out.flush().context("Failed to flush stdout")?;
    }

    Ok(())
}
