use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use dictamen::catalog::ReferenceData;
use dictamen::config::{self, LlmConfig};
use dictamen::pipeline::{ChatClient, ReportGenerator};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let data = match std::env::var_os("DICTAMEN_DATA_DIR") {
        Some(dir) => ReferenceData::load_dir(&PathBuf::from(dir))?,
        None => ReferenceData::builtin(),
    };

    let dictation = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let llm = LlmConfig::from_env();
    let generator = match ChatClient::from_config(&llm) {
        Some(client) => {
            info!(model = %llm.model, "external classifier enabled");
            ReportGenerator::with_fallback(data, Box::new(client))
        }
        None => ReportGenerator::new(data),
    };

    let report = generator.generate(&dictation)?;
    println!("{report}");
    Ok(())
}
