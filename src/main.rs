use std::sync::Arc;

use intake_interview::cli::CliSurface;
use intake_interview::config::InterviewConfig;
use intake_interview::interview::{InterviewSession, OfferContent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the transcript on stdout stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (config, script) = InterviewConfig::load()?;

    eprintln!("Intake Interview v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Prompts: {}", script.len());
    eprintln!("   Sections: {}", script.sections().len());
    eprintln!("   Type your answer and press Enter. /quit to exit.\n");

    let session = InterviewSession::start(Arc::new(script), &config);
    CliSurface::new(OfferContent::default(), config.respondent_name.clone())
        .run(session)
        .await?;

    Ok(())
}
