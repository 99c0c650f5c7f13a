//! encore-billing - pending redirect maintenance.
//!
//! Lists, resumes and discards the redirect checkpoints the client left
//! behind when a listener went to the provider's approval page. Resuming
//! runs the same return step the client runs on app start.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use encore_billing::adapters::checkpoint::FileCheckpointStore;
use encore_billing::adapters::gateways::OrderSubscriptionAdapter;
use encore_billing::adapters::rest::{RestBackendConfig, RestPaymentBackend};
use encore_billing::application::{
    OrchestratorConfig, PaymentOrchestrator, ReconciliationStore, ResumeOutcome, UserNotice,
};
use encore_billing::config::AppConfig;
use encore_billing::ports::{PaymentError, RedirectNavigator};

/// Command-line arguments for encore-billing
#[derive(Parser, Debug)]
#[command(name = "encore-billing")]
#[command(about = "Inspect and complete pending payment redirects")]
#[command(version)]
struct Args {
    /// Emit logs as JSON
    #[arg(long, env = "ENCORE_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List checkpoints awaiting a provider return
    Pending,

    /// Run the return step for one checkpoint
    Resume {
        /// Provider order or subscription id from the return URL
        provider_ref: String,
    },

    /// Remove a checkpoint the listener abandoned
    Discard { provider_ref: String },
}

/// Prints the approval URL instead of opening a browser.
struct PrintNavigator;

#[async_trait]
impl RedirectNavigator for PrintNavigator {
    async fn navigate(&self, url: &str) -> Result<(), PaymentError> {
        println!("Approve the payment at {}", url);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let orchestrator = build_orchestrator(&config)?;

    match args.command {
        Command::Pending => {
            let pending = orchestrator.pending_redirects()?;
            if pending.is_empty() {
                println!("No pending redirects.");
            }
            for checkpoint in pending {
                let cycle = checkpoint
                    .cycle
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    checkpoint.key(),
                    checkpoint.subject,
                    checkpoint.price,
                    cycle,
                    checkpoint.created_at.as_datetime().to_rfc3339()
                );
            }
        }
        Command::Resume { provider_ref } => {
            let outcome = orchestrator
                .resume_redirect(&provider_ref)
                .await
                .with_context(|| format!("Failed to resume {}", provider_ref))?;
            match outcome {
                ResumeOutcome::NothingPending => println!("Nothing pending for {}.", provider_ref),
                ResumeOutcome::Resumed(report) if report.succeeded() => {
                    println!("{} completed for {}.", provider_ref, report.subject)
                }
                ResumeOutcome::Resumed(report) => {
                    let message = report
                        .notice()
                        .map(|notice: UserNotice| notice.message)
                        .unwrap_or_else(|| format!("{:?}", report.state));
                    println!("{} not completed: {}", provider_ref, message);
                }
            }
        }
        Command::Discard { provider_ref } => {
            if orchestrator.discard_redirect(&provider_ref).await? {
                println!("Discarded {}.", provider_ref);
            } else {
                println!("Nothing pending for {}.", provider_ref);
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "encore_billing=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_orchestrator(config: &AppConfig) -> Result<PaymentOrchestrator> {
    let mut backend_config = RestBackendConfig::new(config.backend.base_url.clone())
        .with_timeout(config.backend.request_timeout());
    if let Some(token) = &config.backend.api_token {
        backend_config = backend_config.with_api_token(token.clone());
    }
    let backend = Arc::new(RestPaymentBackend::new(backend_config).context("Failed to build backend client")?);

    let checkpoints = Arc::new(
        FileCheckpointStore::open(config.storage.checkpoint_dir.clone())
            .context("Failed to open checkpoint directory")?,
    );
    info!(dir = %config.storage.checkpoint_dir.display(), "Checkpoint store opened");

    let reconciliation = Arc::new(ReconciliationStore::new(backend.clone()));
    let redirect = OrderSubscriptionAdapter::new(
        backend.clone(),
        Arc::new(PrintNavigator),
        config.gateways.redirect_client_id.clone(),
        config.gateways.return_url.clone(),
    );

    Ok(PaymentOrchestrator::new(
        backend,
        checkpoints,
        reconciliation,
        OrchestratorConfig::from(&config.orchestrator),
    )
    .with_adapter(Arc::new(redirect)))
}
