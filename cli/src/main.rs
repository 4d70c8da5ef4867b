//! CLI for the readme-sync bot.
//!
//! `serve` runs the webhook endpoint; `sync` runs the pipeline once for a
//! single pull request with CI-style exit codes.

mod serve;

use clap::{Parser, Subcommand};
use octocrab::Octocrab;
use readme_sync::{
    AnalysisClient, ClientCache, RepoClient, SignatureVerifier, SyncOutcome, SyncRequest,
    SyncTrigger, Syncer,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// readme-sync - Keep READMEs in step with pull-request changes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GitHub token (App installation token or PAT).
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,

    /// Path to the LLM config file.
    #[arg(long, env = "README_SYNC_LLM_CONFIG", default_value = "config.toml")]
    llm_config_path: PathBuf,

    /// Post suggestions as a comment instead of committing.
    #[arg(long)]
    comment_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook endpoint.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Webhook signing secret. Required: deliveries without a valid
        /// signature are rejected.
        #[arg(long, env = "README_SYNC_WEBHOOK_SECRET")]
        webhook_secret: String,
    },

    /// Analyze and sync a single pull request.
    ///
    /// Exits 0 when the README is already in step, 1 when updates were
    /// needed, 2 on failure.
    Sync {
        /// Base repository owner.
        #[arg(long)]
        owner: String,

        /// Base repository name.
        #[arg(long)]
        repo: String,

        /// Pull request number.
        #[arg(long)]
        pr: u64,

        /// Run the apply path: commit without posting a fresh status
        /// comment.
        #[arg(long)]
        apply: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Compact single-line output; log level via `RUST_LOG`, defaulting to
/// "info".
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let octocrab = Octocrab::builder()
        .personal_token(args.token.clone())
        .build()?;
    let analyzer = AnalysisClient::from_config_path(&args.llm_config_path)?;

    match args.command {
        Command::Serve {
            bind,
            webhook_secret,
        } => {
            // A missing or empty secret is a configuration error, never a
            // silent verification bypass.
            let verifier = SignatureVerifier::new(webhook_secret)?;
            let state = serve::AppState {
                cache: ClientCache::new(octocrab),
                analyzer,
                verifier,
                auto_commit: !args.comment_only,
            };
            serve::serve(bind, state).await?;
            Ok(ExitCode::from(0))
        }
        Command::Sync {
            owner,
            repo,
            pr,
            apply,
        } => {
            let syncer = Syncer::new(RepoClient::new(octocrab), analyzer, !args.comment_only);
            let request = SyncRequest {
                owner,
                repo,
                number: pr,
                head: None,
                installation_id: None,
                trigger: if apply {
                    SyncTrigger::ApplyCommand
                } else {
                    SyncTrigger::PullRequestUpdate
                },
            };
            let outcome = syncer.run(&request).await?;
            print_outcome(&outcome);
            Ok(exit_code(&outcome))
        }
    }
}

/// Prints a human summary of a one-shot run.
fn print_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::UpToDate { diagnostic } => {
            println!("README is up to date.");
            if let Some(diagnostic) = diagnostic {
                println!("  (analysis degraded: {diagnostic})");
            }
        }
        SyncOutcome::Reported { suggestions } => {
            println!("{suggestions} suggestion(s) posted; committing is disabled.");
        }
        SyncOutcome::Unchanged { suggestions } => {
            println!("{suggestions} suggestion(s) merged to no textual change; nothing committed.");
        }
        SyncOutcome::Committed(commit) => {
            println!(
                "README updated in {} ({} suggestion(s) applied).",
                commit.sha, commit.suggestions_applied
            );
        }
    }
}

/// Exit 1 whenever updates were needed, so CI runs surface the drift.
fn exit_code(outcome: &SyncOutcome) -> ExitCode {
    match outcome {
        SyncOutcome::UpToDate { .. } | SyncOutcome::Unchanged { .. } => ExitCode::from(0),
        SyncOutcome::Reported { .. } | SyncOutcome::Committed(_) => ExitCode::from(1),
    }
}
