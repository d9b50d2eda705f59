//! Ask command handler.
//!
//! Answers a question against a knowledge base through the fallback chain.

use clap::Args;
use kbchat_core::{config::AppConfig, AppResult};
use kbchat_knowledge::{build_orchestrator, ChatAnswer};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Ask a question grounded in a knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Knowledge base id
    #[arg(short, long, env = "KBCHAT_KNOWLEDGE_BASE")]
    pub knowledge_base: String,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip the composite retrieve-and-generate strategy
    #[arg(long)]
    pub no_composite: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let mut config = config.clone();
        if self.no_composite {
            config.retrieval.composite = false;
        }

        let orchestrator = build_orchestrator(&config).await?;

        let cancel = CancellationToken::new();
        let watcher = watch_for_cancel(cancel.clone(), self.timeout.map(Duration::from_secs));

        let result = orchestrator
            .answer_detailed(&self.question, &self.knowledge_base, &cancel)
            .await;
        watcher.abort();

        let answer = result?;

        tracing::debug!(
            strategy = %answer.strategy,
            sources = answer.sources.len(),
            failures = answer.failures.len(),
            "Answer ready"
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            print_answer(&answer);
        }

        Ok(())
    }
}

fn print_answer(answer: &ChatAnswer) {
    println!("{}", answer.answer);

    if answer.sources.is_empty() {
        return;
    }

    println!();
    println!("Sources:");
    for (i, passage) in answer.sources.iter().enumerate() {
        let location = passage
            .location
            .clone()
            .unwrap_or_else(|| format!("result {}", passage.source_index + 1));
        println!("- [{}] {}", i + 1, location);
    }
}

/// Cancel `token` on Ctrl-C or once `timeout` elapses.
fn watch_for_cancel(token: CancellationToken, timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, cancelling request");
            }
            _ = deadline => {
                tracing::warn!(timeout_secs = timeout.map(|t| t.as_secs()), "Request timed out, cancelling");
            }
        }

        token.cancel();
    })
}
