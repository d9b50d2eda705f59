//! Bases command handler.
//!
//! Lists the knowledge bases the configured credentials can see.

use clap::Args;
use kbchat_core::{config::AppConfig, AppResult};
use kbchat_knowledge::build_catalog;

/// List available knowledge bases
#[derive(Args, Debug)]
pub struct BasesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BasesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Listing knowledge bases");

        let catalog = build_catalog(config).await?;
        let bases = catalog.list_knowledge_bases().await?;

        tracing::debug!(count = bases.len(), "Knowledge bases listed");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&bases)?);
            return Ok(());
        }

        if bases.is_empty() {
            println!("No knowledge bases found");
            return Ok(());
        }

        for base in &bases {
            let mut line = base.id.clone();
            if base.name != base.id {
                line.push_str(&format!("  {}", base.name));
            }
            if let Some(status) = &base.status {
                line.push_str(&format!("  [{}]", status));
            }
            println!("{}", line);
        }

        Ok(())
    }
}
