//! Command line surface of the `leadflow` binary

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use leadflow_domain::{HistoryQuery, LeadFlowError, LeadQuery, LeadStatus, Result, StatusFilter};
use serde::Serialize;
use serde_json::{json, Value};

use crate::commands;
use crate::context::AppContext;

#[derive(Debug, Parser)]
#[command(name = "leadflow", version, about = "Upload, deduplicate and dispatch lead spreadsheets")]
pub struct Cli {
    /// Config file (TOML or JSON). Without it the usual locations are probed.
    #[arg(long, global = true, env = "LEADFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List products and their filter rules
    Products {
        /// Include inactive products
        #[arg(long)]
        all: bool,
    },
    /// Upload a spreadsheet (.xls, .xlsx or .html) for a product
    Upload {
        #[arg(long = "product")]
        product_id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Deduplicate and filter a batch (defaults to the current batch)
    Process { batch_id: Option<String> },
    /// Dispatch the valid leads of a batch (defaults to the current batch)
    Send { batch_id: Option<String> },
    /// Upload, process and send in one step
    Run {
        #[arg(long = "product")]
        product_id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// List registered batches
    Batches {
        /// all, uploaded, processed or sent
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long)]
        product: Option<String>,
    },
    /// Make a batch the current one
    Select { batch_id: String },
    /// Forget a batch locally
    Remove { batch_id: String },
    /// Forget every batch locally
    Clear,
    /// Server-side counts for a batch
    Summary { batch_id: String },
    /// Leads of a batch
    Leads {
        batch_id: String,
        /// pending, processed, sent, error, duplicate or filtered
        #[arg(long)]
        status: Option<LeadStatus>,
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = LeadQuery::default().limit)]
        limit: u64,
    },
    /// Candidates already dispatched to the CRM
    History {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = HistoryQuery::default().limit)]
        limit: u64,
    },
}

/// Run one command and render its result as JSON.
pub async fn execute(ctx: &AppContext, command: Command) -> Result<Value> {
    match command {
        Command::Products { all } => to_json(&commands::list_products(ctx, !all).await?),
        Command::Upload { product_id, file } => {
            to_json(&commands::upload_file(ctx, &product_id, &file).await?)
        }
        Command::Process { batch_id } => {
            to_json(&commands::process_batch(ctx, batch_id.as_deref()).await?)
        }
        Command::Send { batch_id } => to_json(&commands::send_batch(ctx, batch_id.as_deref()).await?),
        Command::Run { product_id, file } => {
            to_json(&commands::run_pipeline(ctx, &product_id, &file).await?)
        }
        Command::Batches { status, product } => {
            to_json(&commands::list_batches(ctx, status, product.as_deref()))
        }
        Command::Select { batch_id } => to_json(&commands::select_batch(ctx, &batch_id)?),
        Command::Remove { batch_id } => to_json(&commands::remove_batch(ctx, &batch_id)?),
        Command::Clear => Ok(json!({ "removed": commands::clear_batches(ctx) })),
        Command::Summary { batch_id } => to_json(&commands::batch_summary(ctx, &batch_id).await?),
        Command::Leads { batch_id, status, skip, limit } => {
            let query = LeadQuery { status, skip, limit };
            to_json(&commands::batch_leads(ctx, &batch_id, query).await?)
        }
        Command::History { skip, limit } => {
            to_json(&commands::dispatch_history(ctx, HistoryQuery { skip, limit }).await?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| LeadFlowError::Internal(format!("render output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lead_listing_flags() {
        let cli = Cli::try_parse_from([
            "leadflow", "leads", "a1b2", "--status", "DUPLICATE", "--limit", "25",
        ])
        .unwrap();

        match cli.command {
            Command::Leads { batch_id, status, skip, limit } => {
                assert_eq!(batch_id, "a1b2");
                assert_eq!(status, Some(LeadStatus::Duplicate));
                assert_eq!(skip, 0);
                assert_eq!(limit, 25);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn batches_defaults_to_every_status() {
        let cli = Cli::try_parse_from(["leadflow", "batches"]).unwrap();
        assert!(matches!(cli.command, Command::Batches { status: StatusFilter::All, product: None }));
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["leadflow", "batches", "--status", "queued"]).is_err());
    }

    #[test]
    fn upload_takes_product_and_file_flags() {
        let cli =
            Cli::try_parse_from(["leadflow", "upload", "--product", "65a1", "--file", "leads.xlsx"])
                .unwrap();
        match cli.command {
            Command::Upload { product_id, file } => {
                assert_eq!(product_id, "65a1");
                assert_eq!(file, PathBuf::from("leads.xlsx"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn process_batch_id_is_optional() {
        let cli = Cli::try_parse_from(["leadflow", "process"]).unwrap();
        assert!(matches!(cli.command, Command::Process { batch_id: None }));
    }
}
