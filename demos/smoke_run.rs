//! Smoke-run demo
//!
//! Drives the batch harvester against a simulated provider:
//! - a fixed 40-code universe
//! - a fetcher that randomly times out or returns empty data
//! - Ctrl-C wired to the cancellation token for a graceful interrupt
//!
//! Run with: cargo run --example smoke_run

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value, json};
use std::process::ExitCode;
use stock_harvest::{
    BatchHarvester, DataFetcher, Entity, FetchError, HarvestConfig, RunOutcome, StockCode,
    WorklistProvider,
};
use tokio_util::sync::CancellationToken;

struct SimulatedExchange;

#[async_trait]
impl WorklistProvider for SimulatedExchange {
    async fn list_universe(&self) -> Result<Vec<Entity>, String> {
        Ok((0..40)
            .map(|i| {
                let code = format!("{:06}", 600000 + i);
                Entity::new(code.as_str(), format!("Company {i}"), "sh")
            })
            .collect())
    }
}

struct FlakyFetcher;

#[async_trait]
impl DataFetcher for FlakyFetcher {
    async fn fetch_record(&self, code: &StockCode) -> Result<Map<String, Value>, FetchError> {
        let roll: f64 = rand::thread_rng().r#gen();
        if roll < 0.1 {
            return Err(FetchError::timeout("simulated read timeout"));
        }
        if roll < 0.15 {
            return Ok(Map::new());
        }
        let mut fields = Map::new();
        fields.insert("cninfo_name".into(), json!(format!("Company {code} Ltd.")));
        fields.insert("cninfo_industry".into(), json!("manufacturing"));
        fields.insert("cninfo_list_date".into(), json!("2010-01-01"));
        Ok(fields)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = HarvestConfig {
        base_delay_secs: 0.2,
        floor_delay_secs: 0.05,
        max_delay_secs: 2.0,
        checkpoint_path: "./demo_checkpoint.json".into(),
        output_path: "./demo_dataset.json".into(),
        test_subset: Some(5),
        ..Default::default()
    };

    let mut harvester = match BatchHarvester::new(config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("bad configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\ninterrupt requested, finishing current entity...");
            signal_token.cancel();
        }
    });

    match harvester.run(&SimulatedExchange, &FlakyFetcher, &cancel).await {
        Ok(report) => {
            println!("{}", report.summary);
            match report.outcome {
                RunOutcome::Completed => ExitCode::SUCCESS,
                RunOutcome::Interrupted => {
                    println!("interrupted; re-run to resume from the checkpoint");
                    ExitCode::from(130)
                }
            }
        }
        Err(e) => {
            eprintln!("run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
