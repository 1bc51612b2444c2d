//! Common test utilities for stock-harvest integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use stock_harvest::{DataFetcher, Entity, FetchError, HarvestConfig, StockCode, WorklistProvider};

/// Fixed, ordered universe
pub struct StubWorklist {
    entities: Vec<Entity>,
}

impl StubWorklist {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn of_codes(codes: &[&str]) -> Self {
        Self::new(
            codes
                .iter()
                .map(|c| Entity::new(*c, format!("name-{c}"), market_of(c)))
                .collect(),
        )
    }
}

#[async_trait]
impl WorklistProvider for StubWorklist {
    async fn list_universe(&self) -> Result<Vec<Entity>, String> {
        Ok(self.entities.clone())
    }
}

/// Worklist that always fails to enumerate
pub struct BrokenWorklist;

#[async_trait]
impl WorklistProvider for BrokenWorklist {
    async fn list_universe(&self) -> Result<Vec<Entity>, String> {
        Err("exchange listing unavailable".to_string())
    }
}

type FetchOutcome = Result<Map<String, Value>, FetchError>;
type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Scripted fetcher: per-code attempt scripts, a deterministic default, a
/// call log, and an optional per-call hook (used to fire cancellation)
pub struct StubFetcher {
    scripts: Mutex<HashMap<String, Vec<FetchOutcome>>>,
    calls: Mutex<Vec<String>>,
    on_call: Option<CallHook>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            on_call: None,
        }
    }

    /// Script the attempt-by-attempt outcomes for one code; the last entry
    /// repeats once the script is exhausted
    pub fn script(self, code: &str, outcomes: Vec<FetchOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(code.to_string(), outcomes);
        self
    }

    /// Invoke `hook(total_calls)` at the start of every fetch
    pub fn with_call_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_call = Some(Box::new(hook));
        self
    }

    /// Codes fetched so far, in call order (one entry per attempt)
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Distinct codes fetched, in first-call order
    pub fn fetched_codes(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for code in self.calls() {
            if !seen.contains(&code) {
                seen.push(code);
            }
        }
        seen
    }
}

#[async_trait]
impl DataFetcher for StubFetcher {
    async fn fetch_record(&self, code: &StockCode) -> FetchOutcome {
        let attempt_index;
        {
            let mut calls = self.calls.lock().unwrap();
            attempt_index = calls
                .iter()
                .filter(|c| c.as_str() == code.as_str())
                .count();
            calls.push(code.to_string());
        }
        if let Some(hook) = &self.on_call {
            hook(self.calls.lock().unwrap().len());
        }

        let scripts = self.scripts.lock().unwrap();
        match scripts.get(code.as_str()) {
            Some(outcomes) => outcomes
                .get(attempt_index)
                .unwrap_or_else(|| &outcomes[outcomes.len() - 1])
                .clone(),
            None => Ok(default_fields(code)),
        }
    }
}

/// Deterministic success payload derived from the code
pub fn default_fields(code: &StockCode) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("cninfo_name".into(), json!(format!("company-{code}")));
    map.insert("cninfo_industry".into(), json!("industry"));
    map.insert("cninfo_website".into(), json!(format!("https://{code}.example.com")));
    map
}

/// Market from the code prefix, the exchange convention the original data used
pub fn market_of(code: &str) -> &'static str {
    match code.chars().next() {
        Some('6') => "sh",
        Some('0' | '2' | '3') => "sz",
        _ => "bj",
    }
}

/// Config pointing checkpoint and dataset into a scratch directory
pub fn config_in(dir: &std::path::Path) -> HarvestConfig {
    HarvestConfig {
        checkpoint_path: dir.join("checkpoint.json"),
        output_path: dir.join("dataset.json"),
        ..Default::default()
    }
}

/// Strip the per-record `update_time` so datasets from different runs compare
pub fn without_update_times(
    records: &std::collections::BTreeMap<StockCode, Value>,
) -> std::collections::BTreeMap<StockCode, Value> {
    records
        .iter()
        .map(|(code, value)| {
            let mut value = value.clone();
            if let Some(object) = value.as_object_mut() {
                object.remove("update_time");
            }
            (code.clone(), value)
        })
        .collect()
}
