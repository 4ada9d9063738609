use std::collections::HashMap;
use std::sync::Arc;
use lazy_static::lazy_static;
use parking_lot::Mutex;

pub const RPC_REQUESTS: &str = "rpc_requests";
pub const BLOCKS_MINED: &str = "blocks_mined";
pub const TRANSACTIONS_MINED: &str = "transactions_mined";
pub const RECEIPT_POLLS: &str = "receipt_polls";

/// Process-wide counters (simple, Prometheus-style)
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        self.add_counter(name, 1);
    }

    pub fn add_counter(&self, name: &str, by: u64) {
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.lock().clone()
    }
}

lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}
