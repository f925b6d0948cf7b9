//! Shared node state for HTTP handlers.

use arcpool_ledger::PoolService;
use std::time::Instant;

pub struct NodeState {
    pub service: PoolService,
    /// When the node started.
    pub start_time: Instant,
}

impl NodeState {
    pub fn new(service: PoolService) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}
