use crate::rpc_manager::LedgerRpc;
use std::sync::Arc;

/// Where a confirm call sends the signed bytes.
///
/// The primary submitter's results are inspected on every tick; fan-out
/// endpoints get one fire-and-forget submission each.
#[derive(Debug, Clone, Default)]
pub struct BroadcastPlan {
    /// Primary submitter; `None` means the engine's own ledger
    pub primary: Option<Arc<dyn LedgerRpc>>,
    pub fanout: Vec<Arc<dyn LedgerRpc>>,
    /// Fail fast when the very first primary submission is refused
    pub require_initial_accept: bool,
}

impl BroadcastPlan {
    /// Submit to the engine's own ledger only
    pub fn direct() -> Self {
        Self::default()
    }

    /// Submit to the engine's ledger and fire one copy at each extra endpoint
    pub fn with_fanout(fanout: Vec<Arc<dyn LedgerRpc>>) -> Self {
        Self {
            fanout,
            ..Self::default()
        }
    }

    /// Resubmit through a relay; confirmation is still polled on the engine's ledger
    pub fn relay(relay: Arc<dyn LedgerRpc>) -> Self {
        Self {
            primary: Some(relay),
            fanout: Vec::new(),
            require_initial_accept: true,
        }
    }
}
