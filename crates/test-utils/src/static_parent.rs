use std::sync::Arc;

use checkrun::dashboard::{
    completion_channel, CompletionReceiver, CompletionSender, DashboardNodeRun, DashboardParent,
};

/// Minimal parent node: a completion channel and nothing else.
///
/// Tests drain the receiver themselves to check how many signals arrived.
pub struct StaticParent {
    tx: CompletionSender,
    rx: CompletionReceiver,
}

impl StaticParent {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = completion_channel(capacity);
        Self { tx, rx }
    }

    /// Everything pushed so far, without waiting.
    pub fn drain_now(&mut self) -> Vec<Arc<dyn DashboardNodeRun>> {
        let mut received = Vec::new();
        while let Ok(run) = self.rx.try_recv() {
            received.push(run);
        }
        received
    }

    /// Wait for exactly `n` signals.
    pub async fn recv_n(&mut self, n: usize) -> Vec<Arc<dyn DashboardNodeRun>> {
        let mut received = Vec::with_capacity(n);
        while received.len() < n {
            match self.rx.recv().await {
                Some(run) => received.push(run),
                None => break,
            }
        }
        received
    }
}

impl DashboardParent for StaticParent {
    fn child_complete_tx(&self) -> CompletionSender {
        self.tx.clone()
    }
}
