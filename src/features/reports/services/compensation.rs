use futures::future::BoxFuture;
use tracing::info;

/// Undo actions for a partially completed submission.
///
/// Each write step pushes its undo before the next step runs. On failure the
/// recorded steps run newest first, so the submission leaves nothing behind.
pub struct Compensations {
    steps: Vec<(&'static str, BoxFuture<'static, ()>)>,
}

impl Compensations {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, label: &'static str, undo: BoxFuture<'static, ()>) {
        self.steps.push((label, undo));
    }

    /// Run every recorded undo step in reverse order.
    ///
    /// Undo steps handle their own errors; a failed rollback is logged by the
    /// step itself and must not stop the remaining ones.
    pub async fn run(mut self) {
        while let Some((label, undo)) = self.steps.pop() {
            info!("Rolling back: {}", label);
            undo.await;
        }
    }
}

impl Default for Compensations {
    fn default() -> Self {
        Self::new()
    }
}
