//! Shutdown coordination.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Holds the root cancellation token; request tokens handed out by the
/// render middleware are its children.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root token, for `RenderState::with_shutdown`.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// A token cancelled with the root.
    pub fn child(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("shutdown triggered");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`trigger`](Self::trigger) was called.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_children() {
        let shutdown = Shutdown::new();
        let child = shutdown.child();
        assert!(!child.is_cancelled());

        shutdown.trigger();
        shutdown.triggered().await;
        assert!(shutdown.is_triggered());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_leaves_root() {
        let shutdown = Shutdown::new();
        shutdown.child().cancel();
        assert!(!shutdown.is_triggered());
    }
}
