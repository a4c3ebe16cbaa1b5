//! Cooperative cancellation shared between the scan worker and its host.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A set-once stop flag.
///
/// Clones share the same flag. The engine polls it between folders, files and
/// lines, so a stop request takes effect after at most one line.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing flag, e.g. one registered with a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// The underlying flag, for handing to code that sets it directly.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let worker_side = token.clone();
        assert!(!worker_side.is_cancelled());

        token.cancel();
        assert!(worker_side.is_cancelled());
    }

    #[test]
    fn test_from_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::from_flag(Arc::clone(&flag));
        flag.store(true, Ordering::SeqCst);
        assert!(token.is_cancelled());
        assert!(token.flag().load(Ordering::SeqCst));
    }
}
