use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Per-call context carrying an optional cancellation flag.
///
/// Backends check the flag at statement boundaries; a call cancelled inside a
/// transaction rolls back and surfaces [`Error::Cancelled`].
#[derive(Clone, Debug, Default)]
pub struct Ctx {
    cancel: Option<Arc<AtomicBool>>,
}

/// Thread-safe handle that cancels the paired [`Ctx`].
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<AtomicBool>);

impl Ctx {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self { cancel: None }
    }

    pub fn cancellable() -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Self {
                cancel: Some(Arc::clone(&flag)),
            },
            CancelHandle(flag),
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_cancelled() {
        let ctx = Ctx::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.ensure_active().is_ok());
    }

    #[test]
    fn handle_cancels_all_clones() {
        let (ctx, handle) = Ctx::cancellable();
        let other = ctx.clone();
        handle.cancel();
        assert!(matches!(ctx.ensure_active(), Err(Error::Cancelled)));
        assert!(other.is_cancelled());
    }
}
