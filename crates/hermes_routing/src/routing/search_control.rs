use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::RouteError;

/// Shared cancellation flag for a route request. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    cancelled: Arc<AtomicBool>,
}

impl SearchControl {
    pub fn new() -> Self {
        SearchControl::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check(&self) -> Result<(), RouteError> {
        if self.is_cancelled() {
            Err(RouteError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let control = SearchControl::new();
        let clone = control.clone();
        assert_eq!(clone.check(), Ok(()));

        control.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.check(), Err(RouteError::Cancelled));
    }
}
