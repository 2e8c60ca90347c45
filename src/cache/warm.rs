use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "cache is warm" flag.
///
/// Starts cold. The synchronizer marks it warm after the first successful rebuild;
/// query paths only read the cache while it is warm.
#[derive(Debug, Clone, Default)]
pub struct WarmState {
    warm: Arc<AtomicBool>,
}

impl WarmState {
    /// Creates a cold flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag that is already warm (for caches known to be populated).
    pub fn warm() -> Self {
        let state = Self::default();
        state.mark_warm();
        state
    }

    pub fn is_warm(&self) -> bool {
        // Acquire: pairs with the Release in mark_warm so the rebuilt set is visible.
        self.warm.load(Ordering::Acquire)
    }

    pub fn mark_warm(&self) {
        self.warm.store(true, Ordering::Release);
    }
}
