// Screen lifetime - async results that land after a screen is dismissed must be dropped

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "still mounted" flag. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct ScreenLifetime {
    alive: Arc<AtomicBool>,
}

impl ScreenLifetime {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Irreversible; later state updates are suppressed
    pub fn dismiss(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Dismisses the lifetime when the returned guard is dropped
    pub fn guard(&self) -> DismissGuard {
        DismissGuard {
            lifetime: self.clone(),
        }
    }
}

impl Default for ScreenLifetime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct DismissGuard {
    lifetime: ScreenLifetime,
}

impl Drop for DismissGuard {
    fn drop(&mut self) {
        self.lifetime.dismiss();
    }
}
