//! Liveness token for a mounted view.
//!
//! Requests are never cancelled mid-flight. A view instead runs them through a
//! [`ScopeHandle`]; once the view is unmounted the late result is dropped
//! instead of being applied to a page that no longer exists.

use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::debug;

#[derive(Debug)]
pub struct ViewScope {
    name: &'static str,
    alive: Arc<AtomicBool>,
}

impl ViewScope {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            name: self.name,
            alive: Arc::clone(&self.alive),
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            debug!(view = self.name, "view unmounted");
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[derive(Clone, Debug)]
pub struct ScopeHandle {
    name: &'static str,
    alive: Arc<AtomicBool>,
}

impl ScopeHandle {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Awaits `future`; returns `None` if the view went away meanwhile.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        let output = future.await;
        if self.is_alive() {
            Some(output)
        } else {
            debug!(view = self.name, "discarding result for unmounted view");
            None
        }
    }
}
