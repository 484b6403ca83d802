//! Cooperative cancellation of a running compile.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::semantic::error::{SemanticError, SemanticResult};

/// A cloneable cancellation handle.
///
/// Every clone observes the same flag. The rewrite and visit frameworks poll the
/// handle on each node they enter and abort with [`SemanticError::Interrupted`]
/// once it has been triggered.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Option<Arc<AtomicBool>>,
}

impl Interrupt {
    /// Creates a handle that can be triggered.
    pub fn new() -> Self {
        Self {
            flag: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Creates a handle that never fires.
    pub fn never() -> Self {
        Self { flag: None }
    }

    /// Requests cancellation. Has no effect on a [`Interrupt::never`] handle.
    pub fn trigger(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// True once [`Interrupt::trigger`] has been called on any clone.
    pub fn is_triggered(&self) -> bool {
        self.flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Fails with [`SemanticError::Interrupted`] if cancellation was requested.
    pub fn check(&self) -> SemanticResult<()> {
        if self.is_triggered() {
            Err(SemanticError::Interrupted)
        } else {
            Ok(())
        }
    }
}
