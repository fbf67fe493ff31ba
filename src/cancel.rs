//! Cooperative cancellation shared by the fetcher and the summarizer.
//!
//! Checked before every external call; in-flight HTTP calls are bounded by
//! their agent timeouts instead of being interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{RcaError, RcaResult};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has fired.
    pub fn check(&self) -> RcaResult<()> {
        if self.is_cancelled() {
            Err(RcaError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Fire the token on SIGINT (and SIGTERM on unix).
    pub fn register_signals(&self) -> std::io::Result<()> {
        signal_hook::flag::register(signal_hook::consts::SIGINT, self.flag.clone())?;
        #[cfg(unix)]
        signal_hook::flag::register(signal_hook::consts::SIGTERM, self.flag.clone())?;
        Ok(())
    }
}
