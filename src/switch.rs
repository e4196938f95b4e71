//! Process-wide enable/disable flag.
//!
//! The flag lives outside the rendering core; only the dispatcher consults it.

use std::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
};

/// Shared on/off state of the bot.
pub trait Switch {
    fn is_enabled(&self) -> impl Future<Output = bool> + Send;

    fn set_enabled(&self, enabled: bool) -> impl Future<Output = ()> + Send;
}

/// In-process flag.
#[derive(Debug)]
pub struct MemorySwitch {
    enabled: AtomicBool,
}

impl MemorySwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }
}

impl Default for MemorySwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Switch for MemorySwitch {
    async fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    async fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}
