use std::sync::atomic::{AtomicBool, Ordering};

static INSTANCE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// A loader instance is already active in this process.
///
/// This is the one fatal condition in the crate: everything else degrades,
/// double construction fails fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyInitialized;

impl std::fmt::Display for AlreadyInitialized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an asset loader is already active in this process")
    }
}

impl std::error::Error for AlreadyInitialized {}

/// Token enforcing the process-wide single-active-instance invariant.
///
/// Held by the loader for its lifetime; dropping it releases the slot so a
/// later construction can succeed.
#[derive(Debug)]
pub struct InstanceGuard(());

impl InstanceGuard {
    pub fn acquire() -> Result<Self, AlreadyInitialized> {
        if INSTANCE_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(Self(()))
        } else {
            Err(AlreadyInitialized)
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        INSTANCE_ACTIVE.store(false, Ordering::Release);
    }
}

/// Serializes tests that touch the process-wide instance slot.
#[cfg(test)]
pub(crate) static INSTANCE_TEST_LOCK: once_cell::sync::Lazy<tokio::sync::Mutex<()>> =
    once_cell::sync::Lazy::new(|| tokio::sync::Mutex::new(()));
