use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One drawing surface's claim on "the current pass".
///
/// Beginning a pass bumps the generation, which invalidates every token
/// handed out before it.
#[derive(Clone, Debug, Default)]
pub struct PassSlot {
    generation: Arc<AtomicU64>,
}

/// Handle held by a pass; valid until its slot begins another pass.
#[derive(Clone, Debug)]
pub struct PassToken {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl PassSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede any in-flight pass and issue the token for the next one.
    pub fn begin(&self) -> PassToken {
        let issued = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        PassToken {
            generation: Arc::clone(&self.generation),
            issued,
        }
    }

    /// Invalidate the current pass without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl PassToken {
    /// A token not bound to any shared slot; never superseded.
    pub fn detached() -> Self {
        PassSlot::new().begin()
    }

    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.issued
    }

    pub fn generation(&self) -> u64 {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pass_supersedes_old() {
        let slot = PassSlot::new();
        let first = slot.begin();
        assert!(first.is_current());

        let second = slot.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.generation(), first.generation() + 1);
    }

    #[test]
    fn test_cancel_invalidates_without_replacement() {
        let slot = PassSlot::new();
        let token = slot.begin();
        slot.cancel();
        assert!(!token.is_current());
    }

    #[test]
    fn test_clones_share_generation() {
        let slot = PassSlot::new();
        let host_copy = slot.clone();
        let token = slot.begin();
        host_copy.begin();
        assert!(!token.is_current());
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn test_detached_token_stays_current() {
        let token = PassToken::detached();
        assert!(token.is_current());
    }
}
