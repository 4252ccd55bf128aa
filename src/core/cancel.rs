//! Cooperative cancellation for frame-driven animations.
//!
//! Every long-running animation holds a [`CancelToken`] and checks it before
//! mutating shared state. Cloning shares the flag; [`CancelToken::cancel`]
//! is idempotent.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }

    /// A fresh token for the next sequence, cancelling this one.
    pub fn renew(&mut self) -> CancelToken {
        self.cancel();
        *self = CancelToken::new();
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn renew_revokes_previous_holders() {
        let mut owner = CancelToken::new();
        let old = owner.clone();
        let fresh = owner.renew();
        assert!(old.is_cancelled());
        assert!(!fresh.is_cancelled());
        assert!(!owner.is_cancelled());
    }
}
