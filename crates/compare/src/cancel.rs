use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Shared cancel flag. Clones observe the same flag; set it from any thread
/// to stop a running comparison.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The caller's token fired.
    Token,
    /// The run exceeded its deadline.
    Deadline,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token => write!(f, "cancelled"),
            Self::Deadline => write!(f, "deadline exceeded"),
        }
    }
}

/// Token plus optional wall-clock deadline, checked between units of work.
#[derive(Debug, Clone)]
pub struct Cancellation {
    token: CancelToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Start the clock now; `budget` of `None` means no deadline.
    pub fn start(token: CancelToken, budget: Option<Duration>) -> Self {
        Self {
            token,
            deadline: budget.map(|b| Instant::now() + b),
        }
    }

    /// Never fires.
    pub fn none() -> Self {
        Self::start(CancelToken::new(), None)
    }

    pub fn check(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Token);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::Deadline),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn token_wins_over_deadline() {
        let token = CancelToken::new();
        token.cancel();
        let c = Cancellation::start(token, Some(Duration::ZERO));
        assert_eq!(c.check(), Some(CancelReason::Token));
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let c = Cancellation::start(CancelToken::new(), Some(Duration::ZERO));
        assert_eq!(c.check(), Some(CancelReason::Deadline));
    }

    #[test]
    fn no_budget_never_fires() {
        assert_eq!(Cancellation::none().check(), None);
    }
}
