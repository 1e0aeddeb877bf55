//! Confirmation capability for destructive operations.
//!
//! Removing a service or server requires an explicit confirmation
//! before any request is issued. The gate is injected into the
//! [`Controller`](crate::Controller) so interactive frontends can
//! prompt and tests can decide deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A yes/no decision point consulted before destructive operations.
///
/// Returning `false` aborts the operation with zero backend requests
/// and zero state change.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Gate that approves everything — non-interactive contexts (`--yes`).
#[derive(Debug, Default)]
pub struct AssumeYes;

impl ConfirmGate for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Gate that declines everything and counts how often it was asked.
/// Test double for verifying the zero-requests contract.
#[derive(Debug, Default)]
pub struct DenyAll {
    asked: AtomicUsize,
}

impl DenyAll {
    /// Number of times the gate has been consulted.
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl ConfirmGate for DenyAll {
    fn confirm(&self, _prompt: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        false
    }
}

/// Any `Fn(&str) -> bool` closure works as a gate.
impl<F> ConfirmGate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
