//! Errors for state machine configuration and use

use std::fmt;

/// Errors produced by state machine construction and operation.
///
/// All of these indicate configuration or sequencing mistakes in the
/// embedding code; none of them occur during normal gameplay.
#[derive(Debug, Clone)]
pub enum FsmError {
    /// Two states of the same concrete type were supplied to one machine.
    DuplicateState {
        /// Offending state type
        state: &'static str,
    },
    /// A start or transition named a state type the machine does not hold.
    UnknownState {
        /// Requested state type
        state: &'static str,
    },
    /// A blackboard read on a key nothing has set.
    MissingKey {
        /// Formatted key
        key: String,
    },
    /// An operation on a machine after `destroy`.
    Destroyed {
        /// Operation that was attempted
        op: &'static str,
    },
    /// A second `start` on a machine that is already running.
    AlreadyStarted {
        /// State the machine is currently in
        current: &'static str,
    },
    /// A machine was asked for with no states registered for its owner.
    EmptyStateSet {
        /// Owner type
        owner: &'static str,
    },
}

impl fmt::Display for FsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateState { state } => {
                write!(f, "duplicate state type: {state}")
            }
            Self::UnknownState { state } => {
                write!(f, "unknown state type: {state}")
            }
            Self::MissingKey { key } => {
                write!(f, "no blackboard value for key {key}")
            }
            Self::Destroyed { op } => {
                write!(f, "{op} called on a destroyed state machine")
            }
            Self::AlreadyStarted { current } => {
                write!(f, "state machine already started, currently in {current}")
            }
            Self::EmptyStateSet { owner } => {
                write!(f, "no states registered for owner type {owner}")
            }
        }
    }
}

impl std::error::Error for FsmError {}
