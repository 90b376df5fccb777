// Copyright (c) 2017-2021 Fabian Schuiki

//! Errors raised while serializing a trace.

use std::fmt::{self, Display};

/// An error that aborts a trace pass.
///
/// All variants are fatal. A pass that failed must be restarted from scratch
/// with a fresh [`TraceSession`](crate::session::TraceSession).
#[derive(Debug)]
pub enum TraceError {
    /// An instance is nested more than one level deeper than its predecessor.
    StructuralInconsistency {
        /// The name of the offending instance.
        instance: String,
        /// The level the instance claims to be at.
        level: usize,
        /// The level of the innermost open scope, or `None` if no scope was
        /// open at the time.
        current: Option<usize>,
    },
    /// A traced signal has no value yet.
    MissingInitialValue {
        /// The local name of the signal, or `mem(i)` for a memory entry.
        signal: String,
        /// The instance owning the signal.
        instance: String,
    },
    /// A trace session was requested while another one is still active.
    ReentrantTrace,
    /// A value change was recorded at a time before the current one.
    TimeReversal {
        /// The time of the last recorded step.
        current: u64,
        /// The requested time.
        requested: u64,
    },
    /// A hierarchy snapshot could not be turned into a hierarchy.
    Snapshot(String),
    /// Writing the output failed.
    Io(std::io::Error),
}

impl Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TraceError::StructuralInconsistency {
                instance,
                level,
                current: Some(current),
            } => write!(
                f,
                "instance `{}` at level {} cannot follow a scope at level {}",
                instance, level, current
            ),
            TraceError::StructuralInconsistency {
                instance,
                level,
                current: None,
            } => write!(
                f,
                "instance `{}` at level {} cannot be opened outside of a root scope",
                instance, level
            ),
            TraceError::MissingInitialValue { signal, instance } => write!(
                f,
                "{} of module {} has no initial value",
                signal, instance
            ),
            TraceError::ReentrantTrace => {
                write!(f, "cannot trace multiple instances simultaneously")
            }
            TraceError::TimeReversal { current, requested } => write!(
                f,
                "cannot step back in time from {} to {}",
                current, requested
            ),
            TraceError::Snapshot(msg) => write!(f, "invalid snapshot: {}", msg),
            TraceError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TraceError {
    fn from(err: std::io::Error) -> TraceError {
        TraceError::Io(err)
    }
}

/// A result whose error is a [`TraceError`].
pub type Result<T> = std::result::Result<T, TraceError>;
