// Copyright (c) 2017-2021 Fabian Schuiki

//! Hierarchical signal tracing. This library serializes a simulation
//! hierarchy and the state of its signals into a Value Change Dump, together
//! with a Verilog stub that a testbench can build upon.

#[macro_use]
extern crate log;

pub mod code;
pub mod connectivity;
pub mod error;
pub mod hierarchy;
pub mod session;
pub mod signal;
pub mod snapshot;
pub mod stub;
pub mod value;
pub mod vcd;

pub use crate::{
    connectivity::ConnectivityRecord,
    error::{Result, TraceError},
    hierarchy::{Hierarchy, Instance},
    session::{trace_to_dir, Trace, TraceOptions, TraceSession},
    signal::{Memory, Signal, SignalKind, SignalRef},
    value::Value,
};
