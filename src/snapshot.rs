// Copyright (c) 2017-2021 Fabian Schuiki

//! Hierarchy snapshots
//!
//! A snapshot is a JSON description of a simulation hierarchy at the point
//! tracing starts. Signals are listed once in a table and referred to by id
//! from the instances, which allows the same signal to appear in several
//! instances under different names.
//!
//! ```json
//! {
//!   "signals": {
//!     "clk": { "width": 1, "value": { "int": 0 } },
//!     "d": { "width": 8, "value": { "int": 5 } },
//!     "acc": { "width": 96, "value": { "int": "0x8000_0000_0000_0000_0000" } }
//!   },
//!   "instances": [
//!     { "name": "top", "level": 0, "signals": [["clk", "clk"]] },
//!     { "name": "sub", "level": 1, "signals": [["d", "d"], ["clock", "clk"], ["acc", "acc"]] }
//!   ]
//! }
//! ```

use crate::{
    connectivity::ConnectivityRecord,
    error::{Result, TraceError},
    hierarchy::{Hierarchy, Instance},
    signal::{Memory, Signal, SignalRef},
    stub::Interface,
    value::Value,
};
use num::BigUint;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A serialized hierarchy.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    /// The name of the traced design.
    #[serde(default)]
    pub name: Option<String>,
    /// The signal table.
    pub signals: BTreeMap<String, SignalSpec>,
    /// The instances in pre-order.
    pub instances: Vec<InstanceSpec>,
    /// Known sub-instance call sites of the top-level design.
    #[serde(default)]
    pub connectivity: Vec<ConnectivityRecord>,
    /// The interface of the top-level design.
    #[serde(default)]
    pub interface: Option<Interface>,
}

/// A serialized signal.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalSpec {
    /// The width in bits; zero for non-vector signals.
    #[serde(default)]
    pub width: usize,
    /// The kind of signal.
    #[serde(default)]
    pub kind: SignalKindSpec,
    /// The current value; the undriven value for tri-state buses.
    #[serde(default)]
    pub value: Option<ValueSpec>,
    /// The bus driven by a tri-state driver.
    #[serde(default)]
    pub bus: Option<String>,
}

/// The kind of a serialized signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKindSpec {
    /// See [`SignalKind::Plain`](crate::signal::SignalKind::Plain).
    Plain,
    /// See [`SignalKind::Tristate`](crate::signal::SignalKind::Tristate).
    Tristate,
    /// See [`SignalKind::Driver`](crate::signal::SignalKind::Driver).
    Driver,
}

impl Default for SignalKindSpec {
    fn default() -> Self {
        SignalKindSpec::Plain
    }
}

/// A serialized value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSpec {
    /// An unsigned integer.
    Int(IntSpec),
    /// An enumerated symbol.
    Enum(String),
    /// A real number.
    Real(f64),
}

/// A serialized unsigned integer.
///
/// Values wider than 64 bits are given as strings, either decimal or with a
/// `0x` or `0b` prefix. Underscores are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IntSpec {
    /// A JSON number.
    Number(u64),
    /// A string of digits.
    Digits(String),
}

impl IntSpec {
    /// Parse the integer.
    pub fn to_biguint(&self) -> Result<BigUint> {
        match self {
            IntSpec::Number(v) => Ok((*v).into()),
            IntSpec::Digits(text) => {
                let digits: String = text.chars().filter(|&c| c != '_').collect();
                let (digits, radix) = if digits.starts_with("0x") || digits.starts_with("0X") {
                    (&digits[2..], 16)
                } else if digits.starts_with("0b") || digits.starts_with("0B") {
                    (&digits[2..], 2)
                } else {
                    (&digits[..], 10)
                };
                BigUint::parse_bytes(digits.as_bytes(), radix)
                    .ok_or_else(|| TraceError::Snapshot(format!("invalid integer `{}`", text)))
            }
        }
    }
}

impl ValueSpec {
    /// Turn the serialized value into a signal value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(match self {
            ValueSpec::Int(v) => Value::Int(v.to_biguint()?),
            ValueSpec::Enum(v) => Value::symbol(v.as_str()),
            ValueSpec::Real(v) => Value::Real(*v),
        })
    }
}

/// A serialized instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceSpec {
    /// The instance name.
    pub name: String,
    /// The nesting level.
    pub level: usize,
    /// Pairs of local name and signal id.
    #[serde(default)]
    pub signals: Vec<(String, String)>,
    /// Pairs of local name and the signal ids of the memory entries.
    #[serde(default)]
    pub memories: Vec<(String, Vec<String>)>,
}

impl Snapshot {
    /// Parse a snapshot from JSON.
    pub fn from_json(text: &str) -> Result<Snapshot> {
        serde_json::from_str(text).map_err(|e| TraceError::Snapshot(e.to_string()))
    }

    /// Create the signals and instances described by the snapshot.
    pub fn build(&self) -> Result<Hierarchy> {
        let mut builder = Builder {
            specs: &self.signals,
            built: HashMap::new(),
            pending: HashSet::new(),
        };
        let mut hierarchy = Hierarchy::default();
        for spec in &self.instances {
            let mut inst = Instance::new(spec.name.as_str(), spec.level);
            for (name, id) in &spec.signals {
                inst.add_signal(name.as_str(), &builder.signal(id)?);
            }
            for (name, ids) in &spec.memories {
                let entries = ids
                    .iter()
                    .map(|id| builder.signal(id))
                    .collect::<Result<Vec<_>>>()?;
                inst.add_memory(name.as_str(), Memory::new(entries));
            }
            hierarchy.push(inst);
        }
        debug!(
            "Built {} signals in {} instances from snapshot",
            builder.built.len(),
            hierarchy.instances().len()
        );
        Ok(hierarchy)
    }

    /// The interface of the top-level design.
    ///
    /// Falls back to an interface without ports named after the design.
    pub fn interface(&self) -> Interface {
        match &self.interface {
            Some(intf) => intf.clone(),
            None => Interface {
                name: self
                    .name
                    .clone()
                    .or_else(|| self.instances.first().map(|i| i.name.clone()))
                    .unwrap_or_default(),
                ..Default::default()
            },
        }
    }
}

struct Builder<'a> {
    specs: &'a BTreeMap<String, SignalSpec>,
    built: HashMap<String, SignalRef>,
    /// Ids currently being built, to detect driver cycles.
    pending: HashSet<String>,
}

impl Builder<'_> {
    fn signal(&mut self, id: &str) -> Result<SignalRef> {
        if let Some(sig) = self.built.get(id) {
            return Ok(sig.clone());
        }
        let specs = self.specs;
        let spec = specs
            .get(id)
            .ok_or_else(|| TraceError::Snapshot(format!("unknown signal `{}`", id)))?;
        let value = spec.value.as_ref().map(ValueSpec::to_value).transpose()?;
        let sig = match spec.kind {
            SignalKindSpec::Plain => Signal::new(spec.width, value),
            SignalKindSpec::Tristate => Signal::tristate(spec.width, value),
            SignalKindSpec::Driver => {
                let bus = spec.bus.as_ref().ok_or_else(|| {
                    TraceError::Snapshot(format!("driver `{}` has no bus", id))
                })?;
                if !self.pending.insert(id.to_owned()) {
                    return Err(TraceError::Snapshot(format!(
                        "driver `{}` is part of a driver cycle",
                        id
                    )));
                }
                let bus = self.signal(bus)?;
                self.pending.remove(id);
                let sig = Signal::driver(&bus);
                if let Some(value) = value {
                    sig.set_value(value);
                }
                sig
            }
        };
        self.built.insert(id.to_owned(), sig.clone());
        Ok(sig)
    }
}
