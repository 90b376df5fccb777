// Copyright (c) 2017-2021 Fabian Schuiki

//! Traced signals
//!
//! Signals are shared between the instances that refer to them: a port that
//! is passed down the hierarchy shows up under a different name in every
//! instance along the way, yet it is one and the same signal. Therefore
//! signals are handed around as [`SignalRef`]s, and the trace annotations
//! (the identifier code) live on the signal itself.

use crate::{
    code::CodeGenerator,
    error::{Result, TraceError},
    value::Value,
};
use std::{cell::RefCell, rc::Rc};

/// A shared reference to a signal.
pub type SignalRef = Rc<Signal>;

/// A unit of traced state.
#[derive(Debug)]
pub struct Signal {
    width: usize,
    kind: SignalKind,
    value: RefCell<Option<Value>>,
    code: RefCell<Option<String>>,
    testbench_name: RefCell<Option<String>>,
}

/// The different flavours of signals that can be traced.
#[derive(Debug)]
pub enum SignalKind {
    /// An ordinary signal.
    Plain,
    /// A tri-state bus. The trace shows the value the bus floats at, not the
    /// value some driver currently forces onto it.
    Tristate {
        /// The undriven value of the bus.
        original: RefCell<Option<Value>>,
    },
    /// A driver attached to a tri-state bus. Traced as the bus it drives.
    Driver {
        /// The bus this driver is attached to.
        bus: SignalRef,
    },
}

impl Signal {
    fn with_kind(width: usize, kind: SignalKind, value: Option<Value>) -> SignalRef {
        Rc::new(Signal {
            width,
            kind,
            value: RefCell::new(value),
            code: RefCell::new(None),
            testbench_name: RefCell::new(None),
        })
    }

    /// Create a plain signal of the given width.
    ///
    /// A width of zero marks a signal that does not carry a bit vector, for
    /// example a plain integer or real number.
    pub fn new(width: usize, value: impl Into<Option<Value>>) -> SignalRef {
        Self::with_kind(width, SignalKind::Plain, value.into())
    }

    /// Create a tri-state bus that floats at `original`.
    pub fn tristate(width: usize, original: impl Into<Option<Value>>) -> SignalRef {
        let original = original.into();
        Self::with_kind(
            width,
            SignalKind::Tristate {
                original: RefCell::new(original.clone()),
            },
            original,
        )
    }

    /// Create a driver for a tri-state bus.
    pub fn driver(bus: &SignalRef) -> SignalRef {
        Self::with_kind(
            bus.width,
            SignalKind::Driver { bus: bus.clone() },
            None,
        )
    }

    /// The width of the signal in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The kind of the signal.
    pub fn kind(&self) -> &SignalKind {
        &self.kind
    }

    /// The current value of the signal.
    pub fn value(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    /// Change the current value of the signal.
    pub fn set_value(&self, value: impl Into<Value>) {
        *self.value.borrow_mut() = Some(value.into());
    }

    /// Change the value a tri-state bus floats at.
    ///
    /// Has no effect on other kinds of signals.
    pub fn set_original(&self, value: impl Into<Value>) {
        if let SignalKind::Tristate { original } = &self.kind {
            *original.borrow_mut() = Some(value.into());
        }
    }

    /// The value the trace records for this signal.
    ///
    /// This is the current value of plain signals, and the undriven value of
    /// tri-state buses and the buses behind tri-state drivers.
    pub fn sample(&self) -> Option<Value> {
        match &self.kind {
            SignalKind::Plain => self.value(),
            SignalKind::Tristate { original } => original.borrow().clone(),
            SignalKind::Driver { bus } => bus.sample(),
        }
    }

    /// Sample the signal for tracing, failing if it has no value yet.
    ///
    /// `name` and `owner` identify the signal in the error message.
    pub fn resolve(&self, name: &str, owner: &str) -> Result<Value> {
        self.sample().ok_or_else(|| TraceError::MissingInitialValue {
            signal: name.to_owned(),
            instance: owner.to_owned(),
        })
    }

    /// The identifier code assigned to this signal, if it is being traced.
    pub fn code(&self) -> Option<String> {
        self.code.borrow().clone()
    }

    /// Check whether the signal has been assigned an identifier code.
    pub fn is_traced(&self) -> bool {
        self.code.borrow().is_some()
    }

    /// Assign the next code from `codes` unless the signal already has one.
    ///
    /// Returns `true` if a new code was assigned.
    pub(crate) fn assign_code(&self, codes: &mut CodeGenerator) -> bool {
        let mut code = self.code.borrow_mut();
        if code.is_some() {
            return false;
        }
        *code = codes.next();
        true
    }

    /// Forget the identifier code of a previous trace pass.
    pub(crate) fn clear_trace(&self) {
        *self.code.borrow_mut() = None;
    }

    /// The name under which a testbench prints this signal, if any.
    pub fn testbench_name(&self) -> Option<String> {
        self.testbench_name.borrow().clone()
    }

    /// Register the signal for printing by a testbench.
    pub(crate) fn mark_testbench(&self, name: &str) {
        *self.testbench_name.borrow_mut() = Some(name.to_owned());
    }
}

/// An array of signals.
///
/// VCD has no notion of arrays, so every entry is traced as a signal of its
/// own.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    entries: Vec<SignalRef>,
}

impl Memory {
    /// Create a memory from its entries.
    pub fn new(entries: Vec<SignalRef>) -> Self {
        Memory { entries }
    }

    /// The entries of the memory, in index order.
    pub fn entries(&self) -> &[SignalRef] {
        &self.entries
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the memory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_signals_sample_their_value() {
        let sig = Signal::new(4, Value::from_u64(9));
        assert_eq!(sig.sample(), Some(Value::from_u64(9)));
        sig.set_value(Value::from_u64(3));
        assert_eq!(sig.sample(), Some(Value::from_u64(3)));
    }

    #[test]
    fn tristate_samples_original_value() {
        let bus = Signal::tristate(8, Value::from_u64(0));
        bus.set_value(Value::from_u64(0xaa));
        assert_eq!(bus.sample(), Some(Value::from_u64(0)));
        assert_eq!(bus.value(), Some(Value::from_u64(0xaa)));
    }

    #[test]
    fn driver_samples_bus_original_value() {
        let bus = Signal::tristate(8, Value::from_u64(0x0f));
        let drv = Signal::driver(&bus);
        drv.set_value(Value::from_u64(0xff));
        assert_eq!(drv.width(), 8);
        assert_eq!(drv.sample(), Some(Value::from_u64(0x0f)));
        bus.set_original(Value::from_u64(1));
        assert_eq!(drv.sample(), Some(Value::from_u64(1)));
    }

    #[test]
    fn undefined_value_is_reported() {
        let sig = Signal::new(1, None);
        match sig.resolve("rst", "top") {
            Err(TraceError::MissingInitialValue { signal, instance }) => {
                assert_eq!(signal, "rst");
                assert_eq!(instance, "top");
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn codes_are_assigned_once() {
        let mut codes = CodeGenerator::new();
        let sig = Signal::new(1, Value::from_u64(0));
        assert!(!sig.is_traced());
        assert!(sig.assign_code(&mut codes));
        assert!(!sig.assign_code(&mut codes));
        assert_eq!(sig.code().as_deref(), Some("!"));
        assert_eq!(codes.issued(), 1);
    }
}
