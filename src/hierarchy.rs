// Copyright (c) 2017-2021 Fabian Schuiki

//! The flattened instance hierarchy
//!
//! A design is handed to the tracer as a flat list of instances in pre-order:
//! every instance precedes its descendants, and the nesting is encoded only in
//! the level of each instance. The root sits at level 0, its children at
//! level 1, and so on.

use crate::signal::{Memory, SignalRef};

/// A node in the simulation hierarchy.
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    level: usize,
    signals: Vec<(String, SignalRef)>,
    memories: Vec<(String, Memory)>,
}

impl Instance {
    /// Create an empty instance at the given level.
    pub fn new(name: impl Into<String>, level: usize) -> Self {
        Instance {
            name: name.into(),
            level,
            signals: vec![],
            memories: vec![],
        }
    }

    /// The name of the instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nesting level of the instance.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Make a signal visible in this instance under a local name.
    ///
    /// Replaces any signal previously added under the same name, keeping its
    /// position in the declaration order.
    pub fn add_signal(&mut self, name: impl Into<String>, signal: &SignalRef) {
        let name = name.into();
        match self.signals.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = signal.clone(),
            None => self.signals.push((name, signal.clone())),
        }
    }

    /// Add a memory under a local name.
    ///
    /// Replaces any memory previously added under the same name.
    pub fn add_memory(&mut self, name: impl Into<String>, memory: Memory) {
        let name = name.into();
        match self.memories.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = memory,
            None => self.memories.push((name, memory)),
        }
    }

    /// Builder-style variant of [`add_signal`](Instance::add_signal).
    pub fn with_signal(mut self, name: impl Into<String>, signal: &SignalRef) -> Self {
        self.add_signal(name, signal);
        self
    }

    /// Builder-style variant of [`add_memory`](Instance::add_memory).
    pub fn with_memory(mut self, name: impl Into<String>, memory: Memory) -> Self {
        self.add_memory(name, memory);
        self
    }

    /// The signals of the instance, in declaration order.
    pub fn signals(&self) -> impl Iterator<Item = (&str, &SignalRef)> {
        self.signals.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Look up a signal by its local name.
    pub fn signal(&self, name: &str) -> Option<&SignalRef> {
        self.signals.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// The memories of the instance, in declaration order.
    pub fn memories(&self) -> impl Iterator<Item = (&str, &Memory)> {
        self.memories.iter().map(|(n, m)| (n.as_str(), m))
    }
}

/// A flattened hierarchy of instances in pre-order.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    instances: Vec<Instance>,
}

impl Hierarchy {
    /// Create a hierarchy from a pre-order list of instances.
    pub fn new(instances: Vec<Instance>) -> Self {
        Hierarchy { instances }
    }

    /// Append an instance.
    pub fn push(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    /// The instances in pre-order.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// The root instance, if there is one.
    pub fn top(&self) -> Option<&Instance> {
        self.instances.first()
    }

    /// Check whether the hierarchy has no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterate over every signal reference in the hierarchy, including memory
    /// entries. Aliased signals are yielded once per reference.
    pub fn all_signals(&self) -> impl Iterator<Item = &SignalRef> {
        self.instances.iter().flat_map(|inst| {
            inst.signals
                .iter()
                .map(|(_, s)| s)
                .chain(inst.memories.iter().flat_map(|(_, m)| m.entries()))
        })
    }
}

impl<'a> IntoIterator for &'a Hierarchy {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
