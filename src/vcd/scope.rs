// Copyright (c) 2017-2021 Fabian Schuiki

//! Scope and variable declarations
//!
//! Rebuilds the nested scope structure from the levels of the flattened
//! hierarchy and declares every signal. Signals referenced from several
//! instances are declared once per reference but coded only once.

use super::VcdWriter;
use crate::{
    error::{Result, TraceError},
    hierarchy::{Hierarchy, Instance},
    signal::{Memory, SignalRef},
    value::Value,
};
use std::io::Write;

impl<W> VcdWriter<W>
where
    W: Write,
{
    /// Emit the scope tree and variable declarations for a hierarchy.
    ///
    /// Memories are flattened into scopes of their own if `memories` is set.
    pub fn write_declarations(&mut self, hierarchy: &Hierarchy, memories: bool) -> Result<()> {
        debug!(
            "Declaring signals of {} instances",
            hierarchy.instances().len()
        );
        for inst in hierarchy {
            self.write_instance(inst, memories)?;
        }
        while self.depth > 0 {
            self.close_scope()?;
        }
        Ok(())
    }

    /// Open the scope of an instance, popping back up the tree as needed.
    fn write_instance(&mut self, inst: &Instance, memories: bool) -> Result<()> {
        // An instance at level `n` lives inside `n + 1` open scopes.
        let target = inst.level() + 1;
        if target > self.depth + 1 {
            return Err(TraceError::StructuralInconsistency {
                instance: inst.name().to_owned(),
                level: inst.level(),
                current: self.depth.checked_sub(1),
            });
        }
        while self.depth >= target {
            self.close_scope()?;
        }
        self.open_scope(inst.name())?;

        for (name, signal) in inst.signals() {
            let value = signal.resolve(name, inst.name())?;
            self.declare(signal, name, &value)?;
        }
        if memories {
            for (name, memory) in inst.memories() {
                self.write_memory(name, memory, inst.name())?;
            }
        }
        Ok(())
    }

    /// Flatten a memory into one variable per entry.
    pub fn write_memory(&mut self, name: &str, memory: &Memory, owner: &str) -> Result<()> {
        self.open_scope(name)?;
        for (index, signal) in memory.entries().iter().enumerate() {
            let entry = format!("{}({})", name, index);
            let value = signal.resolve(&entry, owner)?;
            self.declare(signal, &entry, &value)?;
        }
        self.close_scope()
    }

    /// Code a signal if necessary and emit its `$var` line.
    fn declare(&mut self, signal: &SignalRef, name: &str, value: &Value) -> Result<()> {
        if signal.assign_code(&mut self.codes) {
            self.coded.push(signal.clone());
        }
        let code = signal.code().unwrap_or_default();
        trace!("Declaring {} as `{}`", name, code);
        let width = signal.width();
        if width == 0 || value.is_scalar_kind() {
            writeln!(self.writer, "$var real 1 {} {} $end", code, name)?;
        } else if width == 1 {
            writeln!(self.writer, "$var reg 1 {} {} $end", code, name)?;
        } else {
            writeln!(self.writer, "$var reg {} {} {} $end", width, code, name)?;
        }
        Ok(())
    }
}
