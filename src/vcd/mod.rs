// Copyright (c) 2017-2021 Fabian Schuiki

//! Value Change Dump output
//!
//! The [`VcdWriter`] emits a trace in three stages: the header, the nested
//! scope and variable declarations (see the `scope` submodule), and the
//! initial value dump. Afterwards it accepts value changes as the simulation
//! advances.

use crate::{
    code::CodeGenerator,
    error::{Result, TraceError},
    signal::SignalRef,
};
use std::io::Write;

mod scope;

/// The version string written into the trace header.
pub const VERSION: &str = concat!("hdltrace ", env!("CARGO_PKG_VERSION"));

/// A writer that emits a signal trace as VCD.
pub struct VcdWriter<W> {
    writer: W,
    codes: CodeGenerator,
    /// Signals in the order they received their code.
    coded: Vec<SignalRef>,
    /// The number of currently open scopes.
    depth: usize,
    time: Option<u64>,
}

impl<W> VcdWriter<W>
where
    W: Write,
{
    /// Create a new VCD writer which will write its VCD to `writer`.
    pub fn new(writer: W) -> Self {
        VcdWriter {
            writer,
            codes: CodeGenerator::new(),
            coded: vec![],
            depth: 0,
            time: None,
        }
    }

    /// Write the header block.
    pub fn write_header(&mut self, date: &str, timescale: &str) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w, "$date")?;
        writeln!(w, "    {}", date)?;
        writeln!(w, "$end")?;
        writeln!(w, "$version")?;
        writeln!(w, "    {}", VERSION)?;
        writeln!(w, "$end")?;
        writeln!(w, "$timescale")?;
        writeln!(w, "    {}", timescale)?;
        writeln!(w, "$end")?;
        writeln!(w)?;
        Ok(())
    }

    /// Terminate the declarations and dump the initial value of every signal
    /// that received a code, in the order the codes were assigned.
    pub fn write_dump(&mut self) -> Result<()> {
        debug!("Dumping initial values of {} signals", self.coded.len());
        writeln!(self.writer)?;
        writeln!(self.writer, "$enddefinitions $end")?;
        writeln!(self.writer, "$dumpvars")?;
        for signal in &self.coded {
            // Coded signals always carry a code and a value, both were
            // checked when the code was assigned.
            if let (Some(code), Some(value)) = (signal.code(), signal.sample()) {
                writeln!(self.writer, "{}", value.vcd_change(signal.width(), &code))?;
            }
        }
        writeln!(self.writer, "$end")?;
        Ok(())
    }

    /// The signals that received a code, in assignment order.
    pub fn coded_signals(&self) -> &[SignalRef] {
        &self.coded
    }

    /// Start a new time step.
    ///
    /// Steps to the current time are ignored; steps backwards in time fail.
    pub fn advance(&mut self, time: u64) -> Result<()> {
        match self.time {
            Some(current) if time < current => {
                return Err(TraceError::TimeReversal {
                    current,
                    requested: time,
                })
            }
            Some(current) if time == current => return Ok(()),
            _ => (),
        }
        writeln!(self.writer, "#{}", time)?;
        self.time = Some(time);
        Ok(())
    }

    /// Record the current value of a signal.
    ///
    /// Signals that are not part of the trace, or have no value, are skipped.
    pub fn change(&mut self, signal: &SignalRef) -> Result<()> {
        let code = match signal.code() {
            Some(code) => code,
            None => return Ok(()),
        };
        if let Some(value) = signal.value() {
            writeln!(self.writer, "{}", value.vcd_change(signal.width(), &code))?;
        }
        Ok(())
    }

    /// Flush the output and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn open_scope(&mut self, name: &str) -> Result<()> {
        trace!("Opening scope {} at depth {}", name, self.depth);
        writeln!(self.writer, "$scope module {} $end", name)?;
        self.depth += 1;
        Ok(())
    }

    fn close_scope(&mut self) -> Result<()> {
        writeln!(self.writer, "$upscope $end")?;
        self.depth -= 1;
        Ok(())
    }
}
