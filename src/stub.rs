// Copyright (c) 2017-2021 Fabian Schuiki

//! Verilog testbench stub
//!
//! Next to the trace, a Verilog stub is written that declares one wire per
//! top-level signal and connects the sub-instances of the top-level design to
//! these wires. The connections come from [`ConnectivityRecord`]s and are a
//! best-effort match: ports that do not name a top-level wire are left out.

use crate::{
    connectivity::ConnectivityRecord,
    error::Result,
    hierarchy::Hierarchy,
    vcd::VERSION,
};
use itertools::Itertools;
use serde::Deserialize;
use std::io::Write;

/// The direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The port is read by the design.
    Input,
    /// The port is driven by the design.
    Output,
}

/// A port of the traced top-level design.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Port {
    /// The port name.
    pub name: String,
    /// Whether the port is an input or an output.
    pub dir: Direction,
    /// The width of the port in bits.
    pub width: usize,
}

/// The interface of the traced top-level design.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Interface {
    /// The module name.
    pub name: String,
    /// The ports in declaration order.
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Documentation attached to the design.
    #[serde(default)]
    pub doc: Option<String>,
}

/// Everything besides the hierarchy that goes into a stub.
#[derive(Debug, Clone)]
pub struct StubContext<'a> {
    /// The name of the stub file.
    pub file_name: &'a str,
    /// The time unit of the trace.
    pub timescale: &'a str,
    /// The time precision of the stub.
    pub precision: &'a str,
    /// The date written into the file header.
    pub date: &'a str,
    /// The interface of the top-level design.
    pub interface: &'a Interface,
    /// The inferred sub-instance call sites.
    pub records: &'a [ConnectivityRecord],
}

/// Write a complete stub.
pub fn write(output: &mut impl Write, hierarchy: &Hierarchy, ctx: &StubContext) -> Result<()> {
    debug!("Emitting testbench stub {}", ctx.file_name);
    write_file_header(output, ctx)?;
    write_module_header(output, ctx.interface)?;
    write_connections(output, hierarchy, ctx.records)?;
    writeln!(output, "initial begin")?;
    Ok(())
}

/// Write the comment banner and timescale directive.
pub fn write_file_header(output: &mut impl Write, ctx: &StubContext) -> Result<()> {
    writeln!(output, "// File: {}", ctx.file_name)?;
    writeln!(output, "// Generated by {}", VERSION)?;
    writeln!(output, "// Date: {}", ctx.date)?;
    writeln!(output)?;
    writeln!(output, "`timescale {}/{}", ctx.timescale, ctx.precision)?;
    writeln!(output)?;
    Ok(())
}

/// Write the module header for an interface.
pub fn write_module_header(output: &mut impl Write, intf: &Interface) -> Result<()> {
    writeln!(
        output,
        "module {} (\n{}\n);",
        intf.name,
        intf.ports.iter().map(|p| format!("    {}", p.name)).format(",\n")
    )?;
    if let Some(doc) = &intf.doc {
        for line in doc.lines() {
            writeln!(output, "// {}", line)?;
        }
    }
    writeln!(output)?;
    for port in &intf.ports {
        let dir = match port.dir {
            Direction::Input => "input",
            Direction::Output => "output",
        };
        writeln!(output, "{}{} {};", dir, range(port.width), port.name)?;
    }
    writeln!(output)?;
    Ok(())
}

/// Declare the top-level wires and bind the ports of the second-level
/// instances to them.
pub fn write_connections(
    output: &mut impl Write,
    hierarchy: &Hierarchy,
    records: &[ConnectivityRecord],
) -> Result<()> {
    let top = match hierarchy.top() {
        Some(top) => top,
        None => return Ok(()),
    };
    for (name, signal) in top.signals() {
        writeln!(output, "wire{} {};", range(signal.width()), name)?;
    }
    writeln!(output)?;

    let child_level = top.level() + 1;
    for inst in hierarchy
        .instances()
        .iter()
        .filter(|inst| inst.level() == child_level)
    {
        let mut matched = false;
        for record in records.iter().filter(|r| r.instance == inst.name()) {
            matched = true;
            let ports = record
                .args
                .iter()
                .filter(|port| {
                    let known = top.signal(port).is_some();
                    if !known {
                        debug!("Port {} of {} has no top-level wire", port, inst.name());
                    }
                    known
                })
                .map(|port| format!("  .{0}({0})", port));
            writeln!(
                output,
                "{} {} (\n{}\n);",
                record.kind,
                record.instance,
                ports.format(",\n")
            )?;
            writeln!(output)?;
        }
        if !matched {
            debug!("No connectivity known for instance {}", inst.name());
        }
    }
    Ok(())
}

/// Mark every top-level signal for printing by the testbench.
pub fn register_testbench_signals(hierarchy: &Hierarchy) {
    if let Some(top) = hierarchy.top() {
        for (name, signal) in top.signals() {
            signal.mark_testbench(name);
        }
    }
}

/// Format the range of a vector of the given width.
fn range(width: usize) -> String {
    if width > 1 {
        format!(" [{}:0]", width - 1)
    } else {
        String::new()
    }
}
