// Copyright (c) 2017-2021 Fabian Schuiki

//! A tool to trace a hierarchy snapshot into a VCD file and testbench stub

#![deny(missing_docs)]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use clap::Arg;
use hdltrace::{connectivity, session::TracedFiles, snapshot::Snapshot, TraceOptions};
use std::{fs, path::Path};

fn main() -> Result<()> {
    // Configure the logger.
    env_logger::init_from_env(env_logger::Env::default().filter("HDLTRACE_LOG"));

    // Parse the command line arguments.
    let matches = app_from_crate!()
        .about("Trace a simulation hierarchy into a VCD file and a Verilog testbench stub.")
        .arg(
            Arg::with_name("INPUT")
                .help("The hierarchy snapshot to trace")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output-dir")
                .short("o")
                .long("output-dir")
                .takes_value(true)
                .help("Directory to write the output files to; current directory if omitted"),
        )
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .takes_value(true)
                .help("Base name of the output files; top instance name if omitted"),
        )
        .arg(
            Arg::with_name("timescale")
                .short("t")
                .long("timescale")
                .takes_value(true)
                .help("Time unit declared in the trace"),
        )
        .arg(
            Arg::with_name("no-memories")
                .long("no-memories")
                .help("Do not trace memories"),
        )
        .arg(
            Arg::with_name("no-stub")
                .long("no-stub")
                .help("Do not write a testbench stub"),
        )
        .arg(
            Arg::with_name("source")
                .long("source")
                .takes_value(true)
                .help("Source of the top-level design to infer port connections from"),
        )
        .get_matches();

    // Load the snapshot.
    let path = matches.value_of("INPUT").unwrap();
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read input from {}", path))?;
    let snapshot =
        Snapshot::from_json(&text).with_context(|| format!("failed to parse input from {}", path))?;
    let hierarchy = snapshot
        .build()
        .with_context(|| format!("failed to build hierarchy from {}", path))?;

    // Gather the port connections of the sub-instances.
    let mut records = snapshot.connectivity.clone();
    if let Some(source) = matches.value_of("source") {
        let text = fs::read_to_string(source)
            .with_context(|| format!("failed to read source from {}", source))?;
        let found = connectivity::scan(&text);
        debug!("Found {} call sites in {}", found.len(), source);
        records.extend(found);
    }

    // Assemble the options.
    let defaults = TraceOptions::default();
    let options = TraceOptions {
        name: matches
            .value_of("name")
            .map(String::from)
            .or_else(|| snapshot.name.clone()),
        timescale: matches
            .value_of("timescale")
            .map(String::from)
            .unwrap_or(defaults.timescale),
        trace_memories: !matches.is_present("no-memories"),
        stub: !matches.is_present("no-stub"),
        ..defaults
    };

    // Write the trace.
    let dir = Path::new(matches.value_of("output-dir").unwrap_or("."));
    let TracedFiles {
        trace,
        vcd_path,
        stub_path,
    } = hdltrace::trace_to_dir(
        dir,
        &hierarchy,
        &snapshot.interface(),
        &records,
        &options,
    )
    .with_context(|| format!("failed to trace {}", path))?;
    trace
        .finish()
        .with_context(|| format!("failed to flush {}", vcd_path.display()))?;
    info!("Wrote {}", vcd_path.display());
    if let Some(stub) = stub_path {
        info!("Wrote {}", stub.display());
    }

    Ok(())
}
