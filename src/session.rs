// Copyright (c) 2017-2021 Fabian Schuiki

//! Trace sessions
//!
//! A [`TraceSession`] guards against two traces being active at the same
//! time. It is created before any output is produced and lives on in the
//! returned [`Trace`] until the trace is finished or dropped.

use crate::{
    connectivity::ConnectivityRecord,
    error::{Result, TraceError},
    hierarchy::Hierarchy,
    signal::SignalRef,
    stub::{self, Interface, StubContext},
    vcd::VcdWriter,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::UNIX_EPOCH,
};

/// Set while a [`TraceSession`] exists anywhere in the process.
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Options controlling a trace pass.
#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// The base name of the output files. Defaults to the name of the top
    /// instance.
    pub name: Option<String>,
    /// The time unit declared in the trace.
    pub timescale: String,
    /// Whether memories are traced.
    pub trace_memories: bool,
    /// Whether a testbench stub is written.
    pub stub: bool,
    /// The time precision declared in the testbench stub.
    pub stub_precision: String,
    /// The date written into the headers. Defaults to the current time.
    pub date: Option<String>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        TraceOptions {
            name: None,
            timescale: "1ns".to_owned(),
            trace_memories: true,
            stub: true,
            stub_precision: "10ps".to_owned(),
            date: None,
        }
    }
}

impl TraceOptions {
    /// The date to write into the headers.
    pub fn date(&self) -> String {
        match &self.date {
            Some(date) => date.clone(),
            None => time::now().asctime().to_string(),
        }
    }

    /// The base name of the output files for a hierarchy.
    pub fn base_name(&self, hierarchy: &Hierarchy) -> String {
        match (&self.name, hierarchy.top()) {
            (Some(name), _) => name.clone(),
            (None, Some(top)) => top.name().to_owned(),
            (None, None) => "trace".to_owned(),
        }
    }
}

/// Exclusive permission to write a trace.
#[derive(Debug)]
pub struct TraceSession {
    _private: (),
}

impl TraceSession {
    /// Start a new session.
    ///
    /// Fails if another session in this process is still active, no matter
    /// which thread started it.
    pub fn begin() -> Result<TraceSession> {
        match ACTIVE.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok(TraceSession { _private: () }),
            Err(_) => Err(TraceError::ReentrantTrace),
        }
    }

    /// Check whether a session is currently active in this process.
    pub fn is_active() -> bool {
        ACTIVE.load(Ordering::Acquire)
    }

    /// Write the header, declarations, and initial values of a hierarchy.
    ///
    /// Every signal in the hierarchy starts out uncoded, such that a pass
    /// that previously failed can simply be repeated.
    pub fn trace<W: Write>(
        self,
        hierarchy: &Hierarchy,
        options: &TraceOptions,
        output: W,
    ) -> Result<Trace<W>> {
        for signal in hierarchy.all_signals() {
            signal.clear_trace();
        }
        let mut writer = VcdWriter::new(output);
        writer.write_header(&options.date(), &options.timescale)?;
        writer.write_declarations(hierarchy, options.trace_memories)?;
        writer.write_dump()?;
        info!(
            "Tracing {} signals of {} instances",
            writer.coded_signals().len(),
            hierarchy.instances().len()
        );
        Ok(Trace {
            writer,
            _session: self,
        })
    }
}

impl Drop for TraceSession {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}

/// An active trace that records value changes.
pub struct Trace<W: Write> {
    writer: VcdWriter<W>,
    _session: TraceSession,
}

impl<W: Write> Trace<W> {
    /// The traced signals, in the order they were coded.
    pub fn signals(&self) -> &[SignalRef] {
        self.writer.coded_signals()
    }

    /// Start a new time step.
    pub fn advance(&mut self, time: u64) -> Result<()> {
        self.writer.advance(time)
    }

    /// Record the current value of a signal.
    pub fn change(&mut self, signal: &SignalRef) -> Result<()> {
        self.writer.change(signal)
    }

    /// Flush the trace, end the session, and return the output.
    pub fn finish(self) -> Result<W> {
        self.writer.finish()
    }
}

/// The result of [`trace_to_dir`].
pub struct TracedFiles {
    /// The open trace.
    pub trace: Trace<BufWriter<File>>,
    /// The path of the trace file.
    pub vcd_path: PathBuf,
    /// The path of the testbench stub, if one was written.
    pub stub_path: Option<PathBuf>,
}

/// Trace a hierarchy into `<name>.vcd` and `<name>_bfm.v` inside `dir`.
///
/// Existing files are backed up before they are replaced.
pub fn trace_to_dir(
    dir: &Path,
    hierarchy: &Hierarchy,
    interface: &Interface,
    records: &[ConnectivityRecord],
    options: &TraceOptions,
) -> Result<TracedFiles> {
    let session = TraceSession::begin()?;
    let name = options.base_name(hierarchy);

    let vcd_path = dir.join(format!("{}.vcd", name));
    let trace = session.trace(hierarchy, options, create_with_backup(&vcd_path)?)?;

    let stub_path = if options.stub {
        let file_name = format!("{}_bfm.v", name);
        let path = dir.join(&file_name);
        let mut output = create_with_backup(&path)?;
        let date = options.date();
        let mut intf = interface.clone();
        intf.name = name.clone();
        let ctx = StubContext {
            file_name: &file_name,
            timescale: &options.timescale,
            precision: &options.stub_precision,
            date: &date,
            interface: &intf,
            records,
        };
        stub::write(&mut output, hierarchy, &ctx)?;
        output.flush()?;
        stub::register_testbench_signals(hierarchy);
        Some(path)
    } else {
        None
    };

    Ok(TracedFiles {
        trace,
        vcd_path,
        stub_path,
    })
}

/// Create a file, moving any existing file at `path` to
/// `<path>.<modification time>` first.
pub fn create_with_backup(path: &Path) -> Result<BufWriter<File>> {
    if path.exists() {
        let mtime = fs::metadata(path)?
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut backup = path.as_os_str().to_owned();
        backup.push(format!(".{}", mtime));
        debug!("Backing up {} to {:?}", path.display(), backup);
        fs::copy(path, &backup)?;
        fs::remove_file(path)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}
