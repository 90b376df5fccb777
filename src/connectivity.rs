// Copyright (c) 2017-2021 Fabian Schuiki

//! Port connectivity records
//!
//! The testbench stub needs to know how the sub-instances of the top-level
//! design are wired up. This information is approximated by scanning the
//! source of the top-level design for assignments of the form
//! `inst = kind(a, b, c)`. The scan is a best-effort text match: arguments
//! that are not plain identifiers are dropped, and anything that does not
//! look like such an assignment is ignored.

use regex::Regex;
use serde::Deserialize;

/// Callees that construct signals or processes rather than sub-instances.
pub const RESERVED: &[&str] = &["Signal", "bool", "always", "delay", "True", "False"];

/// An inferred sub-instance call site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectivityRecord {
    /// The name the sub-instance is assigned to.
    pub instance: String,
    /// The name of the instantiated kind of module.
    pub kind: String,
    /// The identifiers passed as arguments, in order.
    pub args: Vec<String>,
}

impl ConnectivityRecord {
    /// Create a new record.
    pub fn new(instance: impl Into<String>, kind: impl Into<String>, args: &[&str]) -> Self {
        ConnectivityRecord {
            instance: instance.into(),
            kind: kind.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Scan source text for sub-instance call sites.
pub fn scan(source: &str) -> Vec<ConnectivityRecord> {
    // Neither pattern can fail to compile.
    let call = Regex::new(r"(?m)^\s*([A-Za-z_]\w*)\s*=\s*([A-Za-z_]\w*)\s*\(([^()]*)\)")
        .expect("call pattern");
    let ident = Regex::new(r"^[A-Za-z_]\w*$").expect("identifier pattern");

    let mut records = vec![];
    for caps in call.captures_iter(source) {
        let instance = &caps[1];
        let kind = &caps[2];
        if RESERVED.contains(&kind) {
            continue;
        }
        let args: Vec<&str> = caps[3]
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        match args.first() {
            Some(first) if ident.is_match(first) => (),
            _ => {
                trace!("Skipping call of {} assigned to {}", kind, instance);
                continue;
            }
        }
        let args: Vec<&str> = args.into_iter().filter(|a| ident.is_match(a)).collect();
        debug!("Found instance {} of {} with {} ports", instance, kind, args.len());
        records.push(ConnectivityRecord::new(instance, kind, &args));
    }
    records
}
