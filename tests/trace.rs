#[macro_use]
extern crate indoc;

use hdltrace::{
    code, Hierarchy, Instance, Memory, Signal, TraceError, TraceOptions, TraceSession, Value,
};
use std::{
    sync::{Mutex, MutexGuard},
    thread,
};

/// Only one trace session may exist per process. Tests that start sessions
/// hold this lock to not trip over each other.
static SESSIONS: Mutex<()> = Mutex::new(());

fn exclusive() -> MutexGuard<'static, ()> {
    SESSIONS.lock().unwrap_or_else(|e| e.into_inner())
}

fn options() -> TraceOptions {
    TraceOptions {
        date: Some("today".to_owned()),
        ..Default::default()
    }
}

/// Trace a hierarchy into a string, keeping partial output on failure.
fn trace(hierarchy: &Hierarchy) -> (String, Result<(), TraceError>) {
    let _guard = exclusive();
    let mut output = Vec::new();
    let result = TraceSession::begin()
        .and_then(|session| session.trace(hierarchy, &options(), &mut output))
        .and_then(|trace| trace.finish())
        .map(|_| ());
    (String::from_utf8(output).unwrap(), result)
}

fn trace_ok(hierarchy: &Hierarchy) -> String {
    let (output, result) = trace(hierarchy);
    result.unwrap();
    output
}

/// Extract the lines of the initial value dump.
fn dump_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .skip_while(|l| *l != "$dumpvars")
        .skip(1)
        .take_while(|l| *l != "$end")
        .collect()
}

fn var_lines(output: &str) -> Vec<&str> {
    output.lines().filter(|l| l.starts_with("$var")).collect()
}

#[test]
fn top_and_sub() {
    let clk = Signal::new(1, Value::from_u64(0));
    let d = Signal::new(8, Value::from_u64(5));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0).with_signal("clk", &clk),
        Instance::new("sub", 1).with_signal("d", &d),
    ]);
    let expected = indoc! {"
        $date
            today
        $end
        $version
            @VERSION@
        $end
        $timescale
            1ns
        $end

        $scope module top $end
        $var reg 1 ! clk $end
        $scope module sub $end
        $var reg 8 \" d $end
        $upscope $end
        $upscope $end

        $enddefinitions $end
        $dumpvars
        0!
        b00000101 \"
        $end
    "}
    .replace("@VERSION@", hdltrace::vcd::VERSION);
    assert_eq!(trace_ok(&hierarchy), expected);
}

#[test]
fn aliased_signal_is_coded_and_dumped_once() {
    let data = Signal::new(4, Value::from_u64(3));
    let en = Signal::new(1, Value::from_u64(1));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0)
            .with_signal("data", &data)
            .with_signal("en", &en),
        Instance::new("u0", 1).with_signal("din", &data),
        Instance::new("u1", 1)
            .with_signal("enable", &en)
            .with_signal("x", &data),
    ]);
    let output = trace_ok(&hierarchy);
    assert_eq!(
        var_lines(&output),
        vec![
            "$var reg 4 ! data $end",
            "$var reg 1 \" en $end",
            "$var reg 4 ! din $end",
            "$var reg 1 \" enable $end",
            "$var reg 4 ! x $end",
        ]
    );
    assert_eq!(dump_lines(&output), vec!["b0011 !", "1\""]);
}

#[test]
fn dump_follows_coding_order() {
    let a = Signal::new(1, Value::from_u64(1));
    let b = Signal::new(1, Value::from_u64(0));
    let c = Signal::new(1, Value::from_u64(1));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0).with_signal("c", &c),
        Instance::new("sub", 1)
            .with_signal("b", &b)
            .with_signal("c_alias", &c)
            .with_signal("a", &a),
    ]);
    let output = trace_ok(&hierarchy);
    assert_eq!(dump_lines(&output), vec!["1!", "0\"", "1#"]);
}

#[test]
fn scopes_are_balanced() {
    let s = Signal::new(1, Value::from_u64(0));
    let levels = [0, 1, 2, 3, 2, 1, 2, 2, 3, 3, 1, 0, 1];
    let hierarchy = Hierarchy::new(
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Instance::new(format!("i{}", i), level).with_signal("s", &s))
            .collect(),
    );
    let output = trace_ok(&hierarchy);
    let mut open = 0isize;
    let mut opened = 0;
    for line in output.lines() {
        if line.starts_with("$scope") {
            open += 1;
            opened += 1;
        } else if line.starts_with("$upscope") {
            open -= 1;
        }
        assert!(open >= 0, "more scopes closed than opened");
    }
    assert_eq!(open, 0);
    assert_eq!(opened, levels.len());
}

#[test]
fn scopes_nest_by_level() {
    let s = Signal::new(1, Value::from_u64(0));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0),
        Instance::new("a", 1),
        Instance::new("a0", 2),
        Instance::new("b", 1).with_signal("s", &s),
    ]);
    let output = trace_ok(&hierarchy);
    let structure: Vec<_> = output
        .lines()
        .filter(|l| l.starts_with("$scope") || l.starts_with("$upscope") || l.starts_with("$var"))
        .collect();
    assert_eq!(
        structure,
        vec![
            "$scope module top $end",
            "$scope module a $end",
            "$scope module a0 $end",
            "$upscope $end",
            "$upscope $end",
            "$scope module b $end",
            "$var reg 1 ! s $end",
            "$upscope $end",
            "$upscope $end",
        ]
    );
}

#[test]
fn level_jump_is_rejected() {
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0),
        Instance::new("a", 1),
        Instance::new("deep", 3),
    ]);
    let (output, result) = trace(&hierarchy);
    match result {
        Err(TraceError::StructuralInconsistency {
            instance,
            level,
            current,
        }) => {
            assert_eq!(instance, "deep");
            assert_eq!(level, 3);
            assert_eq!(current, Some(1));
        }
        x => panic!("unexpected {:?}", x),
    }
    assert!(output.ends_with("$scope module a $end\n"));
    assert!(!output.contains("$dumpvars"));
}

#[test]
fn first_instance_must_be_a_root() {
    let hierarchy = Hierarchy::new(vec![Instance::new("orphan", 1)]);
    let (output, result) = trace(&hierarchy);
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        TraceError::StructuralInconsistency { current: None, .. }
    ));
    assert_eq!(
        err.to_string(),
        "instance `orphan` at level 1 cannot be opened outside of a root scope"
    );
    assert!(!output.contains("$scope"));
}

#[test]
fn vector_and_scalar_declarations() {
    let bit = Signal::new(1, Value::from_u64(1));
    let byte = Signal::new(8, Value::from_u64(0x81));
    let count = Signal::new(0, Value::from_u64(12));
    let state = Signal::new(2, Value::symbol("IDLE"));
    let hierarchy = Hierarchy::new(vec![Instance::new("top", 0)
        .with_signal("bit", &bit)
        .with_signal("byte", &byte)
        .with_signal("count", &count)
        .with_signal("state", &state)]);
    let output = trace_ok(&hierarchy);
    assert_eq!(
        var_lines(&output),
        vec![
            "$var reg 1 ! bit $end",
            "$var reg 8 \" byte $end",
            "$var real 1 # count $end",
            "$var real 1 $ state $end",
        ]
    );
    assert_eq!(
        dump_lines(&output),
        vec!["1!", "b10000001 \"", "r12 #", "sIDLE $"]
    );
}

#[test]
fn memories_are_flattened() {
    let en = Signal::new(1, Value::from_u64(0));
    let entries: Vec<_> = (0..3)
        .map(|i| Signal::new(8, Value::from_u64(i)))
        .collect();
    let hierarchy = Hierarchy::new(vec![Instance::new("top", 0)
        .with_signal("en", &en)
        .with_memory("mem", Memory::new(entries))]);
    let output = trace_ok(&hierarchy);
    let structure: Vec<_> = output
        .lines()
        .skip_while(|l| !l.starts_with("$scope"))
        .take_while(|l| !l.is_empty())
        .collect();
    assert_eq!(
        structure,
        vec![
            "$scope module top $end",
            "$var reg 1 ! en $end",
            "$scope module mem $end",
            "$var reg 8 \" mem(0) $end",
            "$var reg 8 # mem(1) $end",
            "$var reg 8 $ mem(2) $end",
            "$upscope $end",
            "$upscope $end",
        ]
    );
    assert_eq!(
        dump_lines(&output),
        vec!["0!", "b00000000 \"", "b00000001 #", "b00000010 $"]
    );
}

#[test]
fn memory_entry_aliasing_a_signal_is_coded_once() {
    let head = Signal::new(4, Value::from_u64(3));
    let tail = Signal::new(4, Value::from_u64(0));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0).with_signal("head", &head),
        Instance::new("fifo", 1)
            .with_memory("slots", Memory::new(vec![tail.clone(), head.clone()])),
    ]);
    let output = trace_ok(&hierarchy);
    assert_eq!(
        var_lines(&output),
        vec![
            "$var reg 4 ! head $end",
            "$var reg 4 \" slots(0) $end",
            "$var reg 4 ! slots(1) $end",
        ]
    );
    assert_eq!(dump_lines(&output), vec!["b0011 !", "b0000 \""]);
}

#[test]
fn memory_tracing_can_be_disabled() {
    let _guard = exclusive();
    let entry = Signal::new(8, Value::from_u64(1));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0).with_memory("mem", Memory::new(vec![entry]))
    ]);
    let mut output = Vec::new();
    let opts = TraceOptions {
        trace_memories: false,
        ..options()
    };
    let trace = TraceSession::begin()
        .unwrap()
        .trace(&hierarchy, &opts, &mut output)
        .unwrap();
    assert!(trace.signals().is_empty());
    drop(trace);
    let output = String::from_utf8(output).unwrap();
    assert!(!output.contains("mem"));
}

#[test]
fn undefined_value_aborts() {
    let ok = Signal::new(1, Value::from_u64(0));
    let rst = Signal::new(1, None);
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0).with_signal("ok", &ok),
        Instance::new("ctrl", 1).with_signal("rst", &rst),
    ]);
    let (output, result) = trace(&hierarchy);
    match result {
        Err(TraceError::MissingInitialValue { signal, instance }) => {
            assert_eq!(signal, "rst");
            assert_eq!(instance, "ctrl");
        }
        x => panic!("unexpected {:?}", x),
    }
    assert!(!output.contains("$dumpvars"));
    assert!(!output.contains("$enddefinitions"));
}

#[test]
fn undefined_memory_entry_aborts() {
    let hierarchy = Hierarchy::new(vec![Instance::new("top", 0).with_memory(
        "regs",
        Memory::new(vec![Signal::new(4, Value::from_u64(0)), Signal::new(4, None)]),
    )]);
    let (_, result) = trace(&hierarchy);
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "regs(1) of module top has no initial value");
}

#[test]
fn tristate_traces_original_value() {
    let bus = Signal::tristate(4, Value::from_u64(0));
    bus.set_value(Value::from_u64(0xf));
    let drv = Signal::driver(&bus);
    drv.set_value(Value::from_u64(0x5));
    let hierarchy = Hierarchy::new(vec![
        Instance::new("top", 0).with_signal("bus", &bus),
        Instance::new("dev", 1).with_signal("drv", &drv),
    ]);
    let output = trace_ok(&hierarchy);
    assert_eq!(dump_lines(&output), vec!["b0000 !", "b0000 \""]);
}

#[test]
fn codes_follow_the_generator() {
    let signals: Vec<_> = (0..200)
        .map(|i| Signal::new(1, Value::from_u64(i % 2)))
        .collect();
    let mut top = Instance::new("top", 0);
    for (i, s) in signals.iter().enumerate() {
        top.add_signal(format!("s{}", i), s);
    }
    trace_ok(&Hierarchy::new(vec![top]));
    for (i, s) in signals.iter().enumerate() {
        assert_eq!(code::decode(&s.code().unwrap()), Some(i as u64));
    }
}

#[test]
fn second_session_is_rejected() {
    let _guard = exclusive();
    let first = TraceSession::begin().unwrap();
    assert!(TraceSession::is_active());
    assert!(matches!(
        TraceSession::begin(),
        Err(TraceError::ReentrantTrace)
    ));
    drop(first);
    assert!(!TraceSession::is_active());
    TraceSession::begin().unwrap();
}

#[test]
fn session_is_exclusive_across_threads() {
    let _guard = exclusive();
    let first = TraceSession::begin().unwrap();
    let rejected = thread::spawn(|| match TraceSession::begin() {
        Err(TraceError::ReentrantTrace) => true,
        _ => false,
    })
    .join()
    .unwrap();
    assert!(rejected);
    drop(first);
    let accepted = thread::spawn(|| TraceSession::begin().is_ok())
        .join()
        .unwrap();
    assert!(accepted);
    assert!(!TraceSession::is_active());
}

#[test]
fn session_stays_active_while_tracing() {
    let _guard = exclusive();
    let s = Signal::new(1, Value::from_u64(0));
    let hierarchy = Hierarchy::new(vec![Instance::new("top", 0).with_signal("s", &s)]);
    let trace = TraceSession::begin()
        .unwrap()
        .trace(&hierarchy, &options(), Vec::new())
        .unwrap();
    assert!(TraceSession::begin().is_err());
    trace.finish().unwrap();
    assert!(TraceSession::begin().is_ok());
}

#[test]
fn retried_pass_starts_fresh() {
    let a = Signal::new(1, Value::from_u64(0));
    let b = Signal::new(1, None);
    let hierarchy = Hierarchy::new(vec![Instance::new("top", 0)
        .with_signal("a", &a)
        .with_signal("b", &b)]);
    assert!(trace(&hierarchy).1.is_err());
    assert!(a.is_traced());
    b.set_value(Value::from_u64(1));
    let output = trace_ok(&hierarchy);
    assert_eq!(a.code().as_deref(), Some("!"));
    assert_eq!(b.code().as_deref(), Some("\""));
    assert_eq!(dump_lines(&output), vec!["0!", "1\""]);
}

#[test]
fn value_changes_after_dump() {
    let _guard = exclusive();
    let clk = Signal::new(1, Value::from_u64(0));
    let cnt = Signal::new(4, Value::from_u64(0));
    let untraced = Signal::new(1, Value::from_u64(0));
    let hierarchy = Hierarchy::new(vec![Instance::new("top", 0)
        .with_signal("clk", &clk)
        .with_signal("cnt", &cnt)]);
    let mut trace = TraceSession::begin()
        .unwrap()
        .trace(&hierarchy, &options(), Vec::new())
        .unwrap();
    trace.advance(0).unwrap();
    trace.advance(10).unwrap();
    clk.set_value(Value::from_u64(1));
    cnt.set_value(Value::from_u64(1));
    trace.change(&clk).unwrap();
    trace.change(&cnt).unwrap();
    trace.change(&untraced).unwrap();
    trace.advance(10).unwrap();
    assert!(matches!(
        trace.advance(5),
        Err(TraceError::TimeReversal {
            current: 10,
            requested: 5
        })
    ));
    let output = String::from_utf8(trace.finish().unwrap()).unwrap();
    let tail: Vec<_> = output
        .lines()
        .skip_while(|l| !l.starts_with('#'))
        .collect();
    assert_eq!(tail, vec!["#0", "#10", "1!", "b0001 \""]);
}
