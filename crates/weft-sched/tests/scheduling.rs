//! End-to-end scheduling scenarios: ordering, gating, fault containment,
//! and the deferred invocation forms.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use weft_core::CallError;
use weft_sched::{Call, FaultStage, RunError, Schedule, System, TickResult};
use weft_spec::{AccessCode, AccessNode, Path};
use weft_test_utils::{const_writer, failing, new_log, recorder};

#[test]
fn writer_then_reader_chain() {
    // A (no dependencies) writes x=1; B (runs_after A) reads x and
    // writes y=x+1. Running against {} yields {x:1, y:2}.
    let mut sched = Schedule::new("update");
    let a = System::named("a")
        .writes("x")
        .via(|_| Ok(Some(json!({"x": 1}))))
        .during(&mut sched)
        .unwrap();
    System::named("b")
        .runs_after(a)
        .reads("x")
        .writes("y")
        .via(|slice| {
            let x = slice["x"].as_i64().unwrap_or(0);
            Ok(Some(json!({"y": x + 1})))
        })
        .during(&mut sched)
        .unwrap();

    let mut state = json!({});
    sched.run(&mut state).unwrap();
    assert_eq!(state, json!({"x": 1, "y": 2}));
    assert_eq!(sched.last_metrics().executed, 2);
}

#[test]
fn without_gates_on_absence() {
    // C declares without("flag"): present flag skips C, absent flag
    // executes it.
    let mut sched = Schedule::new("update");
    System::named("c")
        .without("flag")
        .writes("ran")
        .via(|_| Ok(Some(json!({"ran": true}))))
        .during(&mut sched)
        .unwrap();

    let mut state = json!({"flag": true});
    sched.run(&mut state).unwrap();
    assert_eq!(state, json!({"flag": true}));
    assert_eq!(sched.last_metrics().skipped_inputs, 1);
    assert_eq!(sched.last_metrics().executed, 0);

    let mut state = json!({});
    sched.run(&mut state).unwrap();
    assert_eq!(state, json!({"ran": true}));
    assert_eq!(sched.last_metrics().executed, 1);
}

#[test]
fn unsatisfied_inputs_skip_silently_and_leave_state_unmodified() {
    let mut sched = Schedule::new("update");
    System::named("needs-x")
        .reads("x")
        .writes("y")
        .via(|_| Ok(Some(json!({"y": 1}))))
        .during(&mut sched)
        .unwrap();

    let mut state = json!({"other": 0});
    sched.run(&mut state).unwrap();
    assert_eq!(state, json!({"other": 0}));
    assert_eq!(sched.last_metrics().skipped_inputs, 1);
}

#[test]
fn low_level_call_api_supports_specs_and_preconditions() {
    let mut sched = Schedule::new("update");
    let mut writes = AccessNode::branch();
    writes.declare(&Path::from("ran"), AccessCode::Write);
    let call = Call::new("mark", const_writer("ran", json!(true)))
        .with_writes(writes)
        .with_precondition(|state| Ok(state.get("enabled").is_some()));
    sched.insert(call, None, None).unwrap();

    let mut state = json!({});
    sched.run(&mut state).unwrap();
    assert_eq!(state, json!({}));
    assert_eq!(sched.last_metrics().skipped_precondition, 1);

    let mut state = json!({"enabled": 1});
    sched.run(&mut state).unwrap();
    assert_eq!(state, json!({"enabled": 1, "ran": true}));
}

#[test]
fn registration_order_breaks_ties_between_unconstrained_calls() {
    let mut sched = Schedule::new("update");
    let log = new_log();
    for name in ["first", "second", "third"] {
        sched
            .insert(Call::new(name, recorder(&log, name)), None, None)
            .unwrap();
    }
    let mut state = json!({});
    sched.run(&mut state).unwrap();
    assert_eq!(*log.borrow(), ["first", "second", "third"]);
}

#[test]
fn rules_override_registration_order_at_run_time() {
    let mut sched = Schedule::new("update");
    let log = new_log();
    let late = sched
        .insert(Call::new("late", recorder(&log, "late")), None, None)
        .unwrap();
    sched
        .insert(
            Call::new("early", recorder(&log, "early")),
            Some(vec![Schedule::START]),
            Some(vec![late]),
        )
        .unwrap();
    let mut state = json!({});
    sched.run(&mut state).unwrap();
    assert_eq!(*log.borrow(), ["early", "late"]);
}

#[test]
fn mutual_dependency_fails_the_build() {
    let mut sched = Schedule::new("update");
    let a = System::named("a").via(|_| Ok(None)).during(&mut sched).unwrap();
    let b = System::named("b").via(|_| Ok(None)).during(&mut sched).unwrap();
    sched.add_rule(a, b).unwrap();
    sched.add_rule(b, a).unwrap();

    let err = sched.build().unwrap_err();
    assert!(err.remaining.contains(&"a".to_string()));
    assert!(err.remaining.contains(&"b".to_string()));

    // The same failure surfaces through run as a RunError.
    let mut state = json!({});
    match sched.run(&mut state) {
        Err(RunError::Unsolvable(source)) => assert_eq!(source.schedule, "update"),
        other => panic!("expected unsolvable graph, got {other:?}"),
    }
}

#[test]
fn inserting_after_a_run_forces_a_rebuild() {
    let mut sched = Schedule::new("update");
    let log = new_log();
    sched
        .insert(Call::new("one", recorder(&log, "one")), None, None)
        .unwrap();
    let mut state = json!({});
    sched.run(&mut state).unwrap();
    assert_eq!(sched.last_metrics().rebuilds, 1);

    sched
        .insert(Call::new("two", recorder(&log, "two")), None, None)
        .unwrap();
    sched.run(&mut state).unwrap();
    assert_eq!(sched.last_metrics().rebuilds, 2);
    assert_eq!(*log.borrow(), ["one", "one", "two"]);
}

#[test]
fn prun_hands_the_fault_to_the_handler_exactly_once() {
    let mut sched = Schedule::new("update");
    System::named("ok")
        .writes("x")
        .via(|_| Ok(Some(json!({"x": 1}))))
        .during(&mut sched)
        .unwrap();
    sched
        .insert(Call::new("broken", failing("boom")), None, None)
        .unwrap();

    let calls = Rc::new(RefCell::new(0));
    let calls_seen = Rc::clone(&calls);
    let mut state = json!({});
    let outcome = sched.prun(
        move |report| {
            *calls_seen.borrow_mut() += 1;
            assert_eq!(report.context.schedule, "update");
            assert_eq!(report.context.call.as_deref(), Some("broken"));
            assert_eq!(report.context.stage, FaultStage::Body);
            assert!(report.description.contains("boom"));
            "recovered"
        },
        &mut state,
    );

    assert_eq!(outcome, TickResult::Recovered("recovered"));
    assert_eq!(*calls.borrow(), 1);
    // Calls before the fault completed; their writes stand.
    assert_eq!(state, json!({"x": 1}));
    assert_eq!(sched.last_metrics().faults, 1);
}

#[test]
fn a_contained_fault_does_not_poison_later_runs() {
    let mut sched = Schedule::new("update");
    let armed = Rc::new(RefCell::new(true));
    let armed_body = Rc::clone(&armed);
    System::named("sometimes-broken")
        .writes("x")
        .via(move |_| {
            if *armed_body.borrow() {
                Err(CallError::ExecutionFailed { reason: "armed".into() })
            } else {
                Ok(Some(json!({"x": 1})))
            }
        })
        .during(&mut sched)
        .unwrap();

    let mut state = json!({});
    let first = sched.prun(|report| report.description, &mut state);
    assert!(!first.is_completed());

    *armed.borrow_mut() = false;
    let second: TickResult<String> = sched.prun(|report| report.description, &mut state);
    assert_eq!(second, TickResult::Completed);
    assert_eq!(state, json!({"x": 1}));
}

#[test]
fn faulting_preconditions_are_contained_too() {
    let mut sched = Schedule::new("update");
    System::named("guarded")
        .when(|_| {
            Err(CallError::ExecutionFailed { reason: "bad guard".into() })
        })
        .via(|_| Ok(None))
        .during(&mut sched)
        .unwrap();

    let mut state = json!({});
    let outcome = sched.prun(|report| report.context.stage, &mut state);
    assert_eq!(outcome, TickResult::Recovered(FaultStage::Precondition));
}

#[test]
fn run_deferred_binds_schedule_and_provider() {
    let mut sched = Schedule::new("update");
    System::named("mark")
        .maybe_reads("ticks")
        .writes("ticks")
        .via(|slice| {
            let n = slice.get("ticks").and_then(Value::as_i64).unwrap_or(0);
            Ok(Some(json!({"ticks": n + 1})))
        })
        .during(&mut sched)
        .unwrap();

    let shared: weft_sched::SharedState = Rc::new(RefCell::new(json!({})));
    let bound = Rc::clone(&shared);
    {
        let mut tick = sched.run_deferred(Some(Box::new(move || Rc::clone(&bound))));
        tick(None).unwrap();
        tick(None).unwrap();
    }
    assert_eq!(*shared.borrow(), json!({"ticks": 2}));
}

#[test]
fn explicit_deferred_argument_overrides_the_provider() {
    let mut sched = Schedule::new("update");
    System::named("mark")
        .writes("ran")
        .via(|_| Ok(Some(json!({"ran": true}))))
        .during(&mut sched)
        .unwrap();

    let bound_state: weft_sched::SharedState = Rc::new(RefCell::new(json!({})));
    let explicit_state: weft_sched::SharedState = Rc::new(RefCell::new(json!({})));
    let bound = Rc::clone(&bound_state);
    {
        let mut tick = sched.run_deferred(Some(Box::new(move || Rc::clone(&bound))));
        tick(Some(Rc::clone(&explicit_state))).unwrap();
    }
    assert_eq!(*bound_state.borrow(), json!({}));
    assert_eq!(*explicit_state.borrow(), json!({"ran": true}));
}

#[test]
fn deferred_invocation_without_state_is_a_contained_fault() {
    let mut sched = Schedule::new("update");
    {
        let mut tick = sched.run_deferred(None);
        match tick(None) {
            Err(RunError::StateUnavailable { schedule }) => assert_eq!(schedule, "update"),
            other => panic!("expected missing state, got {other:?}"),
        }
    }
    {
        let mut tick = sched.prun_deferred(|report| report.context.stage, None);
        assert_eq!(tick(None), TickResult::Recovered(FaultStage::Dispatch));
    }
}
