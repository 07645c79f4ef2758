// Advice chains: layered registration, activation policies, partial
// registration, and concurrent callers during installation

use aspecto::scenario::{lunch_module, Transcript};
use aspecto::{
    classify, register, wrapper, ActivationPolicy, AspectError, Function, HookSlot, Invocation,
    Registration, RegistrationConfig, Runtime, Value,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

/// Test that the later layer runs first and reaches the original through the earlier one
#[test]
fn test_two_layers_on_free_function() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);

    let out = transcript.clone();
    register(&runtime, [lunch.function("eat").unwrap().into()])
        .unwrap()
        .activate(move |call: &Invocation| {
            out.say("first");
            call.proceed()
        })
        .unwrap();

    let out = transcript.clone();
    register(&runtime, [lunch.function("eat").unwrap().into()])
        .unwrap()
        .activate(move |call: &Invocation| {
            out.say("second");
            call.proceed()
        })
        .unwrap();

    lunch.call("eat", &[Value::from("soup")]).unwrap();
    assert_eq!(transcript.lines(), vec!["second", "first", "eating soup"]);
}

/// Test layering on instance, class-bound and static members
#[test]
fn test_two_layers_on_methods() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);
    let eater = lunch.type_def("Eater").unwrap();

    for label in ["inner", "outer"] {
        let out = transcript.clone();
        register(
            &runtime,
            [
                eater.attr("eat").unwrap(),
                eater.attr("eat_class").unwrap(),
                eater.attr("eat_static").unwrap(),
            ],
        )
        .unwrap()
        .activate(move |call: &Invocation| {
            out.say(label);
            call.proceed()
        })
        .unwrap();
    }

    eater.instantiate().call_method("eat", &[]).unwrap();
    eater.call("eat_class", &[]).unwrap();
    eater.call("eat_static", &[]).unwrap();

    assert_eq!(
        transcript.lines(),
        vec![
            "outer",
            "inner",
            "tastes like identity!",
            "outer",
            "inner",
            "let them eat cake!",
            "outer",
            "inner",
            "mmm, static cling",
        ]
    );
}

/// Test that a layer's argument changes are seen by the layer beneath
#[test]
fn test_layers_compose_argument_changes() {
    let runtime = Runtime::new();
    let text = runtime.create_module("text");
    let shout = text.define_function("shout", 1, |args| {
        Ok(Value::from(args[0].as_str("shout")?.to_uppercase()))
    });

    register(&runtime, [shout.into()])
        .unwrap()
        .activate(|call: &Invocation| {
            let s = call.arg(0)?.as_str("shout")?;
            call.proceed_with(&[Value::from(format!("{}!", s))])
        })
        .unwrap();
    register(&runtime, [text.function("shout").unwrap().into()])
        .unwrap()
        .activate(|call: &Invocation| {
            let s = call.arg(0)?.as_str("shout")?;
            call.proceed_with(&[Value::from(format!("hey {}", s))])
        })
        .unwrap();

    assert_eq!(
        text.call("shout", &[Value::from("you")]).unwrap(),
        Value::from("HEY YOU!")
    );
}

/// Test that an activated earlier layer still works when a later layer is pending
#[test]
fn test_pending_outer_layer_blocks_calls() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);

    register(&runtime, [lunch.function("eat").unwrap().into()])
        .unwrap()
        .activate(|call: &Invocation| call.proceed())
        .unwrap();
    let _pending = register(&runtime, [lunch.function("eat").unwrap().into()]).unwrap();

    assert!(matches!(
        lunch.call("eat", &[Value::from("soup")]),
        Err(AspectError::HookNotActivated { .. })
    ));
}

/// Test that re-activating the same registration fails by default
#[test]
fn test_reactivation_rejected() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);

    let activator = register(&runtime, [lunch.function("eat").unwrap().into()]).unwrap();
    activator.activate(|call: &Invocation| call.proceed()).unwrap();
    let err = activator
        .activate(|_: &Invocation| Ok(Value::Unit))
        .err()
        .unwrap();
    assert_eq!(
        err,
        AspectError::AlreadyActivated {
            join_points: "lunch.eat".to_string()
        }
    );

    // The first advice is still in place
    lunch.call("eat", &[Value::from("soup")]).unwrap();
    assert_eq!(transcript.lines(), vec!["eating soup"]);
}

/// Test the opt-in overwrite policy
#[test]
fn test_reactivation_overwrites_when_allowed() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);

    let activator = Registration::new(&runtime)
        .with_config(RegistrationConfig::new().with_activation_policy(ActivationPolicy::Overwrite))
        .join_point(lunch.function("eat").unwrap())
        .install()
        .unwrap();
    activator.activate(|call: &Invocation| call.proceed()).unwrap();
    activator
        .activate(|call: &Invocation| call.proceed_with(&[Value::from("cake")]))
        .unwrap();

    lunch.call("eat", &[Value::from("soup")]).unwrap();
    assert_eq!(transcript.lines(), vec!["eating cake"]);
}

/// Test that a failure midway keeps earlier installations
#[test]
fn test_partial_registration_is_not_rolled_back() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);
    let stray = Function::new("stray", "lunch", Some(0), |_| Ok(Value::Unit));

    let err = register(
        &runtime,
        [lunch.function("eat").unwrap().into(), stray.into()],
    )
    .unwrap_err();
    assert_eq!(
        err,
        AspectError::UnresolvableJoinPoint {
            name: "stray".to_string()
        }
    );
    assert!(matches!(
        lunch.call("eat", &[Value::from("soup")]),
        Err(AspectError::HookNotActivated { .. })
    ));
}

/// Test that callers racing an installation see the old or the new behavior only
#[test]
fn test_concurrent_callers_during_install() {
    let runtime = Arc::new(Runtime::new());
    let counter = runtime.create_module("counter");
    counter.define_function("value", 0, |_| Ok(Value::Int(1)));

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let counter = counter.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut observed = Vec::new();
                while !done.load(Ordering::Acquire) {
                    match counter.call("value", &[]) {
                        Ok(v) => observed.push(v),
                        Err(AspectError::HookNotActivated { .. }) => {}
                        Err(other) => panic!("unexpected error: {}", other),
                    }
                }
                observed
            })
        })
        .collect();

    let activator = register(&runtime, [counter.function("value").unwrap().into()]).unwrap();
    activator
        .activate(|call: &Invocation| {
            let inner = call.proceed()?.as_int("value")?;
            Ok(Value::Int(inner + 1))
        })
        .unwrap();
    thread::sleep(std::time::Duration::from_millis(20));
    done.store(true, Ordering::Release);

    for reader in readers {
        for v in reader.join().unwrap() {
            assert!(v == Value::Int(1) || v == Value::Int(2), "torn value {:?}", v);
        }
    }
    assert_eq!(counter.call("value", &[]).unwrap(), Value::Int(2));
}

/// Test that racing registrations on one function each keep their layer
#[test]
fn test_concurrent_registrations_all_stack() {
    const THREADS: usize = 8;

    for _ in 0..50 {
        let runtime = Arc::new(Runtime::new());
        let module = runtime.create_module("m");
        module.define_function("f", 0, |_| Ok(Value::Int(0)));

        let barrier = Arc::new(Barrier::new(THREADS));
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let runtime = runtime.clone();
                let module = module.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    Registration::new(&runtime)
                        .free(&module, "f")
                        .install()
                        .and_then(|activator| {
                            activator.activate(|call: &Invocation| {
                                Ok(Value::Int(call.proceed()?.as_int("f")? + 1))
                            })
                        })
                        .is_ok()
                })
            })
            .collect();

        let registered = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(registered, THREADS);
        assert_eq!(module.call("f", &[]).unwrap(), Value::Int(THREADS as i64));
    }
}

/// Test that a join point classified before another registration is not installed over it
#[test]
fn test_install_over_rebound_site_fails() {
    let runtime = Runtime::new();
    let module = runtime.create_module("m");
    module.define_function("f", 0, |_| Ok(Value::Int(1)));
    let stale = classify(&runtime, &module.function("f").unwrap().into()).unwrap();

    register(&runtime, [module.function("f").unwrap().into()])
        .unwrap()
        .activate(|call: &Invocation| Ok(Value::Int(call.proceed()?.as_int("f")? + 100)))
        .unwrap();

    let (slot, _setter) = HookSlot::pending(ActivationPolicy::default());
    let err = wrapper::install(&stale, wrapper::build(&stale, &slot).unwrap()).unwrap_err();
    assert!(matches!(err, AspectError::BindingChanged { .. }));
    assert_eq!(module.call("f", &[]).unwrap(), Value::Int(101));
}
