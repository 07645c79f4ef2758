// Method advice: instance, class-bound and static join points, including
// several kinds sharing one registration

use aspecto::scenario::{lunch_module, Transcript};
use aspecto::{
    register, AspectError, Invocation, JoinPointKind, Receiver, Registration, Runtime, TypeDef,
    TypeRef, Value,
};
use std::sync::{Arc, Mutex};

fn account_type(runtime: &Runtime) -> TypeRef {
    let bank = runtime.create_module("bank");
    bank.define_type(
        TypeDef::builder("Account")
            .instance_method("deposit", 1, |args| {
                let this = args[0].as_object("deposit")?;
                let amount = args[1].as_int("deposit")?;
                let balance = this
                    .field("balance")
                    .map_or(Ok(0), |v| v.as_int("balance"))?
                    + amount;
                this.set_field("balance", balance);
                Ok(Value::Int(balance))
            })
            .class_method("describe", 0, |args| {
                Ok(Value::from(format!("account type {}", args[0].as_type("describe")?.name())))
            })
            .static_method("fee", 1, |args| Ok(Value::Int(args[0].as_int("fee")? / 100))),
    )
}

/// Test the documented eater example: one advice over three method kinds
#[test]
fn test_eater_methods_share_one_advice() {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);
    let eater = lunch.type_def("Eater").unwrap();

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
        out.say("delicious!");
        call.proceed()
    })
    .unwrap();

    eater.instantiate().call_method("eat", &[]).unwrap();
    eater.call("eat_class", &[]).unwrap();
    eater.call("eat_static", &[]).unwrap();

    assert_eq!(
        transcript.lines(),
        vec![
            "delicious!",
            "tastes like identity!",
            "delicious!",
            "let them eat cake!",
            "delicious!",
            "mmm, static cling",
        ]
    );
}

/// Test that instance advice receives the instance and next() acts on it
#[test]
fn test_instance_receiver_and_continuation() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let first = account.instantiate();
    let second = account.instantiate();

    let receivers = Arc::new(Mutex::new(Vec::new()));
    let record = receivers.clone();
    register(&runtime, [account.attr("deposit").unwrap()])
        .unwrap()
        .activate(move |call: &Invocation| {
            record.lock().unwrap().push(call.receiver.clone());
            // Double every deposit
            let amount = call.arg(0)?.as_int("deposit")?;
            call.proceed_with(&[Value::Int(amount * 2)])
        })
        .unwrap();

    assert_eq!(first.call_method("deposit", &[Value::Int(5)]).unwrap(), Value::Int(10));
    assert_eq!(second.call_method("deposit", &[Value::Int(1)]).unwrap(), Value::Int(2));
    assert_eq!(first.field("balance"), Some(Value::Int(10)));
    assert_eq!(second.field("balance"), Some(Value::Int(2)));

    let receivers = receivers.lock().unwrap();
    assert_eq!(receivers[0], Receiver::Instance(first.clone()));
    assert_eq!(receivers[1], Receiver::Instance(second.clone()));
}

/// Test registering through a bound instance advises every instance
#[test]
fn test_bound_instance_reference_advises_type() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let holder = account.instantiate();
    let other = account.instantiate();

    let activator = register(&runtime, [holder.attr("deposit").unwrap()]).unwrap();
    assert_eq!(activator.join_points()[0].kind(), JoinPointKind::Instance);
    activator
        .activate(|call: &Invocation| {
            call.proceed()?;
            Ok(Value::from("audited"))
        })
        .unwrap();

    assert_eq!(
        other.call_method("deposit", &[Value::Int(3)]).unwrap(),
        Value::from("audited")
    );
    assert_eq!(other.field("balance"), Some(Value::Int(3)));
}

/// Test that class-bound advice receives the type used at the call site
#[test]
fn test_class_bound_receives_subtype() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let savings = runtime
        .module("bank")
        .unwrap()
        .define_type(TypeDef::builder("Savings").base(&account));

    let receivers = Arc::new(Mutex::new(Vec::new()));
    let record = receivers.clone();
    register(&runtime, [account.attr("describe").unwrap()])
        .unwrap()
        .activate(move |call: &Invocation| {
            record.lock().unwrap().push(call.receiver.clone());
            call.proceed()
        })
        .unwrap();

    // The continuation stays bound to the registering type
    assert_eq!(
        savings.call("describe", &[]).unwrap(),
        Value::from("account type Account")
    );
    assert_eq!(
        account.call("describe", &[]).unwrap(),
        Value::from("account type Account")
    );

    let receivers = receivers.lock().unwrap();
    assert_eq!(receivers[0], Receiver::Type(savings.clone()));
    assert_eq!(receivers[1], Receiver::Type(account.clone()));
}

/// Test that a class-bound member called through an instance passes its type
#[test]
fn test_class_bound_through_instance() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    register(&runtime, [account.attr("describe").unwrap()])
        .unwrap()
        .activate(|call: &Invocation| {
            assert!(matches!(call.receiver, Receiver::Type(_)));
            call.proceed()
        })
        .unwrap();

    let value = account.instantiate().call_method("describe", &[]).unwrap();
    assert_eq!(value, Value::from("account type Account"));
}

/// Test that static advice receives no receiver and next(a) == s(a)
#[test]
fn test_static_method() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let fee = account.own_member("fee").unwrap().function;

    let activator = register(&runtime, [account.attr("fee").unwrap()]).unwrap();
    assert_eq!(activator.join_points()[0].kind(), JoinPointKind::Static);
    activator
        .activate(|call: &Invocation| {
            assert!(call.receiver.is_none());
            call.proceed()
        })
        .unwrap();

    for amount in [0i64, 150, 10_000] {
        assert_eq!(
            account.call("fee", &[Value::Int(amount)]).unwrap(),
            fee.call(&[Value::Int(amount)]).unwrap()
        );
    }
    // Through an instance too
    assert_eq!(
        account.instantiate().call_method("fee", &[Value::Int(300)]).unwrap(),
        Value::Int(3)
    );
}

/// Test that one activation enables every join point of the registration
#[test]
fn test_shared_slot_activates_all_at_once() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let instance = account.instantiate();

    let activator = Registration::new(&runtime)
        .instance(&account, "deposit")
        .class_bound(&account, "describe")
        .static_method(&account, "fee")
        .install()
        .unwrap();

    for result in [
        instance.call_method("deposit", &[Value::Int(1)]),
        account.call("describe", &[]),
        account.call("fee", &[Value::Int(100)]),
    ] {
        assert!(matches!(result, Err(AspectError::HookNotActivated { .. })));
    }

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let record = kinds.clone();
    activator
        .activate(move |call: &Invocation| {
            record.lock().unwrap().push(call.kind);
            call.proceed()
        })
        .unwrap();

    instance.call_method("deposit", &[Value::Int(1)]).unwrap();
    account.call("describe", &[]).unwrap();
    account.call("fee", &[Value::Int(100)]).unwrap();
    assert_eq!(
        *kinds.lock().unwrap(),
        vec![JoinPointKind::Instance, JoinPointKind::ClassBound, JoinPointKind::Static]
    );
}

/// Test the error for a member that does not exist
#[test]
fn test_missing_member_is_unresolvable() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let err = Registration::new(&runtime)
        .instance(&account, "withdraw")
        .install()
        .unwrap_err();
    assert_eq!(
        err,
        AspectError::UnresolvableJoinPoint {
            name: "withdraw".to_string()
        }
    );
}

/// Test that a class-bound reference taken before another registration no longer resolves
#[test]
fn test_stale_class_bound_reference_is_unresolvable() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let stale = account.attr("describe").unwrap();

    register(&runtime, [account.attr("describe").unwrap()])
        .unwrap()
        .activate(|call: &Invocation| {
            let inner = call.proceed()?;
            Ok(Value::from(format!("[{}]", inner)))
        })
        .unwrap();

    let err = register(&runtime, [stale]).unwrap_err();
    assert_eq!(
        err,
        AspectError::UnresolvableJoinPoint {
            name: "describe".to_string()
        }
    );
    // The installed layer survives
    assert_eq!(
        account.call("describe", &[]).unwrap(),
        Value::from("[account type Account]")
    );
}

/// Test that an inherited instance method is advised on its declaring type
#[test]
fn test_inherited_instance_method_through_subtype() {
    let runtime = Runtime::new();
    let account = account_type(&runtime);
    let savings = runtime
        .module("bank")
        .unwrap()
        .define_type(TypeDef::builder("Savings").base(&account));
    let savings_obj = savings.instantiate();
    let plain_obj = account.instantiate();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let record = calls.clone();
    let activator = register(&runtime, [savings_obj.attr("deposit").unwrap()]).unwrap();
    assert_eq!(activator.join_points()[0].qualified_name(), "Account.deposit");
    assert!(savings.own_member("deposit").is_none());
    activator
        .activate(move |call: &Invocation| {
            if let Receiver::Instance(obj) = &call.receiver {
                record.lock().unwrap().push(obj.type_def().name().to_string());
            }
            call.proceed()
        })
        .unwrap();

    assert_eq!(savings_obj.call_method("deposit", &[Value::Int(5)]).unwrap(), Value::Int(5));
    assert_eq!(plain_obj.call_method("deposit", &[Value::Int(7)]).unwrap(), Value::Int(7));
    assert_eq!(*calls.lock().unwrap(), vec!["Savings", "Account"]);
}
