//! Demonstration scenarios run by the `aspecto` binary
//!
//! - `lunch`: a free function whose advice swaps one argument
//! - `eater`: one advice over an instance, a class-bound and a static method;
//!   without static search the static method is registered with its owner
//! - `layered`: the same free function advised twice

use crate::advice::Invocation;
use crate::classifier::JoinPointKind;
use crate::error::Result;
use crate::module::ModuleRef;
use crate::register::{Activator, Registration, RegistrationConfig};
use crate::runtime::Runtime;
use crate::types::TypeDef;
use crate::value::Value;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Lines "printed" by scenario functions and advice
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A join point as reported after registration
#[derive(Debug, Clone, Serialize)]
pub struct AdvisedJoinPoint {
    pub name: String,
    pub kind: JoinPointKind,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub advised: Vec<AdvisedJoinPoint>,
    pub output: Vec<String>,
}

impl ScenarioReport {
    fn new(scenario: &str, activators: &[&Activator], transcript: &Transcript) -> Self {
        let advised = activators
            .iter()
            .flat_map(|a| a.join_points())
            .map(|jp| AdvisedJoinPoint {
                name: jp.name().to_string(),
                kind: jp.kind(),
                owner: jp.site().owner_name().to_string(),
            })
            .collect();
        Self {
            scenario: scenario.to_string(),
            advised,
            output: transcript.lines(),
        }
    }
}

/// Build the `lunch` module: a free function `eat` and the type `Eater`
pub fn lunch_module(runtime: &Runtime, transcript: &Transcript) -> ModuleRef {
    let module = runtime.create_module("lunch");

    let out = transcript.clone();
    module.define_function("eat", 1, move |args| {
        out.say(format!("eating {}", args[0].as_str("eat")?));
        Ok(Value::Unit)
    });

    let (a, b, c) = (transcript.clone(), transcript.clone(), transcript.clone());
    module.define_type(
        TypeDef::builder("Eater")
            .instance_method("eat", 0, move |_| {
                a.say("tastes like identity!");
                Ok(Value::Unit)
            })
            .class_method("eat_class", 0, move |_| {
                b.say("let them eat cake!");
                Ok(Value::Unit)
            })
            .static_method("eat_static", 0, move |_| {
                c.say("mmm, static cling");
                Ok(Value::Unit)
            }),
    );

    module
}

/// Advise `eat` so a sandwich becomes dirt, then serve each food
pub fn run_lunch(foods: &[String], config: RegistrationConfig) -> Result<ScenarioReport> {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);

    let activator = Registration::new(&runtime)
        .with_config(config)
        .join_point(lunch.function("eat")?)
        .install()?;

    let out = transcript.clone();
    activator.activate(move |call: &Invocation| {
        if call.arg(0)?.as_str("eat")? == "sandwich" {
            out.say("delicious sandwich!");
            return call.proceed_with(&[Value::from("dirt")]);
        }
        call.proceed()
    })?;

    for food in foods {
        lunch.call("eat", &[Value::from(food.as_str())])?;
    }

    Ok(ScenarioReport::new("lunch", &[&activator], &transcript))
}

/// Advise all three `Eater` methods with one advice in one registration
pub fn run_eater(config: RegistrationConfig) -> Result<ScenarioReport> {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);
    let eater = lunch.type_def("Eater")?;

    let registration = Registration::new(&runtime)
        .with_config(config)
        .join_point(eater.attr("eat")?)
        .join_point(eater.attr("eat_class")?);
    let registration = if config.static_search {
        registration.join_point(eater.attr("eat_static")?)
    } else {
        registration.static_method(&eater, "eat_static")
    };
    let activator = registration.install()?;

    let out = transcript.clone();
    activator.activate(move |call: &Invocation| {
        out.say("delicious!");
        call.proceed()
    })?;

    eater.instantiate().call_method("eat", &[])?;
    eater.call("eat_class", &[])?;
    eater.call("eat_static", &[])?;

    Ok(ScenarioReport::new("eater", &[&activator], &transcript))
}

/// Advise `eat` twice; the later layer runs first
pub fn run_layered(foods: &[String], config: RegistrationConfig) -> Result<ScenarioReport> {
    let runtime = Runtime::new();
    let transcript = Transcript::new();
    let lunch = lunch_module(&runtime, &transcript);

    let seasoning = Registration::new(&runtime)
        .with_config(config)
        .join_point(lunch.function("eat")?)
        .install()?;
    let out = transcript.clone();
    seasoning.activate(move |call: &Invocation| {
        out.say("seasoning");
        let food = call.arg(0)?.as_str("eat")?;
        call.proceed_with(&[Value::from(format!("seasoned {}", food))])
    })?;

    // Resolves to the seasoning layer now bound under `eat`
    let plating = Registration::new(&runtime)
        .with_config(config)
        .join_point(lunch.function("eat")?)
        .install()?;
    let out = transcript.clone();
    plating.activate(move |call: &Invocation| {
        out.say("plating");
        call.proceed()
    })?;

    for food in foods {
        lunch.call("eat", &[Value::from(food.as_str())])?;
    }

    Ok(ScenarioReport::new("layered", &[&seasoning, &plating], &transcript))
}
