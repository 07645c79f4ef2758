//! Registration: classify, wrap, install, then activate
//!
//! # Example
//! ```
//! use aspecto::{register, Invocation, Runtime, Value};
//!
//! let runtime = Runtime::new();
//! let lunch = runtime.create_module("lunch");
//! let eat = lunch.define_function("eat", 1, |args| {
//!     Ok(Value::from(format!("eating {}", args[0])))
//! });
//!
//! let activate = register(&runtime, [eat.into()]).unwrap();
//! activate
//!     .activate(|call: &Invocation| {
//!         if call.arg(0)? == &Value::from("sandwich") {
//!             return call.proceed_with(&[Value::from("dirt")]);
//!         }
//!         call.proceed()
//!     })
//!     .unwrap();
//!
//! assert_eq!(lunch.call("eat", &[Value::from("soup")]).unwrap(), Value::from("eating soup"));
//! assert_eq!(lunch.call("eat", &[Value::from("sandwich")]).unwrap(), Value::from("eating dirt"));
//! ```

use crate::advice::{Advice, AdviceRef, Invocation};
use crate::callable::CallableRef;
use crate::classifier::{Classifier, JoinPoint};
use crate::error::{AspectError, Result};
use crate::module::ModuleRef;
use crate::runtime::Runtime;
use crate::slot::{ActivationPolicy, HookSlot, Setter};
use crate::types::TypeRef;
use crate::value::Value;
use crate::wrapper;
use std::sync::Arc;

/// Registration settings
///
/// # Example
/// ```
/// use aspecto::{ActivationPolicy, RegistrationConfig};
///
/// let config = RegistrationConfig::new()
///     .with_activation_policy(ActivationPolicy::Overwrite)
///     .with_static_search(false);
/// assert_eq!(config.activation_policy, ActivationPolicy::Overwrite);
/// assert!(!config.static_search);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RegistrationConfig {
    /// Behavior of a second `activate` on the same registration
    pub activation_policy: ActivationPolicy,

    /// Look for bare functions among module types' static members
    pub static_search: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            activation_policy: ActivationPolicy::SingleAssignment,
            static_search: true,
        }
    }
}

impl RegistrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activation_policy(mut self, policy: ActivationPolicy) -> Self {
        self.activation_policy = policy;
        self
    }

    pub fn with_static_search(mut self, enabled: bool) -> Self {
        self.static_search = enabled;
        self
    }
}

enum Target {
    Reference(CallableRef),
    Free(ModuleRef, String),
    Instance(TypeRef, String),
    ClassBound(TypeRef, String),
    Static(TypeRef, String),
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Target::Reference(callable) => callable.name(),
            Target::Free(_, name)
            | Target::Instance(_, name)
            | Target::ClassBound(_, name)
            | Target::Static(_, name) => name,
        }
    }

    fn resolve(&self, classifier: &Classifier<'_>) -> Result<JoinPoint> {
        match self {
            Target::Reference(callable) => classifier.classify(callable),
            Target::Free(module, name) => JoinPoint::free(module, name),
            Target::Instance(owner, name) => JoinPoint::instance(owner, name),
            Target::ClassBound(owner, name) => JoinPoint::class_bound(owner, name),
            Target::Static(owner, name) => JoinPoint::static_method(owner, name),
        }
    }
}

/// Collects join points for one registration call
///
/// References are classified; the typed entries name their owner explicitly
/// and skip the search.
pub struct Registration<'rt> {
    runtime: &'rt Runtime,
    config: RegistrationConfig,
    targets: Vec<Target>,
}

impl<'rt> Registration<'rt> {
    pub fn new(runtime: &'rt Runtime) -> Self {
        Self {
            runtime,
            config: RegistrationConfig::default(),
            targets: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: RegistrationConfig) -> Self {
        self.config = config;
        self
    }

    /// A callable reference to classify
    pub fn join_point(mut self, callable: impl Into<CallableRef>) -> Self {
        self.targets.push(Target::Reference(callable.into()));
        self
    }

    pub fn free(mut self, module: &ModuleRef, name: &str) -> Self {
        self.targets.push(Target::Free(module.clone(), name.to_string()));
        self
    }

    pub fn instance(mut self, owner: &TypeRef, name: &str) -> Self {
        self.targets.push(Target::Instance(owner.clone(), name.to_string()));
        self
    }

    pub fn class_bound(mut self, owner: &TypeRef, name: &str) -> Self {
        self.targets.push(Target::ClassBound(owner.clone(), name.to_string()));
        self
    }

    pub fn static_method(mut self, owner: &TypeRef, name: &str) -> Self {
        self.targets.push(Target::Static(owner.clone(), name.to_string()));
        self
    }

    /// Classify, wrap and install every join point, in order
    ///
    /// Join points are installed one at a time. If one fails, those installed
    /// before it stay installed, calling into a slot that can no longer be
    /// activated; they fail with `HookNotActivated`.
    pub fn install(self) -> Result<Activator> {
        if self.targets.is_empty() {
            return Err(AspectError::EmptyRegistration);
        }

        let classifier = Classifier::new(self.runtime).with_static_search(self.config.static_search);
        let (slot, setter) = HookSlot::pending(self.config.activation_policy);
        let mut installed = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            match install_target(target, &classifier, &slot) {
                Ok(join_point) => {
                    slot.attach(join_point.qualified_name());
                    installed.push(join_point);
                }
                Err(err) => {
                    if !installed.is_empty() {
                        let names: Vec<String> =
                            installed.iter().map(JoinPoint::qualified_name).collect();
                        tracing::warn!(
                            failed = target.name(),
                            installed = ?names,
                            "registration failed after installing earlier join points"
                        );
                    }
                    return Err(err);
                }
            }
        }

        tracing::debug!(count = installed.len(), "registered join points");
        Ok(Activator {
            setter,
            join_points: installed,
        })
    }
}

/// Classify, wrap and swap in one target
///
/// If another registration rebinds the site between classification and the
/// swap, the target is classified again against the new binding. A callable
/// reference to the replaced function then no longer resolves.
fn install_target(target: &Target, classifier: &Classifier<'_>, slot: &HookSlot) -> Result<JoinPoint> {
    loop {
        let join_point = target.resolve(classifier)?;
        let replacement = wrapper::build(&join_point, slot)?;
        match wrapper::install(&join_point, replacement) {
            Ok(()) => return Ok(join_point),
            Err(AspectError::BindingChanged { join_point }) => {
                tracing::debug!(%join_point, "binding changed during registration, classifying again");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Register `join_points` with the default configuration
pub fn register<I>(runtime: &Runtime, join_points: I) -> Result<Activator>
where
    I: IntoIterator<Item = CallableRef>,
{
    join_points
        .into_iter()
        .fold(Registration::new(runtime), |registration, callable| {
            registration.join_point(callable)
        })
        .install()
}

/// Returned by registration; supplies the advice for every join point of it
#[derive(Debug)]
pub struct Activator {
    setter: Setter,
    join_points: Vec<JoinPoint>,
}

impl Activator {
    /// Activate with a closure advice
    ///
    /// Returns the advice wrapped in the [`AdviceRef`] every join point of
    /// this registration now calls.
    pub fn activate<F>(&self, advice: F) -> Result<AdviceRef>
    where
        F: Fn(&Invocation) -> Result<Value> + Send + Sync + 'static,
    {
        self.activate_advice(advice)
    }

    /// Activate with an [`Advice`] value, returned wrapped as an [`AdviceRef`]
    pub fn activate_advice<A: Advice + 'static>(&self, advice: A) -> Result<AdviceRef> {
        self.activate_shared(Arc::new(advice))
    }

    /// Activate with advice that may already serve other registrations
    ///
    /// Returns the same `Arc` that was passed in.
    pub fn activate_shared(&self, advice: AdviceRef) -> Result<AdviceRef> {
        let advice = self.setter.set(advice)?;
        tracing::debug!(join_points = ?self.setter.slot().attached(), "activated advice");
        Ok(advice)
    }

    pub fn join_points(&self) -> &[JoinPoint] {
        &self.join_points
    }

    pub fn slot(&self) -> &HookSlot {
        self.setter.slot()
    }
}
