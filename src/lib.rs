//! Aspecto - join-point interception with around-advice
//!
//! This library lets a caller substitute advice around existing free
//! functions, instance methods, class-bound methods and static methods while
//! every existing caller keeps calling them the same way. Each advice receives
//! a continuation it may use to run the original behavior with the same or
//! different arguments.
//!
//! Join points live in an explicit object model ([`Runtime`], [`Module`],
//! [`TypeDef`]) that every call site resolves by name, so installing a
//! replacement at the binding site redirects all callers at once.

pub mod advice;
pub mod callable;
pub mod classifier;
pub mod cli;
pub mod error;
pub mod function;
pub mod module;
pub mod object;
pub mod register;
pub mod runtime;
pub mod scenario;
pub mod slot;
pub mod types;
pub mod value;
pub mod wrapper;

pub use advice::{Advice, AdviceRef, Continuation, Invocation, Receiver};
pub use callable::CallableRef;
pub use classifier::{classify, BindingSite, Classifier, JoinPoint, JoinPointKind};
pub use error::{AspectError, Result};
pub use function::{Function, FunctionId};
pub use module::{Entry, Module, ModuleRef};
pub use object::{Object, ObjectRef};
pub use register::{register, Activator, Registration, RegistrationConfig};
pub use runtime::Runtime;
pub use slot::{ActivationPolicy, HookSlot, Setter};
pub use types::{Member, MemberKind, TypeBuilder, TypeDef, TypeRef};
pub use value::Value;
