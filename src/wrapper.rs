//! Replacement callables and their installation
//!
//! A replacement keeps the original's name, declaring module and arity, so it
//! is called exactly like the original and can itself be classified and
//! advised again. On each call it fetches the advice from its [`HookSlot`]
//! and hands it a continuation into whatever was bound before it.

use crate::advice::{Continuation, Invocation, Receiver};
use crate::callable::prepend;
use crate::classifier::{BindingSite, JoinPoint, JoinPointKind};
use crate::error::{AspectError, Result};
use crate::function::Function;
use crate::slot::HookSlot;
use crate::types::Member;
use crate::value::Value;

/// Build the replacement for `join_point`, reading its advice from `slot`
pub fn build(join_point: &JoinPoint, slot: &HookSlot) -> Result<Function> {
    let original = join_point.original().clone();
    let name = join_point.name().to_string();
    let kind = join_point.kind();
    let module = original.module().to_string();
    let arity = original.arity();
    let slot = slot.clone();

    let replacement = match kind {
        JoinPointKind::Free | JoinPointKind::Static => {
            let next = {
                let original = original.clone();
                Continuation::new(move |args| original.call(args))
            };
            Function::new(&name, &module, arity, {
                let name = name.clone();
                move |args| {
                    let advice = slot.current(&name)?;
                    tracing::trace!(join_point = %name, ?kind, "advised call");
                    advice.invoke(&Invocation {
                        receiver: Receiver::None,
                        join_point: name.clone(),
                        kind,
                        next: next.clone(),
                        args: args.to_vec(),
                    })
                }
            })
        }
        JoinPointKind::ClassBound => {
            // The continuation stays bound to the type the method was registered on
            let owner = join_point
                .owner_type()
                .cloned()
                .ok_or_else(|| unresolvable(&name))?;
            let next = {
                let original = original.clone();
                Continuation::new(move |args| original.call(&prepend(Value::Type(owner.clone()), args)))
            };
            Function::new(&name, &module, arity, {
                let name = name.clone();
                move |args| {
                    let (receiver, rest) = split_receiver(&name, args)?;
                    let receiver = receiver.as_type(&name)?.clone();
                    let advice = slot.current(&name)?;
                    tracing::trace!(join_point = %name, ?kind, receiver = receiver.name(), "advised call");
                    advice.invoke(&Invocation {
                        receiver: Receiver::Type(receiver),
                        join_point: name.clone(),
                        kind,
                        next: next.clone(),
                        args: rest.to_vec(),
                    })
                }
            })
        }
        JoinPointKind::Instance => {
            if join_point.owner_type().is_none() {
                return Err(unresolvable(&name));
            }
            Function::new(&name, &module, arity, {
                let name = name.clone();
                move |args| {
                    let (receiver, rest) = split_receiver(&name, args)?;
                    let instance = receiver.as_object(&name)?.clone();
                    let advice = slot.current(&name)?;
                    let next = {
                        let original = original.clone();
                        let instance = instance.clone();
                        Continuation::new(move |args| {
                            original.call(&prepend(Value::Object(instance.clone()), args))
                        })
                    };
                    tracing::trace!(join_point = %name, ?kind, "advised call");
                    advice.invoke(&Invocation {
                        receiver: Receiver::Instance(instance),
                        join_point: name.clone(),
                        kind,
                        next,
                        args: rest.to_vec(),
                    })
                }
            })
        }
    };

    Ok(replacement)
}

/// Swap `replacement` into the join point's binding site
///
/// The site must still hold the join point's original. If another
/// registration rebound it since classification, nothing is installed and
/// `BindingChanged` is returned.
pub fn install(join_point: &JoinPoint, replacement: Function) -> Result<()> {
    let original = join_point.original();
    let swapped = match (join_point.site(), join_point.kind().member_kind()) {
        (BindingSite::Module { module, name }, _) => module.rebind_if(name, original, replacement),
        (BindingSite::Member { owner, name }, Some(kind)) => owner.replace_member_if(
            name,
            original,
            Member {
                kind,
                function: replacement,
            },
        ),
        (BindingSite::Member { .. }, None) => false,
    };
    if !swapped {
        return Err(AspectError::BindingChanged {
            join_point: join_point.qualified_name(),
        });
    }
    tracing::debug!(join_point = %join_point.qualified_name(), "installed replacement");
    Ok(())
}

fn split_receiver<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a [Value])> {
    args.split_first().ok_or_else(|| AspectError::ArityMismatch {
        name: name.to_string(),
        expected: 1,
        actual: 0,
    })
}

fn unresolvable(name: &str) -> AspectError {
    AspectError::UnresolvableJoinPoint {
        name: name.to_string(),
    }
}
