//! Hook slots: the forward reference from wrappers to their advice
//!
//! Wrappers are built and installed before the advice exists. They share a
//! [`HookSlot`] that is filled once, through the paired [`Setter`], when the
//! registration is activated. Activating fills the slot for every join point
//! of the registration at the same instant.

use crate::advice::AdviceRef;
use crate::error::{AspectError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// What a second activation of the same slot does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// The slot is set once; a second activation fails with `AlreadyActivated`
    #[default]
    SingleAssignment,
    /// A second activation silently replaces the advice
    Overwrite,
}

struct SlotInner {
    policy: ActivationPolicy,
    advice: RwLock<Option<AdviceRef>>,
    attached: RwLock<Vec<String>>,
}

/// Shared cell read by every wrapper of one registration
#[derive(Clone)]
pub struct HookSlot {
    inner: Arc<SlotInner>,
}

impl HookSlot {
    /// An empty slot and the only handle able to fill it
    pub fn pending(policy: ActivationPolicy) -> (HookSlot, Setter) {
        let slot = HookSlot {
            inner: Arc::new(SlotInner {
                policy,
                advice: RwLock::new(None),
                attached: RwLock::new(Vec::new()),
            }),
        };
        let setter = Setter { slot: slot.clone() };
        (slot, setter)
    }

    pub fn policy(&self) -> ActivationPolicy {
        self.inner.policy
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .advice
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Record a join point served by this slot, for diagnostics
    pub(crate) fn attach(&self, join_point: String) {
        self.inner
            .attached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(join_point);
    }

    pub fn attached(&self) -> Vec<String> {
        self.inner
            .attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The active advice, or `HookNotActivated` naming the join point being called
    pub fn current(&self, join_point: &str) -> Result<AdviceRef> {
        self.inner
            .advice
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| AspectError::HookNotActivated {
                join_point: join_point.to_string(),
            })
    }

    fn set(&self, advice: AdviceRef) -> Result<()> {
        // Check and assign under one write lock so racing activators cannot both win
        let mut current = self
            .inner
            .advice
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if current.is_some() && self.inner.policy == ActivationPolicy::SingleAssignment {
            return Err(AspectError::AlreadyActivated {
                join_points: self.attached().join(", "),
            });
        }
        *current = Some(advice);
        Ok(())
    }
}

impl fmt::Debug for HookSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlot")
            .field("policy", &self.inner.policy)
            .field("active", &self.is_active())
            .field("attached", &self.attached())
            .finish()
    }
}

/// Write side of a pending [`HookSlot`]
#[derive(Debug)]
pub struct Setter {
    slot: HookSlot,
}

impl Setter {
    /// Fill the slot, returning the advice unchanged
    pub fn set(&self, advice: AdviceRef) -> Result<AdviceRef> {
        self.slot.set(advice.clone())?;
        Ok(advice)
    }

    pub fn slot(&self) -> &HookSlot {
        &self.slot
    }
}
