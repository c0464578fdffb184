//! Host-function bindings.
//!
//! Scripts invoke named host functions (audio cues, analytics marks,
//! debug helpers) through `call` steps. The registry maps a hashed name
//! to a closure; resolution is validated once at graph load, not per
//! call. A binding may hand back extra steps, which the engine
//! linearizes as an interrupt before the calling body continues.

use std::collections::HashMap;
use std::fmt;

use skein_core::{StringHash, Variant};

use crate::context::SessionContext;
use crate::error::{EngineError, EngineResult};
use crate::step::Step;

/// Steps a host function asks the engine to run, if any.
pub type HostSteps = Option<Vec<Step>>;

type HostFn = Box<dyn FnMut(&mut SessionContext, &[Variant]) -> HostSteps>;

/// A registry of host functions keyed by hashed name.
#[derive(Default)]
pub struct BindingRegistry {
    fns: HashMap<StringHash, HostFn>,
}

impl BindingRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host function under a name. Re-registering a name
    /// replaces the previous function.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: FnMut(&mut SessionContext, &[Variant]) -> HostSteps + 'static,
    {
        self.fns.insert(StringHash::hash(name), Box::new(f));
    }

    /// Whether a binding exists for the hashed name.
    pub fn contains(&self, id: StringHash) -> bool {
        self.fns.contains_key(&id)
    }

    /// The number of registered bindings.
    pub fn len(&self) -> usize {
        self.fns.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    /// Invoke a binding. Unregistered hashes are an error, though load
    /// validation normally rules them out.
    pub fn call(
        &mut self,
        id: StringHash,
        ctx: &mut SessionContext,
        args: &[Variant],
    ) -> EngineResult<HostSteps> {
        let f = self
            .fns
            .get_mut(&id)
            .ok_or(EngineError::UnknownBindingHash(id))?;
        Ok(f(ctx, args))
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("bindings", &self.fns.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::{PlayerState, StatCatalog};

    fn ctx() -> SessionContext {
        SessionContext::new(PlayerState::new(StatCatalog::new(["Nerve"], 10)))
    }

    #[test]
    fn register_and_call() {
        let mut registry = BindingRegistry::new();
        registry.register("award_city_score", |ctx, args| {
            let delta = args.first().and_then(|v| v.as_int()).unwrap_or(0);
            ctx.player.add_city_score(delta as i32);
            None
        });

        let mut ctx = ctx();
        let id = StringHash::hash("award_city_score");
        assert!(registry.contains(id));
        registry
            .call(id, &mut ctx, &[Variant::Int(5)])
            .unwrap();
        assert_eq!(ctx.player.city_score(), 5);
    }

    #[test]
    fn binding_can_inject_steps() {
        let mut registry = BindingRegistry::new();
        registry.register("narrate", |_, _| {
            Some(vec![Step::Line {
                text: "A gull cries overhead.".to_string(),
                tags: vec![],
            }])
        });

        let mut ctx = ctx();
        let steps = registry
            .call(StringHash::hash("narrate"), &mut ctx, &[])
            .unwrap();
        assert_eq!(steps.map(|s| s.len()), Some(1));
    }

    #[test]
    fn unknown_hash_is_error() {
        let mut registry = BindingRegistry::new();
        let mut ctx = ctx();
        assert!(matches!(
            registry.call(StringHash::hash("missing"), &mut ctx, &[]),
            Err(EngineError::UnknownBindingHash(_))
        ));
    }
}
