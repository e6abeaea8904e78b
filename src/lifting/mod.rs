// This module is the lifting front door. Lifter is the interface every backend implements
// (one method, lift). LifterRegistry maps architecture names to lifters; it is populated
// once at process start and read on every lift. Registering a name that is already bound
// replaces the previous lifter and hands it back to the caller, so overwrites are always
// visible. A lookup for an unbound name is an UnsupportedArchitecture error, raised before
// any request resolution. The process-wide registry behind register/lift mirrors how the
// lifter is normally used: bind libVEX to every supported name once, then lift by name.

//! Lifter interface and architecture registry.

pub mod libvex;
pub mod validate;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::core::arch::{Arch, ArchDescriptor};
use crate::core::error::{LiftError, LiftResult};
use crate::core::request::LiftRequest;
use crate::engine::{EngineGate, NativeEngine};
use crate::ir::IrBlock;

pub use libvex::LibVexLifter;
pub use validate::validate_and_build;

/// Outcome of one lift: a block, or a classified error.
pub type LiftOutcome = LiftResult<IrBlock>;

/// A lifting backend.
pub trait Lifter: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    /// Lift one block of `request` for the guest described by `arch`.
    fn lift(&self, arch: &ArchDescriptor, request: &LiftRequest<'_>) -> LiftOutcome;
}

/// Name-keyed table of lifters.
#[derive(Default, Clone)]
pub struct LifterRegistry {
    lifters: HashMap<String, Arc<dyn Lifter>>,
}

impl LifterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a libVEX lifter bound to every supported architecture.
    pub fn with_libvex<E: NativeEngine + 'static>(gate: Arc<EngineGate<E>>) -> Self {
        let mut registry = Self::new();
        let lifter: Arc<dyn Lifter> = Arc::new(LibVexLifter::new(gate));
        for arch in Arch::ALL {
            registry.register(Arc::clone(&lifter), arch.name());
        }
        registry
    }

    /// Bind `lifter` to `arch_name`.
    ///
    /// The last registration wins; the lifter it replaced is returned.
    pub fn register(&mut self, lifter: Arc<dyn Lifter>, arch_name: &str) -> Option<Arc<dyn Lifter>> {
        let previous = self.lifters.insert(arch_name.to_string(), lifter);
        if previous.is_some() {
            log::debug!("replaced lifter registered for {}", arch_name);
        }
        previous
    }

    /// Lifter bound to `arch_name`.
    pub fn lookup(&self, arch_name: &str) -> LiftResult<Arc<dyn Lifter>> {
        self.lifters
            .get(arch_name)
            .cloned()
            .ok_or_else(|| LiftError::unsupported(arch_name))
    }

    pub fn contains(&self, arch_name: &str) -> bool {
        self.lifters.contains_key(arch_name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lifters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch on the descriptor's name and lift.
    pub fn lift(&self, arch: &ArchDescriptor, request: &LiftRequest<'_>) -> LiftOutcome {
        self.lookup(arch.name())?.lift(arch, request)
    }
}

fn global_registry() -> &'static RwLock<LifterRegistry> {
    static REGISTRY: OnceLock<RwLock<LifterRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(LifterRegistry::new()))
}

/// Bind `lifter` to `arch_name` in the process-wide registry.
pub fn register(lifter: Arc<dyn Lifter>, arch_name: &str) -> Option<Arc<dyn Lifter>> {
    global_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(lifter, arch_name)
}

/// Bind a libVEX lifter over `gate` to every supported architecture.
pub fn register_libvex<E: NativeEngine + 'static>(gate: Arc<EngineGate<E>>) {
    let lifter: Arc<dyn Lifter> = Arc::new(LibVexLifter::new(gate));
    for arch in Arch::ALL {
        register(Arc::clone(&lifter), arch.name());
    }
}

/// Lifter bound to `arch_name` in the process-wide registry.
pub fn lookup(arch_name: &str) -> LiftResult<Arc<dyn Lifter>> {
    global_registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .lookup(arch_name)
}

/// Lift through the process-wide registry.
pub fn lift(arch: &ArchDescriptor, request: &LiftRequest<'_>) -> LiftOutcome {
    // The registry lock is not held across the engine call.
    let lifter = lookup(arch.name())?;
    lifter.lift(arch, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_utils::test::ScriptedEngine;

    struct Named(&'static str);

    impl Lifter for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn lift(&self, _arch: &ArchDescriptor, _request: &LiftRequest<'_>) -> LiftOutcome {
            Err(LiftError::lifting(self.0))
        }
    }

    #[test]
    fn test_libvex_registry_covers_all_arches() {
        let gate = Arc::new(EngineGate::new(ScriptedEngine::new(vec![])));
        let registry = LifterRegistry::with_libvex(gate);
        for arch in Arch::ALL {
            assert_eq!(registry.lookup(arch.name()).unwrap().name(), "libvex");
        }
        assert_eq!(registry.names().len(), 13);
    }

    #[test]
    fn test_unknown_name_is_unsupported() {
        let registry = LifterRegistry::new();
        let err = registry.lookup("RISCV64").err().unwrap();
        assert_eq!(err, LiftError::unsupported("RISCV64"));
    }

    #[test]
    fn test_last_registration_wins_and_is_reported() {
        let mut registry = LifterRegistry::new();
        assert!(registry.register(Arc::new(Named("first")), "ARM").is_none());
        let replaced = registry.register(Arc::new(Named("second")), "ARM").unwrap();
        assert_eq!(replaced.name(), "first");
        assert_eq!(registry.lookup("ARM").unwrap().name(), "second");
    }

    #[test]
    fn test_dispatch_uses_descriptor_name() {
        let mut registry = LifterRegistry::new();
        registry.register(Arc::new(Named("arm-only")), "ARM");
        let code = [0u8; 4];

        let err = registry
            .lift(&ArchDescriptor::new(Arch::Arm), &LiftRequest::new(&code, 0))
            .unwrap_err();
        assert_eq!(err, LiftError::lifting("arm-only"));

        let err = registry
            .lift(&ArchDescriptor::new(Arch::Ppc32), &LiftRequest::new(&code, 0))
            .unwrap_err();
        assert!(matches!(err, LiftError::UnsupportedArchitecture { .. }));
    }
}
