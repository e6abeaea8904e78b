// This module provides EngineGate, the single capability to call the native engine. The
// gate owns the engine behind a mutex, and every gate in the process also takes one shared
// region lock before touching anything. The region lock is what guards the engine's
// globals (log level, log buffer) and the architecture descriptors' cache list slots, so
// two gates lifting the same descriptor still cannot interleave. EngineGate::call performs
// the whole locked region as one scoped operation: take the region lock and the gate's
// lock (blocking, no timeout), switch the descriptor's cache slot to the engine's null
// list, propagate the log level, call the engine, capture its log, run the caller's
// validation/build step, then restore the cache slot and release both locks. Restoration
// is carried by a drop guard declared after the mutex guards, so it runs first on every
// exit path: normal return, an error from validation, or a panic unwinding out of the
// engine or the builder. A panic poisons the mutexes; the next caller recovers them
// because the scratch slot has already been restored by then.

//! Serialized access to the native engine.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::log_reader::read_log;
use super::{EngineArgs, EngineLogLevel, NativeEngine};
use crate::core::arch::{ArchDescriptor, CacheScratch};
use crate::core::error::LiftResult;
use crate::core::stats::GateStats;

/// Held by whichever gate is inside the engine. Scratch slots live on shared
/// descriptors, not on a gate, so they need a lock no gate owns alone.
static NATIVE_REGION: Mutex<()> = Mutex::new(());

fn enter_native_region() -> MutexGuard<'static, ()> {
    NATIVE_REGION.lock().unwrap_or_else(|poisoned| {
        log::warn!("native region recovered after a panic in a previous call");
        PoisonError::into_inner(poisoned)
    })
}

struct GateState<E> {
    engine: E,
    stats: GateStats,
}

/// Everything the validation step may touch while the gate is held.
pub struct LockedCall<'g, E: NativeEngine> {
    pub engine: &'g mut E,
    pub stats: &'g mut GateStats,
    /// Engine result; `None` is the failure sentinel.
    pub output: Option<E::Output>,
    /// Decoded engine log, captured before anything else could overwrite it.
    pub log: Option<String>,
}

/// Restores a descriptor's cache list slot when dropped.
struct ScratchGuard<'a> {
    arch: &'a ArchDescriptor,
}

impl<'a> ScratchGuard<'a> {
    fn engage(arch: &'a ArchDescriptor) -> Self {
        arch.info().hwcache_info.set_caches(CacheScratch::Null);
        Self { arch }
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.arch.info().hwcache_info.set_caches(CacheScratch::Absent);
    }
}

/// Exclusive, serialized access to one native engine.
pub struct EngineGate<E: NativeEngine> {
    state: Mutex<GateState<E>>,
}

impl<E: NativeEngine> EngineGate<E> {
    pub fn new(engine: E) -> Self {
        Self {
            state: Mutex::new(GateState {
                engine,
                stats: GateStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState<E>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log::warn!("engine gate recovered after a panic in a previous call");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Run one engine call and `finish` under the gate.
    ///
    /// `finish` sees the raw result and the captured log while the lock is
    /// still held. Calls are serialized across all gates in the process. The
    /// descriptor's cache slot is back to [`CacheScratch::Absent`] before the
    /// lock is released, whatever `finish` or the engine do.
    pub fn call<R, F>(&self, arch: &ArchDescriptor, args: &EngineArgs<'_>, finish: F) -> LiftResult<R>
    where
        F: FnOnce(LockedCall<'_, E>) -> LiftResult<R>,
    {
        let region = enter_native_region();
        let mut state = self.lock();
        let scratch = ScratchGuard::engage(arch);

        let GateState { engine, stats } = &mut *state;
        stats.record_call(arch.arch());

        let level = EngineLogLevel::for_call(log::max_level(), args.traceflags);
        engine.set_log_level(level);

        log::trace!(
            "engine call: {} at {:#x}, {} bytes / {} insns",
            arch.name(),
            args.addr,
            args.max_bytes,
            args.max_inst
        );
        let output = engine.lift(arch, args);
        let log = read_log(&*engine);
        if output.is_none() {
            stats.record_engine_failure();
        }

        let result = finish(LockedCall {
            engine,
            stats,
            output,
            log,
        });

        drop(scratch);
        drop(state);
        drop(region);
        result
    }

    /// Snapshot of the gate's counters.
    pub fn stats(&self) -> GateStats {
        self.lock().stats.clone()
    }

    /// Inspect the engine under the gate.
    pub fn with_engine<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.lock().engine)
    }

    pub fn into_engine(self) -> E {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .engine
    }
}
