// This module defines the call contract for the native lifting engine and everything that
// talks to it directly. NativeEngine is the seam: one method per engine entry point the
// lifter uses (set the global log level, lift, read the global log buffer) plus the
// hand-off that turns the engine's raw result into an owned IrBlock. EngineArgs carries
// the per-call arguments in the order the engine takes them. EngineLogLevel maps the log
// facade's verbosity onto the engine's numeric scale. The engine is process-global and
// non-reentrant; the only way in is through EngineGate, which serializes every call and
// restores the descriptor's scratch slot on every exit path. With the `libvex` feature the
// ffi module provides the real backend.

//! Native engine contract, gate and log capture.

pub mod gate;
pub mod log_reader;
pub(crate) mod test_utils;

#[cfg(feature = "libvex")]
pub mod ffi;

use std::ffi::c_int;
use std::sync::OnceLock;

use log::LevelFilter;

use crate::core::arch::{ArchDescriptor, VexArch};
use crate::core::error::{LiftError, LiftResult};
use crate::ir::IrBlock;

pub use gate::{EngineGate, LockedCall};
pub use log_reader::read_log;

/// Engine log level, on the engine's numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EngineLogLevel(pub i32);

impl EngineLogLevel {
    pub const DEBUG: EngineLogLevel = EngineLogLevel(10);
    pub const INFO: EngineLogLevel = EngineLogLevel(20);
    pub const WARNING: EngineLogLevel = EngineLogLevel(30);
    pub const ERROR: EngineLogLevel = EngineLogLevel(40);
    pub const OFF: EngineLogLevel = EngineLogLevel(50);

    pub fn from_filter(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::Trace | LevelFilter::Debug => Self::DEBUG,
            LevelFilter::Info => Self::INFO,
            LevelFilter::Warn => Self::WARNING,
            LevelFilter::Error => Self::ERROR,
            LevelFilter::Off => Self::OFF,
        }
    }

    /// Level to propagate for a call; tracing needs at least info.
    pub fn for_call(filter: LevelFilter, traceflags: u32) -> Self {
        let level = Self::from_filter(filter);
        if traceflags != 0 {
            level.min(Self::INFO)
        } else {
            level
        }
    }
}

/// Arguments of one engine call, in engine order.
#[derive(Debug, Clone, Copy)]
pub struct EngineArgs<'c> {
    pub vex_arch: VexArch,
    /// Code starting at the resolved byte offset.
    pub code: &'c [u8],
    pub addr: u64,
    pub max_inst: u32,
    pub max_bytes: usize,
    pub opt_level: i32,
    pub traceflags: u32,
    pub allow_arch_optimizations: bool,
    pub strict_block_end: bool,
    pub collect_data_refs: bool,
}

/// The native lifting engine.
///
/// Implementations wrap process-global, non-reentrant state. Callers never
/// use an engine directly; [`EngineGate`] owns it.
pub trait NativeEngine: Send {
    /// Raw result of a successful engine call.
    type Output;

    /// Write the engine's global log level.
    fn set_log_level(&mut self, level: EngineLogLevel);

    /// Lift one block. `None` is the engine's failure sentinel.
    fn lift(&mut self, arch: &ArchDescriptor, args: &EngineArgs<'_>) -> Option<Self::Output>;

    /// The engine's global log buffer, valid until the next call.
    fn log_buffer(&self) -> Option<&[u8]>;

    /// Translate a raw result into an owned block.
    fn build_block(
        &mut self,
        output: Self::Output,
        addr: u64,
        skip_stmts: bool,
    ) -> LiftResult<IrBlock>;
}

/// Run a one-shot engine initializer and check its remembered status.
///
/// `init` runs at most once per `status` cell. A zero status is a failure for
/// this and every later caller.
#[cfg_attr(not(feature = "libvex"), allow(dead_code))]
pub(crate) fn init_once(status: &OnceLock<c_int>, init: impl FnOnce() -> c_int) -> LiftResult<()> {
    if *status.get_or_init(init) == 0 {
        return Err(LiftError::configuration("libvex initialization failed"));
    }
    Ok(())
}
