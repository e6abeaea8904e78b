// This module is the request resolver. It turns a caller's LiftRequest into the
// EffectiveConfig that is actually handed to the engine: the byte offset defaults to 0,
// max-bytes and max-instructions default to the engine ceilings (5000 bytes, 99
// instructions) and are clamped down to them, strict-block-end defaults to true and
// collect-data-refs to false. Max-bytes is further limited to what the buffer holds past
// the offset so the engine never reads outside the caller's slice. Resolution also runs
// the architecture preconditions (the 8086 code segment must be set) and the request
// sanity checks; every failure here is a Configuration error raised before the engine
// lock is ever touched.

//! Request resolution and clamping.

use super::arch::ArchDescriptor;
use super::error::{LiftError, LiftResult};
use super::request::LiftRequest;

/// Largest block, in bytes, the engine will decode.
pub const VEX_MAX_BYTES: usize = 5000;

/// Largest block, in instructions, the engine will decode.
pub const VEX_MAX_INSTRUCTIONS: u32 = 99;

/// Options after defaulting and clamping; the values the engine sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub bytes_offset: usize,
    pub max_bytes: usize,
    pub max_inst: u32,
    pub opt_level: i32,
    pub traceflags: u32,
    pub allow_arch_optimizations: bool,
    pub strict_block_end: bool,
    pub collect_data_refs: bool,
    pub skip_stmts: bool,
}

/// Clamp an optional caller bound to an engine ceiling.
fn clamp_to_ceiling<T: Ord + Copy>(requested: Option<T>, ceiling: T) -> T {
    match requested {
        Some(value) if value <= ceiling => value,
        _ => ceiling,
    }
}

/// Check architecture preconditions that must hold before the engine is called.
pub fn check_arch_preconditions(arch: &ArchDescriptor) -> LiftResult<()> {
    if arch.arch().is_segmented() && arch.cs_reg_uninitialized() {
        return Err(LiftError::configuration(
            "must provide cs register for 8086 mode",
        ));
    }
    Ok(())
}

/// Resolve `request` against `arch` into the configuration passed to the engine.
pub fn resolve(request: &LiftRequest<'_>, arch: &ArchDescriptor) -> LiftResult<EffectiveConfig> {
    check_arch_preconditions(arch)?;

    if request.code.is_empty() {
        return Err(LiftError::configuration("cannot lift block with no data"));
    }

    let bytes_offset = request.bytes_offset.unwrap_or(0);
    if bytes_offset >= request.code.len() {
        return Err(LiftError::configuration(format!(
            "byte offset {} is outside the {}-byte code buffer",
            bytes_offset,
            request.code.len()
        )));
    }

    if request.max_bytes == Some(0) {
        return Err(LiftError::configuration(
            "cannot lift block with no data (max_bytes == 0)",
        ));
    }
    if request.max_inst == Some(0) {
        return Err(LiftError::configuration(
            "cannot lift block with no instructions (max_inst == 0)",
        ));
    }

    let available = request.code.len() - bytes_offset;
    let max_bytes = clamp_to_ceiling(request.max_bytes, VEX_MAX_BYTES).min(available);
    let max_inst = clamp_to_ceiling(request.max_inst, VEX_MAX_INSTRUCTIONS);

    let config = EffectiveConfig {
        bytes_offset,
        max_bytes,
        max_inst,
        opt_level: request.opt_level,
        traceflags: request.traceflags,
        allow_arch_optimizations: request.allow_arch_optimizations,
        strict_block_end: request.strict_block_end.unwrap_or(true),
        collect_data_refs: request.collect_data_refs.unwrap_or(false),
        skip_stmts: request.skip_stmts,
    };
    log::trace!("resolved {} request at {:#x}: {:?}", arch.name(), request.addr, config);
    Ok(config)
}
