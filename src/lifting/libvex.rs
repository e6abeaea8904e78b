// This module provides LibVexLifter, the lifter bound to every supported architecture name.
// A lift runs in three steps: resolve the request against the descriptor (defaults,
// ceilings, the 8086 code segment check) with no lock held; enter the engine gate with the
// resolved arguments, pointing the engine at the code starting at the resolved offset; and
// classify and build the result inside the gate. Configuration failures therefore never
// touch the engine, and everything after the engine call runs before the gate restores
// the descriptor's scratch slot and releases the lock.

//! libVEX lifter.

use std::sync::Arc;

use super::validate::validate_and_build;
use super::{LiftOutcome, Lifter};
use crate::core::arch::ArchDescriptor;
use crate::core::request::LiftRequest;
use crate::core::resolve::resolve;
use crate::engine::{EngineArgs, EngineGate, NativeEngine};

/// Lifter that delegates decoding to a gated native engine.
pub struct LibVexLifter<E: NativeEngine> {
    gate: Arc<EngineGate<E>>,
}

impl<E: NativeEngine> LibVexLifter<E> {
    pub fn new(gate: Arc<EngineGate<E>>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &Arc<EngineGate<E>> {
        &self.gate
    }
}

impl<E: NativeEngine> Clone for LibVexLifter<E> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<E: NativeEngine> Lifter for LibVexLifter<E> {
    fn name(&self) -> &str {
        "libvex"
    }

    fn lift(&self, arch: &ArchDescriptor, request: &LiftRequest<'_>) -> LiftOutcome {
        let config = resolve(request, arch)?;

        let args = EngineArgs {
            vex_arch: arch.vex_arch(),
            code: &request.code[config.bytes_offset..],
            addr: request.addr,
            max_inst: config.max_inst,
            max_bytes: config.max_bytes,
            opt_level: config.opt_level,
            traceflags: config.traceflags,
            allow_arch_optimizations: config.allow_arch_optimizations,
            strict_block_end: config.strict_block_end,
            collect_data_refs: config.collect_data_refs,
        };

        let block = self
            .gate
            .call(arch, &args, |call| validate_and_build(call, request.addr, &config))?;
        log::debug!(
            "lifted {} block at {:#x}: {} bytes, {} instructions",
            arch.name(),
            block.addr,
            block.size,
            block.instruction_count
        );
        Ok(block)
    }
}
