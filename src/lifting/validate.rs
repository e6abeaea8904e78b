// This module classifies the engine's answer and builds the caller's block. It runs inside
// the gate, on the LockedCall the gate hands over. A null engine result becomes a Lifting
// error carrying the captured engine log, or a generic message when the log is empty. On
// success any captured log is only an informational note and is logged at info level.
// The block is built through the engine's hand-off, honoring skip-statements and
// collect-data-refs. A built block of size zero is turned into a Lifting error: success
// without progress is never reported as success.

//! Result classification and block construction.

use crate::core::error::{LiftError, LiftResult, NO_INSTRUCTIONS_DECODED, UNKNOWN_ENGINE_ERROR};
use crate::core::resolve::EffectiveConfig;
use crate::engine::{LockedCall, NativeEngine};
use crate::ir::IrBlock;

/// Classify the engine result and build the block, under the gate.
pub fn validate_and_build<E: NativeEngine>(
    call: LockedCall<'_, E>,
    addr: u64,
    config: &EffectiveConfig,
) -> LiftResult<IrBlock> {
    let LockedCall {
        engine,
        stats,
        output,
        log,
    } = call;

    let output = match output {
        Some(output) => output,
        None => {
            let message = log.unwrap_or_else(|| UNKNOWN_ENGINE_ERROR.to_string());
            log::debug!("engine failed at {:#x}: {}", addr, message);
            return Err(LiftError::lifting(message));
        }
    };

    if let Some(note) = &log {
        log::info!("{}", note);
    }

    let mut block = engine.build_block(output, addr, config.skip_stmts)?;
    if config.skip_stmts && !block.statements_skipped {
        block.strip_statements();
    }
    if !config.collect_data_refs {
        block.data_refs.clear();
    }

    if block.size == 0 {
        stats.record_empty_block();
        log::debug!("raising lifting exception: empty block at {:#x}", addr);
        return Err(LiftError::lifting(NO_INSTRUCTIONS_DECODED));
    }

    stats.record_block(block.size);
    Ok(block)
}
