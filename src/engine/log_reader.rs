//! Engine diagnostic log capture.
//!
//! The engine writes into one global buffer that the next call overwrites,
//! so it is read while the gate is still held.

use super::NativeEngine;

/// Decode the engine's log buffer; `None` when it holds nothing.
pub fn read_log<E: NativeEngine + ?Sized>(engine: &E) -> Option<String> {
    let raw = engine.log_buffer()?;
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&raw[..end]).into_owned())
}
