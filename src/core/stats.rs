// This module tracks statistics for an engine gate. GateStats counts engine invocations,
// engine-reported failures, zero-size blocks, successful lifts and the total number of
// guest bytes lifted, plus a per-architecture breakdown of calls. The gate updates the
// counters while it still holds the engine lock, so every snapshot reflects whole calls
// only. The Display implementation renders a short report for the CLI and for debugging.

//! Engine gate statistics.

use std::collections::HashMap;
use std::fmt;

use super::arch::Arch;

/// Counters accumulated by an engine gate.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GateStats {
    /// Engine invocations.
    pub engine_calls: usize,

    /// Calls where the engine returned its null result.
    pub engine_failures: usize,

    /// Calls where the engine succeeded but built an empty block.
    pub empty_blocks: usize,

    /// Calls that produced a usable block.
    pub blocks_lifted: usize,

    /// Guest bytes covered by lifted blocks.
    pub bytes_lifted: usize,

    /// Engine invocations per architecture.
    pub calls_by_arch: HashMap<Arch, usize>,
}

impl GateStats {
    pub(crate) fn record_call(&mut self, arch: Arch) {
        self.engine_calls += 1;
        *self.calls_by_arch.entry(arch).or_insert(0) += 1;
    }

    pub(crate) fn record_engine_failure(&mut self) {
        self.engine_failures += 1;
    }

    pub(crate) fn record_empty_block(&mut self) {
        self.empty_blocks += 1;
    }

    pub(crate) fn record_block(&mut self, size: usize) {
        self.blocks_lifted += 1;
        self.bytes_lifted += size;
    }
}

impl fmt::Display for GateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine Gate Statistics:")?;
        writeln!(f, "  Engine calls: {}", self.engine_calls)?;
        writeln!(f, "  Blocks lifted: {}", self.blocks_lifted)?;
        writeln!(f, "  Bytes lifted: {}", self.bytes_lifted)?;
        writeln!(f, "  Engine failures: {}", self.engine_failures)?;
        writeln!(f, "  Empty blocks: {}", self.empty_blocks)?;

        if !self.calls_by_arch.is_empty() {
            writeln!(f, "  Calls by architecture:")?;
            let mut sorted: Vec<_> = self.calls_by_arch.iter().collect();
            sorted.sort_by_key(|(arch, count)| (std::cmp::Reverse(**count), **arch));

            for (arch, count) in sorted {
                writeln!(f, "    {}: {}", arch, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = GateStats::default();
        stats.record_call(Arch::Amd64);
        stats.record_call(Arch::Amd64);
        stats.record_call(Arch::Arm);
        stats.record_block(12);
        stats.record_engine_failure();
        stats.record_empty_block();

        assert_eq!(stats.engine_calls, 3);
        assert_eq!(stats.calls_by_arch[&Arch::Amd64], 2);
        assert_eq!(stats.calls_by_arch[&Arch::Arm], 1);
        assert_eq!(stats.blocks_lifted, 1);
        assert_eq!(stats.bytes_lifted, 12);
        assert_eq!(stats.engine_failures, 1);
        assert_eq!(stats.empty_blocks, 1);
    }

    #[test]
    fn test_statistics_display() {
        let mut stats = GateStats::default();
        stats.record_call(Arch::Mips32);
        stats.record_block(8);

        let output = format!("{}", stats);
        assert!(output.contains("Engine calls: 1"));
        assert!(output.contains("Bytes lifted: 8"));
        assert!(output.contains("MIPS32: 1"));
    }
}
