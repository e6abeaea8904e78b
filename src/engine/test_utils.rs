//! Test utilities for code that drives a native engine.
//!
//! Provides a scripted in-process engine so the gate and the validator can
//! be exercised without linking libVEX.

#[cfg(test)]
pub mod test {
    use std::collections::VecDeque;

    use crate::core::arch::{ArchDescriptor, CacheScratch};
    use crate::core::error::LiftResult;
    use crate::engine::{EngineArgs, EngineLogLevel, NativeEngine};
    use crate::ir::{IrBlock, Statement};

    /// What the scripted engine does on its next call.
    #[derive(Debug, Clone)]
    pub enum Step {
        /// Succeed with a block of this many bytes (0 = no progress).
        Block(usize),
        /// Succeed, writing a note to the log.
        BlockWithLog(usize, &'static str),
        /// Return the failure sentinel, optionally logging.
        Fail(Option<&'static str>),
        /// Panic inside the engine call.
        Panic,
    }

    /// Raw result handed from `lift` to `build_block`.
    pub struct ScriptedOutput {
        size: usize,
    }

    pub struct ScriptedEngine {
        script: VecDeque<Step>,
        log: Option<Vec<u8>>,
        pub calls: usize,
        pub log_level: Option<EngineLogLevel>,
        pub scratch_seen: Vec<CacheScratch>,
        pub max_bytes_seen: Vec<usize>,
    }

    impl ScriptedEngine {
        pub fn new(script: Vec<Step>) -> Self {
            Self {
                script: script.into(),
                log: None,
                calls: 0,
                log_level: None,
                scratch_seen: Vec::new(),
                max_bytes_seen: Vec::new(),
            }
        }
    }

    impl NativeEngine for ScriptedEngine {
        type Output = ScriptedOutput;

        fn set_log_level(&mut self, level: EngineLogLevel) {
            self.log_level = Some(level);
        }

        fn lift(&mut self, arch: &ArchDescriptor, args: &EngineArgs<'_>) -> Option<ScriptedOutput> {
            self.calls += 1;
            self.log = None;
            self.scratch_seen.push(arch.cache_scratch());
            self.max_bytes_seen.push(args.max_bytes);
            match self.script.pop_front().unwrap_or(Step::Block(1)) {
                Step::Block(size) => Some(ScriptedOutput { size }),
                Step::BlockWithLog(size, note) => {
                    self.log = Some(note.as_bytes().to_vec());
                    Some(ScriptedOutput { size })
                }
                Step::Fail(note) => {
                    self.log = note.map(|n| n.as_bytes().to_vec());
                    None
                }
                Step::Panic => panic!("scripted engine panic"),
            }
        }

        fn log_buffer(&self) -> Option<&[u8]> {
            self.log.as_deref()
        }

        fn build_block(
            &mut self,
            output: ScriptedOutput,
            addr: u64,
            skip_stmts: bool,
        ) -> LiftResult<IrBlock> {
            let mut block = IrBlock::new(addr);
            block.size = output.size;
            block.instruction_count = output.size;
            if !skip_stmts {
                block.statements = (0..output.size as u64)
                    .map(|i| Statement::IMark {
                        addr: addr + i,
                        len: 1,
                        delta: 0,
                    })
                    .collect();
            }
            Ok(block)
        }
    }

    /// Engine arguments covering all of `code`.
    pub fn args_for<'c>(arch: &ArchDescriptor, code: &'c [u8]) -> EngineArgs<'c> {
        EngineArgs {
            vex_arch: arch.vex_arch(),
            code,
            addr: 0x1000,
            max_inst: 99,
            max_bytes: code.len(),
            opt_level: 1,
            traceflags: 0,
            allow_arch_optimizations: true,
            strict_block_end: true,
            collect_data_refs: false,
        }
    }
}
