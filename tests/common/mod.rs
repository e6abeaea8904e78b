//! Recording fake engine shared by the integration tests.
//!
//! The engine never decodes anything: it follows a script, records every
//! argument it is called with and tracks how many calls are inside it at once.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use vexlift::{
    ArchDescriptor, CacheScratch, EngineArgs, EngineGate, EngineLogLevel, IrBlock, LiftResult,
    NativeEngine, Statement,
};

/// What the engine does on its next call.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Succeed with a block of this many bytes (0 = no progress).
    Block(usize),
    /// Succeed after holding the engine for a while.
    SlowBlock(usize, Duration),
    /// Succeed and leave a note in the log.
    BlockWithLog(usize, String),
    /// Return the failure sentinel, optionally with a log message.
    Fail(Option<String>),
    /// Panic in the middle of the call.
    Panic,
}

/// One recorded engine invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub code_ptr: usize,
    pub code_len: usize,
    pub addr: u64,
    pub max_bytes: usize,
    pub max_inst: u32,
    pub opt_level: i32,
    pub strict_block_end: bool,
    pub collect_data_refs: bool,
    pub scratch: CacheScratch,
    pub log_level: Option<EngineLogLevel>,
}

/// Observations shared between the engine and the test.
#[derive(Default)]
pub struct Recorder {
    pub in_section: AtomicUsize,
    pub max_in_section: AtomicUsize,
    pub calls: Mutex<Vec<RecordedCall>>,
    pub skip_flags: Mutex<Vec<bool>>,
    /// Slow calls that found the cache slot changed after their pause.
    pub scratch_lost: AtomicUsize,
}

impl Recorder {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().unwrap().last().cloned().expect("engine was not called")
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_section.load(Ordering::SeqCst)
    }
}

pub struct FakeEngine {
    script: VecDeque<Behavior>,
    fallback: Behavior,
    log: Option<Vec<u8>>,
    log_level: Option<EngineLogLevel>,
    recorder: Arc<Recorder>,
}

pub struct FakeOutput {
    size: usize,
}

impl FakeEngine {
    pub fn new(script: Vec<Behavior>) -> (Self, Arc<Recorder>) {
        Self::with_fallback(script, Behavior::Block(4))
    }

    pub fn with_fallback(script: Vec<Behavior>, fallback: Behavior) -> (Self, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let engine = Self::sharing(Arc::clone(&recorder), script, fallback);
        (engine, recorder)
    }

    /// Engine reporting into an existing recorder.
    pub fn sharing(recorder: Arc<Recorder>, script: Vec<Behavior>, fallback: Behavior) -> Self {
        Self {
            script: script.into(),
            fallback,
            log: None,
            log_level: None,
            recorder,
        }
    }

    /// Gate over a fresh fake engine.
    pub fn gate(script: Vec<Behavior>) -> (Arc<EngineGate<FakeEngine>>, Arc<Recorder>) {
        let (engine, recorder) = Self::new(script);
        (Arc::new(EngineGate::new(engine)), recorder)
    }
}

struct Section<'a>(&'a Recorder);

impl<'a> Section<'a> {
    fn enter(recorder: &'a Recorder) -> Self {
        let now = recorder.in_section.fetch_add(1, Ordering::SeqCst) + 1;
        recorder.max_in_section.fetch_max(now, Ordering::SeqCst);
        Section(recorder)
    }
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        self.0.in_section.fetch_sub(1, Ordering::SeqCst);
    }
}

impl NativeEngine for FakeEngine {
    type Output = FakeOutput;

    fn set_log_level(&mut self, level: EngineLogLevel) {
        self.log_level = Some(level);
    }

    fn lift(&mut self, arch: &ArchDescriptor, args: &EngineArgs<'_>) -> Option<FakeOutput> {
        let _section = Section::enter(&self.recorder);
        self.log = None;
        self.recorder.calls.lock().unwrap().push(RecordedCall {
            code_ptr: args.code.as_ptr() as usize,
            code_len: args.code.len(),
            addr: args.addr,
            max_bytes: args.max_bytes,
            max_inst: args.max_inst,
            opt_level: args.opt_level,
            strict_block_end: args.strict_block_end,
            collect_data_refs: args.collect_data_refs,
            scratch: arch.cache_scratch(),
            log_level: self.log_level,
        });

        let behavior = self.script.pop_front().unwrap_or_else(|| self.fallback.clone());
        match behavior {
            Behavior::Block(size) => Some(FakeOutput { size }),
            Behavior::SlowBlock(size, pause) => {
                thread::sleep(pause);
                if arch.cache_scratch() != CacheScratch::Null {
                    self.recorder.scratch_lost.fetch_add(1, Ordering::SeqCst);
                }
                Some(FakeOutput { size })
            }
            Behavior::BlockWithLog(size, note) => {
                self.log = Some(note.into_bytes());
                Some(FakeOutput { size })
            }
            Behavior::Fail(note) => {
                self.log = note.map(String::into_bytes);
                None
            }
            Behavior::Panic => panic!("injected engine fault"),
        }
    }

    fn log_buffer(&self) -> Option<&[u8]> {
        self.log.as_deref()
    }

    fn build_block(&mut self, output: FakeOutput, addr: u64, skip_stmts: bool) -> LiftResult<IrBlock> {
        self.recorder.skip_flags.lock().unwrap().push(skip_stmts);
        let mut block = IrBlock::new(addr);
        block.size = output.size;
        block.instruction_count = usize::from(output.size > 0);
        if !skip_stmts && output.size > 0 {
            block.statements.push(Statement::IMark {
                addr,
                len: output.size as u32,
                delta: 0,
            });
        }
        Ok(block)
    }
}
