// This module binds the pyvex build of libVEX. It declares the C entry points the lifter
// uses (vex_init, vex_lift) and the three engine globals (log_level, msg_buffer,
// msg_current_size), mirrors the VexArchInfo/VexCacheInfo structs the engine takes by
// value, and implements NativeEngine on top of them as LibVex. The cache list pointer in
// the mirrored struct is taken from the descriptor's scratch slot, which the gate has set
// to null for the duration of the call. The engine's lift result stays opaque here: turning
// it into an IrBlock is the job of an IrsbConsumer supplied at install time. There is
// exactly one LibVex gate per process, created on first install and shared afterwards.

//! libVEX FFI backend.

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::marker::{PhantomData, PhantomPinned};
use std::ptr::{self, NonNull};
use std::sync::{Arc, OnceLock};

use super::{init_once, EngineArgs, EngineGate, EngineLogLevel, NativeEngine};
use crate::core::arch::{ArchDescriptor, CacheScratch, VexArchInfo};
use crate::core::error::{LiftError, LiftResult};
use crate::ir::IrBlock;

/// Opaque `VEXLiftResult` owned by the engine.
#[repr(C)]
pub struct VexLiftResult {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[repr(C)]
struct RawVexCacheInfo {
    num_levels: c_uint,
    num_caches: c_uint,
    caches: *mut c_void,
    icaches_maintain_coherence: u8,
}

#[repr(C)]
struct RawVexArchInfo {
    hwcaps: c_uint,
    endness: c_uint,
    hwcache_info: RawVexCacheInfo,
    ppc_icache_line_sz_b: c_int,
    ppc_dcbz_sz_b: c_uint,
    ppc_dcbzl_sz_b: c_uint,
    arm64_dminline_lg2_sz_b: c_uint,
    arm64_iminline_lg2_sz_b: c_uint,
    x86_cr0: c_uint,
    i8086_cs_reg: c_uint,
}

impl RawVexArchInfo {
    fn from_descriptor(info: &VexArchInfo) -> Self {
        // The engine only accepts a null cache list; anything else is a gate bug.
        debug_assert_eq!(info.hwcache_info.caches(), CacheScratch::Null);
        Self {
            hwcaps: info.hwcaps,
            endness: info.endness as c_uint,
            hwcache_info: RawVexCacheInfo {
                num_levels: info.hwcache_info.num_levels,
                num_caches: info.hwcache_info.num_caches,
                caches: ptr::null_mut(),
                icaches_maintain_coherence: u8::from(info.hwcache_info.icaches_maintain_coherence),
            },
            ppc_icache_line_sz_b: info.ppc_icache_line_szb,
            ppc_dcbz_sz_b: info.ppc_dcbz_szb,
            ppc_dcbzl_sz_b: info.ppc_dcbzl_szb,
            arm64_dminline_lg2_sz_b: info.arm64_dminline_lg2_szb,
            arm64_iminline_lg2_sz_b: info.arm64_iminline_lg2_szb,
            x86_cr0: info.x86_cr0,
            i8086_cs_reg: info.i8086_cs_reg,
        }
    }
}

extern "C" {
    fn vex_init() -> c_int;

    fn vex_lift(
        guest: c_uint,
        archinfo: RawVexArchInfo,
        insn_start: *const u8,
        insn_addr: u64,
        max_insns: c_uint,
        max_bytes: c_uint,
        opt_level: c_int,
        traceflags: c_int,
        allow_arch_optimizations: c_int,
        strict_block_end: c_int,
        collect_data_refs: c_int,
    ) -> *mut VexLiftResult;

    static mut log_level: c_int;
    static mut msg_buffer: *mut c_char;
    static mut msg_current_size: usize;
}

/// Builds an [`IrBlock`] from the engine's raw lift result.
pub trait IrsbConsumer: Send {
    /// # Safety
    ///
    /// `result` must be the pointer the engine just returned; it is only
    /// valid until the next engine call.
    unsafe fn build(
        &self,
        result: NonNull<VexLiftResult>,
        addr: u64,
        skip_stmts: bool,
    ) -> LiftResult<IrBlock>;
}

/// The libVEX engine.
pub struct LibVex {
    consumer: Box<dyn IrsbConsumer>,
}

/// Status returned by the one `vex_init` call of this process.
static VEX_INIT: OnceLock<c_int> = OnceLock::new();
static LIBVEX_GATE: OnceLock<Arc<EngineGate<LibVex>>> = OnceLock::new();

impl LibVex {
    fn new(consumer: Box<dyn IrsbConsumer>) -> LiftResult<Self> {
        // SAFETY: runs once per process, before any other engine call.
        init_once(&VEX_INIT, || unsafe { vex_init() })?;
        Ok(Self { consumer })
    }

    /// Create the process-wide libVEX gate.
    ///
    /// Fails if a gate was already installed; use [`LibVex::gate`] to share it.
    pub fn install(consumer: Box<dyn IrsbConsumer>) -> LiftResult<Arc<EngineGate<LibVex>>> {
        if LIBVEX_GATE.get().is_some() {
            return Err(LiftError::configuration("libvex gate already installed"));
        }
        let gate = Arc::new(EngineGate::new(LibVex::new(consumer)?));
        LIBVEX_GATE
            .set(Arc::clone(&gate))
            .map_err(|_| LiftError::configuration("libvex gate already installed"))?;
        log::debug!("libvex gate installed");
        Ok(gate)
    }

    /// The installed process-wide gate, if any.
    pub fn gate() -> Option<Arc<EngineGate<LibVex>>> {
        LIBVEX_GATE.get().cloned()
    }
}

fn to_c_uint(value: usize) -> c_uint {
    c_uint::try_from(value).unwrap_or(c_uint::MAX)
}

impl NativeEngine for LibVex {
    type Output = NonNull<VexLiftResult>;

    fn set_log_level(&mut self, level: EngineLogLevel) {
        // SAFETY: the gate serializes every access to engine globals.
        unsafe { ptr::addr_of_mut!(log_level).write(level.0) };
    }

    fn lift(&mut self, arch: &ArchDescriptor, args: &EngineArgs<'_>) -> Option<Self::Output> {
        let archinfo = RawVexArchInfo::from_descriptor(arch.info());
        // SAFETY: `code` holds at least `max_bytes` bytes (the resolver limits
        // it), and the gate guarantees no concurrent engine call.
        let result = unsafe {
            vex_lift(
                args.vex_arch.as_raw(),
                archinfo,
                args.code.as_ptr(),
                args.addr,
                args.max_inst,
                to_c_uint(args.max_bytes.min(args.code.len())),
                args.opt_level,
                args.traceflags as c_int,
                c_int::from(args.allow_arch_optimizations),
                c_int::from(args.strict_block_end),
                c_int::from(args.collect_data_refs),
            )
        };
        NonNull::new(result)
    }

    fn log_buffer(&self) -> Option<&[u8]> {
        // SAFETY: the buffer stays valid until the next engine call, which
        // needs `&mut self`, so the borrow cannot outlive it.
        unsafe {
            let buffer = ptr::addr_of!(msg_buffer).read();
            if buffer.is_null() {
                return None;
            }
            let len = ptr::addr_of!(msg_current_size).read();
            Some(std::slice::from_raw_parts(buffer.cast::<u8>(), len))
        }
    }

    fn build_block(
        &mut self,
        output: Self::Output,
        addr: u64,
        skip_stmts: bool,
    ) -> LiftResult<IrBlock> {
        // SAFETY: `output` came from the call that just returned under the gate.
        unsafe { self.consumer.build(output, addr, skip_stmts) }
    }
}
