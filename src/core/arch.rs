// This module is the architecture descriptor provider. Arch is the closed set of guest
// architectures the lifter understands, keyed by the names callers pass to the registry.
// Each Arch maps onto the engine's native identifier token (VexArch) and a default byte
// order. ArchDescriptor bundles the immutable per-architecture metadata handed to the
// engine (VexArchInfo: hwcaps, endianness, cache geometry, PPC/ARM64 line sizes, the x86
// CR0 value and the 8086 code-segment register) with exactly one mutable slot, the cache
// list pointer inside the hardware cache info. That slot is the only thing the lifter ever
// writes on a descriptor: it is switched to the engine's null cache list for the duration
// of one engine call and back to absent afterwards, always under the engine gate.

//! Architecture descriptors and native identifier tokens.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use super::error::LiftError;

/// Sentinel stored in the 8086 code-segment register until the caller provides one.
pub const UNINITIALIZED_SREG: u32 = 0xFFFF_FFFF;

/// Default CR0 value libVEX assumes for x86 guests.
pub const DEFAULT_X86_CR0: u32 = 0xFFFF_FFFF;

/// Guest architectures supported by the libVEX lifter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    I8086,
    X86,
    Amd64,
    Mips32,
    Mips64,
    Arm,
    ArmEl,
    ArmHf,
    ArmCortexM,
    Aarch64,
    Ppc32,
    Ppc64,
    S390x,
}

impl Arch {
    /// Every supported architecture, in registration order.
    pub const ALL: [Arch; 13] = [
        Arch::I8086,
        Arch::X86,
        Arch::Amd64,
        Arch::Mips32,
        Arch::Mips64,
        Arch::Arm,
        Arch::ArmEl,
        Arch::ArmHf,
        Arch::ArmCortexM,
        Arch::Aarch64,
        Arch::Ppc32,
        Arch::Ppc64,
        Arch::S390x,
    ];

    /// Registry name of the architecture.
    pub const fn name(self) -> &'static str {
        match self {
            Arch::I8086 => "8086",
            Arch::X86 => "X86",
            Arch::Amd64 => "AMD64",
            Arch::Mips32 => "MIPS32",
            Arch::Mips64 => "MIPS64",
            Arch::Arm => "ARM",
            Arch::ArmEl => "ARMEL",
            Arch::ArmHf => "ARMHF",
            Arch::ArmCortexM => "ARMCortexM",
            Arch::Aarch64 => "AARCH64",
            Arch::Ppc32 => "PPC32",
            Arch::Ppc64 => "PPC64",
            Arch::S390x => "S390X",
        }
    }

    /// Look up an architecture by its exact registry name.
    pub fn from_name(name: &str) -> Option<Arch> {
        Arch::ALL.iter().copied().find(|arch| arch.name() == name)
    }

    /// Native identifier token the engine expects for this guest.
    pub const fn vex_arch(self) -> VexArch {
        match self {
            Arch::I8086 | Arch::X86 => VexArch::X86,
            Arch::Amd64 => VexArch::Amd64,
            Arch::Mips32 => VexArch::Mips32,
            Arch::Mips64 => VexArch::Mips64,
            Arch::Arm | Arch::ArmEl | Arch::ArmHf | Arch::ArmCortexM => VexArch::Arm,
            Arch::Aarch64 => VexArch::Arm64,
            Arch::Ppc32 => VexArch::Ppc32,
            Arch::Ppc64 => VexArch::Ppc64,
            Arch::S390x => VexArch::S390x,
        }
    }

    /// Byte order used when the caller does not choose one.
    pub const fn default_endness(self) -> Endness {
        match self {
            Arch::Mips32 | Arch::Mips64 | Arch::Ppc32 | Arch::Ppc64 | Arch::S390x => Endness::Big,
            _ => Endness::Little,
        }
    }

    /// Width of a general purpose register in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Arch::I8086 => 16,
            Arch::Amd64 | Arch::Mips64 | Arch::Aarch64 | Arch::Ppc64 | Arch::S390x => 64,
            _ => 32,
        }
    }

    /// Whether this is the segmented real-mode guest.
    pub const fn is_segmented(self) -> bool {
        matches!(self, Arch::I8086)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = LiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::from_name(s)
            .or_else(|| {
                Arch::ALL
                    .iter()
                    .copied()
                    .find(|arch| arch.name().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| LiftError::unsupported(s))
    }
}

/// libVEX guest architecture identifiers (`VexArch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VexArch {
    X86 = 0x401,
    Amd64 = 0x402,
    Arm = 0x403,
    Arm64 = 0x404,
    Ppc32 = 0x405,
    Ppc64 = 0x406,
    S390x = 0x407,
    Mips32 = 0x408,
    Mips64 = 0x409,
}

impl VexArch {
    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}

/// libVEX byte order identifiers (`VexEndness`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Endness {
    Little = 0x601,
    Big = 0x602,
}

/// State of the cache list pointer inside [`HwCacheInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScratch {
    /// No value; the resting state between engine calls.
    Absent,
    /// Explicit null cache list, the value the engine requires during a call.
    Null,
}

/// Hardware cache geometry, including the transient cache list slot.
#[derive(Debug)]
pub struct HwCacheInfo {
    pub num_levels: u32,
    pub num_caches: u32,
    pub icaches_maintain_coherence: bool,
    caches: Mutex<CacheScratch>,
}

impl HwCacheInfo {
    pub fn new() -> Self {
        Self {
            num_levels: 0,
            num_caches: 0,
            icaches_maintain_coherence: true,
            caches: Mutex::new(CacheScratch::Absent),
        }
    }

    /// Current value of the cache list slot.
    pub fn caches(&self) -> CacheScratch {
        *self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only the engine gate writes this slot.
    pub(crate) fn set_caches(&self, value: CacheScratch) {
        *self.caches.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl Default for HwCacheInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-architecture metadata passed to the engine (`VexArchInfo`).
#[derive(Debug)]
pub struct VexArchInfo {
    pub hwcaps: u32,
    pub endness: Endness,
    pub hwcache_info: HwCacheInfo,
    pub ppc_icache_line_szb: i32,
    pub ppc_dcbz_szb: u32,
    pub ppc_dcbzl_szb: u32,
    pub arm64_dminline_lg2_szb: u32,
    pub arm64_iminline_lg2_szb: u32,
    pub x86_cr0: u32,
    /// Code segment register for 8086 guests; [`UNINITIALIZED_SREG`] until set.
    pub i8086_cs_reg: u32,
}

impl VexArchInfo {
    fn for_arch(arch: Arch) -> Self {
        let ppc_icache_line_szb = match arch {
            Arch::Ppc32 | Arch::Ppc64 => 32,
            _ => 0,
        };
        Self {
            hwcaps: 0,
            endness: arch.default_endness(),
            hwcache_info: HwCacheInfo::new(),
            ppc_icache_line_szb,
            ppc_dcbz_szb: 0,
            ppc_dcbzl_szb: 0,
            arm64_dminline_lg2_szb: 0,
            arm64_iminline_lg2_szb: 0,
            x86_cr0: DEFAULT_X86_CR0,
            i8086_cs_reg: UNINITIALIZED_SREG,
        }
    }
}

/// Long-lived architecture descriptor shared by every lift for that guest.
///
/// Everything except the cache list slot is fixed after construction; share
/// it behind an `Arc` or a `&'static`.
#[derive(Debug)]
pub struct ArchDescriptor {
    arch: Arch,
    info: VexArchInfo,
}

impl ArchDescriptor {
    /// Descriptor with libVEX defaults for `arch`.
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            info: VexArchInfo::for_arch(arch),
        }
    }

    /// Descriptor for a registry name.
    pub fn from_name(name: &str) -> Result<Self, LiftError> {
        Arch::from_name(name)
            .map(Self::new)
            .ok_or_else(|| LiftError::unsupported(name))
    }

    pub fn with_endness(mut self, endness: Endness) -> Self {
        self.info.endness = endness;
        self
    }

    pub fn with_hwcaps(mut self, hwcaps: u32) -> Self {
        self.info.hwcaps = hwcaps;
        self
    }

    pub fn with_x86_cr0(mut self, cr0: u32) -> Self {
        self.info.x86_cr0 = cr0;
        self
    }

    /// Provide the code segment for 8086 guests.
    pub fn with_cs_reg(mut self, cs: u16) -> Self {
        self.info.i8086_cs_reg = u32::from(cs);
        self
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn name(&self) -> &'static str {
        self.arch.name()
    }

    pub fn vex_arch(&self) -> VexArch {
        self.arch.vex_arch()
    }

    pub fn info(&self) -> &VexArchInfo {
        &self.info
    }

    /// Current value of the transient cache list slot.
    pub fn cache_scratch(&self) -> CacheScratch {
        self.info.hwcache_info.caches()
    }

    /// Whether the code segment register still holds the uninitialized sentinel.
    pub fn cs_reg_uninitialized(&self) -> bool {
        self.info.i8086_cs_reg == UNINITIALIZED_SREG
    }
}
