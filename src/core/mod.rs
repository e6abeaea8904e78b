// This module gathers the shared infrastructure every lift goes through before and after
// the engine call: the error taxonomy, the architecture descriptor provider (closed Arch
// set, native identifier tokens, VexArchInfo metadata and the cache list scratch slot),
// the per-call LiftRequest, the request resolver that produces the clamped
// EffectiveConfig, and the counters an engine gate keeps. Nothing here touches the
// engine; all of it is safe to use without holding the gate.

//! Core vexlift infrastructure
//!
//! # Key Components
//!
//! ## Errors (`error`)
//! - `Configuration`, `UnsupportedArchitecture` and `Lifting` failures
//!
//! ## Architectures (`arch`)
//! - Supported guest names and their libVEX identifiers
//! - Per-architecture metadata with one transient scratch slot
//!
//! ## Requests (`request`, `resolve`)
//! - Caller options with defaults left open
//! - Resolution into the values the engine sees, clamped to engine ceilings
//!
//! ## Statistics (`stats`)
//! - Per-gate call, failure and byte counters

pub mod arch;
pub mod error;
pub mod request;
pub mod resolve;
pub mod stats;

pub use arch::{
    Arch,
    ArchDescriptor,
    CacheScratch,
    Endness,
    HwCacheInfo,
    VexArch,
    VexArchInfo,
    UNINITIALIZED_SREG,
};

pub use error::{
    LiftError,
    LiftResult,
};

pub use request::LiftRequest;

pub use resolve::{
    resolve,
    EffectiveConfig,
    VEX_MAX_BYTES,
    VEX_MAX_INSTRUCTIONS,
};

pub use stats::GateStats;
