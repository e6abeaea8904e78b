//! vexlift - machine code to IR through a gated native lifter.
//!
//! vexlift lifts raw machine code for a guest architecture into an
//! architecture independent IR block. Decoding is done by libVEX, a native
//! engine with process-global state that must never be entered twice at
//! once; this crate is the layer around that call.
//!
//! # Primary Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use vexlift::{ArchDescriptor, Arch, EngineGate, LiftRequest, LifterRegistry};
//!
//! let registry = LifterRegistry::with_libvex(gate);
//! let arch = ArchDescriptor::new(Arch::Amd64);
//! let block = registry.lift(&arch, &LiftRequest::new(&code, 0x400000))?;
//! println!("{}", block);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Errors, architecture descriptors, requests and their resolution
//! - [`engine`] - The native engine contract and the gate that serializes it
//! - [`lifting`] - Lifter interface, registry and the libVEX lifter
//! - [`ir`] - Owned IR block model

pub mod core;
pub mod engine;
pub mod ir;
pub mod lifting;

pub use self::core::{
    // Architectures
    Arch, ArchDescriptor, CacheScratch, Endness, VexArch,
    // Requests
    LiftRequest, EffectiveConfig, VEX_MAX_BYTES, VEX_MAX_INSTRUCTIONS,
    // Errors
    LiftError, LiftResult,
    GateStats,
};
pub use engine::{EngineArgs, EngineGate, EngineLogLevel, LockedCall, NativeEngine};
pub use ir::{DataRef, DataRefKind, Expr, IrBlock, JumpKind, Statement};
pub use lifting::{lift, lookup, register, register_libvex, LibVexLifter, LiftOutcome, Lifter, LifterRegistry};
