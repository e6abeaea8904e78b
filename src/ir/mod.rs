// This module defines the owned IR data model handed back to callers. IrBlock is one lifted
// basic block: its guest address, the number of guest bytes it covers, the number of guest
// instructions, the block's exit jump kind and next-address expression, the ordered list
// of statements and any data references the engine collected. Statement and Expr are a
// compact rendering of VEX IR, enough to carry instruction marks, register and memory
// writes, temporaries and side exits. Blocks built with skip-statements keep their address
// and size metadata but carry no statement bodies. A Display implementation prints a block
// in the usual VEX textual layout.

//! Owned IR block model.

use std::fmt;

/// How control leaves a block or a side exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    Boring,
    Call,
    Ret,
    ClientReq,
    Yield,
    EmWarn,
    EmFail,
    NoDecode,
    MapFail,
    InvalICache,
    FlushDCache,
    NoRedir,
    SigILL,
    SigTRAP,
    SigSEGV,
    SigBUS,
    SigFPE,
    Syscall,
    Sysenter,
}

impl JumpKind {
    pub const fn vex_name(self) -> &'static str {
        match self {
            JumpKind::Boring => "Ijk_Boring",
            JumpKind::Call => "Ijk_Call",
            JumpKind::Ret => "Ijk_Ret",
            JumpKind::ClientReq => "Ijk_ClientReq",
            JumpKind::Yield => "Ijk_Yield",
            JumpKind::EmWarn => "Ijk_EmWarn",
            JumpKind::EmFail => "Ijk_EmFail",
            JumpKind::NoDecode => "Ijk_NoDecode",
            JumpKind::MapFail => "Ijk_MapFail",
            JumpKind::InvalICache => "Ijk_InvalICache",
            JumpKind::FlushDCache => "Ijk_FlushDCache",
            JumpKind::NoRedir => "Ijk_NoRedir",
            JumpKind::SigILL => "Ijk_SigILL",
            JumpKind::SigTRAP => "Ijk_SigTRAP",
            JumpKind::SigSEGV => "Ijk_SigSEGV",
            JumpKind::SigBUS => "Ijk_SigBUS",
            JumpKind::SigFPE => "Ijk_SigFPE",
            JumpKind::Syscall => "Ijk_Sys_syscall",
            JumpKind::Sysenter => "Ijk_Sys_sysenter",
        }
    }
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vex_name())
    }
}

/// IR expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Constant of the given bit width.
    Const { value: u64, bits: u32 },
    /// Read of a temporary.
    RdTmp(u32),
    /// Read of guest state at a register offset.
    Get { offset: u32, ty: String },
    /// Memory load.
    Load { ty: String, addr: Box<Expr> },
    /// Primitive operation, named as the engine names it (`Iop_Add64`).
    Op { op: String, args: Vec<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const { value, bits } => write!(f, "{:#x}:I{}", value, bits),
            Expr::RdTmp(tmp) => write!(f, "t{}", tmp),
            Expr::Get { offset, ty } => write!(f, "GET:{}(offset={})", ty, offset),
            Expr::Load { ty, addr } => write!(f, "LDle:{}({})", ty, addr),
            Expr::Op { op, args } => {
                write!(f, "{}(", op)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// IR statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Start of a guest instruction.
    IMark { addr: u64, len: u32, delta: u8 },
    NoOp,
    AbiHint { base: Expr, len: i32, nia: Expr },
    Put { offset: u32, data: Expr },
    WrTmp { tmp: u32, data: Expr },
    Store { addr: Expr, data: Expr },
    /// Conditional side exit.
    Exit { guard: Expr, dst: u64, jumpkind: JumpKind, offs_ip: u32 },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::IMark { addr, len, delta } => {
                write!(f, "------ IMark({:#x}, {}, {}) ------", addr, len, delta)
            }
            Statement::NoOp => write!(f, "IR-NoOp"),
            Statement::AbiHint { base, len, nia } => {
                write!(f, "====== AbiHint({}, {}, {}) ======", base, len, nia)
            }
            Statement::Put { offset, data } => write!(f, "PUT(offset={}) = {}", offset, data),
            Statement::WrTmp { tmp, data } => write!(f, "t{} = {}", tmp, data),
            Statement::Store { addr, data } => write!(f, "STle({}) = {}", addr, data),
            Statement::Exit {
                guard,
                dst,
                jumpkind,
                offs_ip,
            } => write!(
                f,
                "if ({}) {{ PUT(offset={}) = {:#x}; {} }}",
                guard, offs_ip, dst, jumpkind
            ),
        }
    }
}

/// Kind of data a [`DataRef`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataRefKind {
    Unknown,
    Integer,
    Fp,
    StoreInteger,
}

/// A memory reference the engine noticed while lifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRef {
    pub data_addr: u64,
    pub size: u32,
    pub kind: DataRefKind,
    pub stmt_idx: usize,
    pub ins_addr: u64,
}

/// One lifted basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrBlock {
    pub addr: u64,
    /// Guest bytes covered; never 0 for a block returned to a caller.
    pub size: usize,
    pub instruction_count: usize,
    pub jumpkind: JumpKind,
    pub next: Option<Expr>,
    pub statements: Vec<Statement>,
    pub data_refs: Vec<DataRef>,
    /// Statement bodies were omitted on request.
    pub statements_skipped: bool,
}

impl IrBlock {
    /// Empty block at `addr`; builders fill in the rest.
    pub fn new(addr: u64) -> Self {
        Self {
            addr,
            size: 0,
            instruction_count: 0,
            jumpkind: JumpKind::Boring,
            next: None,
            statements: Vec::new(),
            data_refs: Vec::new(),
            statements_skipped: false,
        }
    }

    /// Drop statement bodies while keeping address and size metadata.
    pub fn strip_statements(&mut self) {
        self.statements.clear();
        self.statements_skipped = true;
    }

    /// Guest addresses of the instructions in this block, from its IMarks.
    pub fn instruction_addrs(&self) -> Vec<u64> {
        self.statements
            .iter()
            .filter_map(|stmt| match stmt {
                Statement::IMark { addr, .. } => Some(*addr),
                _ => None,
            })
            .collect()
    }

    /// Whether this block covers no guest bytes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// First address after the block.
    pub fn end_addr(&self) -> u64 {
        self.addr.wrapping_add(self.size as u64)
    }
}

impl fmt::Display for IrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IRSB {{")?;
        if self.statements_skipped {
            writeln!(f, "   <{} statements skipped>", self.instruction_count)?;
        }
        for (idx, stmt) in self.statements.iter().enumerate() {
            writeln!(f, "   {:02} | {}", idx, stmt)?;
        }
        match &self.next {
            Some(next) => writeln!(f, "   NEXT: PUT(pc) = {}; {}", next, self.jumpkind)?,
            None => writeln!(f, "   NEXT: {}", self.jumpkind)?,
        }
        write!(f, "}}")
    }
}
