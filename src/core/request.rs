//! Lift requests.
//!
//! A [`LiftRequest`] is created by the caller for one lift call and dropped
//! afterwards. Options left as `None` are filled in by the resolver.

use std::borrow::Cow;

/// Optimisation level used when the caller does not pick one.
pub const DEFAULT_OPT_LEVEL: i32 = 1;

/// One request to lift a basic block.
#[derive(Debug, Clone)]
pub struct LiftRequest<'a> {
    /// Machine code; lifting starts at `bytes_offset`.
    pub code: Cow<'a, [u8]>,
    /// Guest address of the first lifted byte.
    pub addr: u64,
    pub bytes_offset: Option<usize>,
    pub max_bytes: Option<usize>,
    pub max_inst: Option<u32>,
    pub opt_level: i32,
    pub traceflags: u32,
    pub allow_arch_optimizations: bool,
    /// Defaults to `true` when unset.
    pub strict_block_end: Option<bool>,
    /// Defaults to `false` when unset.
    pub collect_data_refs: Option<bool>,
    /// Leave statement bodies out of the built block.
    pub skip_stmts: bool,
}

impl<'a> LiftRequest<'a> {
    /// Request borrowing `code`.
    pub fn new(code: &'a [u8], addr: u64) -> Self {
        Self::from_cow(Cow::Borrowed(code), addr)
    }

    /// Request owning `code`.
    pub fn owned(code: Vec<u8>, addr: u64) -> LiftRequest<'static> {
        LiftRequest::from_cow(Cow::Owned(code), addr)
    }

    fn from_cow(code: Cow<'a, [u8]>, addr: u64) -> Self {
        Self {
            code,
            addr,
            bytes_offset: None,
            max_bytes: None,
            max_inst: None,
            opt_level: DEFAULT_OPT_LEVEL,
            traceflags: 0,
            allow_arch_optimizations: true,
            strict_block_end: None,
            collect_data_refs: None,
            skip_stmts: false,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.bytes_offset = Some(offset);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_max_inst(mut self, max_inst: u32) -> Self {
        self.max_inst = Some(max_inst);
        self
    }

    pub fn with_opt_level(mut self, opt_level: i32) -> Self {
        self.opt_level = opt_level;
        self
    }

    pub fn with_traceflags(mut self, traceflags: u32) -> Self {
        self.traceflags = traceflags;
        self
    }

    pub fn with_arch_optimizations(mut self, allow: bool) -> Self {
        self.allow_arch_optimizations = allow;
        self
    }

    pub fn with_strict_block_end(mut self, strict: bool) -> Self {
        self.strict_block_end = Some(strict);
        self
    }

    pub fn with_data_refs(mut self, collect: bool) -> Self {
        self.collect_data_refs = Some(collect);
        self
    }

    pub fn skip_statements(mut self, skip: bool) -> Self {
        self.skip_stmts = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let code = [0x90, 0xc3];
        let req = LiftRequest::new(&code, 0x1000);
        assert_eq!(req.bytes_offset, None);
        assert_eq!(req.max_bytes, None);
        assert_eq!(req.max_inst, None);
        assert_eq!(req.opt_level, DEFAULT_OPT_LEVEL);
        assert!(req.allow_arch_optimizations);
        assert_eq!(req.strict_block_end, None);
        assert_eq!(req.collect_data_refs, None);
        assert!(!req.skip_stmts);
    }

    #[test]
    fn test_owned_request_outlives_buffer() {
        let req = {
            let code = vec![0x90; 4];
            LiftRequest::owned(code, 0).with_offset(2)
        };
        assert_eq!(req.code.len(), 4);
        assert_eq!(req.bytes_offset, Some(2));
    }
}
