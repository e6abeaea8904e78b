//! Process-wide registry: bind once at start-up, then lift by name.
//!
//! Kept in its own test binary since it mutates global state.

mod common;

use std::sync::Arc;

use common::{Behavior, FakeEngine};
use vexlift::{Arch, ArchDescriptor, LiftError, LiftRequest, Lifter, LiftOutcome};

struct Refusing;

impl Lifter for Refusing {
    fn name(&self) -> &str {
        "refusing"
    }

    fn lift(&self, _arch: &ArchDescriptor, _request: &LiftRequest<'_>) -> LiftOutcome {
        Err(LiftError::lifting("refused"))
    }
}

#[test]
fn test_register_then_lift_by_name() {
    let _ = env_logger::builder().is_test(true).try_init();

    let code = [0x90, 0xc3];
    let arch = ArchDescriptor::new(Arch::Amd64);

    let err = vexlift::lift(&arch, &LiftRequest::new(&code, 0)).unwrap_err();
    assert!(matches!(err, LiftError::UnsupportedArchitecture { .. }));

    let (gate, recorder) = FakeEngine::gate(vec![Behavior::Block(2)]);
    vexlift::register_libvex(gate);

    let block = vexlift::lift(&arch, &LiftRequest::new(&code, 0x7000)).unwrap();
    assert_eq!(block.addr, 0x7000);
    assert_eq!(block.size, 2);
    assert_eq!(recorder.call_count(), 1);
    assert_eq!(vexlift::lookup("S390X").unwrap().name(), "libvex");

    let replaced = vexlift::register(Arc::new(Refusing), "AMD64").unwrap();
    assert_eq!(replaced.name(), "libvex");
    let err = vexlift::lift(&arch, &LiftRequest::new(&code, 0)).unwrap_err();
    assert_eq!(err, LiftError::lifting("refused"));
    assert_eq!(recorder.call_count(), 1);
}
