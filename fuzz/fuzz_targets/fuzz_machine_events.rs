#![no_main]

use arbitrary::Arbitrary;
use dragline_core::{
    Anchor, DragConfig, DragEnv, DragMachine, DragNotice, ListenerError, ListenerId,
    ListenerToken, MachineEvent, MeasureError, PointerStream, TargetId,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Down { target: u8, x: i16, y: i16 },
    Move { x: i16, y: i16 },
    Up { x: i16, y: i16 },
    Enter,
    Leave,
    SetPayload(u8),
    /// Toggle whether the next measurement fails.
    Unmount,
    /// Toggle whether the next listener registration fails.
    Refuse,
}

#[derive(Debug, Arbitrary)]
struct Input {
    threshold: u8,
    ops: Vec<Op>,
}

#[derive(Default)]
struct FuzzEnv {
    next: u64,
    live: Vec<ListenerId>,
    unmounted: bool,
    refuse: bool,
}

impl DragEnv for FuzzEnv {
    fn measure(&mut self, target: TargetId) -> Result<Anchor, MeasureError> {
        if self.unmounted {
            return Err(MeasureError::Unmounted(target));
        }
        Ok(Anchor::new(1.0, 2.0))
    }

    fn listen(
        &mut self,
        stream: PointerStream,
        _token: ListenerToken,
    ) -> Result<ListenerId, ListenerError> {
        if self.refuse {
            return Err(ListenerError::Refused { stream });
        }
        self.next += 1;
        let id = ListenerId::new(self.next);
        self.live.push(id);
        Ok(id)
    }

    fn unlisten(&mut self, id: ListenerId) -> Result<(), ListenerError> {
        let before = self.live.len();
        self.live.retain(|live| *live != id);
        if self.live.len() == before {
            return Err(ListenerError::Unknown(id));
        }
        Ok(())
    }
}

fuzz_target!(|input: Input| {
    if input.ops.len() > 512 {
        return;
    }
    let config = DragConfig::with_threshold(f64::from(input.threshold));
    let mut machine: DragMachine<u8> = DragMachine::new(&config);
    let mut env = FuzzEnv::default();
    let mut started = 0usize;
    let mut finished = 0usize;

    for op in input.ops {
        let event = match op {
            Op::Down { target, x, y } => {
                MachineEvent::down(TargetId::new(u64::from(target)), f64::from(x), f64::from(y), None)
            }
            Op::Move { x, y } => MachineEvent::moved(f64::from(x), f64::from(y)),
            Op::Up { x, y } => MachineEvent::up(f64::from(x), f64::from(y)),
            Op::Enter => MachineEvent::DropAreaEnter,
            Op::Leave => MachineEvent::DropAreaLeave,
            Op::SetPayload(p) => MachineEvent::SetPayload(Some(p)),
            Op::Unmount => {
                env.unmounted = !env.unmounted;
                continue;
            }
            Op::Refuse => {
                env.refuse = !env.refuse;
                continue;
            }
        };

        let step = machine.step(event, &mut env);
        for notice in &step.notices {
            match notice {
                DragNotice::Started { .. } => started += 1,
                DragNotice::Ended { .. } => finished += 1,
                DragNotice::Aborted { .. } => assert_eq!(started, finished, "abort after start"),
                _ => {}
            }
        }

        let snap = machine.snapshot();
        assert_eq!(snap.owner.is_some(), snap.phase.is_active(), "owner/phase mismatch");
        if snap.phase.is_idle() {
            assert_eq!((snap.dx, snap.dy), (0.0, 0.0), "offset while idle");
        }
        let expected = if snap.phase.is_active() { 2 } else { 0 };
        assert_eq!(machine.active_listeners(), expected, "listener count");
        assert_eq!(env.live.len(), expected, "leaked listener");
        assert!(finished <= started && started <= finished + 1, "unbalanced notices");
    }

    machine.shutdown(&mut env);
    assert!(env.live.is_empty(), "listener survived shutdown");
});
