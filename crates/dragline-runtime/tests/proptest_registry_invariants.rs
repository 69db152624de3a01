//! Property-based tests for the registry and bus-driven services.
//!
//! 1. Consumer counts track acquire/release exactly; entries exist iff count > 0
//! 2. Bus listeners match the phases of the live groups
//! 3. Stopped services never change after release, whatever the bus emits

use dragline_core::{Anchor, DragPhase, GroupId, MachineEvent, Point, TargetId};
use dragline_runtime::{BoundsTable, MachineHandle, PointerBus, Registry};
use proptest::prelude::*;

const GROUPS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Op {
    Acquire(usize),
    Release(usize),
    Down(usize, f64, f64),
    Move(f64, f64),
    Up(f64, f64),
}

fn coord() -> impl Strategy<Value = f64> {
    -200.0f64..200.0
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..GROUPS.len()).prop_map(Op::Acquire),
        (0..GROUPS.len()).prop_map(Op::Release),
        (0..GROUPS.len(), coord(), coord()).prop_map(|(g, x, y)| Op::Down(g, x, y)),
        (coord(), coord()).prop_map(|(x, y)| Op::Move(x, y)),
        (coord(), coord()).prop_map(|(x, y)| Op::Up(x, y)),
    ]
}

fn setup() -> (Registry<u8>, PointerBus) {
    let bus = PointerBus::new();
    let bounds = BoundsTable::new();
    for raw in 0..GROUPS.len() as u64 {
        bounds.mount(TargetId::new(raw), Anchor::new(1.0, 2.0));
    }
    (Registry::new(bus.clone(), bounds), bus)
}

proptest! {
    #[test]
    fn consumer_counts_follow_acquire_and_release(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let (registry, bus) = setup();
        let mut expected = [0usize; GROUPS.len()];
        let mut released: Vec<MachineHandle<u8>> = Vec::new();

        for op in &ops {
            match *op {
                Op::Acquire(g) => {
                    registry.acquire(GROUPS[g]);
                    expected[g] += 1;
                }
                Op::Release(g) => {
                    let group = GroupId::new(GROUPS[g]);
                    let handle = registry.get(&group);
                    let stopped = registry.release(&group);
                    if expected[g] > 0 {
                        expected[g] -= 1;
                    }
                    prop_assert_eq!(stopped, expected[g] == 0 && handle.is_some());
                    if stopped {
                        if let Some(handle) = handle {
                            released.push(handle);
                        }
                    }
                }
                Op::Down(g, x, y) => {
                    if let Some(handle) = registry.get(&GroupId::new(GROUPS[g])) {
                        handle
                            .send(MachineEvent::down(TargetId::new(g as u64), x, y, Some(g as u8)))
                            .unwrap();
                    }
                }
                Op::Move(x, y) => {
                    bus.emit_move(Point::new(x, y));
                }
                Op::Up(x, y) => {
                    bus.emit_up(Point::new(x, y));
                }
            }

            let mut live_listeners = 0;
            for (g, name) in GROUPS.iter().enumerate() {
                let group = GroupId::new(*name);
                prop_assert_eq!(registry.consumer_count(&group), expected[g]);
                prop_assert_eq!(registry.contains(&group), expected[g] > 0);
                if let Some(handle) = registry.get(&group) {
                    let listeners = if handle.phase() == DragPhase::Idle { 0 } else { 2 };
                    prop_assert_eq!(handle.active_listeners(), listeners);
                    live_listeners += listeners;
                }
            }
            prop_assert_eq!(bus.listener_count(), live_listeners);

            for handle in &released {
                prop_assert!(handle.is_stopped());
                prop_assert_eq!(handle.active_listeners(), 0);
            }
        }
    }

    #[test]
    fn released_service_ignores_later_pointer_activity(
        moves in prop::collection::vec((coord(), coord()), 1..30),
    ) {
        let (registry, bus) = setup();
        let group = GroupId::new("a");
        let handle = registry.acquire(group.clone());
        handle.send(MachineEvent::down(TargetId::new(0), 0.0, 0.0, Some(1))).unwrap();
        bus.emit_move(Point::new(0.0, 50.0));
        registry.release(&group);

        let frozen = handle.snapshot();
        let version = handle.version();
        for (x, y) in moves {
            bus.emit_move(Point::new(x, y));
            bus.emit_up(Point::new(x, y));
        }

        prop_assert_eq!(handle.snapshot(), frozen);
        prop_assert_eq!(handle.version(), version);
        prop_assert_eq!(bus.listener_count(), 0);
    }
}
