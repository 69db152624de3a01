#![no_main]

use arbitrary::Arbitrary;
use dragline_core::{Anchor, GroupId, Point};
use dragline_runtime::{BoundsTable, DragBinding, DragOptions, PointerBus, Registry};
use libfuzzer_sys::fuzz_target;

const GROUPS: [&str; 2] = ["left", "right"];

#[derive(Debug, Arbitrary)]
enum Op {
    Attach { group: bool, draggable: bool, drop_area: bool },
    Detach(u8),
    Down { binding: u8, x: i16, y: i16 },
    Enter(u8),
    Leave(u8),
    Release(u8),
    SetData { binding: u8, data: u8 },
    Move { x: i16, y: i16 },
    Up { x: i16, y: i16 },
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 256 {
        return;
    }
    let bus = PointerBus::new();
    let bounds = BoundsTable::new();
    let registry: Registry<u8> = Registry::new(bus.clone(), bounds.clone());
    let mut bindings: Vec<DragBinding<u8>> = Vec::new();

    for op in ops {
        match op {
            Op::Attach {
                group,
                draggable,
                drop_area,
            } => {
                let binding = DragBinding::attach(
                    &registry,
                    GROUPS[usize::from(group)],
                    DragOptions::new()
                        .draggable(draggable)
                        .drop_area(drop_area)
                        .data(bindings.len() as u8),
                );
                bounds.mount(binding.id(), Anchor::new(0.0, 0.0));
                bindings.push(binding);
            }
            Op::Detach(i) => {
                if !bindings.is_empty() {
                    let index = usize::from(i) % bindings.len();
                    drop(bindings.swap_remove(index));
                }
            }
            Op::Down { binding, x, y } => {
                if let Some(b) = pick(&bindings, binding) {
                    let _ = b.pointer_down(Point::new(f64::from(x), f64::from(y)));
                }
            }
            Op::Enter(i) => {
                if let Some(b) = pick(&bindings, i) {
                    let _ = b.pointer_enter();
                }
            }
            Op::Leave(i) => {
                if let Some(b) = pick(&bindings, i) {
                    let _ = b.pointer_leave();
                }
            }
            Op::Release(i) => {
                if let Some(b) = pick(&bindings, i) {
                    let _ = b.pointer_up();
                }
            }
            Op::SetData { binding, data } => {
                if !bindings.is_empty() {
                    let index = usize::from(binding) % bindings.len();
                    let _ = bindings[index].set_data(data);
                }
            }
            Op::Move { x, y } => {
                bus.emit_move(Point::new(f64::from(x), f64::from(y)));
            }
            Op::Up { x, y } => {
                bus.emit_up(Point::new(f64::from(x), f64::from(y)));
            }
        }

        let mut listeners = 0;
        for name in GROUPS {
            let attached = bindings.iter().filter(|b| b.group().as_str() == name).count();
            let group = GroupId::new(name);
            assert_eq!(registry.consumer_count(&group), attached, "consumer count drift");
            if let Some(handle) = registry.get(&group) {
                listeners += handle.active_listeners();
            }
        }
        assert_eq!(bus.listener_count(), listeners, "bus holds orphaned listeners");
    }

    bindings.clear();
    assert!(registry.is_empty(), "group survived its last binding");
    assert_eq!(bus.listener_count(), 0, "listener survived release");
});

fn pick(bindings: &[DragBinding<u8>], i: u8) -> Option<&DragBinding<u8>> {
    if bindings.is_empty() {
        None
    } else {
        Some(&bindings[usize::from(i) % bindings.len()])
    }
}
