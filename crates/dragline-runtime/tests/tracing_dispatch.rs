#![forbid(unsafe_code)]

//! Tracing output of the registry and dispatch loop.
//!
//! Verifies that transitions are logged inside a `dragline.dispatch` span
//! carrying the group, and that registry lifecycle events are reported.
//!
//! Run:
//!   cargo test -p dragline-runtime --test tracing_dispatch

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dragline_core::{Anchor, GroupId, MachineEvent, Point, TargetId};
use dragline_runtime::{BoundsTable, PointerBus, Registry};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    span: Option<(String, HashMap<String, String>)>,
}

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    span_fields: Arc<Mutex<HashMap<u64, HashMap<String, String>>>>,
}

struct FieldVisitor(HashMap<String, String>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(HashMap::new());
        attrs.record(&mut visitor);
        self.span_fields
            .lock()
            .unwrap()
            .insert(id.into_u64(), visitor.0);
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(HashMap::new());
        event.record(&mut visitor);
        let message = visitor.0.remove("message").unwrap_or_default();

        let span = ctx.event_span(event).map(|span| {
            let fields = self
                .span_fields
                .lock()
                .unwrap()
                .get(&span.id().into_u64())
                .cloned()
                .unwrap_or_default();
            (span.name().to_string(), fields)
        });

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields: visitor.0,
            span,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let layer = Capture::default();
    let events = Arc::clone(&layer.events);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn drag_once() {
    let bus = PointerBus::new();
    let bounds = BoundsTable::new();
    bounds.mount(TargetId::new(1), Anchor::new(0.0, 0.0));
    let registry: Registry<()> = Registry::new(bus.clone(), bounds);
    let group = GroupId::new("board");

    let handle = registry.acquire(group.clone());
    handle
        .send(MachineEvent::down(TargetId::new(1), 0.0, 0.0, None))
        .unwrap();
    bus.emit_move(Point::new(0.0, 30.0));
    bus.emit_up(Point::new(0.0, 30.0));
    registry.release(&group);
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn transitions_are_logged_inside_dispatch_span() {
    let events = capture(drag_once);

    let transitions: Vec<_> = events
        .iter()
        .filter(|e| e.message == "transition")
        .collect();
    assert_eq!(transitions.len(), 3);

    for event in &transitions {
        assert_eq!(event.level, tracing::Level::DEBUG);
        let (name, fields) = event.span.as_ref().expect("transition outside a span");
        assert_eq!(name, "dragline.dispatch");
        assert_eq!(fields.get("group").map(String::as_str), Some("board"));
    }

    let hops: Vec<_> = transitions
        .iter()
        .map(|e| (e.fields["from"].as_str(), e.fields["to"].as_str()))
        .collect();
    assert_eq!(
        hops,
        vec![("idle", "preDrag"), ("preDrag", "dragging"), ("dragging", "idle")]
    );
}

#[test]
fn registry_lifecycle_is_logged_at_info() {
    let events = capture(drag_once);

    let info: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::INFO)
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(info, vec!["drag machine created", "drag machine destroyed"]);
}

#[test]
fn aborted_confirmation_is_a_warning() {
    let events = capture(|| {
        let bus = PointerBus::new();
        let registry: Registry<()> = Registry::new(bus.clone(), BoundsTable::new());
        let handle = registry.acquire("board");
        handle
            .send(MachineEvent::down(TargetId::new(7), 0.0, 0.0, None))
            .unwrap();
        bus.emit_move(Point::new(0.0, 30.0));
    });

    let warning = events
        .iter()
        .find(|e| e.level == tracing::Level::WARN && e.message == "drag aborted")
        .expect("no abort warning");
    let (name, _) = warning.span.as_ref().expect("abort outside a span");
    assert_eq!(name, "dragline.dispatch");
}
