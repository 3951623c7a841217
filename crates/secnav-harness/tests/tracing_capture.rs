//! The navigator's structured events, captured through a registry layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use secnav_harness::Rig;
use secnav_runtime::NavigatorConfig;
use tracing_subscriber::layer::SubscriberExt;
use web_time::Duration;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn capture(run: impl FnOnce()) -> Vec<CapturedEvent> {
    let layer = EventCapture::default();
    let events = Arc::clone(&layer.events);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, run);
    let captured = events.lock().unwrap().clone();
    captured
}

fn contains_ordered_chain(messages: &[&str], expected: &[&str]) -> bool {
    let mut needle = 0usize;
    for message in messages {
        if *message == expected[needle] {
            needle += 1;
            if needle == expected.len() {
                return true;
            }
        }
    }
    false
}

fn find<'a>(events: &'a [CapturedEvent], message: &str) -> Option<&'a CapturedEvent> {
    events.iter().find(|e| e.message() == message)
}

#[test]
fn click_logs_goto_suppression_and_settle_in_order() {
    let events = capture(|| {
        let mut rig = Rig::new(&Rig::chapters(), NavigatorConfig::default()).expect("rig");
        rig.mount();
        rig.settle();
        rig.click("ch3");
        rig.settle();
    });
    let messages: Vec<&str> = events.iter().map(CapturedEvent::message).collect();
    assert!(
        contains_ordered_chain(
            &messages,
            &["navigator.mount", "nav.goto", "navigator.suppressed", "nav.settle"]
        ),
        "unexpected event order: {messages:?}"
    );

    let goto = find(&events, "nav.goto").expect("nav.goto");
    assert_eq!(goto.fields.get("target").map(String::as_str), Some("ch3"));
    assert_eq!(goto.fields.get("origin").map(String::as_str), Some("user"));

    let settle = find(&events, "nav.settle").expect("nav.settle");
    assert_eq!(settle.fields.get("reason").map(String::as_str), Some("arrived"));
}

#[test]
fn unsupported_observer_is_a_warning() {
    use secnav_harness::SimulatedPage;

    let events = capture(|| {
        let sections = Rig::chapters();
        let page = SimulatedPage::new(&sections).without_observer();
        let mut rig = Rig::with_page(page, &sections, NavigatorConfig::default()).expect("rig");
        rig.mount();
    });
    let disabled = find(&events, "navigator.tracking_disabled").expect("tracking disabled");
    assert_eq!(disabled.level, tracing::Level::WARN);
    assert!(find(&events, "navigator.mount").is_none());
}

#[test]
fn unmount_reports_totals() {
    let events = capture(|| {
        let mut rig = Rig::new(&Rig::chapters(), NavigatorConfig::default()).expect("rig");
        rig.mount();
        rig.click("ch2");
        rig.advance(Duration::from_millis(64));
        rig.unmount();
    });
    let unmount = find(&events, "navigator.unmount").expect("navigator.unmount");
    assert_eq!(unmount.level, tracing::Level::INFO);
    assert_eq!(unmount.fields.get("navigations").map(String::as_str), Some("1"));
    assert!(find(&events, "tracker.stop").is_some());
}
