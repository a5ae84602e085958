//! Event sinks for workflow observability.
//!
//! Workflows never log directly. They emit events into the sink carried by
//! their [`crate::context::Context`], which may forward them to `tracing`,
//! collect them for assertions, or drop them.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde_json::{json, Value};

/// Builds an event payload carrying a human readable message.
///
/// `fields` must be a JSON object; its entries are merged next to `message`.
#[must_use]
pub fn payload(message: impl Into<String>, fields: Value) -> Value {
    let mut data = json!({ "message": message.into() });
    if let (Some(target), Value::Object(extra)) = (data.as_object_mut(), fields) {
        target.extend(extra);
    }
    data
}
