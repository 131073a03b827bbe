use tracing::trace;

use super::EventCallback;
use super::model::Notification;

/// The `type` discriminator carried by frames this client delivers.
const NOTIFICATION_FRAME: &str = "notification";

/// Decode a raw text frame and hand it to `on_event` when it is a
/// well-formed notification envelope.
///
/// Everything else is dropped without surfacing an error: unknown frame
/// types are forward-compatible no-ops, and a malformed payload must never
/// reach the consumer.
pub fn dispatch_frame(raw: &str, on_event: &EventCallback) {
    match decode_frame(raw) {
        Some(notification) => on_event(notification),
        None => trace!(frame = raw, "ignoring non-notification frame"),
    }
}

fn decode_frame(raw: &str) -> Option<Notification> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    if value.get("type").and_then(|t| t.as_str()) != Some(NOTIFICATION_FRAME) {
        return None;
    }
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;

    fn counting_callback() -> (EventCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let callback: EventCallback = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    #[test]
    fn foreign_frame_types_never_reach_the_callback() {
        let (callback, count) = counting_callback();
        dispatch_frame(r#"{"type":"ping"}"#, &callback);
        dispatch_frame(r#"{"type":"presence","user":3}"#, &callback);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_frames_are_dropped_silently() {
        let (callback, count) = counting_callback();
        dispatch_frame("not json at all", &callback);
        dispatch_frame(r#"{"type":"notification""#, &callback);
        dispatch_frame(r#"{"message":"no discriminator"}"#, &callback);
        // Right discriminator but not a decodable notification record.
        dispatch_frame(r#"{"type":"notification","message":"missing id"}"#, &callback);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notification_frames_invoke_the_callback_exactly_once() {
        let received: Arc<Mutex<Vec<Notification>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let callback: EventCallback = Arc::new(move |n| sink.lock().push(n));

        dispatch_frame(
            r#"{"type":"notification","id":2,"message":"hi","read":false}"#,
            &callback,
        );

        let received = received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id.as_str(), "2");
        assert_eq!(received[0].message, "hi");
        assert!(!received[0].read);
    }

    #[test]
    fn string_ids_on_the_wire_are_accepted() {
        let received: Arc<Mutex<Vec<Notification>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let callback: EventCallback = Arc::new(move |n| sink.lock().push(n));

        dispatch_frame(
            r#"{"type":"notification","id":"abc-9","message":"trainer replied"}"#,
            &callback,
        );

        assert_eq!(received.lock()[0].id.as_str(), "abc-9");
    }
}
