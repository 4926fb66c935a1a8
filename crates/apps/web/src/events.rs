use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Deserialize;

/// Renderer and DOM callbacks, buffered until the next `tick()`.
///
/// JS callbacks never touch the widget directly: they may fire while the
/// widget is mid-update, so they only enqueue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    Loaded,
    StyleLoaded,
    Click { id: String },
    Hover { id: String, on: bool },
    Resize { width: u32, height: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Rc<RefCell<VecDeque<HostEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: HostEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Parses one JSON message from the JS shim. Unknown messages are
    /// reported and dropped.
    pub fn push_json(&self, raw: &str) -> Result<(), String> {
        let event: HostEvent = serde_json::from_str(raw).map_err(|e| format!("{e}: {raw}"))?;
        self.push(event);
        Ok(())
    }

    pub fn drain(&self) -> Vec<HostEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventQueue, HostEvent};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_shim_messages_in_order() {
        let q = EventQueue::new();
        q.push_json(r#"{"kind":"loaded"}"#).unwrap();
        q.push_json(r#"{"kind":"click","id":"goa"}"#).unwrap();
        q.push_json(r#"{"kind":"hover","id":"goa","on":true}"#).unwrap();
        q.push_json(r#"{"kind":"style_loaded"}"#).unwrap();
        q.push(HostEvent::Resize {
            width: 800,
            height: 600,
        });

        assert_eq!(
            q.drain(),
            vec![
                HostEvent::Loaded,
                HostEvent::Click {
                    id: "goa".to_string()
                },
                HostEvent::Hover {
                    id: "goa".to_string(),
                    on: true
                },
                HostEvent::StyleLoaded,
                HostEvent::Resize {
                    width: 800,
                    height: 600
                },
            ]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn unknown_message_is_rejected() {
        let q = EventQueue::new();
        assert!(q.push_json(r#"{"kind":"wheel"}"#).is_err());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn clones_share_the_buffer() {
        let q = EventQueue::new();
        let producer = q.clone();
        producer.push(HostEvent::Loaded);
        assert_eq!(q.drain(), vec![HostEvent::Loaded]);
    }
}
