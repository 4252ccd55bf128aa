//! Input events and listener registration.
//!
//! Hosts translate their native events into [`InputEvent`] and hand them to
//! the orchestrator. Components that want a channel register on the
//! [`InputBus`]; every registration has an id so it can be removed exactly
//! once, and teardown can sweep a whole subscriber.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Scroll,
    Wheel,
    Keyboard,
    Pointer,
    Resize,
    Touch,
}

impl Channel {
    pub fn all() -> &'static [Channel] {
        &[
            Channel::Scroll,
            Channel::Wheel,
            Channel::Keyboard,
            Channel::Pointer,
            Channel::Resize,
            Channel::Touch,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Scroll => "scroll",
            Channel::Wheel => "wheel",
            Channel::Keyboard => "keyboard",
            Channel::Pointer => "pointer",
            Channel::Resize => "resize",
            Channel::Touch => "touch",
        }
    }
}

/// Components that own registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subscriber {
    Narrative,
    Emergence,
    Depth,
    Modes,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Escape,
    Home,
    End,
    Digit(u8),
    Char(char),
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Key {
        match key {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            " " | "Space" | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            "Home" => Key::Home,
            "End" => Key::End,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Key::Digit(c as u8 - b'0'),
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other(key.to_string()),
                }
            }
        }
    }

    pub fn as_dom(&self) -> String {
        match self {
            Key::ArrowUp => "ArrowUp".to_string(),
            Key::ArrowDown => "ArrowDown".to_string(),
            Key::ArrowLeft => "ArrowLeft".to_string(),
            Key::ArrowRight => "ArrowRight".to_string(),
            Key::Space => " ".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Home => "Home".to_string(),
            Key::End => "End".to_string(),
            Key::Digit(d) => d.to_string(),
            Key::Char(c) => c.to_string(),
            Key::Other(s) => s.clone(),
        }
    }

    /// Case-insensitive character match.
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::from_dom(&s)
    }
}

impl From<Key> for String {
    fn from(k: Key) -> Self {
        k.as_dom()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value", rename_all = "snake_case"))]
pub enum InputEvent {
    /// Absolute scroll offset and the maximum scrollable offset.
    Scroll { y: f32, max: f32 },
    Wheel { delta_y: f32 },
    Key(Key),
    /// Pointer position in viewport pixels.
    PointerMove { x: f32, y: f32 },
    Resize { width: f32, height: f32 },
    TouchStart { y: f32 },
    TouchEnd { y: f32 },
}

impl InputEvent {
    pub fn channel(&self) -> Channel {
        match self {
            InputEvent::Scroll { .. } => Channel::Scroll,
            InputEvent::Wheel { .. } => Channel::Wheel,
            InputEvent::Key(_) => Channel::Keyboard,
            InputEvent::PointerMove { .. } => Channel::Pointer,
            InputEvent::Resize { .. } => Channel::Resize,
            InputEvent::TouchStart { .. } | InputEvent::TouchEnd { .. } => Channel::Touch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub id: ListenerId,
    pub channel: Channel,
    pub subscriber: Subscriber,
    /// Higher runs first.
    pub priority: i32,
}

/// Registration table plus a FIFO of pending events.
#[derive(Debug, Default)]
pub struct InputBus {
    next_id: u64,
    registrations: Vec<Registration>,
    queue: VecDeque<InputEvent>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, channel: Channel, subscriber: Subscriber, priority: i32) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.registrations.push(Registration {
            id,
            channel,
            subscriber,
            priority,
        });
        id
    }

    /// Remove one registration. Unknown or already-removed ids return false.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Remove every registration owned by `subscriber`; returns how many.
    pub fn unregister_all(&mut self, subscriber: Subscriber) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.subscriber != subscriber);
        before - self.registrations.len()
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.registrations.iter().any(|r| r.id == id)
    }

    /// Subscribers on `channel`, highest priority first, then registration order.
    pub fn listeners(&self, channel: Channel) -> Vec<Subscriber> {
        let mut regs: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| r.channel == channel)
            .collect();
        regs.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        let mut out: Vec<Subscriber> = Vec::with_capacity(regs.len());
        for r in regs {
            if !out.contains(&r.subscriber) {
                out.push(r.subscriber);
            }
        }
        out
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.queue.drain(..).collect()
    }

    /// Drop every registration and pending event.
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_keys_map() {
        assert_eq!(Key::from_dom("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_dom(" "), Key::Space);
        assert_eq!(Key::from_dom("3"), Key::Digit(3));
        assert_eq!(Key::from_dom("r"), Key::Char('r'));
        assert_eq!(Key::from_dom("Shift"), Key::Other("Shift".to_string()));
        assert!(Key::from_dom("C").is_char('c'));
        for k in [Key::ArrowUp, Key::Space, Key::Digit(2), Key::Char('h'), Key::End] {
            assert_eq!(Key::from_dom(&k.as_dom()), k);
        }
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut bus = InputBus::new();
        let a = bus.register(Channel::Keyboard, Subscriber::Depth, 10);
        let b = bus.register(Channel::Keyboard, Subscriber::Narrative, 0);
        assert!(bus.unregister(a));
        assert!(!bus.unregister(a));
        assert!(!bus.is_registered(a));
        assert!(bus.is_registered(b));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn listeners_sorted_by_priority() {
        let mut bus = InputBus::new();
        bus.register(Channel::Keyboard, Subscriber::Narrative, 0);
        bus.register(Channel::Keyboard, Subscriber::Modes, 5);
        bus.register(Channel::Keyboard, Subscriber::Depth, 10);
        bus.register(Channel::Scroll, Subscriber::Narrative, 0);
        assert_eq!(
            bus.listeners(Channel::Keyboard),
            vec![Subscriber::Depth, Subscriber::Modes, Subscriber::Narrative]
        );
        assert_eq!(bus.unregister_all(Subscriber::Narrative), 2);
        assert!(bus.listeners(Channel::Scroll).is_empty());
    }

    #[test]
    fn queue_is_fifo() {
        let mut bus = InputBus::new();
        bus.push(InputEvent::Wheel { delta_y: 1.0 });
        bus.push(InputEvent::Key(Key::Escape));
        assert_eq!(bus.pending(), 2);
        let drained = bus.drain();
        assert_eq!(drained[1].channel(), Channel::Keyboard);
        assert_eq!(bus.pending(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn events_read_from_json() {
        let json = r#"[
            {"type": "scroll", "value": {"y": 1200.0, "max": 10000.0}},
            {"type": "key", "value": "ArrowDown"},
            {"type": "touch_end", "value": {"y": 40.0}}
        ]"#;
        let events: Vec<InputEvent> = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], InputEvent::Key(Key::ArrowDown));
    }
}
