//! Event decoding for the callback channel.
//!
//! Turns a decrypted, attribute-flexible JSON payload into a typed event.
//!
//! # Hierarchy
//!
//! ```text
//! decode(payload)
//! ├── EventType dispatch (membership changes)
//! │   ├── "chat_quit"          → ChatQuit
//! │   ├── "chat_remove_member" → ChatKick
//! │   ├── "chat_update_title"  → GroupNameChange
//! │   └── "chat_disband"       → GroupDisband
//! ├── MsgType present          → GroupMessage
//! └── anything else            → BasicEvent only
//! ```
//!
//! Every decoded specific event is accompanied by a [`BasicEvent`] shadow
//! carrying the unmodified payload; the pipeline radios both under one
//! [`TraceId`], so handlers wanting typed fields and handlers wanting raw
//! access observe the same inbound event.
//!
//! # Flexible key casing
//!
//! Upstream payloads are inconsistent about the case of a key's first
//! letter (`EventType` vs `eventType`). [`flex_get`] tries the exact key
//! first, then the first-letter case-flipped variant. This normalisation
//! lives only here, at the decode boundary.

use std::any::Any;

use serde_json::{Map, Value};

use braze_core::{BoxedEvent, Event, TraceId};

// ============================================================================
// Flexible key lookup
// ============================================================================

/// Looks up `key` in `map`, tolerating a flipped-case first letter.
pub(crate) fn flex_get<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    let mut chars = key.chars();
    let first = chars.next()?;
    let flipped: String = if first.is_uppercase() {
        first.to_lowercase().chain(chars).collect()
    } else {
        first.to_uppercase().chain(chars).collect()
    };
    map.get(&flipped)
}

fn flex_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    flex_get(map, key).and_then(Value::as_str)
}

fn flex_string(map: &Map<String, Value>, key: &str) -> String {
    flex_str(map, key).unwrap_or_default().to_string()
}

// ============================================================================
// Event variants
// ============================================================================

/// A text (or other) message received in a group chat.
#[derive(Debug, Clone)]
pub struct GroupMessage {
    /// Chat the message was posted in.
    pub chat_id: String,
    /// Platform message id.
    pub msg_id: String,
    /// User id of the sender.
    pub sender: String,
    /// Platform message type (`"text"`, `"image"`, ...).
    pub msg_type: String,
    /// Text content, for text messages.
    pub text: Option<String>,
    /// The unmodified payload.
    pub raw: Value,
}

impl Event for GroupMessage {
    fn event_name(&self) -> &'static str {
        "group_message"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A member left the chat on their own.
#[derive(Debug, Clone)]
pub struct ChatQuit {
    /// Chat the member left.
    pub chat_id: String,
    /// User id of the member who left.
    pub quit_user: String,
}

impl Event for ChatQuit {
    fn event_name(&self) -> &'static str {
        "chat_quit"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A member was removed from the chat by an operator.
#[derive(Debug, Clone)]
pub struct ChatKick {
    /// Chat the member was removed from.
    pub chat_id: String,
    /// User id of the operator.
    pub operator: String,
    /// User ids of the removed members.
    pub removed: Vec<String>,
}

impl Event for ChatKick {
    fn event_name(&self) -> &'static str {
        "chat_kick"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The chat was renamed.
#[derive(Debug, Clone)]
pub struct GroupNameChange {
    /// Chat that was renamed.
    pub chat_id: String,
    /// User id of the operator.
    pub operator: String,
    /// The new chat title.
    pub new_title: String,
}

impl Event for GroupNameChange {
    fn event_name(&self) -> &'static str {
        "group_name_change"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The chat was disbanded.
#[derive(Debug, Clone)]
pub struct GroupDisband {
    /// Chat that was disbanded.
    pub chat_id: String,
    /// User id of the operator.
    pub operator: String,
}

impl Event for GroupDisband {
    fn event_name(&self) -> &'static str {
        "group_disband"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Generic event wrapping the raw decoded payload, unmodified.
///
/// Radioed alongside every specific event (and alone for payloads no
/// specific decoder recognises — an unknown shape is never an error;
/// downstream handlers decide relevance).
#[derive(Debug, Clone)]
pub struct BasicEvent {
    /// The unmodified payload.
    pub raw: Value,
}

impl Event for BasicEvent {
    fn event_name(&self) -> &'static str {
        "basic"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// One decoded inbound payload: the specific event (when recognised), the
/// raw shadow, and the trace shared by both.
#[derive(Debug)]
pub struct Decoded {
    /// The type-specific event, when the payload matched a known shape.
    pub specific: Option<BoxedEvent>,
    /// Raw-payload shadow, always present.
    pub basic: BasicEvent,
    /// Trace identifier threading this payload through dispatch.
    pub trace: TraceId,
}

/// Decodes a payload into a typed event plus its raw shadow.
pub fn decode(payload: Value) -> Decoded {
    let trace = TraceId::new();
    let specific = payload.as_object().and_then(decode_specific);
    Decoded {
        specific,
        basic: BasicEvent { raw: payload },
        trace,
    }
}

fn decode_specific(map: &Map<String, Value>) -> Option<BoxedEvent> {
    if let Some(event_type) = flex_str(map, "EventType") {
        match event_type {
            "chat_quit" => {
                return Some(BoxedEvent::new(ChatQuit {
                    chat_id: flex_string(map, "ChatId"),
                    quit_user: flex_string(map, "QuitUser"),
                }));
            }
            "chat_remove_member" => {
                return Some(BoxedEvent::new(ChatKick {
                    chat_id: flex_string(map, "ChatId"),
                    operator: flex_string(map, "Operator"),
                    removed: flex_get(map, "DelMemberList")
                        .and_then(Value::as_array)
                        .map(|list| {
                            list.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                }));
            }
            "chat_update_title" => {
                return Some(BoxedEvent::new(GroupNameChange {
                    chat_id: flex_string(map, "ChatId"),
                    operator: flex_string(map, "Operator"),
                    new_title: flex_string(map, "ChatName"),
                }));
            }
            "chat_disband" => {
                return Some(BoxedEvent::new(GroupDisband {
                    chat_id: flex_string(map, "ChatId"),
                    operator: flex_string(map, "Operator"),
                }));
            }
            // Unknown event types fall through to the message/basic path.
            _ => {}
        }
    }

    if let Some(msg_type) = flex_str(map, "MsgType") {
        let text = flex_get(map, "Text")
            .and_then(Value::as_object)
            .and_then(|t| flex_str(t, "Content"))
            .map(str::to_string);
        return Some(BoxedEvent::new(GroupMessage {
            chat_id: flex_string(map, "ChatId"),
            msg_id: flex_string(map, "MsgId"),
            sender: flex_get(map, "From")
                .and_then(Value::as_object)
                .map(|f| flex_string(f, "UserId"))
                .unwrap_or_default(),
            msg_type: msg_type.to_string(),
            text,
            raw: Value::Object(map.clone()),
        }));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn flex_get_tries_both_first_letter_cases() {
        let map = obj(json!({"eventType": "chat_quit", "ChatId": "c1"}));
        assert_eq!(
            flex_get(&map, "EventType").and_then(Value::as_str),
            Some("chat_quit")
        );
        assert_eq!(
            flex_get(&map, "chatId").and_then(Value::as_str),
            Some("c1")
        );
        assert!(flex_get(&map, "Nothing").is_none());
    }

    #[test]
    fn decodes_membership_events() {
        let decoded = decode(json!({
            "EventType": "chat_remove_member",
            "ChatId": "c1",
            "Operator": "boss",
            "DelMemberList": ["a", "b"]
        }));
        let specific = decoded.specific.unwrap();
        let kick = specific.downcast_ref::<ChatKick>().unwrap();
        assert_eq!(kick.chat_id, "c1");
        assert_eq!(kick.operator, "boss");
        assert_eq!(kick.removed, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn decodes_rename_with_lowercased_keys() {
        let decoded = decode(json!({
            "eventType": "chat_update_title",
            "chatId": "c2",
            "operator": "boss",
            "chatName": "new name"
        }));
        let specific = decoded.specific.unwrap();
        let rename = specific.downcast_ref::<GroupNameChange>().unwrap();
        assert_eq!(rename.chat_id, "c2");
        assert_eq!(rename.new_title, "new name");
    }

    #[test]
    fn decodes_text_message() {
        let decoded = decode(json!({
            "MsgType": "text",
            "MsgId": "m1",
            "ChatId": "c1",
            "From": {"UserId": "alice"},
            "Text": {"Content": "hello"}
        }));
        let specific = decoded.specific.unwrap();
        let msg = specific.downcast_ref::<GroupMessage>().unwrap();
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.text.as_deref(), Some("hello"));
        assert_eq!(msg.msg_type, "text");
    }

    #[test]
    fn unknown_event_type_falls_back_to_basic_only() {
        let payload = json!({"EventType": "totally_new", "ChatId": "c1"});
        let decoded = decode(payload.clone());
        assert!(decoded.specific.is_none());
        assert_eq!(decoded.basic.raw, payload);
    }

    #[test]
    fn shadow_carries_unmodified_payload() {
        let payload = json!({
            "EventType": "chat_disband",
            "ChatId": "c9",
            "Operator": "boss"
        });
        let decoded = decode(payload.clone());
        assert!(decoded.specific.is_some());
        assert_eq!(decoded.basic.raw, payload);
    }
}
