//! Bus model (SlotMap-backed).
//!
//! Messages live in a **SlotMap** arena with stable [`MessageKey`]s. Iteration follows
//! the schema order through `iter_messages()`. Lookups by frame key and by name
//! resolve to the same record, so a message is never stored twice.

use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::types::{canframe::frame_key, message::Message};

new_key_type! { pub struct MessageKey; }

/// One bus of the network with its messages.
#[derive(Default, Clone, Debug)]
pub struct Bus {
    /// Bus name.
    pub name: String,

    // --- Main storage (stable-key map) ---
    pub(crate) messages: SlotMap<MessageKey, Message>,

    // --- Order "view" (schema order) ---
    pub(crate) messages_order: Vec<MessageKey>,

    // --- Lookups ---
    pub(crate) msg_key_by_id: HashMap<u32, MessageKey>, // id | ext << 31 → MessageKey
    pub(crate) msg_key_by_name: HashMap<String, MessageKey>,
}

impl Bus {
    pub fn new(name: &str) -> Self {
        Bus {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Appends a message and indexes its frame key and name.
    ///
    /// A later message with the same key or name shadows the earlier one in the
    /// lookups; both stay reachable through `iter_messages()`.
    pub fn add_message(&mut self, message: Message) -> MessageKey {
        let id_key: u32 = message.key();
        let name: String = message.name.clone();

        let key: MessageKey = self.messages.insert(message);
        self.messages_order.push(key);
        self.msg_key_by_id.insert(id_key, key);
        self.msg_key_by_name.insert(name, key);
        key
    }

    pub fn get_message_by_key(&self, key: MessageKey) -> Option<&Message> {
        self.messages.get(key)
    }

    pub fn get_msg_key_by_id(&self, id: u32, extended: bool) -> Option<MessageKey> {
        self.msg_key_by_id.get(&frame_key(id, extended)).copied()
    }

    pub fn get_msg_key_by_name(&self, name: &str) -> Option<MessageKey> {
        self.msg_key_by_name.get(name).copied()
    }

    /// Returns a `&Message` given the arbitration id and its format.
    pub fn get_message_by_id(&self, id: u32, extended: bool) -> Option<&Message> {
        let key: MessageKey = self.get_msg_key_by_id(id, extended)?;
        self.get_message_by_key(key)
    }

    /// Returns a `&Message` given its name.
    pub fn get_message_by_name(&self, name: &str) -> Option<&Message> {
        let key: MessageKey = self.get_msg_key_by_name(name)?;
        self.get_message_by_key(key)
    }

    /// Messages in schema order.
    pub fn iter_messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages_order
            .iter()
            .filter_map(move |&key| self.messages.get(key))
    }

    /// Message at position `index` in schema order.
    pub fn message_at(&self, index: usize) -> Option<&Message> {
        let key: MessageKey = *self.messages_order.get(index)?;
        self.get_message_by_key(key)
    }

    pub fn len(&self) -> usize {
        self.messages_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages_order.is_empty()
    }
}
