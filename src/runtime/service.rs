//! Bus-level signal database.
//!
//! A [`DatabaseService`] is created once per bus. It subscribes to a
//! [`Transport`], decodes every known frame into its [`SignalRuntime`]s and
//! encodes the current signal values back into frames on [`send`](DatabaseService::send).

use slotmap::SlotMap;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::runtime::listener::ListenerHandle;
use crate::runtime::message::MessageRuntime;
use crate::runtime::signal::SignalRuntime;
use crate::runtime::transport::Transport;
use crate::types::{
    bus::{Bus, MessageKey},
    canframe::{CAN_MAX_DLEN, CanFrame, frame_key},
    errors::DatabaseError,
};

pub struct DatabaseService<T: Transport> {
    transport: Arc<T>,
    bus_name: String,

    // --- Main storage (stable-key map) ---
    messages: SlotMap<MessageKey, MessageRuntime>,

    // --- Order "view" (schema order) ---
    messages_order: Vec<MessageKey>,

    // --- Lookups ---
    msg_key_by_id: HashMap<u32, MessageKey>, // id | ext << 31 → MessageKey
    msg_key_by_name: HashMap<String, MessageKey>,

    subscription: ListenerHandle,
}

impl<T: Transport + 'static> DatabaseService<T> {
    /// Builds the runtime for every message of `bus` and subscribes to `transport`.
    ///
    /// The transport only keeps a weak reference: dropping the last `Arc` of the
    /// service unsubscribes it.
    pub fn new(transport: Arc<T>, bus: &Bus) -> Arc<Self> {
        let mut messages: SlotMap<MessageKey, MessageRuntime> = SlotMap::with_key();
        let mut messages_order: Vec<MessageKey> = Vec::with_capacity(bus.len());
        let mut msg_key_by_id: HashMap<u32, MessageKey> = HashMap::with_capacity(bus.len());
        let mut msg_key_by_name: HashMap<String, MessageKey> = HashMap::with_capacity(bus.len());

        for msg in bus.iter_messages() {
            let key: MessageKey = messages.insert(MessageRuntime::new(msg));
            messages_order.push(key);
            msg_key_by_id.insert(msg.key(), key);
            msg_key_by_name.insert(msg.name.clone(), key);
        }

        tracing::debug!(bus = %bus.name, messages = messages_order.len(), "database service created");

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak: Weak<Self> = weak.clone();
            let subscription: ListenerHandle = transport.add_listener(Arc::new(move |frame: &CanFrame| {
                if let Some(service) = weak.upgrade() {
                    service.on_message(frame);
                }
            }));

            DatabaseService {
                transport,
                bus_name: bus.name.clone(),
                messages,
                messages_order,
                msg_key_by_id,
                msg_key_by_name,
                subscription,
            }
        })
    }
}

impl<T: Transport> DatabaseService<T> {
    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the message called `name`.
    pub fn get_message(&self, name: &str) -> Option<&MessageRuntime> {
        self.msg_key_by_name
            .get(name)
            .and_then(|k| self.messages.get(*k))
    }

    /// Returns the message with arbitration id `id` in the given format.
    pub fn get_message_by_id(&self, id: u32, extended: bool) -> Option<&MessageRuntime> {
        self.msg_key_by_id
            .get(&frame_key(id, extended))
            .and_then(|k| self.messages.get(*k))
    }

    /// Returns signal `signal` of message `message`.
    pub fn get_signal(&self, message: &str, signal: &str) -> Option<&SignalRuntime> {
        self.get_message(message).and_then(|m| m.get_signal(signal))
    }

    /// Messages in schema order.
    pub fn iter_messages(&self) -> impl Iterator<Item = &MessageRuntime> + '_ {
        self.messages_order.iter().filter_map(|k| self.messages.get(*k))
    }

    /// Decodes a received frame into the signals of its message.
    ///
    /// Remote requests and frames of unknown messages are ignored.
    pub fn on_message(&self, frame: &CanFrame) {
        if frame.remote_request {
            tracing::trace!(id = frame.id, "remote request ignored");
            return;
        }

        let Some(msg) = self.msg_key_by_id.get(&frame.key()).and_then(|k| self.messages.get(*k)) else {
            tracing::debug!(
                bus = %self.bus_name,
                id = frame.id,
                extended = frame.extended,
                "frame of unknown message dropped"
            );
            return;
        };

        msg.receive(&frame.payload);
    }

    /// Sets the value of a signal, as [`SignalRuntime::update`]. Returns whether it changed.
    pub fn set_signal(&self, message: &str, signal: &str, value: f64) -> Result<bool, DatabaseError> {
        let msg: &MessageRuntime = self.lookup(message)?;
        let sig: &SignalRuntime = msg
            .get_signal(signal)
            .ok_or_else(|| DatabaseError::SignalNotDefined {
                message: message.to_string(),
                signal: signal.to_string(),
            })?;
        Ok(sig.update(value))
    }

    /// Encodes the current signal values of a message into a frame without sending it.
    ///
    /// `name` is either `Message` or `Message.selector`, the selector in
    /// hexadecimal (`OBD2.0C`, `OBD2.0x0C`). Returns `None` for a message
    /// declared with a length of zero.
    pub fn build_frame(&self, name: &str) -> Result<Option<CanFrame>, DatabaseError> {
        let (msg_name, selector) = split_name(name)?;
        let msg: &MessageRuntime = self.lookup(msg_name)?;
        let schema = msg.message();

        if schema.length == 0 {
            return Ok(None);
        }

        let max_len: usize = self.transport.max_payload_len();
        let payload_len: usize = (schema.length as usize).min(max_len);
        let payload: Vec<u8> = msg.encode(selector, payload_len)?;

        Ok(Some(CanFrame::new(schema.id, schema.is_extended(), payload)))
    }

    /// Encodes the current signal values of a message and transmits the frame.
    ///
    /// See [`build_frame`](Self::build_frame) for the name format. Payloads above
    /// the classic 8 bytes go through [`Transport::send_fd`].
    pub fn send(&self, name: &str) -> Result<(), DatabaseError> {
        let Some(frame) = self.build_frame(name)? else {
            tracing::debug!(message = name, "zero-length message not sent");
            return Ok(());
        };

        tracing::trace!(id = frame.id, data = %frame.data_hex(), "sending frame");
        if frame.payload.len() > CAN_MAX_DLEN {
            self.transport.send_fd(&frame)?;
        } else {
            self.transport.send(&frame)?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&MessageRuntime, DatabaseError> {
        self.get_message(name)
            .ok_or_else(|| DatabaseError::MessageNotDefined { name: name.to_string() })
    }
}

impl<T: Transport> Drop for DatabaseService<T> {
    fn drop(&mut self) {
        self.transport.remove_listener(self.subscription);
    }
}

impl<T: Transport> std::fmt::Debug for DatabaseService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("bus", &self.bus_name)
            .field("messages", &self.messages_order.len())
            .finish()
    }
}

/// Splits `Message.selector` into the message name and the hexadecimal selector.
fn split_name(name: &str) -> Result<(&str, Option<u64>), DatabaseError> {
    let Some((msg_name, selector)) = name.split_once('.') else {
        return Ok((name, None));
    };

    let trimmed: &str = selector.trim();
    let digits: &str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let value: u64 = u64::from_str_radix(digits, 16).map_err(|_| DatabaseError::InvalidSelector {
        message: msg_name.to_string(),
        selector: selector.to_string(),
    })?;
    Ok((msg_name, Some(value)))
}
