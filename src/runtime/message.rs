//! Per-message runtime state.
//!
//! Signals live in a **SlotMap** arena keyed by [`SignalKey`], iterated in schema
//! order and looked up by name. Same-named definitions are merged so a field is
//! represented once.

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::BitLayout;
use crate::runtime::listener::{ListenerHandle, Listeners};
use crate::runtime::signal::SignalRuntime;
use crate::types::{
    errors::{DatabaseError, LayoutError},
    message::Message,
    signal::{Signal, Signedness},
};

new_key_type! { pub struct SignalKey; }

/// Callback invoked after every signal of a received frame was decoded.
pub type MessageListener = dyn Fn(&MessageRuntime) + Send + Sync;

pub struct MessageRuntime {
    message: Message,
    mux_layout: Option<Result<BitLayout, LayoutError>>,

    // --- Signals (stable-key map + schema order) ---
    signals: SlotMap<SignalKey, SignalRuntime>,
    signals_order: Vec<SignalKey>,
    sig_key_by_name: HashMap<String, SignalKey>,

    on_receive: Mutex<Listeners<MessageListener>>,
}

impl MessageRuntime {
    pub fn new(message: &Message) -> Self {
        let mut merged: Vec<Signal> = Vec::with_capacity(message.signals.len());
        for sig in &message.signals {
            match merged.iter_mut().find(|s| s.name == sig.name) {
                Some(existing) => existing.merge(sig.clone()),
                None => merged.push(sig.clone()),
            }
        }

        let mut signals: SlotMap<SignalKey, SignalRuntime> = SlotMap::with_key();
        let mut signals_order: Vec<SignalKey> = Vec::with_capacity(merged.len());
        let mut sig_key_by_name: HashMap<String, SignalKey> = HashMap::with_capacity(merged.len());
        for sig in merged {
            let name: String = sig.name.clone();
            let key: SignalKey = signals.insert(SignalRuntime::new(sig));
            signals_order.push(key);
            sig_key_by_name.insert(name, key);
        }

        let mux_layout = message.mux.as_ref().filter(|_| message.muxed).map(|m| m.layout());

        MessageRuntime {
            message: message.clone(),
            mux_layout,
            signals,
            signals_order,
            sig_key_by_name,
            on_receive: Mutex::new(Listeners::default()),
        }
    }

    /// Schema record.
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn name(&self) -> &str {
        &self.message.name
    }

    /// Returns the signal called `name`.
    pub fn get_signal(&self, name: &str) -> Option<&SignalRuntime> {
        self.sig_key_by_name
            .get(name)
            .and_then(|k| self.signals.get(*k))
    }

    /// Signals in schema order.
    pub fn iter_signals(&self) -> impl Iterator<Item = &SignalRuntime> + '_ {
        self.signals_order.iter().filter_map(|k| self.signals.get(*k))
    }

    /// Registers a listener fired after a frame of this message was decoded.
    pub fn on_receive<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&MessageRuntime) + Send + Sync + 'static,
    {
        self.on_receive.lock().add(Arc::new(listener))
    }

    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.on_receive.lock().remove(handle)
    }

    /// Decodes a received payload into the signals, then notifies receive listeners.
    ///
    /// Short payloads are zero-padded to the declared length. In a multiplexed
    /// message only the signals of the received selector (and the
    /// selector-independent ones) are updated; the others keep their value.
    pub(crate) fn receive(&self, payload: &[u8]) {
        let length: usize = self.message.length as usize;
        let mut data: Vec<u8> = payload.to_vec();
        if data.len() < length {
            data.resize(length, 0);
        }

        let selector: Option<u64> = match &self.mux_layout {
            Some(Ok(layout)) => match layout.decode(&data, Signedness::Unsigned) {
                Ok(raw) => Some(raw as u64),
                Err(e) => {
                    tracing::warn!(message = %self.message.name, error = %e, "selector not decoded");
                    return;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(message = %self.message.name, error = %e, "selector has an invalid bit layout");
                return;
            }
            None => None,
        };

        for sig in self.iter_signals() {
            if let Some(sel) = selector
                && !sig.signal().is_active_for(sel)
            {
                continue;
            }
            sig.receive(&data);
        }

        let listeners: Vec<Arc<MessageListener>> = self.on_receive.lock().snapshot();
        for listener in listeners {
            listener(self);
        }
    }

    /// Builds a payload of `payload_len` bytes from the current signal values.
    ///
    /// With a selector, the selector field is written first and only the
    /// signals active for it are encoded. Signals without an assigned value
    /// keep their bits at zero.
    pub(crate) fn encode(&self, selector: Option<u64>, payload_len: usize) -> Result<Vec<u8>, DatabaseError> {
        let mut payload: Vec<u8> = vec![0u8; payload_len];

        if let (Some(sel), Some(mux_layout)) = (selector, &self.mux_layout) {
            let layout: &BitLayout = mux_layout.as_ref().map_err(Clone::clone)?;
            layout.encode(&mut payload, Signedness::Unsigned, sel as i128)?;
        }

        for sig in self.iter_signals() {
            if let Some(sel) = selector
                && !sig.signal().is_active_for(sel)
            {
                continue;
            }
            if !sig.encode_into(&mut payload)? {
                tracing::trace!(message = %self.message.name, signal = %sig.name(), "unassigned signal skipped");
            }
        }
        Ok(payload)
    }
}

impl std::fmt::Debug for MessageRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRuntime")
            .field("name", &self.message.name)
            .field("id", &self.message.id_hex())
            .field("signals", &self.signals_order.len())
            .finish()
    }
}
