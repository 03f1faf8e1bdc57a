use crate::codec::BitLayout;
use crate::types::{
    canframe::frame_key,
    errors::LayoutError,
    node::NodeRef,
    signal::{Endianness, Signal},
};

/// CAN message defined in the network description.
///
/// Maintains the arbitration id (`id`), its format, the `name`, payload length
/// (`length`), timing metadata, the producing nodes and the composing signals.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Message {
    /// ID Format (Standard or Extended)
    pub id_format: IdFormat,
    /// Arbitration id.
    pub id: u32,
    /// Message name.
    pub name: String,
    /// Payload length in bytes.
    pub length: u16,
    /// Generation interval in milliseconds (`0` when not cyclic).
    pub interval: u32,
    /// Sent on event rather than (or on top of) the interval.
    pub triggered: bool,
    /// `true` when the layout depends on a multiplexor selector.
    pub muxed: bool,
    /// Selector field, when `muxed`.
    pub mux: Option<Mux>,
    /// Transmitting nodes.
    pub producers: Vec<NodeRef>,
    /// Signals that belong to this message, in schema order.
    pub signals: Vec<Signal>,
}

impl Message {
    pub fn new(name: &str, id: u32, id_format: IdFormat) -> Self {
        Message {
            id_format,
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_extended(&self) -> bool {
        matches!(self.id_format, IdFormat::Extended)
    }

    /// Lookup key with the extended flag folded into bit 31.
    #[inline]
    pub fn key(&self) -> u32 {
        frame_key(self.id, self.is_extended())
    }

    /// Normalized hexadecimal id (`"0x..."`, uppercase).
    pub fn id_hex(&self) -> String {
        format!("0x{:X}", self.id)
    }

    /// Returns the signal called `name`.
    pub fn get_signal_by_name(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Appends a signal, merging it into an existing one with the same name.
    pub fn add_signal(&mut self, signal: Signal) {
        match self.signals.iter_mut().find(|s| s.name == signal.name) {
            Some(existing) => existing.merge(signal),
            None => self.signals.push(signal),
        }
    }

    /// One past the last bit used by any signal or by the selector.
    pub fn max_end_bit(&self) -> usize {
        let sig_end: usize = self.signals.iter().map(Signal::end_bit).max().unwrap_or(0);
        let mux_end: usize = self.mux.as_ref().map(Mux::end_bit).unwrap_or(0);
        sig_end.max(mux_end)
    }

    /// Verifies that every field fits `length` bytes.
    ///
    /// On failure returns the name of the offending field with the reason.
    pub fn check_layout(&self) -> Result<(), (String, LayoutError)> {
        let capacity_bits: usize = self.length as usize * 8;
        if let Some(mux) = &self.mux {
            mux.layout()
                .and_then(|l| l.check_fits(capacity_bits))
                .map_err(|e| (mux.name.clone(), e))?;
        }
        for sig in &self.signals {
            sig.layout()
                .and_then(|l| l.check_fits(capacity_bits))
                .map_err(|e| (sig.name.clone(), e))?;
        }
        Ok(())
    }
}

#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum IdFormat {
    #[default]
    Standard,
    Extended,
}

impl IdFormat {
    pub fn to_str(&self) -> &'static str {
        match self {
            IdFormat::Standard => "Standard",
            IdFormat::Extended => "Extended",
        }
    }
}

/// Multiplexor selector field of a message.
///
/// The selector is always read as an unsigned little-endian field.
#[derive(Default, Clone, PartialEq, Eq, Debug)]
pub struct Mux {
    /// Selector name.
    pub name: String,
    /// Bit offset of the selector.
    pub bit_offset: u16,
    /// Bit length of the selector.
    pub bit_length: u16,
}

impl Mux {
    pub fn end_bit(&self) -> usize {
        self.bit_offset as usize + self.bit_length as usize
    }

    pub fn layout(&self) -> Result<BitLayout, LayoutError> {
        BitLayout::compile(self.bit_offset, self.bit_length, Endianness::Little)
    }
}
