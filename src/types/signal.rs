use crate::codec::BitLayout;
use crate::types::{errors::LayoutError, node::NodeRef};
use std::collections::BTreeMap;

/// Definition of a signal within a CAN message (KCD).
///
/// Describes position/bit-length, bit ordering, sign, scaling (slope/intercept),
/// valid range, unit of measure, label set and consumer nodes.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Signal {
    /// Signal name.
    pub name: String,
    /// Optional numeric identifier (J1939 SPN).
    pub spn: Option<u32>,
    /// Bit offset in the payload; see [`Endianness`] for the numbering.
    pub bit_offset: u16,
    /// Bit length.
    pub bit_length: u16,
    /// Bit ordering.
    pub endian: Endianness,
    /// Sign.
    pub sign: Signedness,
    /// Scaling factor (`physical = raw * slope + intercept`).
    pub slope: f64,
    /// Scaling offset.
    pub intercept: f64,
    /// Unit of measure.
    pub unit: String,
    /// Value the runtime starts from, when the schema declares one.
    pub default_value: Option<f64>,
    /// Minimum physical value.
    pub min: Option<f64>,
    /// Maximum physical value.
    pub max: Option<f64>,
    /// Raw value to label mapping.
    pub labels: BTreeMap<i64, String>,
    /// Nodes reading this signal.
    pub consumers: Vec<NodeRef>,
    /// Multiplexor selector values for which this field is valid.
    /// Empty when the field does not depend on the selector.
    pub mux_group: Vec<u64>,
}

impl Signal {
    /// Builds an unsigned little-endian signal with unit scaling.
    pub fn new(name: &str, bit_offset: u16, bit_length: u16) -> Self {
        Signal {
            name: name.to_string(),
            bit_offset,
            bit_length,
            slope: 1.0,
            ..Default::default()
        }
    }

    /// `true` if the field is present for the given selector value.
    ///
    /// Selector-independent signals (empty `mux_group`) are always active.
    #[inline]
    pub fn is_active_for(&self, selector: u64) -> bool {
        self.mux_group.is_empty() || self.mux_group.contains(&selector)
    }

    /// Adds a selector value to `mux_group`. No duplicates.
    pub fn add_mux_value(&mut self, selector: u64) {
        if !self.mux_group.contains(&selector) {
            self.mux_group.push(selector);
        }
    }

    /// Merges another definition of the same named field: its selector
    /// values and consumers are added, geometry and scaling are kept.
    pub fn merge(&mut self, other: Signal) {
        for value in other.mux_group {
            self.add_mux_value(value);
        }
        for node in other.consumers {
            if !self.consumers.contains(&node) {
                self.consumers.push(node);
            }
        }
    }

    /// One past the last bit this field occupies.
    #[inline]
    pub fn end_bit(&self) -> usize {
        self.bit_offset as usize + self.bit_length as usize
    }

    /// Compiles the extraction layout for this signal.
    pub fn layout(&self) -> Result<BitLayout, LayoutError> {
        BitLayout::compile(self.bit_offset, self.bit_length, self.endian)
    }

    /// Converts a raw field value to physical units.
    #[inline]
    pub fn to_physical(&self, raw: i128) -> f64 {
        raw as f64 * self.slope + self.intercept
    }

    /// Converts a physical value back to the nearest raw integer.
    #[inline]
    pub fn to_raw(&self, value: f64) -> i128 {
        ((value - self.intercept) / self.slope).round() as i128
    }

    /// `true` when `value` lies outside the declared `[min, max]` bounds.
    pub fn is_out_of_bounds(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }

    /// Label attached to a raw value, if any.
    pub fn label_for(&self, raw: i64) -> Option<&str> {
        self.labels.get(&raw).map(String::as_str)
    }
}

/// Bit ordering of a field.
///
/// - `Little` (Intel): bit 0 is the LSB of byte 0 and numbering grows across
///   bytes; the offset names the field's least-significant bit.
/// - `Big` (Motorola): bit 0 is the MSB of byte 0, bit 7 its LSB, bit 8 the MSB
///   of byte 1; the offset names the field's most-significant bit.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    pub fn to_str(&self) -> &'static str {
        match self {
            Endianness::Little => "little",
            Endianness::Big => "big",
        }
    }
}

#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Signedness {
    #[default]
    Unsigned,
    Signed,
}

impl Signedness {
    #[inline]
    pub fn is_signed(&self) -> bool {
        matches!(self, Signedness::Signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_signal() -> Signal {
        Signal {
            name: "Temperature".into(),
            bit_offset: 8,
            bit_length: 8,
            slope: 0.5,
            intercept: -40.0,
            unit: "degC".into(),
            min: Some(-40.0),
            max: Some(87.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_scaling() {
        let sig: Signal = build_test_signal();
        assert_eq!(sig.to_physical(100), 10.0);
        assert_eq!(sig.to_raw(10.0), 100);
        // 10.2 is not representable with slope 0.5: nearest raw wins
        assert_eq!(sig.to_raw(10.2), 100);
        assert_eq!(sig.to_raw(10.3), 101);
    }

    #[test]
    fn test_bounds() {
        let sig: Signal = build_test_signal();
        assert!(!sig.is_out_of_bounds(0.0));
        assert!(sig.is_out_of_bounds(-41.0));
        assert!(sig.is_out_of_bounds(90.0));
        assert!(!Signal::new("Free", 0, 8).is_out_of_bounds(1e9));
    }

    #[test]
    fn test_mux_group_membership() {
        let mut sig: Signal = Signal::new("PID", 8, 8);
        assert!(sig.is_active_for(0));
        assert!(sig.is_active_for(42));

        sig.add_mux_value(1);
        sig.add_mux_value(1);
        assert_eq!(sig.mux_group, vec![1]);
        assert!(sig.is_active_for(1));
        assert!(!sig.is_active_for(2));
    }

    #[test]
    fn test_merge_accumulates_selectors() {
        let mut a: Signal = Signal::new("Data", 16, 8);
        a.add_mux_value(0);
        let mut b: Signal = Signal::new("Data", 24, 8);
        b.add_mux_value(8);
        b.consumers.push(NodeRef { id: 3 });

        a.merge(b);
        assert_eq!(a.mux_group, vec![0, 8]);
        assert_eq!(a.bit_offset, 16);
        assert_eq!(a.consumers, vec![NodeRef { id: 3 }]);
    }
}
