use std::collections::BTreeMap;

use crate::kcd::core::attr;
use crate::kcd::xml::{XmlLabelSet, XmlSignal, XmlValue};
use crate::types::{
    errors::KcdParseError,
    node::NodeRef,
    signal::{Endianness, Signal, Signedness},
};

// Defaults of the optional <Signal> / <Value> attributes.
//
// | element  | attribute      | required | default    |
// |----------|----------------|----------|------------|
// | Signal   | name           | yes      |            |
// | Signal   | offset         | yes      |            |
// | Signal   | spn            | no       | none       |
// | Signal   | length         | no       | 1          |
// | Signal   | endianess      | no       | little     |
// | Value    | slope          | no       | 1.0        |
// | Value    | intercept      | no       | 0.0        |
// | Value    | unit           | no       | ""         |
// | Value    | type           | no       | unsigned   |
// | Value    | defaultValue   | no       | none       |
// | Value    | min / max      | no       | unbounded  |
pub(crate) const DEFAULT_BIT_LENGTH: u16 = 1;
pub(crate) const DEFAULT_ENDIANNESS: Endianness = Endianness::Little;
pub(crate) const DEFAULT_SLOPE: f64 = 1.0;
pub(crate) const DEFAULT_INTERCEPT: f64 = 0.0;
pub(crate) const DEFAULT_SIGNEDNESS: Signedness = Signedness::Unsigned;

/// Builds a [`Signal`] from a `<Signal>` element.
///
/// `mux_value` is the selector of the enclosing `<MuxGroup>`, if any.
pub(crate) fn decode(xml: &XmlSignal, mux_value: Option<u64>) -> Result<Signal, KcdParseError> {
    let mut sig: Signal = Signal {
        name: xml.name.clone(),
        spn: attr::parse_opt("Signal", "spn", xml.spn.as_deref())?,
        bit_offset: attr::parse("Signal", "offset", &xml.offset)?,
        bit_length: attr::parse_opt("Signal", "length", xml.length.as_deref())?
            .unwrap_or(DEFAULT_BIT_LENGTH),
        endian: decode_endianness(xml.endianess.as_deref())?,
        slope: DEFAULT_SLOPE,
        intercept: DEFAULT_INTERCEPT,
        sign: DEFAULT_SIGNEDNESS,
        ..Default::default()
    };

    if let Some(value) = &xml.value {
        decode_value(&mut sig, value)?;
    }

    if let Some(label_set) = &xml.label_set {
        sig.labels = decode_labels(label_set)?;
    }

    for consumer in &xml.consumers {
        for node_ref in &consumer.node_refs {
            let id: u32 = attr::parse("NodeRef", "id", &node_ref.id)?;
            if !sig.consumers.iter().any(|n| n.id == id) {
                sig.consumers.push(NodeRef { id });
            }
        }
    }

    if let Some(selector) = mux_value {
        sig.add_mux_value(selector);
    }

    Ok(sig)
}

fn decode_endianness(value: Option<&str>) -> Result<Endianness, KcdParseError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_ENDIANNESS),
        Some("little") => Ok(Endianness::Little),
        Some("big") => Ok(Endianness::Big),
        Some(other) => Err(attr::invalid("Signal", "endianess", other)),
    }
}

fn decode_value(sig: &mut Signal, value: &XmlValue) -> Result<(), KcdParseError> {
    sig.slope = attr::parse_opt("Value", "slope", value.slope.as_deref())?.unwrap_or(DEFAULT_SLOPE);
    sig.intercept =
        attr::parse_opt("Value", "intercept", value.intercept.as_deref())?.unwrap_or(DEFAULT_INTERCEPT);
    sig.unit = value.unit.clone().unwrap_or_default();
    sig.default_value = attr::parse_opt("Value", "defaultValue", value.default_value.as_deref())?;
    sig.min = attr::parse_opt("Value", "min", value.min.as_deref())?;
    sig.max = attr::parse_opt("Value", "max", value.max.as_deref())?;
    sig.sign = match value.kind.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_SIGNEDNESS,
        Some("unsigned") => Signedness::Unsigned,
        Some("signed") => Signedness::Signed,
        Some(other) => {
            tracing::warn!(
                signal = %sig.name,
                value_type = other,
                "unsupported value type, field is read as unsigned raw bits"
            );
            Signedness::Unsigned
        }
    };
    if sig.slope == 0.0 {
        return Err(attr::invalid("Value", "slope", value.slope.as_deref().unwrap_or("0")));
    }
    Ok(())
}

fn decode_labels(label_set: &XmlLabelSet) -> Result<BTreeMap<i64, String>, KcdParseError> {
    let mut labels: BTreeMap<i64, String> = BTreeMap::new();
    for label in &label_set.labels {
        let value: i64 = attr::parse("Label", "value", &label.value)?;
        labels.insert(value, label.name.clone());
    }
    Ok(labels)
}
