//! Typed view of a KCD document.
//!
//! Mirrors the element/attribute shape of the format one-to-one. Attributes are
//! kept as text; conversion and defaults happen in [`crate::kcd::core`]. Elements
//! that are not modeled (`Document`, `Notes`, `LabelGroup`, ...) are skipped.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlNetworkDefinition {
    #[serde(rename = "Node", default)]
    pub(crate) nodes: Vec<XmlNode>,
    #[serde(rename = "Bus", default)]
    pub(crate) buses: Vec<XmlBus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlNode {
    #[serde(rename = "@id")]
    pub(crate) id: String,
    #[serde(rename = "@name")]
    pub(crate) name: String,
    #[serde(rename = "@device", default)]
    pub(crate) device: Option<String>,
    #[serde(rename = "@J1939AAC", default)]
    pub(crate) j1939_aac: Option<String>,
    #[serde(rename = "@J1939Function", default)]
    pub(crate) j1939_function: Option<String>,
    #[serde(rename = "@J1939Vehicle", default)]
    pub(crate) j1939_vehicle: Option<String>,
    #[serde(rename = "@J1939IdentityNumber", default)]
    pub(crate) j1939_identity_number: Option<String>,
    #[serde(rename = "@J1939IndustryGroup", default)]
    pub(crate) j1939_industry_group: Option<String>,
    #[serde(rename = "@J1939System", default)]
    pub(crate) j1939_system: Option<String>,
    #[serde(rename = "@J1939ManufacturerCode", default)]
    pub(crate) j1939_manufacturer_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlBus {
    #[serde(rename = "@name")]
    pub(crate) name: String,
    #[serde(rename = "Message", default)]
    pub(crate) messages: Vec<XmlMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlMessage {
    #[serde(rename = "@id")]
    pub(crate) id: String,
    #[serde(rename = "@name")]
    pub(crate) name: String,
    #[serde(rename = "@format", default)]
    pub(crate) format: Option<String>,
    #[serde(rename = "@length", default)]
    pub(crate) length: Option<String>,
    #[serde(rename = "@interval", default)]
    pub(crate) interval: Option<String>,
    #[serde(rename = "@triggered", default)]
    pub(crate) triggered: Option<String>,
    #[serde(rename = "Producer", default)]
    pub(crate) producers: Vec<XmlNodeRefs>,
    #[serde(rename = "Multiplex", default)]
    pub(crate) multiplex: Vec<XmlMultiplex>,
    #[serde(rename = "Signal", default)]
    pub(crate) signals: Vec<XmlSignal>,
}

/// `Producer` and `Consumer` share the same shape.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlNodeRefs {
    #[serde(rename = "NodeRef", default)]
    pub(crate) node_refs: Vec<XmlNodeRef>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlNodeRef {
    #[serde(rename = "@id")]
    pub(crate) id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlMultiplex {
    #[serde(rename = "@name")]
    pub(crate) name: String,
    #[serde(rename = "@offset")]
    pub(crate) offset: String,
    #[serde(rename = "@length", default)]
    pub(crate) length: Option<String>,
    #[serde(rename = "MuxGroup", default)]
    pub(crate) groups: Vec<XmlMuxGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlMuxGroup {
    #[serde(rename = "@count")]
    pub(crate) count: String,
    #[serde(rename = "Signal", default)]
    pub(crate) signals: Vec<XmlSignal>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlSignal {
    #[serde(rename = "@name")]
    pub(crate) name: String,
    #[serde(rename = "@spn", default)]
    pub(crate) spn: Option<String>,
    #[serde(rename = "@offset")]
    pub(crate) offset: String,
    #[serde(rename = "@length", default)]
    pub(crate) length: Option<String>,
    #[serde(rename = "@endianess", default)]
    pub(crate) endianess: Option<String>,
    #[serde(rename = "Value", default)]
    pub(crate) value: Option<XmlValue>,
    #[serde(rename = "LabelSet", default)]
    pub(crate) label_set: Option<XmlLabelSet>,
    #[serde(rename = "Consumer", default)]
    pub(crate) consumers: Vec<XmlNodeRefs>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlValue {
    #[serde(rename = "@slope", default)]
    pub(crate) slope: Option<String>,
    #[serde(rename = "@intercept", default)]
    pub(crate) intercept: Option<String>,
    #[serde(rename = "@unit", default)]
    pub(crate) unit: Option<String>,
    #[serde(rename = "@min", default)]
    pub(crate) min: Option<String>,
    #[serde(rename = "@max", default)]
    pub(crate) max: Option<String>,
    #[serde(rename = "@type", default)]
    pub(crate) kind: Option<String>,
    #[serde(rename = "@defaultValue", default)]
    pub(crate) default_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlLabelSet {
    #[serde(rename = "Label", default)]
    pub(crate) labels: Vec<XmlLabel>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlLabel {
    #[serde(rename = "@value")]
    pub(crate) value: String,
    #[serde(rename = "@name")]
    pub(crate) name: String,
}
