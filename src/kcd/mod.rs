//! # kcd
//!
//! Loader for **KCD** network definitions (the Kayak XML format) into a
//! [`Network`]: nodes with their J1939 identity, buses, messages, multiplexors
//! and signals.
//!
//! Loading is all-or-nothing: the first malformed element aborts with a
//! [`KcdParseError`] and no partial network is returned.
//!

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::fs;

use crate::types::{bus::Bus, errors::KcdParseError, network::Network, node::Node};
use self::xml::XmlNetworkDefinition;

pub(crate) mod core;
pub(crate) mod xml;

const ROOT_ELEMENT: &str = "NetworkDefinition";

/// Loads a network definition from a `.kcd` file.
///
/// - `path`: Path to the file. Must end with `.kcd`.
pub fn from_file(path: &str) -> Result<Network, KcdParseError> {
    if !path.ends_with(".kcd") {
        return Err(KcdParseError::InvalidExtension {
            path: path.to_string(),
        });
    }

    let content: String = fs::read_to_string(path).map_err(|source| KcdParseError::OpenFile {
        path: path.to_string(),
        source,
    })?;
    from_str(&content)
}

/// Loads a network definition from KCD text.
///
/// ```
/// let xml = r#"<NetworkDefinition>
///   <Bus name="Motor">
///     <Message id="0x37F" name="CruiseControlStatus">
///       <Signal name="SpeedKm" offset="0" length="8"/>
///     </Message>
///   </Bus>
/// </NetworkDefinition>"#;
///
/// let net = can_kcd::kcd::from_str(xml).unwrap();
/// let msg = net.get_bus_by_name("Motor").unwrap().get_message_by_name("CruiseControlStatus").unwrap();
/// assert_eq!(msg.id, 0x37F);
/// assert_eq!(msg.length, 1);
/// ```
pub fn from_str(xml: &str) -> Result<Network, KcdParseError> {
    check_root(xml)?;
    let doc: XmlNetworkDefinition = quick_xml::de::from_str(xml)?;

    let mut nodes: BTreeMap<u32, Node> = BTreeMap::new();
    for xml_node in &doc.nodes {
        let node: Node = self::core::node::decode(xml_node)?;
        nodes.insert(node.id, node);
    }

    let mut buses: Vec<Bus> = Vec::with_capacity(doc.buses.len());
    for xml_bus in &doc.buses {
        let mut bus: Bus = Bus::new(&xml_bus.name);
        for xml_msg in &xml_bus.messages {
            let msg = self::core::message::decode(&mut nodes, &xml_bus.name, xml_msg)?;
            bus.add_message(msg);
        }
        tracing::debug!(bus = %bus.name, messages = bus.len(), "bus loaded");
        buses.push(bus);
    }

    Ok(Network { nodes, buses })
}

// The deserializer accepts any root name, so it is checked up front.
fn check_root(xml: &str) -> Result<(), KcdParseError> {
    let mut reader: Reader<&[u8]> = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(word) | Event::Empty(word) => {
                let name = word.local_name();
                let tag: &str = std::str::from_utf8(name.as_ref()).unwrap_or("");
                if tag == ROOT_ELEMENT {
                    return Ok(());
                }
                return Err(KcdParseError::UnexpectedRoot {
                    found: tag.to_string(),
                });
            }
            Event::Eof => {
                return Err(KcdParseError::UnexpectedRoot {
                    found: String::new(),
                });
            }
            // declaration, comments, doctype
            _ => {}
        }
    }
}
