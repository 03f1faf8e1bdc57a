use std::collections::BTreeMap;

use crate::kcd::core::{attr, signal};
use crate::kcd::xml::{XmlMessage, XmlMultiplex};
use crate::types::{
    errors::KcdParseError,
    message::{IdFormat, Message, Mux},
    node::{Node, NodeRef, SignalRef},
    signal::Signal,
};

/// Default length of a `<Multiplex>` selector.
pub(crate) const DEFAULT_MUX_BIT_LENGTH: u16 = 1;

/// Builds a [`Message`] from a `<Message>` element of bus `bus_name`.
///
/// Producer and consumer relations are recorded on `nodes` as a side effect;
/// references to undeclared nodes are kept on the message/signal only.
pub(crate) fn decode(
    nodes: &mut BTreeMap<u32, Node>,
    bus_name: &str,
    xml: &XmlMessage,
) -> Result<Message, KcdParseError> {
    let id_format: IdFormat = match xml.format.as_deref().map(str::trim) {
        Some("extended") => IdFormat::Extended,
        _ => IdFormat::Standard,
    };
    let mut msg: Message = Message::new(&xml.name, attr::parse_hex("Message", "id", &xml.id)?, id_format);

    // "auto" or absent: derived from the signals below
    msg.length = match xml.length.as_deref().map(str::trim) {
        None | Some("") | Some("auto") => 0,
        Some(v) => attr::parse("Message", "length", v)?,
    };
    msg.interval = attr::parse_opt("Message", "interval", xml.interval.as_deref())?.unwrap_or(0);
    msg.triggered = xml.triggered.as_deref().map(str::trim) == Some("true");

    // Producers
    for producer in &xml.producers {
        for node_ref in &producer.node_refs {
            let id: u32 = attr::parse("NodeRef", "id", &node_ref.id)?;
            if !msg.producers.iter().any(|n| n.id == id) {
                msg.producers.push(NodeRef { id });
            }
            if let Some(node) = nodes.get_mut(&id) {
                node.bus_refs_mut(bus_name).produces.push(msg.id);
            }
        }
    }

    // Running end bit of every parsed signal definition
    let mut max_end: usize = 0;

    // Only the first <Multiplex> is modeled
    if let Some(multiplex) = xml.multiplex.first() {
        if xml.multiplex.len() > 1 {
            tracing::warn!(
                message = %msg.name,
                count = xml.multiplex.len(),
                "only the first multiplexor of a message is supported"
            );
        }
        max_end = decode_multiplex(nodes, bus_name, &mut msg, multiplex)?;
    }

    for xml_sig in &xml.signals {
        let sig: Signal = signal::decode(xml_sig, None)?;
        max_end = max_end.max(sig.end_bit());
        add_consumed_signal(nodes, bus_name, &mut msg, sig);
    }

    // every <Signal> counts, including definitions merged away above
    if msg.length == 0 {
        let mux_end: usize = msg.mux.as_ref().map(Mux::end_bit).unwrap_or(0);
        msg.length = max_end.max(mux_end).div_ceil(8) as u16;
    }

    msg.check_layout()
        .map_err(|(signal, source)| KcdParseError::Layout {
            message: msg.name.clone(),
            signal,
            source,
        })?;

    Ok(msg)
}

/// Loads the selector and its groups; returns the largest end bit of the group signals.
fn decode_multiplex(
    nodes: &mut BTreeMap<u32, Node>,
    bus_name: &str,
    msg: &mut Message,
    xml: &XmlMultiplex,
) -> Result<usize, KcdParseError> {
    msg.muxed = true;
    msg.mux = Some(Mux {
        name: xml.name.clone(),
        bit_offset: attr::parse("Multiplex", "offset", &xml.offset)?,
        bit_length: attr::parse_opt("Multiplex", "length", xml.length.as_deref())?
            .unwrap_or(DEFAULT_MUX_BIT_LENGTH),
    });

    let mut max_end: usize = 0;
    for group in &xml.groups {
        let selector: u64 = attr::parse("MuxGroup", "count", &group.count)?;
        for xml_sig in &group.signals {
            let sig: Signal = signal::decode(xml_sig, Some(selector))?;
            max_end = max_end.max(sig.end_bit());
            add_consumed_signal(nodes, bus_name, msg, sig);
        }
    }
    Ok(max_end)
}

/// Records the signal's consumers on their nodes, then adds it to the message.
fn add_consumed_signal(nodes: &mut BTreeMap<u32, Node>, bus_name: &str, msg: &mut Message, sig: Signal) {
    for consumer in &sig.consumers {
        if let Some(node) = nodes.get_mut(&consumer.id) {
            let consumes: &mut Vec<SignalRef> = &mut node.bus_refs_mut(bus_name).consumes;
            if !consumes.iter().any(|r| r.id == msg.id && r.signal_name == sig.name) {
                consumes.push(SignalRef {
                    id: msg.id,
                    signal_name: sig.name.clone(),
                });
            }
        }
    }
    msg.add_signal(sig);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kcd::xml::{XmlMuxGroup, XmlNodeRef, XmlNodeRefs, XmlSignal};
    use crate::types::errors::LayoutError;

    fn xml_signal(name: &str, offset: &str, length: &str) -> XmlSignal {
        XmlSignal {
            name: name.into(),
            offset: offset.into(),
            length: Some(length.into()),
            ..Default::default()
        }
    }

    fn node_refs(ids: &[&str]) -> Vec<XmlNodeRefs> {
        vec![XmlNodeRefs {
            node_refs: ids.iter().map(|id| XmlNodeRef { id: id.to_string() }).collect(),
        }]
    }

    fn nodes() -> BTreeMap<u32, Node> {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            1,
            Node {
                id: 1,
                name: "Motor".into(),
                ..Default::default()
            },
        );
        nodes.insert(
            12,
            Node {
                id: 12,
                name: "Gateway".into(),
                ..Default::default()
            },
        );
        nodes
    }

    #[test]
    fn test_plain_message() {
        let mut consumed = xml_signal("SpeedKm", "0", "8");
        consumed.consumers = node_refs(&["12", "99"]);
        let xml = XmlMessage {
            id: "0x37F".into(),
            name: "CruiseControlStatus".into(),
            interval: Some("100".into()),
            triggered: Some("true".into()),
            producers: node_refs(&["1"]),
            signals: vec![consumed, xml_signal("Active", "8", "1")],
            ..Default::default()
        };

        let mut nodes = nodes();
        let msg: Message = decode(&mut nodes, "Motor", &xml).unwrap();
        assert_eq!(msg.id, 895);
        assert!(!msg.is_extended());
        assert_eq!(msg.length, 2);
        assert_eq!(msg.interval, 100);
        assert!(msg.triggered);
        assert!(!msg.muxed);
        assert_eq!(msg.producers, vec![NodeRef { id: 1 }]);
        assert_eq!(msg.signals.len(), 2);

        assert_eq!(nodes[&1].bus_refs("Motor").unwrap().produces, vec![895]);
        let consumes = &nodes[&12].bus_refs("Motor").unwrap().consumes;
        assert_eq!(consumes.len(), 1);
        assert_eq!(consumes[0].id, 895);
        assert_eq!(consumes[0].signal_name, "SpeedKm");
        // undeclared node 99 only lives on the signal
        assert_eq!(msg.signals[0].consumers.len(), 2);
    }

    #[test]
    fn test_multiplexed_message() {
        let group = |count: &str, sigs: Vec<XmlSignal>| XmlMuxGroup {
            count: count.into(),
            signals: sigs,
        };
        let xml = XmlMessage {
            id: "7E8".into(),
            name: "OBD2".into(),
            format: Some("extended".into()),
            length: Some("8".into()),
            multiplex: vec![
                XmlMultiplex {
                    name: "PID".into(),
                    offset: "0".into(),
                    length: Some("8".into()),
                    groups: vec![
                        group("0", vec![xml_signal("Data", "8", "8")]),
                        group("8", vec![xml_signal("Data", "8", "8"), xml_signal("Rpm", "16", "16")]),
                    ],
                },
                XmlMultiplex {
                    name: "Ignored".into(),
                    offset: "56".into(),
                    length: Some("8".into()),
                    groups: vec![group("1", vec![xml_signal("Never", "40", "8")])],
                },
            ],
            signals: vec![xml_signal("Counter", "48", "4")],
            ..Default::default()
        };

        let mut nodes = nodes();
        let msg: Message = decode(&mut nodes, "OBD2", &xml).unwrap();
        assert!(msg.muxed);
        assert!(msg.is_extended());
        assert_eq!(
            msg.mux,
            Some(Mux {
                name: "PID".into(),
                bit_offset: 0,
                bit_length: 8
            })
        );
        let names: Vec<&str> = msg.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Data", "Rpm", "Counter"]);
        assert_eq!(msg.get_signal_by_name("Data").unwrap().mux_group, vec![0, 8]);
        assert_eq!(msg.get_signal_by_name("Rpm").unwrap().mux_group, vec![8]);
        assert!(msg.get_signal_by_name("Counter").unwrap().mux_group.is_empty());
    }

    #[test]
    fn test_derived_length_counts_every_definition() {
        let group = |count: &str, sig: XmlSignal| XmlMuxGroup {
            count: count.into(),
            signals: vec![sig],
        };
        let xml = XmlMessage {
            id: "0x100".into(),
            name: "Muxed".into(),
            multiplex: vec![XmlMultiplex {
                name: "Sel".into(),
                offset: "0".into(),
                length: Some("8".into()),
                groups: vec![
                    group("0", xml_signal("Data", "8", "8")),
                    group("1", xml_signal("Data", "40", "16")),
                ],
            }],
            ..Default::default()
        };

        let msg: Message = decode(&mut nodes(), "Body", &xml).unwrap();
        assert_eq!(msg.length, 7);
        // merged: the first placement is kept, both selectors map to it
        let data = msg.get_signal_by_name("Data").unwrap();
        assert_eq!((data.bit_offset, data.bit_length), (8, 8));
        assert_eq!(data.mux_group, vec![0, 1]);
    }

    #[test]
    fn test_declared_length_too_short() {
        let xml = XmlMessage {
            id: "10".into(),
            name: "Short".into(),
            length: Some("1".into()),
            signals: vec![xml_signal("Wide", "4", "8")],
            ..Default::default()
        };
        let err = decode(&mut nodes(), "Motor", &xml).unwrap_err();
        match err {
            KcdParseError::Layout { message, signal, source } => {
                assert_eq!(message, "Short");
                assert_eq!(signal, "Wide");
                assert_eq!(source, LayoutError::OutOfBounds { end_bit: 12, capacity_bits: 8 });
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_auto_length_and_invalid_id() {
        let mut xml = XmlMessage {
            id: "1".into(),
            name: "Auto".into(),
            length: Some("auto".into()),
            signals: vec![xml_signal("A", "0", "9")],
            ..Default::default()
        };
        assert_eq!(decode(&mut nodes(), "Motor", &xml).unwrap().length, 2);

        xml.id = "0xG1".into();
        assert!(matches!(
            decode(&mut nodes(), "Motor", &xml),
            Err(KcdParseError::InvalidAttribute { attribute: "id", .. })
        ));
    }
}
