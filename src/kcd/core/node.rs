use crate::kcd::core::attr;
use crate::kcd::xml::XmlNode;
use crate::types::{
    errors::KcdParseError,
    node::{J1939, Node},
};

/// Builds a [`Node`] from a `<Node>` element.
///
/// The J1939 identity is computed when at least one J1939 attribute is present;
/// missing fields count as zero.
pub(crate) fn decode(xml: &XmlNode) -> Result<Node, KcdParseError> {
    Ok(Node {
        id: attr::parse("Node", "id", &xml.id)?,
        name: xml.name.clone(),
        device: xml.device.clone().unwrap_or_default(),
        j1939: decode_j1939(xml)?,
        ..Default::default()
    })
}

fn decode_j1939(xml: &XmlNode) -> Result<Option<J1939>, KcdParseError> {
    let fields = [
        &xml.j1939_aac,
        &xml.j1939_function,
        &xml.j1939_vehicle,
        &xml.j1939_identity_number,
        &xml.j1939_industry_group,
        &xml.j1939_system,
        &xml.j1939_manufacturer_code,
    ];
    if fields.iter().all(|f| f.is_none()) {
        return Ok(None);
    }

    Ok(Some(J1939 {
        aac: attr::parse_opt("Node", "J1939AAC", xml.j1939_aac.as_deref())?.unwrap_or(0),
        function: attr::parse_opt("Node", "J1939Function", xml.j1939_function.as_deref())?
            .unwrap_or(0),
        vehicle: attr::parse_opt("Node", "J1939Vehicle", xml.j1939_vehicle.as_deref())?
            .unwrap_or(0),
        identity_number: attr::parse_opt(
            "Node",
            "J1939IdentityNumber",
            xml.j1939_identity_number.as_deref(),
        )?
        .unwrap_or(0),
        industry_group: attr::parse_opt(
            "Node",
            "J1939IndustryGroup",
            xml.j1939_industry_group.as_deref(),
        )?
        .unwrap_or(0),
        system: attr::parse_opt("Node", "J1939System", xml.j1939_system.as_deref())?.unwrap_or(0),
        manufacturer_code: attr::parse_opt(
            "Node",
            "J1939ManufacturerCode",
            xml.j1939_manufacturer_code.as_deref(),
        )?
        .unwrap_or(0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_node() {
        let xml = XmlNode {
            id: "12".into(),
            name: "Gateway".into(),
            ..Default::default()
        };
        let node: Node = decode(&xml).unwrap();
        assert_eq!(node.id, 12);
        assert_eq!(node.name, "Gateway");
        assert_eq!(node.device, "");
        assert!(node.j1939.is_none());
        assert!(node.buses.is_empty());
    }

    #[test]
    fn test_node_with_identity() {
        let xml = XmlNode {
            id: "1".into(),
            name: "Engine".into(),
            device: Some("ECU".into()),
            j1939_aac: Some("1".into()),
            j1939_identity_number: Some("74565".into()),
            ..Default::default()
        };
        let node: Node = decode(&xml).unwrap();
        let id: J1939 = node.j1939.unwrap();
        assert_eq!(id.aac, 1);
        assert_eq!(id.identity_number, 74565);
        assert_eq!(id.function, 0);
        assert_eq!(node.device, "ECU");
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let xml = XmlNode {
            id: "gateway".into(),
            name: "Gateway".into(),
            ..Default::default()
        };
        assert!(matches!(
            decode(&xml),
            Err(KcdParseError::InvalidAttribute { element: "Node", attribute: "id", .. })
        ));
    }
}
