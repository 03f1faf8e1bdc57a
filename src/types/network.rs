use std::collections::BTreeMap;

use crate::types::{bus::Bus, node::Node};

/// In-memory representation of a KCD network definition.
///
/// Built once by the loader and read-only afterwards: nodes keyed by their
/// numeric id, buses in document order.
#[derive(Default, Clone, Debug)]
pub struct Network {
    /// Nodes keyed by declared id.
    pub nodes: BTreeMap<u32, Node>,
    /// Buses in document order.
    pub buses: Vec<Bus>,
}

impl Network {
    /// Returns the bus called `name`.
    pub fn get_bus_by_name(&self, name: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name == name)
    }

    pub fn get_node_by_id(&self, id: u32) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the first node called `name`.
    pub fn get_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Buses in document order.
    pub fn iter_buses(&self) -> impl Iterator<Item = &Bus> + '_ {
        self.buses.iter()
    }
}
