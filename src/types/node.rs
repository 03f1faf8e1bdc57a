use std::collections::BTreeMap;

/// Node/ECU defined in the network description.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Node {
    /// Numeric node id, unique within the network.
    pub id: u32,
    /// Node/ECU name.
    pub name: String,
    /// Free-form device description.
    pub device: String,
    /// J1939 address-claim fields, when declared.
    pub j1939: Option<J1939>,
    /// Produced messages and consumed signals, per bus name.
    pub buses: BTreeMap<String, BusRefs>,
}

impl Node {
    /// Relations of this node on `bus`, created on first use.
    pub fn bus_refs_mut(&mut self, bus: &str) -> &mut BusRefs {
        self.buses.entry(bus.to_string()).or_default()
    }

    /// Relations of this node on `bus`.
    pub fn bus_refs(&self, bus: &str) -> Option<&BusRefs> {
        self.buses.get(bus)
    }
}

/// What a node emits and reads on a single bus.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct BusRefs {
    /// Ids of the messages produced by the node.
    pub produces: Vec<u32>,
    /// Signals consumed by the node.
    pub consumes: Vec<SignalRef>,
}

/// A consumed signal: message id plus signal name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SignalRef {
    pub id: u32,
    pub signal_name: String,
}

/// Reference to a [`Node`] by id, as found under `Producer`/`Consumer`.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeRef {
    pub id: u32,
}

/// J1939 address-claim fields of a node.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub struct J1939 {
    /// Arbitrary address capable.
    pub aac: u8,
    pub function: u8,
    pub vehicle: u8,
    pub identity_number: u32,
    pub industry_group: u8,
    pub system: u8,
    pub manufacturer_code: u16,
}

impl J1939 {
    /// 64 bit NAME as transmitted in the address claim (byte 0 first).
    ///
    /// Function instance and ECU instance are always zero.
    pub fn name_bytes(&self) -> [u8; 8] {
        let mut name = [0u8; 8];
        name[7] = ((self.aac & 0x1) << 7) | ((self.industry_group & 0x7) << 4) | (self.vehicle & 0xF);
        name[6] = (self.system << 1) & 0xFE;
        name[5] = self.function;
        name[4] = 0;
        name[3] = ((self.manufacturer_code >> 3) & 0xFF) as u8;
        name[2] = (((self.manufacturer_code & 0x7) << 5) as u8) | ((self.identity_number >> 16) & 0x1F) as u8;
        name[1] = ((self.identity_number >> 8) & 0xFF) as u8;
        name[0] = (self.identity_number & 0xFF) as u8;
        name
    }

    /// NAME as an integer, byte 0 being the least significant.
    pub fn name(&self) -> u64 {
        u64::from_le_bytes(self.name_bytes())
    }
}
