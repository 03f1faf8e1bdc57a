//! # can_kcd
//!
//! Rust utilities for decoding and encoding **automotive CAN** signals described
//! by KCD network definitions.
//!
//! ## Highlights
//! - **KCD loader**: load a [`Network`] (nodes, buses, messages, multiplexors, signals) from `.kcd`.
//! - **Bit-field codec**: [`codec::decode`] / [`codec::encode`] for fields of 1 to 64 bits, little or big endian, signed or unsigned.
//! - **Stable keys**: messages and signals live in SlotMap arenas; iteration follows schema order.
//! - **Live signals**: a [`DatabaseService`] per bus decodes received frames into [`SignalRuntime`]s with change/update listeners and encodes them back on `send`.
//! - **Pluggable transport**: implement [`Transport`] for a real CAN channel or use the in-process [`VirtualBus`].
//!
//! ```rust
//! use std::sync::Arc;
//! use can_kcd::{DatabaseService, Transport, VirtualBus};
//!
//! let xml = r#"<NetworkDefinition>
//!   <Bus name="Motor">
//!     <Message id="0x37F" name="CruiseControlStatus" length="1">
//!       <Signal name="SpeedKm" offset="0" length="8"><Value slope="0.5"/></Signal>
//!     </Message>
//!   </Bus>
//! </NetworkDefinition>"#;
//! let network = can_kcd::kcd::from_str(xml).unwrap();
//!
//! let bus = Arc::new(VirtualBus::new());
//! bus.start().unwrap();
//! let tx = DatabaseService::new(Arc::clone(&bus), network.get_bus_by_name("Motor").unwrap());
//! let rx = DatabaseService::new(Arc::clone(&bus), network.get_bus_by_name("Motor").unwrap());
//!
//! tx.set_signal("CruiseControlStatus", "SpeedKm", 42.5).unwrap();
//! tx.send("CruiseControlStatus").unwrap();
//! assert_eq!(rx.get_signal("CruiseControlStatus", "SpeedKm").unwrap().value(), Some(42.5));
//! ```
//!

pub mod codec;
#[cfg(feature = "kcd")]
pub mod kcd;
pub mod runtime;
#[doc(hidden)]
pub mod types;

// Top-level re-exports (appear under Crate Items → Structs)
#[doc(inline)]
pub use crate::types::{
    bus::{Bus, MessageKey},
    canframe::CanFrame,
    message::{IdFormat, Message, Mux},
    network::Network,
    node::{BusRefs, J1939, Node, NodeRef, SignalRef},
    signal::{Endianness, Signal, Signedness},
};

#[doc(inline)]
pub use crate::types::errors::{DatabaseError, LayoutError, TransportError};

#[cfg(feature = "kcd")]
#[doc(inline)]
pub use crate::types::errors::KcdParseError;

#[doc(inline)]
pub use crate::runtime::{
    DatabaseService, ListenerHandle, MessageRuntime, RxFilter, SignalRuntime, Transport, VirtualBus,
};
