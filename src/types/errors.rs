use std::io;
use thiserror::Error;

/// Errors produced while checking that a bit field fits a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Signal Bit Length cannot be zero")]
    ZeroBitLength,
    #[error("Signal Bit Length {bit_length} exceeds 64 bits")]
    TooWide { bit_length: u16 },
    #[error("Out of bounds! \nSignal end bit = {end_bit} \nPayload total bits = {capacity_bits}")]
    OutOfBounds { end_bit: usize, capacity_bits: usize },
}

/// Errors produced while loading a `.kcd` network definition.
#[cfg(feature = "kcd")]
#[derive(Debug, Error)]
pub enum KcdParseError {
    #[error("Not a valid .kcd file: {path}")]
    InvalidExtension { path: String },
    #[error("Failed to open '{path}'. \nError: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Network definition does not match the expected structure: {0}")]
    Structure(#[from] quick_xml::DeError),
    #[error("Expected a <NetworkDefinition> root element, found <{found}>")]
    UnexpectedRoot { found: String },
    #[error("Invalid value '{value}' for attribute '{attribute}' of <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    #[error("Signal '{signal}' does not fit message '{message}'. \nError: {source}")]
    Layout {
        message: String,
        signal: String,
        #[source]
        source: LayoutError,
    },
}

/// Errors reported by a [`Transport`](crate::runtime::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is stopped")]
    Stopped,
    #[error("Operation not supported by this transport")]
    Unsupported,
    #[error("Payload of {len} bytes exceeds the transport limit of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("Transport I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Frame rejected: {reason}")]
    Rejected { reason: String },
}

/// Errors returned by [`DatabaseService`](crate::runtime::service::DatabaseService) operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Message '{name}' not defined")]
    MessageNotDefined { name: String },
    #[error("Signal '{signal}' not defined in message '{message}'")]
    SignalNotDefined { message: String, signal: String },
    #[error("Invalid multiplexor selector '{selector}' for message '{message}'")]
    InvalidSelector { message: String, selector: String },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
