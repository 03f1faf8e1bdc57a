//! Element decoders: turn the typed XML view into database types.

pub(crate) mod attr;
pub(crate) mod message;
pub(crate) mod node;
pub(crate) mod signal;
