//! # runtime
//!
//! Live signal values bound to a transport. A [`DatabaseService`] decodes
//! received frames of one bus into [`SignalRuntime`]s and encodes their current
//! values back into frames.

pub mod listener;
pub mod message;
pub mod service;
pub mod signal;
pub mod transport;
pub mod virtual_bus;

pub use listener::ListenerHandle;
pub use message::MessageRuntime;
pub use service::DatabaseService;
pub use signal::SignalRuntime;
pub use transport::{FrameListener, RxFilter, Transport};
pub use virtual_bus::VirtualBus;
