//! In-process transport.
//!
//! Every frame sent on a [`VirtualBus`] is delivered to all of its listeners
//! that pass the receive filters, the way a `vcan` interface loops frames back
//! to every socket bound to it.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::runtime::listener::{ListenerHandle, Listeners};
use crate::runtime::transport::{FrameListener, RxFilter, Transport};
use crate::types::{
    canframe::{CAN_MAX_DLEN, CANFD_MAX_DLEN, CanFrame},
    errors::TransportError,
};

type FrameCallback = dyn Fn(&CanFrame) + Send + Sync;

#[derive(Default)]
struct BusState {
    running: bool,
    /// A dispatch loop is delivering frames; new frames are queued behind it.
    dispatching: bool,
    queue: VecDeque<CanFrame>,
    listeners: Listeners<FrameCallback>,
    rx_filters: Vec<RxFilter>,
    error_mask: u32,
}

impl BusState {
    fn accepts(&self, frame: &CanFrame) -> bool {
        self.rx_filters.is_empty() || self.rx_filters.iter().any(|f| f.matches(frame))
    }
}

/// Clears the dispatch flag if a listener unwinds out of the dispatch loop,
/// so later frames are delivered again. Frames queued behind it are dropped.
struct DispatchGuard<'a>(&'a Mutex<BusState>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        tracing::warn!(dropped = state.queue.len(), "frame listener panicked during dispatch");
        state.dispatching = false;
        state.queue.clear();
    }
}

/// Loopback bus living in the current process. Starts stopped.
pub struct VirtualBus {
    fd: bool,
    state: Mutex<BusState>,
}

impl VirtualBus {
    /// Classic CAN bus (8-byte payloads).
    pub fn new() -> Self {
        VirtualBus {
            fd: false,
            state: Mutex::new(BusState::default()),
        }
    }

    /// CAN FD capable bus (64-byte payloads).
    pub fn new_fd() -> Self {
        VirtualBus {
            fd: true,
            state: Mutex::new(BusState::default()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Error classes last requested through `set_error_filters`.
    pub fn error_filters(&self) -> u32 {
        self.state.lock().error_mask
    }

    fn transmit(&self, frame: &CanFrame, max_len: usize) -> Result<(), TransportError> {
        if frame.payload.len() > max_len {
            return Err(TransportError::PayloadTooLarge {
                len: frame.payload.len(),
                max: max_len,
            });
        }

        {
            let mut state = self.state.lock();
            if !state.running {
                return Err(TransportError::Stopped);
            }
            state.queue.push_back(frame.clone());
            if state.dispatching {
                tracing::trace!(id = frame.id, "frame queued behind running dispatch");
                return Ok(());
            }
            state.dispatching = true;
        }

        let guard = DispatchGuard(&self.state);
        loop {
            let (frame, listeners) = {
                let mut state = self.state.lock();
                let Some(frame) = state.queue.pop_front() else {
                    // cleared under the same lock that saw the queue empty
                    state.dispatching = false;
                    drop(state);
                    std::mem::forget(guard);
                    return Ok(());
                };
                let listeners = if state.accepts(&frame) {
                    state.listeners.snapshot()
                } else {
                    Vec::new()
                };
                (frame, listeners)
            };

            for listener in listeners {
                listener(&frame);
            }
        }
    }
}

impl Default for VirtualBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for VirtualBus {
    fn start(&self) -> Result<(), TransportError> {
        self.state.lock().running = true;
        Ok(())
    }

    /// Stops the bus and drops frames still waiting for delivery.
    fn stop(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.running = false;
        state.queue.clear();
        Ok(())
    }

    fn send(&self, frame: &CanFrame) -> Result<(), TransportError> {
        self.transmit(frame, CAN_MAX_DLEN)
    }

    fn send_fd(&self, frame: &CanFrame) -> Result<(), TransportError> {
        if !self.fd {
            return Err(TransportError::Unsupported);
        }
        self.transmit(frame, CANFD_MAX_DLEN)
    }

    fn add_listener(&self, listener: FrameListener) -> ListenerHandle {
        self.state.lock().listeners.add(listener)
    }

    fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.state.lock().listeners.remove(handle)
    }

    fn set_rx_filters(&self, filters: &[RxFilter]) -> Result<(), TransportError> {
        self.state.lock().rx_filters = filters.to_vec();
        Ok(())
    }

    fn set_error_filters(&self, error_mask: u32) -> Result<(), TransportError> {
        self.state.lock().error_mask = error_mask;
        Ok(())
    }

    fn max_payload_len(&self) -> usize {
        if self.fd { CANFD_MAX_DLEN } else { CAN_MAX_DLEN }
    }
}
