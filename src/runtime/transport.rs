use std::sync::Arc;

use crate::runtime::listener::ListenerHandle;
use crate::types::{
    canframe::{CAN_MAX_DLEN, CanFrame},
    errors::TransportError,
};

/// Callback invoked for every frame the transport receives.
pub type FrameListener = Arc<dyn Fn(&CanFrame) + Send + Sync>;

/// A raw CAN channel: delivers received frames and transmits encoded ones.
///
/// All methods take `&self`; implementations synchronize internally so a
/// transport can be shared between services and called from listeners.
pub trait Transport: Send + Sync {
    fn start(&self) -> Result<(), TransportError>;

    fn stop(&self) -> Result<(), TransportError>;

    /// Transmits a classic CAN frame.
    fn send(&self, frame: &CanFrame) -> Result<(), TransportError>;

    /// Transmits a CAN FD frame.
    fn send_fd(&self, frame: &CanFrame) -> Result<(), TransportError> {
        let _ = frame;
        Err(TransportError::Unsupported)
    }

    /// Subscribes to received frames.
    fn add_listener(&self, listener: FrameListener) -> ListenerHandle;

    /// Unsubscribes a listener. Returns `false` if the handle is unknown.
    fn remove_listener(&self, handle: ListenerHandle) -> bool;

    /// Replaces the receive filters. An empty list accepts every frame.
    fn set_rx_filters(&self, filters: &[RxFilter]) -> Result<(), TransportError>;

    fn set_error_filters(&self, error_mask: u32) -> Result<(), TransportError>;

    /// Largest payload the transport can carry.
    fn max_payload_len(&self) -> usize {
        CAN_MAX_DLEN
    }
}

/// Acceptance filter on the frame key (`id | extended << 31`).
///
/// A frame matches when `(key & mask) == (id & mask)`; `invert` negates the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxFilter {
    pub id: u32,
    pub mask: u32,
    pub invert: bool,
}

impl RxFilter {
    pub fn new(id: u32, mask: u32) -> Self {
        RxFilter {
            id,
            mask,
            invert: false,
        }
    }

    /// Filter accepting every frame except the matching ones.
    pub fn inverted(id: u32, mask: u32) -> Self {
        RxFilter { id, mask, invert: true }
    }

    pub fn matches(&self, frame: &CanFrame) -> bool {
        ((frame.key() & self.mask) == (self.id & self.mask)) != self.invert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::canframe::EXTENDED_KEY_FLAG;

    #[test]
    fn test_rx_filter() {
        let std_frame = CanFrame::new(0x7E8, false, vec![]);
        let ext_frame = CanFrame::new(0x7E8, true, vec![]);

        let exact = RxFilter::new(0x7E8, 0x7FF);
        assert!(exact.matches(&std_frame));
        assert!(exact.matches(&ext_frame));

        let std_only = RxFilter::new(0x7E8, 0x7FF | EXTENDED_KEY_FLAG);
        assert!(std_only.matches(&std_frame));
        assert!(!std_only.matches(&ext_frame));

        let range = RxFilter::new(0x7E0, 0x7F0);
        assert!(range.matches(&CanFrame::new(0x7EF, false, vec![])));
        assert!(!range.matches(&CanFrame::new(0x7D0, false, vec![])));

        let all_but = RxFilter::inverted(0x100, 0x7FF);
        assert!(!all_but.matches(&CanFrame::new(0x100, false, vec![])));
        assert!(all_but.matches(&std_frame));
    }
}
