/// Largest payload of a classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;
/// Largest payload of a CAN FD frame.
pub const CANFD_MAX_DLEN: usize = 64;

/// Bit folded into the arbitration id to build a lookup key that keeps
/// standard and extended identifiers apart.
pub const EXTENDED_KEY_FLAG: u32 = 1 << 31;

/// A single CAN (or CAN FD) frame as exchanged with a transport.
///
/// # Field semantics
///
/// - `id`: arbitration identifier (11 bit standard or 29 bit extended).
/// - `extended`: `true` when `id` uses the extended frame format.
/// - `remote_request`: remote transmission request; such frames carry no payload.
/// - `payload`: data bytes, up to the transport's maximum frame size.
///
/// # Examples
///
/// ```rust
/// # use can_kcd::CanFrame;
/// let f = CanFrame::new(0x123, false, vec![0x11, 0x22]);
/// assert_eq!(f.key(), 0x123);
/// assert!(!f.is_fd());
///
/// let ext = CanFrame::new(0x123, true, vec![]);
/// assert_ne!(ext.key(), f.key());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanFrame {
    /// Arbitration identifier.
    pub id: u32,
    /// Extended frame format.
    pub extended: bool,
    /// Remote transmission request.
    pub remote_request: bool,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl CanFrame {
    /// Builds a data frame.
    pub fn new(id: u32, extended: bool, payload: Vec<u8>) -> Self {
        CanFrame {
            id,
            extended,
            remote_request: false,
            payload,
        }
    }

    /// Builds a remote transmission request for `id`.
    pub fn remote(id: u32, extended: bool) -> Self {
        CanFrame {
            id,
            extended,
            remote_request: true,
            payload: Vec::new(),
        }
    }

    /// Lookup key with the extended flag folded into bit 31.
    #[inline]
    pub fn key(&self) -> u32 {
        frame_key(self.id, self.extended)
    }

    /// `true` when the payload does not fit a classic CAN frame.
    #[inline]
    pub fn is_fd(&self) -> bool {
        self.payload.len() > CAN_MAX_DLEN
    }

    /// Payload bytes formatted as hex pairs separated by spaces.
    pub fn data_hex(&self) -> String {
        self.payload
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Folds the id format into a single key: `id | extended << 31`.
#[inline]
pub fn frame_key(id: u32, extended: bool) -> u32 {
    if extended { id | EXTENDED_KEY_FLAG } else { id }
}
