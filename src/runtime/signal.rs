use parking_lot::Mutex;
use std::sync::Arc;

use crate::codec::BitLayout;
use crate::runtime::listener::{ListenerHandle, Listeners};
use crate::types::{
    errors::{DatabaseError, LayoutError},
    signal::Signal,
};

/// Callback invoked with the signal that was updated.
pub type SignalListener = dyn Fn(&SignalRuntime) + Send + Sync;

struct SignalState {
    value: Option<f64>,
    on_change: Listeners<SignalListener>,
    on_update: Listeners<SignalListener>,
}

/// Live value of one signal of a bus, with its observers.
///
/// The value starts at the schema `defaultValue`, or unassigned when there is
/// none. An unassigned signal is left out of encoded frames.
pub struct SignalRuntime {
    signal: Signal,
    layout: Result<BitLayout, LayoutError>,
    state: Mutex<SignalState>,
}

impl SignalRuntime {
    pub fn new(signal: Signal) -> Self {
        let layout: Result<BitLayout, LayoutError> = signal.layout();
        if let Err(e) = &layout {
            tracing::warn!(signal = %signal.name, error = %e, "signal has an invalid bit layout");
        }
        let value: Option<f64> = signal.default_value;
        SignalRuntime {
            signal,
            layout,
            state: Mutex::new(SignalState {
                value,
                on_change: Listeners::default(),
                on_update: Listeners::default(),
            }),
        }
    }

    /// Schema record.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn name(&self) -> &str {
        &self.signal.name
    }

    /// Current physical value, `None` until one is assigned.
    pub fn value(&self) -> Option<f64> {
        self.state.lock().value
    }

    /// Label of the current value, if the schema defines one.
    pub fn label(&self) -> Option<&str> {
        let raw: i128 = self.signal.to_raw(self.value()?);
        i64::try_from(raw).ok().and_then(|r| self.signal.label_for(r))
    }

    /// Stores a new physical value and notifies listeners.
    ///
    /// Values outside `[min, max]` are logged and stored anyway. Update listeners
    /// always fire, change listeners only when the value differs from the
    /// previous one. Returns whether the value changed.
    pub fn update(&self, value: f64) -> bool {
        if self.signal.is_out_of_bounds(value) {
            tracing::warn!(
                signal = %self.signal.name,
                value,
                min = ?self.signal.min,
                max = ?self.signal.max,
                "value is out of bounds"
            );
        }

        let (changed, listeners) = {
            let mut state = self.state.lock();
            let changed: bool = state.value != Some(value);
            state.value = Some(value);
            let mut listeners: Vec<Arc<SignalListener>> = state.on_update.snapshot();
            if changed {
                listeners.extend(state.on_change.snapshot());
            }
            (changed, listeners)
        };

        for listener in listeners {
            listener(self);
        }
        changed
    }

    /// Registers a listener fired when the value changes.
    pub fn on_change<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&SignalRuntime) + Send + Sync + 'static,
    {
        self.state.lock().on_change.add(Arc::new(listener))
    }

    /// Registers a listener fired on every update, changed or not.
    pub fn on_update<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&SignalRuntime) + Send + Sync + 'static,
    {
        self.state.lock().on_update.add(Arc::new(listener))
    }

    /// Removes a change or update listener. Returns `false` if the handle is unknown.
    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        let mut state = self.state.lock();
        let from_change: bool = state.on_change.remove(handle);
        let from_update: bool = state.on_update.remove(handle);
        from_change || from_update
    }

    /// Decodes the field from `payload` and updates the value.
    pub(crate) fn receive(&self, payload: &[u8]) {
        let layout: &BitLayout = match &self.layout {
            Ok(layout) => layout,
            Err(_) => return,
        };
        match layout.decode(payload, self.signal.sign) {
            Ok(raw) => {
                let value: f64 = self.signal.to_physical(raw);
                tracing::trace!(signal = %self.signal.name, raw = %raw, value, "signal decoded");
                self.update(value);
            }
            Err(e) => {
                tracing::warn!(signal = %self.signal.name, error = %e, "signal not decoded");
            }
        }
    }

    /// Encodes the current value into `payload`.
    ///
    /// Returns `false` and leaves `payload` untouched when no value is assigned.
    pub(crate) fn encode_into(&self, payload: &mut [u8]) -> Result<bool, DatabaseError> {
        let Some(value) = self.value() else {
            return Ok(false);
        };
        let layout: &BitLayout = self.layout.as_ref().map_err(Clone::clone)?;
        let raw: i128 = self.signal.to_raw(value);
        layout.encode(payload, self.signal.sign, raw)?;
        Ok(true)
    }
}

impl std::fmt::Debug for SignalRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRuntime")
            .field("name", &self.signal.name)
            .field("value", &self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::signal::Signedness;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn speed() -> SignalRuntime {
        let mut sig = Signal::new("SpeedKm", 0, 8);
        sig.min = Some(0.0);
        sig.max = Some(100.0);
        sig.default_value = Some(5.0);
        sig.labels.insert(0, "Stop".into());
        SignalRuntime::new(sig)
    }

    #[test]
    fn test_initial_value() {
        assert_eq!(speed().value(), Some(5.0));
        let unset = SignalRuntime::new(Signal::new("X", 0, 1));
        assert_eq!(unset.value(), None);
        assert_eq!(unset.label(), None);

        // first assignment counts as a change, even to 0
        assert!(unset.update(0.0));
        assert_eq!(unset.value(), Some(0.0));
    }

    #[test]
    fn test_unassigned_value_is_not_encoded() {
        let mut sig = Signal::new("Temp", 0, 8);
        sig.intercept = -40.0;
        let rt = SignalRuntime::new(sig);

        let mut payload = [0u8; 1];
        assert!(!rt.encode_into(&mut payload).unwrap());
        assert_eq!(payload, [0x00]);

        rt.update(-40.0);
        assert!(rt.encode_into(&mut payload).unwrap());
        assert_eq!(payload, [0x00]);
        rt.update(0.0);
        assert!(rt.encode_into(&mut payload).unwrap());
        assert_eq!(payload, [40]);
    }

    #[test]
    fn test_change_and_update_listeners() {
        let rt = speed();
        let changes = Arc::new(AtomicUsize::new(0));
        let updates = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&changes);
        let change_handle = rt.on_change(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let u = Arc::clone(&updates);
        rt.on_update(move |_| {
            u.fetch_add(1, Ordering::SeqCst);
        });

        assert!(rt.update(10.0));
        assert!(!rt.update(10.0));
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 2);

        assert!(rt.remove_listener(change_handle));
        assert!(!rt.remove_listener(change_handle));
        assert!(rt.update(11.0));
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_out_of_bounds_value_is_stored() {
        let rt = speed();
        assert!(rt.update(250.0));
        assert_eq!(rt.value(), Some(250.0));
    }

    #[test]
    fn test_listener_sees_new_value_and_label() {
        let rt = speed();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        rt.on_change(move |sig| s.lock().push((sig.value(), sig.label().map(String::from))));
        rt.update(0.0);
        rt.update(3.0);
        assert_eq!(
            *seen.lock(),
            vec![(Some(0.0), Some("Stop".to_string())), (Some(3.0), None)]
        );
    }

    #[test]
    fn test_receive_and_encode() {
        let mut sig = Signal::new("Temp", 8, 8);
        sig.sign = Signedness::Signed;
        sig.slope = 0.5;
        sig.intercept = -10.0;
        let rt = SignalRuntime::new(sig);

        rt.receive(&[0x00, 0xFE]);
        assert_eq!(rt.value(), Some(-11.0));

        rt.update(20.0);
        let mut payload = [0u8; 2];
        assert!(rt.encode_into(&mut payload).unwrap());
        assert_eq!(payload, [0x00, 60]);

        let mut short = [0u8; 1];
        assert!(matches!(
            rt.encode_into(&mut short),
            Err(DatabaseError::Layout(LayoutError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_invalid_layout_is_reported_on_encode() {
        let rt = SignalRuntime::new(Signal::new("Empty", 0, 0));
        rt.receive(&[0xFF]);
        assert_eq!(rt.value(), None);
        rt.update(1.0);
        assert!(matches!(
            rt.encode_into(&mut [0u8; 1]),
            Err(DatabaseError::Layout(LayoutError::ZeroBitLength))
        ));
    }
}
