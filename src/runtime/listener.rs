use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identifies a registered listener so it can be removed later.
///
/// Handles are unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    pub(crate) fn next() -> Self {
        ListenerHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw handle value.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Listeners in registration order.
///
/// Callers take a [`snapshot`](Listeners::snapshot) under their lock and invoke
/// it after releasing the lock, so a callback may re-enter the owner.
pub(crate) struct Listeners<F: ?Sized> {
    entries: Vec<(ListenerHandle, Arc<F>)>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Listeners { entries: Vec::new() }
    }
}

impl<F: ?Sized> Listeners<F> {
    pub(crate) fn add(&mut self, listener: Arc<F>) -> ListenerHandle {
        let handle: ListenerHandle = ListenerHandle::next();
        self.entries.push((handle, listener));
        handle
    }

    /// Removes the listener registered under `handle`. Returns `false` if absent.
    pub(crate) fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before: usize = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        self.entries.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Callback = dyn Fn() -> u32 + Send + Sync;

    #[test]
    fn test_add_remove_keeps_order() {
        let mut list: Listeners<Callback> = Listeners::default();
        let a = list.add(Arc::new(|| 1));
        let b = list.add(Arc::new(|| 2));
        let _c = list.add(Arc::new(|| 3));
        assert_ne!(a, b);
        assert!(b.id() > a.id());

        assert!(list.remove(b));
        assert!(!list.remove(b));
        let values: Vec<u32> = list.snapshot().iter().map(|f| f()).collect();
        assert_eq!(values, vec![1, 3]);
    }
}
