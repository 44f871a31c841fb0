//! Interfaces between the viewer and the application embedding it
//!
//! The host hands these to the viewer at construction: a drawing surface,
//! a resize notifier, and receivers for viewer events.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::pdf::{ContainerSize, ImageData};

/// Notifications delivered to host subscribers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Emitted exactly once, when the viewer starts loading its document
    LoadingStarted,
    /// Emitted exactly once, when the first page has loaded
    LoadingComplete,
    /// The document (or its first page) could not be loaded. Final: the
    /// viewer ignores navigation afterwards and never reports completion.
    LoadFailed { message: String },
    /// A page failed to load or render
    PageFailed { page: usize, message: String },
    /// A page was drawn to the surface
    PageRendered { page: usize, width: u32, height: u32 },
}

/// Drawing target for rendered pages
pub trait Surface {
    /// Resize the surface ahead of a render. Existing content may be discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw a rasterized page at the surface origin
    fn draw(&mut self, image: &ImageData);
}

/// Identifies a registered resize listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type ResizeListener = Box<dyn Fn(ContainerSize) + Send>;

/// Source of container size changes
pub trait ResizeNotifier: Send + Sync {
    fn register(&self, listener: ResizeListener) -> ListenerId;

    fn unregister(&self, id: ListenerId);
}

/// Fan-out resize notifier. The host calls [`ResizeHub::notify`] whenever the
/// viewer's container changes size.
#[derive(Default)]
pub struct ResizeHub {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, ResizeListener)>>,
}

impl ResizeHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, size: ContainerSize) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for (_, listener) in listeners.iter() {
            listener(size);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl ResizeNotifier for ResizeHub {
    fn register(&self, listener: ResizeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((id, listener));
        debug!("Registered resize listener {id:?}");
        id
    }

    fn unregister(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|(existing, _)| *existing != id);
        debug!("Unregistered resize listener {id:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn unregistered_listeners_stop_receiving() {
        let hub = ResizeHub::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let first = hub.register(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = calls.clone();
        let _second = hub.register(Box::new(move |_| {
            counter.fetch_add(10, Ordering::SeqCst);
        }));

        hub.notify(ContainerSize::new(10, 10));
        assert_eq!(calls.load(Ordering::SeqCst), 11);

        hub.unregister(first);
        assert_eq!(hub.listener_count(), 1);

        hub.notify(ContainerSize::new(20, 20));
        assert_eq!(calls.load(Ordering::SeqCst), 21);
    }
}
