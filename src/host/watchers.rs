//! Per-window update callbacks.
//!
//! A host element that renders one window (a view, a texture target, ...) registers a callback
//! under its window name so it hears when the engine side of that window was touched. Callers
//! identify themselves with an opaque handle; one handle always maps to one name.
//!
//! Callbacks are never run by the registry itself. [`WindowWatchers::notify`] hands out a
//! [`WindowNotice`] holding the callbacks to run, and the caller delivers it once it no longer
//! holds any host lock, so a callback is free to lock the host again.

use crate::errors::HostError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Window update callback. The argument is `true` when the window was (re)bound and `false` when
/// it was removed.
pub type WindowCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Watcher calls collected while the host was locked.
#[must_use = "watchers are only called once the notice is delivered"]
#[derive(Default)]
pub struct WindowNotice {
    calls: Vec<(String, WindowCallback, bool)>,
}

impl std::fmt::Debug for WindowNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let calls: Vec<(&str, bool)> = self.calls.iter().map(|(name, _, bound)| (name.as_str(), *bound)).collect();
        f.debug_struct("WindowNotice").field("calls", &calls).finish()
    }
}

impl WindowNotice {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Window names that will be notified, in call order.
    pub fn windows(&self) -> Vec<&str> {
        self.calls.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    /// Runs the collected callbacks. Call without holding the host lock.
    pub fn deliver(self) {
        for (name, cb, bound) in self.calls {
            log::debug!("Updating window '{}'", name);
            cb(bound);
        }
    }
}

#[derive(Default)]
pub struct WindowWatchers {
    names: HashMap<u64, String>,
    callbacks: BTreeMap<String, WindowCallback>,
}

impl std::fmt::Debug for WindowWatchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowWatchers")
            .field("names", &self.names)
            .field("windows", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WindowWatchers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `name`, replacing any earlier callback for that name.
    ///
    /// Fails if `handle` is already registered under a different name.
    pub fn register(&mut self, handle: u64, name: &str, callback: WindowCallback) -> Result<(), HostError> {
        log::debug!("Registering window watcher {:#x} for '{}'", handle, name);

        match self.names.get(&handle) {
            Some(existing) if existing != name => {
                log::error!("Watcher {:#x} is registered for '{}', refusing '{}'", handle, existing, name);
                return Err(HostError::WatcherNameMismatch { handle, existing: existing.clone() });
            }
            Some(_) => {}
            None => {
                self.names.insert(handle, name.to_string());
            }
        }

        self.callbacks.insert(name.to_string(), callback);
        Ok(())
    }

    /// Drops the callback registered by `handle`. Unknown handles are ignored.
    pub fn unregister(&mut self, handle: u64) {
        if let Some(name) = self.names.remove(&handle) {
            log::debug!("Unregistering window watcher {:#x} for '{}'", handle, name);
            self.callbacks.remove(&name);
        }
    }

    pub fn is_watched(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// The call for `name`, if it has a watcher.
    pub fn notify(&self, name: &str, bound: bool) -> WindowNotice {
        let calls = self
            .callbacks
            .get(name)
            .map(|cb| vec![(name.to_string(), cb.clone(), bound)])
            .unwrap_or_default();
        WindowNotice { calls }
    }

    /// A `true` call for every watcher, in window name order.
    pub fn notify_all(&self) -> WindowNotice {
        let calls = self
            .callbacks
            .iter()
            .map(|(name, cb)| (name.clone(), cb.clone(), true))
            .collect();
        WindowNotice { calls }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, WindowCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |bound| sink.lock().unwrap().push(bound)))
    }

    #[test]
    fn notify_reaches_the_named_callback_only() {
        let mut watchers = WindowWatchers::new();
        let (main, cb) = recorder();
        watchers.register(1, "", cb).unwrap();
        let (other, cb) = recorder();
        watchers.register(2, "minimap", cb).unwrap();

        watchers.notify("", true).deliver();
        assert!(watchers.notify("unknown", true).is_empty());
        watchers.notify("minimap", false).deliver();

        assert_eq!(*main.lock().unwrap(), vec![true]);
        assert_eq!(*other.lock().unwrap(), vec![false]);
    }

    #[test]
    fn nothing_runs_until_delivered() {
        let mut watchers = WindowWatchers::new();
        let (seen, cb) = recorder();
        watchers.register(1, "hud", cb).unwrap();

        let notice = watchers.notify("hud", true);
        assert_eq!(notice.windows(), vec!["hud"]);
        assert!(seen.lock().unwrap().is_empty());

        // the registry can change before delivery without affecting the collected call
        watchers.unregister(1);
        notice.deliver();
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn handle_cannot_change_name() {
        let mut watchers = WindowWatchers::new();
        let (_, cb) = recorder();
        watchers.register(7, "a", cb).unwrap();

        let (_, cb) = recorder();
        let err = watchers.register(7, "b", cb).unwrap_err();
        assert!(matches!(err, HostError::WatcherNameMismatch { handle: 7, ref existing } if existing == "a"));
        assert!(!watchers.is_watched("b"));

        // same name is fine and replaces the callback
        let (seen, cb) = recorder();
        watchers.register(7, "a", cb).unwrap();
        watchers.notify("a", true).deliver();
        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert_eq!(watchers.len(), 1);
    }

    #[test]
    fn unregister_forgets_handle_and_callback() {
        let mut watchers = WindowWatchers::new();
        let (seen, cb) = recorder();
        watchers.register(3, "hud", cb).unwrap();

        watchers.unregister(3);
        watchers.unregister(3);
        watchers.notify_all().deliver();

        assert!(watchers.is_empty());
        assert!(seen.lock().unwrap().is_empty());

        // the handle is free for another name now
        let (_, cb) = recorder();
        assert!(watchers.register(3, "other", cb).is_ok());
    }

    #[test]
    fn notify_all_calls_everyone() {
        let mut watchers = WindowWatchers::new();
        let (a, cb) = recorder();
        watchers.register(1, "b", cb).unwrap();
        let (b, cb) = recorder();
        watchers.register(2, "a", cb).unwrap();

        let notice = watchers.notify_all();
        assert_eq!(notice.windows(), vec!["a", "b"]);
        notice.deliver();
        assert_eq!(*a.lock().unwrap(), vec![true]);
        assert_eq!(*b.lock().unwrap(), vec![true]);
    }
}
