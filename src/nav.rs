use std::sync::Mutex;

/// Navigation capability owned by the embedding application: its router
/// and address bar. The core only asks for path-level moves and in-place
/// address replacement; it never constructs full reloads.
pub trait Navigator: Send + Sync {
    /// The current navigable address: path plus query and fragment.
    fn current_address(&self) -> String;
    /// Route to a path through the embedder's navigation.
    fn navigate_to(&self, path: &str);
    /// Replace the visible address in place, without navigating.
    fn replace_address(&self, path: &str);
}

/// A navigator for headless embedders. The address is always the root
/// path and navigation requests are dropped.
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn current_address(&self) -> String {
        "/".to_string()
    }

    fn navigate_to(&self, _path: &str) {}

    fn replace_address(&self, _path: &str) {}
}

/// A navigator that records every call. Used by tests and by embedders
/// that bridge navigation into a channel of their own.
pub struct RecordingNavigator {
    address: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    replacements: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn with_address(address: &str) -> Self {
        RecordingNavigator {
            address: Mutex::new(address.to_string()),
            navigations: Mutex::new(Vec::new()),
            replacements: Mutex::new(Vec::new()),
        }
    }

    /// Point the recorded address somewhere else, as an embedder would on
    /// an ordinary route change.
    pub fn set_address(&self, address: &str) {
        *self.address.lock().expect("navigator mutex poisoned") = address.to_string();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .expect("navigator mutex poisoned")
            .clone()
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replacements
            .lock()
            .expect("navigator mutex poisoned")
            .clone()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::with_address("/")
    }
}

impl Navigator for RecordingNavigator {
    fn current_address(&self) -> String {
        self.address
            .lock()
            .expect("navigator mutex poisoned")
            .clone()
    }

    fn navigate_to(&self, path: &str) {
        self.navigations
            .lock()
            .expect("navigator mutex poisoned")
            .push(path.to_string());
    }

    fn replace_address(&self, path: &str) {
        *self.address.lock().expect("navigator mutex poisoned") = path.to_string();
        self.replacements
            .lock()
            .expect("navigator mutex poisoned")
            .push(path.to_string());
    }
}
