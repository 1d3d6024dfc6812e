/// Durable string key-value storage scoped to the browser profile. The
/// popup controller only ever talks to this port, never to the DOM.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// `window.localStorage`. Every accessor degrades to a no-op when the
/// storage area is unavailable (private browsing, detached host).
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl KvStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(key, value);
        }
    }
}

#[cfg(test)]
pub mod memory {
    use super::KvStore;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Test double with the same persistence semantics: clones share the
    /// underlying map, so a "reload" is just a fresh controller over a
    /// clone of the store.
    #[derive(Clone, Default)]
    pub struct MemoryStore(Rc<RefCell<HashMap<String, String>>>);

    impl KvStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.borrow().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.0.borrow_mut().insert(key.to_string(), value.to_string());
        }
    }
}
