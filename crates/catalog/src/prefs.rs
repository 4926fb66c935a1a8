use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::CatalogError;

/// Storage key holding the `"dark"`/`"light"` theme preference.
pub const THEME_KEY: &str = "theme";

/// Durable string key-value storage (browser `localStorage` in the web host).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError>;
    fn remove(&mut self, key: &str) -> Result<bool, CatalogError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyValueStore {
    entries: BTreeMap<String, String>,
    writes: u64,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls, including overwrites with the same value.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, CatalogError> {
        Ok(self.entries.remove(key).is_some())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, CatalogError> {
        (**self).remove(key)
    }
}

/// Shared handle, so a host can keep reading a store it handed to the widget.
impl<T: KeyValueStore> KeyValueStore for Rc<RefCell<T>> {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
        self.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
        self.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, CatalogError> {
        self.borrow_mut().remove(key)
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::KeyValueStore;
    use crate::CatalogError;

    /// `window.localStorage`, keys stored verbatim so other parts of the page
    /// can read them.
    #[derive(Debug, Default)]
    pub struct LocalStorageKeyValueStore;

    impl LocalStorageKeyValueStore {
        pub fn new() -> Result<Self, CatalogError> {
            // Fail early when storage is disabled (private mode, sandboxed iframe).
            window_local_storage()?;
            Ok(Self)
        }
    }

    impl KeyValueStore for LocalStorageKeyValueStore {
        fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
            window_local_storage()?
                .get_item(key)
                .map_err(|e| CatalogError::Io(format!("get_item({key}) failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
            window_local_storage()?
                .set_item(key, value)
                .map_err(|e| CatalogError::Io(format!("set_item({key}) failed: {:?}", e)))
        }

        fn remove(&mut self, key: &str) -> Result<bool, CatalogError> {
            let storage = window_local_storage()?;
            let existed = storage
                .get_item(key)
                .map_err(|e| CatalogError::Io(format!("get_item({key}) failed: {:?}", e)))?
                .is_some();
            storage
                .remove_item(key)
                .map_err(|e| CatalogError::Io(format!("remove_item({key}) failed: {:?}", e)))?;
            Ok(existed)
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, CatalogError> {
        let win = web_sys::window().ok_or(CatalogError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| CatalogError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(CatalogError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageKeyValueStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageKeyValueStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageKeyValueStore {
    pub fn new() -> Result<Self, CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for LocalStorageKeyValueStore {
    fn get(&self, _key: &str) -> Result<Option<String>, CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<bool, CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }
}
