//! `localStorage` backed key-value store

use gloo::storage::{LocalStorage, Storage};
use goftr_admin_core::{CoreError, CoreResult, KeyValueStore};

/// Durable browser storage.
///
/// Values are stored as raw strings (not JSON encoded) so tokens written by
/// other tabs or older builds stay readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

fn js_error(op: &str, key: &str, err: wasm_bindgen::JsValue) -> CoreError {
    CoreError::storage(format!("localStorage {op} '{key}' failed: {err:?}"))
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|err| js_error("get", key, err))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| js_error("set", key, err))
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|err| js_error("remove", key, err))
    }
}
