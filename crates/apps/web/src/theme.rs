use catalog::{InMemoryKeyValueStore, KeyValueStore, LocalStorageKeyValueStore};
use surface::style::Theme;
use widget::ThemeSink;

/// Toggles the `dark` class on `<html>`.
#[derive(Debug, Default)]
pub struct DocumentThemeSink;

impl ThemeSink for DocumentThemeSink {
    fn apply(&mut self, theme: Theme) {
        let Some(root) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        else {
            return;
        };
        if let Err(e) = root.class_list().toggle_with_force("dark", theme.is_dark()) {
            crate::log_error(&format!(
                "could not toggle theme class: {}",
                crate::mapbox::js_error_message(&e)
            ));
        }
    }
}

/// `localStorage`, or an in-memory stand-in when the browser refuses it
/// (private mode, sandboxed iframes).
pub fn preference_store() -> Box<dyn KeyValueStore> {
    match LocalStorageKeyValueStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            crate::log_error(&format!("theme preference will not persist: {e}"));
            Box::new(InMemoryKeyValueStore::new())
        }
    }
}
