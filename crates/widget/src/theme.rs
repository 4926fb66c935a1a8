use catalog::{KeyValueStore, THEME_KEY};
use surface::style::Theme;
use tracing::{debug, warn};

/// Receives the theme of every completed style switch.
///
/// Implementations must not fail the switch: errors are logged and dropped.
pub trait ThemeSink {
    fn apply(&mut self, theme: Theme);
}

/// Persists the theme under [`THEME_KEY`].
#[derive(Debug, Default)]
pub struct PreferenceThemeSink<S> {
    store: S,
}

impl<S: KeyValueStore> PreferenceThemeSink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> ThemeSink for PreferenceThemeSink<S> {
    fn apply(&mut self, theme: Theme) {
        match self.store.set(THEME_KEY, theme.as_str()) {
            Ok(()) => debug!(theme = theme.as_str(), "theme preference saved"),
            Err(e) => warn!(error = %e, "could not persist theme preference"),
        }
    }
}

/// Fans one theme out to two sinks (storage plus the page attribute in the
/// web host).
impl<A: ThemeSink, B: ThemeSink> ThemeSink for (A, B) {
    fn apply(&mut self, theme: Theme) {
        self.0.apply(theme);
        self.1.apply(theme);
    }
}

impl<T: ThemeSink + ?Sized> ThemeSink for Box<T> {
    fn apply(&mut self, theme: Theme) {
        (**self).apply(theme);
    }
}

/// Sink that only remembers the last theme it saw.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordingThemeSink {
    pub last: Option<Theme>,
    pub applied: u32,
}

impl ThemeSink for RecordingThemeSink {
    fn apply(&mut self, theme: Theme) {
        self.last = Some(theme);
        self.applied += 1;
    }
}

/// Reads the persisted theme, if any. Unreadable or unknown values count as
/// absent.
pub fn stored_theme(store: &impl KeyValueStore) -> Option<Theme> {
    match store.get(THEME_KEY) {
        Ok(value) => value.as_deref().and_then(Theme::parse),
        Err(e) => {
            warn!(error = %e, "could not read theme preference");
            None
        }
    }
}
