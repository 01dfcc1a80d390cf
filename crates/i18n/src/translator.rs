//! Current-language state and persisted preference
//!
//! The selected language survives restarts through a one-line file,
//! mirroring how the session record is persisted. A missing or
//! unreadable preference silently selects Arabic.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::catalog::translate;
use crate::language::Language;

/// Backing store for the language preference.
pub trait LanguagePreferenceStore: Send + Sync {
    fn load(&self) -> Option<Language>;
    fn save(&self, language: Language);
}

/// One-line file holding the language code; the production store.
pub struct FileLanguageStore {
    path: PathBuf,
}

impl FileLanguageStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LanguagePreferenceStore for FileLanguageStore {
    fn load(&self) -> Option<Language> {
        let text = std::fs::read_to_string(&self.path).ok()?;
        match text.parse() {
            Ok(language) => Some(language),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid language preference");
                None
            }
        }
    }

    fn save(&self, language: Language) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "failed to create preference directory");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, language.code()) {
            tracing::warn!(error = %e, "failed to persist language preference");
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryLanguageStore {
    language: Mutex<Option<Language>>,
}

impl MemoryLanguageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguagePreferenceStore for MemoryLanguageStore {
    fn load(&self) -> Option<Language> {
        *self
            .language
            .lock()
            .expect("language lock poisoned — prior test panicked")
    }

    fn save(&self, language: Language) {
        *self
            .language
            .lock()
            .expect("language lock poisoned — prior test panicked") = Some(language);
    }
}

/// Holds the current language and resolves catalog keys with it.
pub struct Translator {
    current: RwLock<Language>,
    store: Box<dyn LanguagePreferenceStore>,
}

impl Translator {
    /// Start from the persisted preference, or Arabic.
    pub fn new(store: Box<dyn LanguagePreferenceStore>) -> Self {
        let current = store.load().unwrap_or_default();
        Self {
            current: RwLock::new(current),
            store,
        }
    }

    pub fn current(&self) -> Language {
        *self
            .current
            .read()
            .expect("language lock poisoned — prior access panicked")
    }

    /// Switch language and persist the choice.
    pub fn set_language(&self, language: Language) {
        *self
            .current
            .write()
            .expect("language lock poisoned — prior access panicked") = language;
        self.store.save(language);
        tracing::info!(%language, "language changed");
    }

    pub fn is_rtl(&self) -> bool {
        self.current().is_rtl()
    }

    /// Resolve a catalog key in the current language.
    pub fn t(&self, key: &'static str) -> &'static str {
        translate(self.current(), key)
    }
}
