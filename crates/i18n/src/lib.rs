//! Localization for the Unilearn client
//!
//! Arabic-first: Arabic is the default language and the only
//! right-to-left one. The catalog is a fixed in-process table; keys
//! missing from the selected language fall back to Arabic, then to the
//! key itself so a typo stays visible instead of rendering blank UI.

pub mod catalog;
pub mod language;
pub mod translator;

pub use catalog::translate;
pub use language::{Language, UnknownLanguage};
pub use translator::{
    FileLanguageStore, LanguagePreferenceStore, MemoryLanguageStore, Translator,
};
