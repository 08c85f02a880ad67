//! Localization entries of all localization files.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::keys::KeyChain;
use crate::base::{DocId, Name, NodeId};
use crate::document::{DocumentKind, DocumentSource};

/// One `key: value` property of a localization file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizationEntry {
    pub file: DocId,
    /// The property node; placements anchor on it.
    pub property: NodeId,
    pub locale: Option<Name>,
    pub chain: KeyChain,
}

impl LocalizationEntry {
    pub fn key(&self) -> &str {
        self.chain.key()
    }
}

/// Key → entries, in document order.
#[derive(Clone, Debug, Default)]
pub struct LocalizationIndex {
    generation: u64,
    entries: Vec<LocalizationEntry>,
    by_key: FxHashMap<Arc<str>, Vec<usize>>,
    /// Every localization file, including empty ones, in document order.
    by_file: IndexMap<DocId, LocalizationFile>,
}

#[derive(Clone, Debug, Default)]
struct LocalizationFile {
    locale: Option<Name>,
    entries: Vec<usize>,
}

impl LocalizationIndex {
    /// Collect the top-level properties of every localization document.
    pub fn build<S: DocumentSource + ?Sized>(source: &S) -> Self {
        let mut index = Self {
            generation: source.generation(),
            ..Self::default()
        };
        for file in source.documents(Some(DocumentKind::Localization)) {
            let Some(doc) = source.document(file) else {
                continue;
            };
            let mut slot = LocalizationFile {
                locale: doc.meta().locale.clone(),
                entries: Vec::new(),
            };
            for (key, property) in doc.properties(doc.top()) {
                let at = index.entries.len();
                slot.entries.push(at);
                index
                    .by_key
                    .entry(Arc::from(key))
                    .or_default()
                    .push(at);
                index.entries.push(LocalizationEntry {
                    file,
                    property,
                    locale: slot.locale.clone(),
                    chain: KeyChain::parse(key),
                });
            }
            index.by_file.insert(file, slot);
        }
        index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> impl Iterator<Item = &LocalizationEntry> {
        self.entries.iter()
    }

    /// All entries with exactly this key, any locale.
    pub fn entries_for<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a LocalizationEntry> + 'a {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    /// First entry for a key in the given locale, optionally within one file.
    pub fn find(
        &self,
        key: &str,
        locale: Option<&str>,
        file: Option<DocId>,
    ) -> Option<&LocalizationEntry> {
        self.entries_for(key).find(|e| {
            e.locale.as_deref() == locale && file.is_none_or(|f| e.file == f)
        })
    }

    /// Entries of one file, in declaration order.
    pub fn entries_in(&self, file: DocId) -> impl Iterator<Item = &LocalizationEntry> {
        self.by_file
            .get(&file)
            .into_iter()
            .flat_map(|f| f.entries.iter())
            .map(|&i| &self.entries[i])
    }

    /// Localization files of a locale, in document order.
    pub fn files(&self, locale: Option<&str>) -> Vec<DocId> {
        self.by_file
            .iter()
            .filter(|(_, f)| f.locale.as_deref() == locale)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Locale of a known localization file.
    ///
    /// `None` for an unknown file, `Some(None)` for a file without a locale.
    pub fn locale_of(&self, file: DocId) -> Option<Option<&str>> {
        self.by_file.get(&file).map(|f| f.locale.as_deref())
    }

    /// Whether a file holds any key equal to `prefix` or continuing it at a token boundary.
    pub fn file_has_prefix(&self, file: DocId, prefix: &str) -> bool {
        self.entries_in(file).any(|e| {
            let key = e.key();
            key == prefix
                || key
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}
