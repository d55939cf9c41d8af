//! Source registry.
//!
//! The registry is an ordered list of [`Source`] records persisted as one
//! JSON array under [`SOURCES_KEY`]. Every mutation rewrites the whole blob.

use crate::store::{JsonStoreExt, KeyValueStore, SOURCES_KEY};
use crate::types::{Source, SourceDraft};
use chrono::Utc;
use notebook_core::{AppError, AppResult, MessagesConfig};
use std::sync::Arc;

/// Registry of named sources backed by the shared store.
pub struct SourceRegistry {
    store: Arc<dyn KeyValueStore>,
    sources: Vec<Source>,
    messages: MessagesConfig,
}

impl SourceRegistry {
    /// Open the registry and load the persisted sources.
    pub fn open(store: Arc<dyn KeyValueStore>, messages: MessagesConfig) -> AppResult<Self> {
        let mut registry = Self {
            store,
            sources: Vec::new(),
            messages,
        };
        registry.load()?;
        Ok(registry)
    }

    /// Reload from the store. An absent blob is an empty registry; a
    /// malformed one is an error.
    pub fn load(&mut self) -> AppResult<&[Source]> {
        self.sources = self
            .store
            .get_json::<Vec<Source>>(SOURCES_KEY)?
            .unwrap_or_default();

        tracing::debug!("Loaded {} sources", self.sources.len());
        Ok(&self.sources)
    }

    /// All sources, in insertion order.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Sources flagged for inclusion in the next question.
    pub fn active_sources(&self) -> Vec<Source> {
        active_subset(&self.sources)
    }

    pub fn get(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Append a new active source built from `draft` and persist.
    ///
    /// Returns `AppError::Validation` without touching the registry when the
    /// name or the path is blank. Accepted text is stored as entered.
    pub fn add(&mut self, draft: &SourceDraft) -> AppResult<Source> {
        if draft.name.trim().is_empty() || draft.path.trim().is_empty() {
            tracing::debug!("Rejected source draft with missing name or path");
            return Err(AppError::Validation(self.messages.missing_fields.clone()));
        }

        let content = draft
            .content
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.messages.placeholder_for(&draft.name));

        let source = Source {
            id: self.next_id(),
            name: draft.name.clone(),
            source_type: draft.source_type,
            path: draft.path.clone(),
            content: Some(content),
            is_active: true,
        };

        self.sources.push(source.clone());
        if let Err(e) = self.persist() {
            self.sources.pop();
            return Err(e);
        }

        tracing::info!(id = %source.id, name = %source.name, "Added source");
        Ok(source)
    }

    /// Remove the source with `id` and persist the remainder.
    ///
    /// Returns `false` (and writes nothing) if no such source exists.
    pub fn remove(&mut self, id: &str) -> AppResult<bool> {
        let Some(index) = self.sources.iter().position(|s| s.id == id) else {
            tracing::debug!(id, "Remove requested for unknown source");
            return Ok(false);
        };

        let removed = self.sources.remove(index);
        if let Err(e) = self.persist() {
            self.sources.insert(index, removed);
            return Err(e);
        }

        tracing::info!(id, name = %removed.name, "Removed source");
        Ok(true)
    }

    fn persist(&self) -> AppResult<()> {
        self.store.set_json(SOURCES_KEY, &self.sources)
    }

    /// Millisecond timestamp, bumped past any id already in use.
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }
}

/// Filter `sources` to the active ones, preserving order.
pub fn active_subset(sources: &[Source]) -> Vec<Source> {
    sources.iter().filter(|s| s.is_active).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::SourceType;

    fn registry() -> (Arc<MemoryStore>, SourceRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = SourceRegistry::open(store.clone(), MessagesConfig::default()).unwrap();
        (store, registry)
    }

    fn persisted(store: &MemoryStore) -> Vec<Source> {
        store.get_json(SOURCES_KEY).unwrap().unwrap_or_default()
    }

    #[test]
    fn test_load_absent_blob_is_empty() {
        let (_, registry) = registry();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_malformed_blob_fails() {
        let store = Arc::new(MemoryStore::new());
        store.set(SOURCES_KEY, "{not an array").unwrap();

        let result = SourceRegistry::open(store, MessagesConfig::default());
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_add_appends_and_persists() {
        let (store, mut registry) = registry();

        let first = registry.add(&SourceDraft::new("Policy A", "http://x")).unwrap();
        let second = registry
            .add(&SourceDraft::new("Manual", "/srv/manual.pdf").with_type(SourceType::File))
            .unwrap();

        assert!(first.is_active);
        assert_eq!(first.content.as_deref(), Some("[Training data from Policy A]"));
        assert_ne!(first.id, second.id);

        let names: Vec<_> = registry.sources().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Policy A", "Manual"]);
        assert_eq!(persisted(&store), registry.sources());
        assert_eq!(persisted(&store)[1].source_type, SourceType::File);
    }

    #[test]
    fn test_add_keeps_supplied_content() {
        let (_, mut registry) = registry();
        let source = registry
            .add(&SourceDraft::new("Policy A", "http://x").with_content("Gloves at all times"))
            .unwrap();
        assert_eq!(source.content.as_deref(), Some("Gloves at all times"));
    }

    #[test]
    fn test_add_stores_text_as_entered() {
        let (store, mut registry) = registry();
        let source = registry
            .add(&SourceDraft::new("  Policy A ", " http://x"))
            .unwrap();

        assert_eq!(source.name, "  Policy A ");
        assert_eq!(source.path, " http://x");
        assert_eq!(persisted(&store)[0], source);
    }

    #[test]
    fn test_add_rejects_missing_fields_without_mutation() {
        let (store, mut registry) = registry();
        registry.add(&SourceDraft::new("Policy A", "http://x")).unwrap();
        let before = persisted(&store);
        let mut events = store.subscribe();

        for draft in [
            SourceDraft::new("", "http://y"),
            SourceDraft::new("Policy B", ""),
            SourceDraft::new("   ", "http://y"),
        ] {
            let err = registry.add(&draft).unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), MessagesConfig::default().missing_fields);
        }

        assert_eq!(registry.len(), 1);
        assert_eq!(persisted(&store), before);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_remove_exact_record() {
        let (store, mut registry) = registry();
        let a = registry.add(&SourceDraft::new("A", "http://a")).unwrap();
        let b = registry.add(&SourceDraft::new("B", "http://b")).unwrap();
        let c = registry.add(&SourceDraft::new("C", "http://c")).unwrap();

        assert!(registry.remove(&b.id).unwrap());

        let ids: Vec<_> = registry.sources().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, [a.id, c.id]);
        assert_eq!(persisted(&store), registry.sources());
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let (store, mut registry) = registry();
        registry.add(&SourceDraft::new("A", "http://a")).unwrap();
        let before = persisted(&store);

        assert!(!registry.remove("does-not-exist").unwrap());
        assert_eq!(registry.len(), 1);
        assert_eq!(persisted(&store), before);
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let (_, mut registry) = registry();
        let ids: Vec<_> = (0..20)
            .map(|i| {
                registry
                    .add(&SourceDraft::new(format!("S{}", i), "http://s"))
                    .unwrap()
                    .id
            })
            .collect();

        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_active_subset_preserves_order() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                SOURCES_KEY,
                r#"[
                    {"id":"1","name":"A","type":"url","path":"http://a","isActive":true},
                    {"id":"2","name":"B","type":"url","path":"http://b","isActive":false},
                    {"id":"3","name":"C","type":"file","path":"/c","isActive":true}
                ]"#,
            )
            .unwrap();

        let registry = SourceRegistry::open(store, MessagesConfig::default()).unwrap();
        let ids: Vec<_> = registry.active_sources().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["1", "3"]);
    }
}
