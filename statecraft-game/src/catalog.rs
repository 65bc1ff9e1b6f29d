//! Compiled-in catalog of authored political events.
use log::warn;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::constants::{MAX_EVENT_OPTIONS, MIN_EVENT_OPTIONS};
use crate::event::Event;
use serde::{Deserialize, Serialize};

const DEFAULT_EVENT_DATA: &str = include_str!("../assets/standard_events.json");

/// Container for the authored event pool.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventCatalog {
    #[serde(default)]
    pub events: Vec<Event>,
}

impl EventCatalog {
    /// Empty catalog, handy in tests.
    #[must_use]
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    /// Parse a catalog from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid event data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.sanitize();
        Ok(catalog)
    }

    /// Build a catalog from pre-parsed events (sanitized the same way the
    /// JSON path is).
    #[must_use]
    pub fn from_events(events: Vec<Event>) -> Self {
        let mut catalog = Self { events };
        catalog.sanitize();
        catalog
    }

    /// Load the compiled-in catalog.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_EVENT_DATA).unwrap_or_default()
    }

    /// Drop entries that cannot be served: duplicate ids keep their first
    /// occurrence, undersized slates are removed, oversized slates are
    /// trimmed to the cap.
    fn sanitize(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        self.events.retain_mut(|event| {
            if !seen.insert(event.id.clone()) {
                warn!("catalog: duplicate id {} dropped", event.id);
                return false;
            }
            if event.options.len() > MAX_EVENT_OPTIONS {
                warn!(
                    "catalog: {} trimmed from {} options",
                    event.id,
                    event.options.len()
                );
                event.options.truncate(MAX_EVENT_OPTIONS);
            }
            if event.options.len() < MIN_EVENT_OPTIONS {
                warn!(
                    "catalog: {} dropped with {} options",
                    event.id,
                    event.options.len()
                );
                return false;
            }
            true
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.id.as_str())
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}

/// Shared compiled-in catalog.
#[must_use]
pub fn catalog() -> &'static EventCatalog {
    static CATALOG: OnceLock<EventCatalog> = OnceLock::new();
    CATALOG.get_or_init(EventCatalog::load_from_static)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Provenance;

    #[test]
    fn compiled_catalog_parses_and_is_populated() {
        let catalog = EventCatalog::load_from_static();
        assert!(
            catalog.len() >= 10,
            "authored pool too small: {}",
            catalog.len()
        );
        for event in &catalog.events {
            assert!(event.has_valid_option_count(), "{} bad slate", event.id);
            assert_eq!(event.provenance, Provenance::Static);
            assert!(!event.title.is_empty());
            assert!(!event.description.is_empty());
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = EventCatalog::load_from_static();
        let mut ids: Vec<&str> = catalog.ids().collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn authored_effects_sit_inside_bounds() {
        let catalog = EventCatalog::load_from_static();
        for event in &catalog.events {
            for option in &event.options {
                assert!(
                    option.effects.is_within_bounds(),
                    "{}: '{}' out of band",
                    event.id,
                    option.text
                );
            }
        }
    }

    #[test]
    fn sanitize_drops_duplicates_and_short_slates() {
        let json = r#"{
            "events": [
                {
                    "id": "a",
                    "title": "A",
                    "description": "first",
                    "options": [
                        { "text": "1" }, { "text": "2" }, { "text": "3" }
                    ]
                },
                {
                    "id": "a",
                    "title": "A again",
                    "description": "dup",
                    "options": [
                        { "text": "1" }, { "text": "2" }, { "text": "3" }
                    ]
                },
                {
                    "id": "b",
                    "title": "B",
                    "description": "short slate",
                    "options": [ { "text": "only" } ]
                }
            ]
        }"#;
        let catalog = EventCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.events[0].title, "A");
    }
}
