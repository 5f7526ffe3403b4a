use std::sync::Arc;

use super::PlaceRegistry;

/// The registry plus the place the user picked.
#[derive(Debug, Clone)]
pub struct Session {
    registry: Arc<PlaceRegistry>,
    current_place: Option<String>,
}

impl Session {
    pub fn new(registry: Arc<PlaceRegistry>) -> Self {
        Self {
            registry,
            current_place: None,
        }
    }

    pub fn registry(&self) -> &PlaceRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<PlaceRegistry> {
        Arc::clone(&self.registry)
    }

    /// Selects `key` if the registry knows it. Returns false and keeps the
    /// previous selection otherwise.
    pub fn set_current_place(&mut self, key: &str) -> bool {
        match self.registry.canonical_key(key) {
            Some(canonical) => {
                self.current_place = Some(canonical.to_string());
                true
            }
            None => {
                log::warn!("Refusing to select unknown place {key:?}");
                false
            }
        }
    }

    pub fn current_place(&self) -> Option<&str> {
        self.current_place.as_deref()
    }
}
