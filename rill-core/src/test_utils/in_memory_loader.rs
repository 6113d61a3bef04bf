//! InMemoryLoader: in-process registry of component factories.

use crate::component::{Component, ComponentFactory, ComponentLoader};
use crate::error::LoadError;
use crate::id::ComponentName;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Maps qualified names to factories. Each `load` creates a fresh instance.
pub struct InMemoryLoader {
    factories: RwLock<HashMap<String, Arc<dyn ComponentFactory>>>,
}

impl InMemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) a factory.
    pub fn register(&self, name: impl Into<ComponentName>, factory: Arc<dyn ComponentFactory>) {
        let name = name.into();
        self.factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.0, factory);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for InMemoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentLoader for InMemoryLoader {
    async fn load(&self, name: &ComponentName) -> Result<Arc<dyn Component>, LoadError> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| LoadError::NotFound(name.clone()))?;
        factory.create().map_err(|source| LoadError::Instantiate {
            name: name.clone(),
            source,
        })
    }
}
