//! Plugin-based component registry
//!
//! The registry allows resolver, notifier and baseline store backends to be
//! registered dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsdrift_core::registry::ComponentRegistry;
//!
//! let registry = ComponentRegistry::new();
//! registry.register_resolver("hickory", Box::new(HickoryResolverFactory));
//!
//! let resolver = registry.create_resolver(&config.resolver)?;
//! ```
//!
//! Backend crates should register themselves during initialization via a
//! `register()` entry point.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::{NotifierConfig, ResolverConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::traits::{
    BaselineStore, ChangeNotifier, NotifierFactory, RecordResolver, ResolverFactory, StoreFactory,
};

/// Registry of capability backend factories
///
/// ## Thread Safety
///
/// Interior mutability with RwLock: concurrent reads, exclusive writes.
#[derive(Default)]
pub struct ComponentRegistry {
    resolvers: RwLock<HashMap<String, Box<dyn ResolverFactory>>>,
    notifiers: RwLock<HashMap<String, Box<dyn NotifierFactory>>>,
    stores: RwLock<HashMap<String, Box<dyn StoreFactory>>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in backends registered
    ///
    /// Built-ins: "memory" and "file" stores, the "log" notifier.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(crate::store::MemoryStoreFactory));
        registry.register_store("file", Box::new(crate::store::FileStoreFactory));
        registry.register_notifier("log", Box::new(crate::notify::LogNotifierFactory));
        registry
    }

    /// Register a resolver factory
    pub fn register_resolver(&self, name: impl Into<String>, factory: Box<dyn ResolverFactory>) {
        let mut resolvers = self.resolvers.write().unwrap();
        resolvers.insert(name.into(), factory);
    }

    /// Register a notifier factory
    pub fn register_notifier(&self, name: impl Into<String>, factory: Box<dyn NotifierFactory>) {
        let mut notifiers = self.notifiers.write().unwrap();
        notifiers.insert(name.into(), factory);
    }

    /// Register a baseline store factory
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn StoreFactory>) {
        let mut stores = self.stores.write().unwrap();
        stores.insert(name.into(), factory);
    }

    /// Create a resolver from configuration
    pub fn create_resolver(&self, config: &ResolverConfig) -> Result<Box<dyn RecordResolver>> {
        let resolvers = self.resolvers.read().unwrap();
        let factory = resolvers.get(config.type_name()).ok_or_else(|| {
            Error::config(format!("unknown resolver type: {}", config.type_name()))
        })?;
        factory.create(config)
    }

    /// Create a notifier from configuration
    pub fn create_notifier(&self, config: &NotifierConfig) -> Result<Box<dyn ChangeNotifier>> {
        let notifiers = self.notifiers.read().unwrap();
        let factory = notifiers.get(config.type_name()).ok_or_else(|| {
            Error::config(format!("unknown notifier type: {}", config.type_name()))
        })?;
        factory.create(config)
    }

    /// Create a baseline store from configuration
    ///
    /// Returns `None` for the disabled store: the engine then always falls
    /// back to static expected values.
    pub fn create_store(&self, config: &StoreConfig) -> Result<Option<Box<dyn BaselineStore>>> {
        if matches!(config, StoreConfig::Disabled) {
            return Ok(None);
        }

        let stores = self.stores.read().unwrap();
        let factory = stores
            .get(config.type_name())
            .ok_or_else(|| Error::config(format!("unknown store type: {}", config.type_name())))?;
        factory.create(config).map(Some)
    }

    /// List all registered resolver types
    pub fn list_resolvers(&self) -> Vec<String> {
        self.resolvers.read().unwrap().keys().cloned().collect()
    }

    /// List all registered notifier types
    pub fn list_notifiers(&self) -> Vec<String> {
        self.notifiers.read().unwrap().keys().cloned().collect()
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        self.stores.read().unwrap().keys().cloned().collect()
    }

    /// Check if a resolver type is registered
    pub fn has_resolver(&self, name: &str) -> bool {
        self.resolvers.read().unwrap().contains_key(name)
    }

    /// Check if a notifier type is registered
    pub fn has_notifier(&self, name: &str) -> bool {
        self.notifiers.read().unwrap().contains_key(name)
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        self.stores.read().unwrap().contains_key(name)
    }
}
