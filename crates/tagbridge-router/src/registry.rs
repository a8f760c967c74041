//! Registry of loaded controllers.
//!
//! Holds the parsed descriptors in load-submission order and one live
//! implementation per controller name. Loading a name twice merges the
//! implementations instead of replacing them.

use crate::controller::{Controller, ControllerError};
use serde_json::Value;
use std::collections::BTreeMap;
use tagbridge_domain::ControllerDescriptor;
use tracing::debug;

/// Descriptors plus live implementations
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Vec<ControllerDescriptor>,
    controllers: BTreeMap<String, Controller>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor and merge its implementation under the
    /// descriptor's name (last write wins per method)
    pub fn register(&mut self, descriptor: ControllerDescriptor, controller: Controller) {
        match self.controllers.get_mut(&descriptor.name) {
            Some(existing) => {
                debug!(
                    controller = %descriptor.name,
                    methods = controller.len(),
                    "Merging into existing controller"
                );
                existing.merge(controller);
            }
            None => {
                self.controllers.insert(descriptor.name.clone(), controller);
            }
        }
        self.descriptors.push(descriptor);
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> &[ControllerDescriptor] {
        &self.descriptors
    }

    /// Live implementation of a controller
    pub fn controller(&self, name: &str) -> Option<&Controller> {
        self.controllers.get(name)
    }

    /// Controller names in sorted order
    pub fn controller_names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    /// Number of distinct controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Call `controller.method` directly, outside any HTTP chain
    pub async fn call(
        &self,
        controller: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, ControllerError> {
        match self.controller(controller) {
            Some(c) => c.call(method, args).await,
            None => Err(ControllerError::new(format!("No such controller: {}", controller))
                .with_status(404)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str) -> ControllerDescriptor {
        ControllerDescriptor {
            name: name.to_string(),
            description: String::new(),
            methods: Vec::new(),
        }
    }

    #[test]
    fn test_new_registry() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.descriptors().is_empty());
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let mut registry = Registry::new();
        registry.register(
            descriptor("Users"),
            Controller::new().sync_method("count", |_| Ok(json!(3))),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.call("Users", "count", vec![]).await.unwrap(), json!(3));
        assert!(registry.call("Nope", "count", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_same_name_merges() {
        let mut registry = Registry::new();
        registry.register(
            descriptor("Users"),
            Controller::new()
                .sync_method("list", |_| Ok(json!("v1-list")))
                .sync_method("get", |_| Ok(json!("v1-get"))),
        );
        registry.register(
            descriptor("Users"),
            Controller::new().sync_method("get", |_| Ok(json!("v2-get"))),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors().len(), 2);
        assert_eq!(
            registry.controller_names().collect::<Vec<_>>(),
            vec!["Users"]
        );
        assert_eq!(
            registry.call("Users", "list", vec![]).await.unwrap(),
            json!("v1-list")
        );
        assert_eq!(
            registry.call("Users", "get", vec![]).await.unwrap(),
            json!("v2-get")
        );
    }
}
