//! Controller module - the named route group derived from one source unit

use crate::route::RouteDescriptor;
use serde::Serialize;

/// Named group of route descriptors.
///
/// Built once per loaded source unit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerDescriptor {
    /// Controller name from the module-identity tag
    pub name: String,

    /// Description of the module-identity record
    pub description: String,

    /// Routes in documentation order
    pub methods: Vec<RouteDescriptor>,
}

impl ControllerDescriptor {
    /// Look up a route by method name
    pub fn method(&self, name: &str) -> Option<&RouteDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}
