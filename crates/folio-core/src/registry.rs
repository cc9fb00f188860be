// Folio Core - Flow registry
//
// Populated once by an explicit bootstrap and then shared read-only. Defining
// a flow needs `&mut self`, so once the registry sits behind an `Arc` no
// further registration is possible.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{FlowError, FlowResult};
use crate::flow::{Flow, FlowDefinition};
use crate::model::Model;

/// Registry of defined flows, keyed by unique name
pub struct FlowRegistry {
    model: Arc<dyn Model>,
    flows: BTreeMap<String, Arc<Flow>>,
}

impl std::fmt::Debug for FlowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowRegistry")
            .field("model", &self.model.name())
            .field("flows", &self.flows.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FlowRegistry {
    /// Empty registry whose flows will call `model`
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            flows: BTreeMap::new(),
        }
    }

    /// Build a registry from a fixed list of definitions
    pub fn from_definitions(
        model: Arc<dyn Model>,
        definitions: impl IntoIterator<Item = FlowDefinition>,
    ) -> FlowResult<Self> {
        let mut registry = Self::new(model);
        for definition in definitions {
            registry.define(definition)?;
        }
        Ok(registry)
    }

    /// Register a flow under its unique name
    pub fn define(&mut self, definition: FlowDefinition) -> FlowResult<Arc<Flow>> {
        if self.flows.contains_key(&definition.name) {
            return Err(FlowError::DuplicateFlowName(definition.name));
        }

        let flow = Arc::new(Flow::new(definition, self.model.clone())?);
        let name = flow.name().to_string();
        debug!("Defined flow: {}", name);
        self.flows.insert(name, flow.clone());
        Ok(flow)
    }

    /// Resolve a flow by name
    pub fn lookup(&self, name: &str) -> FlowResult<Arc<Flow>> {
        self.flows
            .get(name)
            .cloned()
            .ok_or_else(|| FlowError::NotFound(name.to_string()))
    }

    /// Flow names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.flows.keys().map(|s| s.as_str()).collect()
    }

    /// All flows, sorted by name
    pub fn flows(&self) -> Vec<Arc<Flow>> {
        self.flows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }
}
