//! Capability registry - manages and dispatches tool calls
//!
//! Central hub for registering capabilities and routing invocations to them.
//! The registry is built once at startup and shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::config::FinanceConfig;
use crate::core::{Result, StockBotError, ToolDefinition};
use crate::tools::finance::{PriceLookup, SymbolLookup, YahooFinance};
use crate::tools::schema;

/// An external function the model may ask to run
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name advertised to the model
    fn name(&self) -> &str;

    /// What the capability does, shown to the model
    fn description(&self) -> &str;

    /// JSON Schema for the arguments
    fn input_schema(&self) -> Value;

    /// Run the capability with already-validated arguments
    async fn invoke(&self, arguments: &Value) -> Result<Value>;
}

type Executable = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Capability backed by a closure
pub struct FnCapability {
    name: String,
    description: String,
    input_schema: Value,
    executable: Executable,
}

impl FnCapability {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        executable: F,
    ) -> Self
    where
        F: Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            executable: Arc::new(executable),
        }
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        (self.executable)(arguments.clone()).await
    }
}

struct Entry {
    capability: Arc<dyn Capability>,
    schema: Value,
}

/// Registry of available capabilities
#[derive(Default)]
pub struct CapabilityRegistry {
    /// Entries in registration order
    entries: Vec<Entry>,
    /// Name to position in `entries`
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.name().to_string();
        if self.index.contains_key(&name) {
            return Err(StockBotError::DuplicateCapability(name));
        }

        let schema = capability.input_schema();
        self.index.insert(name, self.entries.len());
        self.entries.push(Entry { capability, schema });
        Ok(())
    }

    /// Create a registry with the Yahoo Finance lookups
    pub fn with_stock_tools(config: &FinanceConfig) -> Result<Self> {
        let finance = Arc::new(YahooFinance::from_config(config)?);
        let mut registry = Self::new();
        registry.register(Arc::new(SymbolLookup::new(finance.clone())))?;
        registry.register(Arc::new(PriceLookup::new(finance)))?;
        Ok(registry)
    }

    /// Register a closure as a capability
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        executable: F,
    ) -> Result<()>
    where
        F: Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnCapability::new(
            name,
            description,
            input_schema,
            executable,
        )))
    }

    /// Descriptors for every capability, in registration order
    pub fn describe_all(&self) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .map(|entry| {
                ToolDefinition::function(
                    entry.capability.name(),
                    entry.capability.description(),
                    entry.schema.clone(),
                )
            })
            .collect()
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.capability.name()).collect()
    }

    /// Check whether a capability is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the arguments, then run the capability.
    ///
    /// Errors raised by the capability itself come back as `ExecutionFailure`.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<Value> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| StockBotError::UnknownCapability(name.to_string()))?;

        schema::validate(&entry.schema, arguments)
            .map_err(|reason| StockBotError::invalid_arguments(name, reason))?;

        tracing::debug!(capability = name, %arguments, "Invoking capability");

        entry.capability.invoke(arguments).await.map_err(|e| match e {
            StockBotError::ExecutionFailure { .. } => e,
            other => StockBotError::execution(name, other.to_string()),
        })
    }
}
