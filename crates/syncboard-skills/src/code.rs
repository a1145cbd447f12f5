use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use syncboard_core::{SyncboardError, SyncboardResult};
use tracing::info;

/// An in-process handler backing a [`syncboard_core::SkillType::Code`] skill.
#[async_trait]
pub trait CodeHandler: Send + Sync {
    async fn run(&self, input: &str) -> SyncboardResult<serde_json::Value>;
}

/// Handlers available to code skills, keyed by the name used in skill config.
#[derive(Default)]
pub struct CodeHandlers {
    handlers: RwLock<HashMap<String, Arc<dyn CodeHandler>>>,
}

impl CodeHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Handler names are unique.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn CodeHandler>,
    ) -> SyncboardResult<()> {
        let name = name.into();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&name) {
            return Err(SyncboardError::Registry(format!(
                "Code handler '{name}' already registered"
            )));
        }
        info!(handler = %name, "Registered code handler");
        handlers.insert(name, handler);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs the named handler on its own task so a panicking handler becomes
    /// an execution error instead of unwinding through the dispatcher.
    pub async fn run(&self, name: &str, input: &str) -> SyncboardResult<serde_json::Value> {
        let handler = self
            .handlers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                SyncboardError::Execution(format!("No code handler registered as '{name}'"))
            })?;

        let input = input.to_string();
        tokio::spawn(async move { handler.run(&input).await })
            .await
            .map_err(|e| SyncboardError::Execution(format!("Code handler '{name}' aborted: {e}")))?
    }
}

/// Returns the input unchanged.
pub struct EchoHandler;

#[async_trait]
impl CodeHandler for EchoHandler {
    async fn run(&self, input: &str) -> SyncboardResult<serde_json::Value> {
        Ok(serde_json::Value::String(input.to_string()))
    }
}

/// Returns the current UTC time; input is ignored.
pub struct ClockHandler;

#[async_trait]
impl CodeHandler for ClockHandler {
    async fn run(&self, _input: &str) -> SyncboardResult<serde_json::Value> {
        Ok(serde_json::json!({ "utc": chrono::Utc::now().to_rfc3339() }))
    }
}

/// Registers the built-in handlers (`echo`, `clock`).
pub fn register_builtins(handlers: &CodeHandlers) -> SyncboardResult<()> {
    handlers.register("echo", Arc::new(EchoHandler))?;
    handlers.register("clock", Arc::new(ClockHandler))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct Panicky;

    #[async_trait]
    impl CodeHandler for Panicky {
        async fn run(&self, _input: &str) -> SyncboardResult<serde_json::Value> {
            panic!("handler bug");
        }
    }

    #[tokio::test]
    async fn test_builtins() {
        let handlers = CodeHandlers::new();
        register_builtins(&handlers).unwrap();
        assert_eq!(handlers.names(), vec!["clock", "echo"]);

        let out = handlers.run("echo", "hi").await.unwrap();
        assert_eq!(out, serde_json::json!("hi"));

        let out = handlers.run("clock", "").await.unwrap();
        assert!(out["utc"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_and_unknown() {
        let handlers = CodeHandlers::new();
        handlers.register("echo", Arc::new(EchoHandler)).unwrap();
        assert!(handlers.register("echo", Arc::new(EchoHandler)).is_err());

        let err = handlers.run("missing", "x").await.unwrap_err();
        assert!(matches!(err, SyncboardError::Execution(_)));
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_error() {
        let handlers = CodeHandlers::new();
        handlers.register("bad", Arc::new(Panicky)).unwrap();
        let err = handlers.run("bad", "x").await.unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }
}
