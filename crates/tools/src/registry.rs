//! Tool registry: maps tool names to executors and records whether each
//! one runs automatically or only after a human approves it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::ToolExecutor;

/// How a registered executor may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// Run as soon as the model emits the call.
    Automatic,
    /// Run only when a confirmation surface approves the call.
    RequiresConfirmation,
}

/// A registered executor together with its policy.
#[derive(Clone)]
pub struct RegisteredTool {
    pub executor: Arc<dyn ToolExecutor>,
    pub policy: ExecutionPolicy,
}

/// Registry of tool executors.
///
/// # Usage
///
/// ```rust,no_run
/// # use pl_tools::{ToolRegistry, Typed};
/// # use pl_tools::builtins::CalculatorTool;
/// let mut reg = ToolRegistry::new();
/// reg.register_automatic("calculator", Typed(CalculatorTool::default()));
/// assert!(!reg.requires_confirmation("calculator"));
/// assert!(reg.requires_confirmation("getWeather"));
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor that runs without human involvement.
    ///
    /// The name is normalized to lowercase so lookups are case-insensitive.
    pub fn register_automatic<T: ToolExecutor>(
        &mut self,
        name: impl Into<String>,
        tool: T,
    ) -> &mut Self {
        self.register_boxed(name, Arc::new(tool), ExecutionPolicy::Automatic)
    }

    /// Register an executor that only runs after approval.
    pub fn register_confirmed<T: ToolExecutor>(
        &mut self,
        name: impl Into<String>,
        tool: T,
    ) -> &mut Self {
        self.register_boxed(name, Arc::new(tool), ExecutionPolicy::RequiresConfirmation)
    }

    /// Register a pre-wrapped executor with an explicit policy.
    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        executor: Arc<dyn ToolExecutor>,
        policy: ExecutionPolicy,
    ) -> &mut Self {
        self.tools.insert(
            name.into().to_ascii_lowercase(),
            RegisteredTool { executor, policy },
        );
        self
    }

    /// Look up a tool by name (case-insensitive).
    pub fn get(&self, tool_name: &str) -> Option<RegisteredTool> {
        self.tools.get(&tool_name.to_ascii_lowercase()).cloned()
    }

    /// The automatic executor for `tool_name`, if one is registered.
    pub fn automatic_executor(&self, tool_name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.get(tool_name)
            .filter(|t| t.policy == ExecutionPolicy::Automatic)
            .map(|t| t.executor)
    }

    /// A call needs a human decision whenever no automatic executor exists,
    /// including for names nothing is registered under.
    pub fn requires_confirmation(&self, tool_name: &str) -> bool {
        self.automatic_executor(tool_name).is_none()
    }

    /// All registered tool names (sorted, lowercase).
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}
