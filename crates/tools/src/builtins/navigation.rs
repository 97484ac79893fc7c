use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{ToolContext, ToolError, TypedTool};

/// Places the assistant may send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTarget {
    Homepage,
    Chat,
    Top,
    Bottom,
    Refresh,
    Demo,
    Dashboard,
    Profile,
    Settings,
    About,
}

/// The kind of side effect a target implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationAction {
    Route,
    Scroll,
    Reload,
}

impl NavigationTarget {
    pub fn label(self) -> &'static str {
        match self {
            Self::Homepage => "home page",
            Self::Chat => "chat",
            Self::Top => "top of the page",
            Self::Bottom => "bottom of the page",
            Self::Refresh => "page refresh",
            Self::Demo => "demo page",
            Self::Dashboard => "dashboard",
            Self::Profile => "profile",
            Self::Settings => "settings",
            Self::About => "about page",
        }
    }

    pub fn action(self) -> NavigationAction {
        match self {
            Self::Chat | Self::Top | Self::Bottom => NavigationAction::Scroll,
            Self::Refresh => NavigationAction::Reload,
            _ => NavigationAction::Route,
        }
    }

    /// Route path for targets that change page.
    pub fn path(self) -> Option<&'static str> {
        match self {
            Self::Homepage => Some("/"),
            Self::Demo => Some("/demo"),
            Self::Dashboard => Some("/demo#dashboard"),
            Self::Profile => Some("/demo#profile"),
            Self::Settings => Some("/demo#settings"),
            Self::About => Some("/demo#about"),
            _ => None,
        }
    }
}

/// Capability that performs the actual navigation.  Supplied by whatever
/// owns the presentation layer and passed in explicitly.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavigationTarget) -> Result<(), String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationArgs {
    pub target: NavigationTarget,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationOutcome {
    pub target: NavigationTarget,
    pub action: NavigationAction,
    pub success: bool,
    pub message: String,
}

pub struct NavigationTool {
    navigator: Arc<dyn Navigator>,
}

impl NavigationTool {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

#[async_trait::async_trait]
impl TypedTool for NavigationTool {
    type Args = NavigationArgs;
    type Output = NavigationOutcome;

    async fn run(&self, _ctx: &ToolContext, args: NavigationArgs) -> Result<NavigationOutcome, ToolError> {
        let target = args.target;
        self.navigator.navigate(target).map_err(|e| {
            tracing::warn!(target_page = ?target, error = %e, "navigation failed");
            ToolError::Failed(e)
        })?;

        let verb = match target.action() {
            NavigationAction::Route => "Navigated to",
            NavigationAction::Scroll => "Scrolled to",
            NavigationAction::Reload => "Triggered",
        };
        Ok(NavigationOutcome {
            target,
            action: target.action(),
            success: true,
            message: format!("{verb} {}", target.label()),
        })
    }
}
