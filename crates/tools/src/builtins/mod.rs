//! Built-in tools: weather lookup and navigation need a human decision,
//! the calculator runs automatically, and `requestApproval` is a pure
//! yes/no confirmation.

mod approval;
mod calculator;
mod navigation;
mod weather;

pub use approval::{ApprovalArgs, ApprovalResult, ApprovalTool};
pub use calculator::{evaluate, CalculationKind, CalculationStep, CalculatorArgs, CalculatorResult, CalculatorTool};
pub use navigation::{
    NavigationAction, NavigationArgs, NavigationOutcome, NavigationTarget, NavigationTool, Navigator,
};
pub use weather::{ForecastDay, TemperatureUnit, WeatherArgs, WeatherReport, WeatherTool};

use std::sync::Arc;

use crate::registry::ToolRegistry;
use crate::types::Typed;

pub const GET_WEATHER: &str = "getWeather";
pub const CALCULATOR: &str = "calculator";
pub const NAVIGATION_GUIDE: &str = "navigationGuide";
pub const REQUEST_APPROVAL: &str = "requestApproval";

/// Register every built-in tool.  Navigation side effects go through the
/// supplied capability rather than any global hook.
pub fn register_builtins(registry: &mut ToolRegistry, navigator: Arc<dyn Navigator>) {
    registry
        .register_automatic(CALCULATOR, Typed(CalculatorTool::default()))
        .register_confirmed(GET_WEATHER, Typed(WeatherTool::default()))
        .register_confirmed(NAVIGATION_GUIDE, Typed(NavigationTool::new(navigator)))
        .register_confirmed(REQUEST_APPROVAL, Typed(ApprovalTool));
}
