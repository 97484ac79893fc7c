//! Typed view over a tool call's arguments, keyed by tool name.
//!
//! The resolver stays payload-agnostic; confirmation surfaces use
//! [`ToolInvocation`] to show the human what they are approving.

use serde_json::Value;

use crate::builtins::{
    ApprovalArgs, CalculatorArgs, NavigationArgs, WeatherArgs, CALCULATOR, GET_WEATHER,
    NAVIGATION_GUIDE, REQUEST_APPROVAL,
};

#[derive(Debug, Clone)]
pub enum ToolInvocation {
    GetWeather(WeatherArgs),
    Calculator(CalculatorArgs),
    NavigationGuide(NavigationArgs),
    RequestApproval(ApprovalArgs),
    /// Unknown tool, or arguments that do not match the known schema.
    Other { name: String, arguments: Value },
}

impl ToolInvocation {
    pub fn parse(name: &str, arguments: &Value) -> Self {
        fn decode<T: serde::de::DeserializeOwned>(v: &Value) -> Option<T> {
            serde_json::from_value(v.clone()).ok()
        }

        let lower = name.to_ascii_lowercase();
        let typed = if lower == GET_WEATHER.to_ascii_lowercase() {
            decode(arguments).map(Self::GetWeather)
        } else if lower == CALCULATOR {
            decode(arguments).map(Self::Calculator)
        } else if lower == NAVIGATION_GUIDE.to_ascii_lowercase() {
            decode(arguments).map(Self::NavigationGuide)
        } else if lower == REQUEST_APPROVAL.to_ascii_lowercase() {
            decode(arguments).map(Self::RequestApproval)
        } else {
            None
        };

        typed.unwrap_or_else(|| Self::Other {
            name: name.to_string(),
            arguments: arguments.clone(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::GetWeather(_) => GET_WEATHER,
            Self::Calculator(_) => CALCULATOR,
            Self::NavigationGuide(_) => NAVIGATION_GUIDE,
            Self::RequestApproval(_) => REQUEST_APPROVAL,
            Self::Other { name, .. } => name.as_str(),
        }
    }

    /// One-line description for a confirmation prompt.
    pub fn summary(&self) -> String {
        match self {
            Self::GetWeather(a) => format!("Look up the weather in {} ({})", a.location, a.unit.symbol()),
            Self::Calculator(a) => format!("Calculate {}", a.expression),
            Self::NavigationGuide(a) if a.reason.is_empty() => {
                format!("Go to the {}", a.target.label())
            }
            Self::NavigationGuide(a) => format!("Go to the {}: {}", a.target.label(), a.reason),
            Self::RequestApproval(a) => a.message.clone(),
            Self::Other { name, arguments } => format!("Run {name} with {arguments}"),
        }
    }
}
