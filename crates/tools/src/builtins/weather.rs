//! Simulated weather lookup.  There is no upstream service; readings come
//! from a fixed city table and unknown cities report Taipei's weather.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::types::{ToolContext, ToolError, TypedTool};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    fn convert(self, celsius: i32) -> i32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherArgs {
    pub location: String,
    #[serde(default)]
    pub unit: TemperatureUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub day: String,
    pub high: i32,
    pub low: i32,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    pub temperature: i32,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: u8,
    pub icon: String,
    pub forecast: Vec<ForecastDay>,
    pub execution_time_ms: u64,
}

struct Reading {
    temp_c: i32,
    description: &'static str,
    humidity: u8,
    wind: u8,
    icon: &'static str,
}

const TAIPEI: Reading = Reading {
    temp_c: 25,
    description: "Partly cloudy",
    humidity: 65,
    wind: 12,
    icon: "partly-cloudy",
};

fn lookup(location: &str) -> &'static Reading {
    const TOKYO: Reading = Reading {
        temp_c: 18,
        description: "Sunny",
        humidity: 55,
        wind: 8,
        icon: "sunny",
    };
    const NEW_YORK: Reading = Reading {
        temp_c: 12,
        description: "Light rain",
        humidity: 80,
        wind: 15,
        icon: "rainy",
    };
    const LONDON: Reading = Reading {
        temp_c: 8,
        description: "Overcast",
        humidity: 75,
        wind: 10,
        icon: "cloudy",
    };
    const PARIS: Reading = Reading {
        temp_c: 15,
        description: "Sunny",
        humidity: 60,
        wind: 6,
        icon: "sunny",
    };

    match location.trim().to_lowercase().as_str() {
        "tokyo" | "東京" => &TOKYO,
        "new york" | "紐約" => &NEW_YORK,
        "london" | "倫敦" => &LONDON,
        "paris" | "巴黎" => &PARIS,
        _ => &TAIPEI,
    }
}

/// Weather lookup with an optional artificial delay.
#[derive(Debug, Clone, Default)]
pub struct WeatherTool {
    latency: Duration,
}

impl WeatherTool {
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn report(&self, args: &WeatherArgs) -> WeatherReport {
        let reading = lookup(&args.location);
        let temperature = args.unit.convert(reading.temp_c);

        WeatherReport {
            location: args.location.clone(),
            temperature,
            description: reading.description.into(),
            humidity: reading.humidity,
            wind_speed: reading.wind,
            icon: reading.icon.into(),
            forecast: vec![
                ForecastDay {
                    day: "Today".into(),
                    high: temperature + 3,
                    low: temperature - 5,
                    description: reading.description.into(),
                    icon: reading.icon.into(),
                },
                ForecastDay {
                    day: "Tomorrow".into(),
                    high: temperature + 1,
                    low: temperature - 3,
                    description: "Sunny".into(),
                    icon: "sunny".into(),
                },
                ForecastDay {
                    day: "Day after tomorrow".into(),
                    high: temperature - 2,
                    low: temperature - 8,
                    description: "Cloudy".into(),
                    icon: "cloudy".into(),
                },
            ],
            execution_time_ms: 0,
        }
    }
}

#[async_trait::async_trait]
impl TypedTool for WeatherTool {
    type Args = WeatherArgs;
    type Output = WeatherReport;

    async fn run(&self, ctx: &ToolContext, args: WeatherArgs) -> Result<WeatherReport, ToolError> {
        if args.location.trim().is_empty() {
            return Err(ToolError::InvalidArgs("location must not be empty".into()));
        }
        let started = Instant::now();

        if !self.latency.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.latency) => {}
                _ = ctx.cancel.cancelled() => {
                    return Err(ToolError::Failed("weather lookup cancelled".into()));
                }
            }
        }

        let mut report = self.report(&args);
        report.execution_time_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(location = %args.location, unit = ?args.unit, "weather lookup");
        Ok(report)
    }
}
