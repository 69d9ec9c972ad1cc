use crate::error::Result;
use reqwest::Client;
use serde::Deserialize;

/// Default forecast source (open-meteo-shaped API).
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Moscow, the sheet's fixed header location.
pub const DEFAULT_LATITUDE: f64 = 55.7558;
pub const DEFAULT_LONGITUDE: f64 = 37.6173;

/// Current conditions for the sheet header. `unavailable()` is the
/// degraded form shown when the collaborator cannot be reached.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature: String,
    pub condition: String,
}

impl WeatherReport {
    pub fn unavailable() -> Self {
        Self {
            temperature: "N/A".to_string(),
            condition: "N/A".to_string(),
        }
    }
}

/// Fixed WMO code to description table; unrecognized codes map to "unknown".
pub fn describe_weather_code(code: u64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Partly cloudy",
        2 => "Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime fog",
        51 => "Light drizzle",
        53 => "Drizzle",
        55 => "Heavy drizzle",
        61 => "Light rain",
        63 => "Rain",
        65 => "Heavy rain",
        71 => "Light snowfall",
        73 => "Snowfall",
        75 => "Heavy snowfall",
        95 => "Thunderstorm",
        96 => "Thunderstorm with hail",
        _ => "unknown",
    }
}

pub struct WeatherClient {
    base_url: String,
    latitude: f64,
    longitude: f64,
    client: Client,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            latitude,
            longitude,
            client: Client::new(),
        }
    }

    pub async fn current(&self) -> Result<WeatherReport> {
        let url = format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,weathercode",
            self.base_url, self.latitude, self.longitude
        );
        let response: ForecastResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(WeatherReport {
            temperature: format!("{:.1}", response.current.temperature_2m),
            condition: describe_weather_code(response.current.weathercode).to_string(),
        })
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER_API_URL, DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }
}

// Internal response types
#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    weathercode: u64,
}
