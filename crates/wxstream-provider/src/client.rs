//! Provider HTTP clients.
//!
//! One upstream GET per fetch; the two success payloads are structurally
//! different and are normalized into a single `WeatherReading`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;
use wxstream_core::{Provider, ProviderConfig, Scale};

use crate::error::FetchError;
use crate::types::{ConditionCode, Settings, WeatherReading};

/// Client for both upstream weather APIs.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    yahoo_url: String,
    openweathermap_url: String,
}

impl WeatherClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            yahoo_url: config.yahoo_url.clone(),
            openweathermap_url: config.openweathermap_url.clone(),
        })
    }

    /// Fetch and normalize the current weather for one subscriber's settings.
    /// Performs exactly one upstream call; retry is the caller's concern.
    #[instrument(skip(self), fields(city = %settings.city, provider = %settings.provider))]
    pub async fn fetch(&self, settings: &Settings) -> Result<WeatherReading, FetchError> {
        let url = self.request_url(settings);
        tracing::debug!(%url, "requesting upstream weather");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UpstreamStatus(status));
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedPayload(format!("invalid JSON: {}", e)))?;

        // Parse path is selected by the configured provider, never by
        // sniffing the payload shape.
        match settings.provider {
            Provider::Yahoo => parse_yahoo(value),
            Provider::OpenWeatherMap => parse_openweathermap(value),
        }
    }

    fn request_url(&self, settings: &Settings) -> String {
        match settings.provider {
            Provider::Yahoo => {
                let yql = format!(
                    "select item.condition from weather.forecast where woeid in (select woeid from geo.places(1) where text=\"{}\") and u='{}'",
                    settings.city, settings.scale
                );
                format!(
                    "{}?q={}&format=json",
                    self.yahoo_url,
                    urlencoding::encode(&yql)
                )
            }
            Provider::OpenWeatherMap => {
                let units = match settings.scale {
                    Scale::F => "imperial",
                    Scale::C => "metric",
                };
                format!(
                    "{}?q={}&units={}&appid={}",
                    self.openweathermap_url,
                    urlencoding::encode(&settings.city),
                    units,
                    self.api_key
                )
            }
        }
    }
}

// YQL serializes temp and code as strings.
#[derive(Debug, Deserialize)]
struct YahooResponse {
    query: Option<YahooQuery>,
}

#[derive(Debug, Deserialize)]
struct YahooQuery {
    results: Option<YahooResults>,
}

#[derive(Debug, Deserialize)]
struct YahooResults {
    channel: Option<YahooChannel>,
}

#[derive(Debug, Deserialize)]
struct YahooChannel {
    item: Option<YahooItem>,
}

#[derive(Debug, Deserialize)]
struct YahooItem {
    condition: Option<YahooCondition>,
}

#[derive(Debug, Deserialize)]
struct YahooCondition {
    temp: String,
    code: String,
}

fn parse_yahoo(value: serde_json::Value) -> Result<WeatherReading, FetchError> {
    let resp: YahooResponse = serde_json::from_value(value)
        .map_err(|e| FetchError::MalformedPayload(format!("unexpected Yahoo payload: {}", e)))?;

    let condition = resp
        .query
        .and_then(|q| q.results)
        .and_then(|r| r.channel)
        .and_then(|c| c.item)
        .and_then(|i| i.condition)
        .ok_or_else(|| {
            FetchError::MalformedPayload("Yahoo payload missing item.condition".to_string())
        })?;

    let temp: f64 = condition.temp.parse().map_err(|_| {
        FetchError::MalformedPayload(format!(
            "Yahoo temperature is not numeric: {:?}",
            condition.temp
        ))
    })?;
    let code: i64 = condition.code.parse().map_err(|_| {
        FetchError::MalformedPayload(format!(
            "Yahoo condition code is not numeric: {:?}",
            condition.code
        ))
    })?;

    Ok(WeatherReading {
        temperature: temp.round() as i32,
        condition: ConditionCode::Yahoo(code),
    })
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    icon: Option<String>,
}

fn parse_openweathermap(value: serde_json::Value) -> Result<WeatherReading, FetchError> {
    let resp: OwmResponse = serde_json::from_value(value).map_err(|e| {
        FetchError::MalformedPayload(format!("unexpected OpenWeatherMap payload: {}", e))
    })?;

    let temp = resp.main.and_then(|m| m.temp).ok_or_else(|| {
        FetchError::MalformedPayload("OpenWeatherMap payload missing main.temp".to_string())
    })?;

    let icon = resp
        .weather
        .into_iter()
        .next()
        .and_then(|w| w.icon)
        .ok_or_else(|| {
            FetchError::MalformedPayload(
                "OpenWeatherMap payload missing weather[0].icon".to_string(),
            )
        })?;

    Ok(WeatherReading {
        temperature: temp.round() as i32,
        condition: ConditionCode::OpenWeatherMap(icon),
    })
}
