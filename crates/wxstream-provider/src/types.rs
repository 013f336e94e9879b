use serde::{Deserialize, Serialize};
use wxstream_core::{DefaultSettings, Provider, Scale};

/// Settings for one subscriber, fixed for the duration of a refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub city: String,
    pub scale: Scale,
    pub provider: Provider,
}

/// Subscriber settings snapshot as the host delivers it; any field may be
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSettings {
    pub city: Option<String>,
    pub scale: Option<Scale>,
    pub provider: Option<Provider>,
}

impl PartialSettings {
    /// Lenient parse of a raw host snapshot. A snapshot that cannot be
    /// understood degrades to an empty partial, which resolves to the
    /// default profile.
    pub fn from_snapshot(snapshot: &serde_json::Value) -> Self {
        serde_json::from_value(snapshot.clone()).unwrap_or_default()
    }
}

/// Resolve a partial snapshot against the configured default profile.
///
/// If any field is missing the entire profile is substituted; there is no
/// per-field merge.
pub fn resolve_defaults(partial: &PartialSettings, defaults: &DefaultSettings) -> Settings {
    match (&partial.city, partial.scale, partial.provider) {
        (Some(city), Some(scale), Some(provider)) => Settings {
            city: city.clone(),
            scale,
            provider,
        },
        _ => Settings {
            city: defaults.city.clone(),
            scale: defaults.scale,
            provider: defaults.provider,
        },
    }
}

/// Provider-native condition code carried on a reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionCode {
    Yahoo(i64),
    OpenWeatherMap(String),
}

/// Normalized reading from one successful fetch. The temperature is already
/// rounded and already in the subscriber's requested scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: i32,
    pub condition: ConditionCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> DefaultSettings {
        DefaultSettings::default()
    }

    #[test]
    fn test_complete_snapshot_passes_through() {
        let partial = PartialSettings {
            city: Some("Austin, TX".to_string()),
            scale: Some(Scale::F),
            provider: Some(Provider::Yahoo),
        };
        let settings = resolve_defaults(&partial, &defaults());
        assert_eq!(settings.city, "Austin, TX");
        assert_eq!(settings.scale, Scale::F);
        assert_eq!(settings.provider, Provider::Yahoo);
    }

    #[test]
    fn test_missing_city_substitutes_whole_profile() {
        // A partially filled snapshot gets the stock profile, not a merge.
        let partial = PartialSettings {
            city: None,
            scale: Some(Scale::F),
            provider: Some(Provider::Yahoo),
        };
        let settings = resolve_defaults(&partial, &defaults());
        assert_eq!(settings.city, "London, UK");
        assert_eq!(settings.scale, Scale::C);
        assert_eq!(settings.provider, Provider::OpenWeatherMap);
    }

    #[test]
    fn test_empty_snapshot_resolves_to_profile() {
        let settings = resolve_defaults(&PartialSettings::default(), &defaults());
        assert_eq!(settings.city, "London, UK");
        assert_eq!(settings.provider, Provider::OpenWeatherMap);
    }

    #[test]
    fn test_from_snapshot_full() {
        let snapshot = serde_json::json!({
            "city": "Paris, FR",
            "scale": "F",
            "provider": "Yahoo"
        });
        let partial = PartialSettings::from_snapshot(&snapshot);
        assert_eq!(partial.city.as_deref(), Some("Paris, FR"));
        assert_eq!(partial.scale, Some(Scale::F));
        assert_eq!(partial.provider, Some(Provider::Yahoo));
    }

    #[test]
    fn test_from_snapshot_missing_fields() {
        let snapshot = serde_json::json!({ "city": "Paris, FR" });
        let partial = PartialSettings::from_snapshot(&snapshot);
        assert_eq!(partial.city.as_deref(), Some("Paris, FR"));
        assert_eq!(partial.scale, None);
        assert_eq!(partial.provider, None);
    }

    #[test]
    fn test_from_snapshot_garbage_degrades_to_empty() {
        let snapshot = serde_json::json!(["not", "an", "object"]);
        let partial = PartialSettings::from_snapshot(&snapshot);
        assert_eq!(partial, PartialSettings::default());

        let snapshot = serde_json::json!({ "city": 42 });
        let partial = PartialSettings::from_snapshot(&snapshot);
        assert_eq!(partial, PartialSettings::default());
    }

    #[test]
    fn test_reading_serde_round_trip() {
        let reading = WeatherReading {
            temperature: -3,
            condition: ConditionCode::OpenWeatherMap("13n".to_string()),
        };
        let json = serde_json::to_string(&reading).unwrap();
        let back: WeatherReading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reading);
    }
}
