//! Display-string rendering.

use wxstream_provider::{icon, Settings, WeatherReading};

/// Render the display text for a reading: glyph (when one exists), rounded
/// temperature, degree sign, scale letter. Pure function of its inputs.
pub fn render(settings: &Settings, reading: &WeatherReading) -> String {
    let glyph = icon::glyph(&reading.condition);
    if glyph.is_empty() {
        format!("{}°{}", reading.temperature, settings.scale)
    } else {
        format!("{} {}°{}", glyph, reading.temperature, settings.scale)
    }
}
