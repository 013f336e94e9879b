//! Condition-code to display-glyph mapping.
//!
//! Glyphs are code points in the display surface's private-use icon font.
//! The mapping is total: codes outside either table yield the empty string so
//! the temperature still renders without an icon.

use crate::types::ConditionCode;

/// Map a provider-native condition code to its display glyph.
pub fn glyph(condition: &ConditionCode) -> &'static str {
    match condition {
        ConditionCode::Yahoo(code) => yahoo_glyph(*code),
        ConditionCode::OpenWeatherMap(icon) => owm_glyph(icon),
    }
}

fn yahoo_glyph(code: i64) -> &'static str {
    match code {
        0 | 19 | 22..=24 => "\u{e00a}",
        1..=4 | 37..=39 | 45 | 47 => "\u{e011}",
        5..=7 | 18 | 35 => "\u{e00e}",
        8..=10 | 17 => "\u{e00d}",
        11 | 12 | 40 => "\u{e00b}",
        13..=16 | 41..=43 | 46 => "\u{e00f}",
        20 | 21 => "\u{e009}",
        26..=28 => "\u{e008}",
        29 | 30 | 44 => "\u{e006}",
        31 | 33 => "\u{e005}",
        32 | 34 | 36 => "\u{e004}",
        // 25 (cold) and 3200 (not available) have no glyph
        _ => "",
    }
}

fn owm_glyph(icon: &str) -> &'static str {
    match icon {
        "01d" | "01n" | "02d" | "02n" => "\u{e004}",
        "03d" | "03n" | "04d" | "04n" => "\u{e008}",
        "09d" | "09n" | "10d" | "10n" => "\u{e00b}",
        "11d" | "11n" => "\u{e011}",
        "13d" | "13n" => "\u{e00f}",
        "50d" | "50n" => "\u{e009}",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yahoo(code: i64) -> ConditionCode {
        ConditionCode::Yahoo(code)
    }

    fn owm(icon: &str) -> ConditionCode {
        ConditionCode::OpenWeatherMap(icon.to_string())
    }

    #[test]
    fn test_yahoo_sunny_family() {
        assert_eq!(glyph(&yahoo(32)), "\u{e004}");
        assert_eq!(glyph(&yahoo(34)), "\u{e004}");
        assert_eq!(glyph(&yahoo(36)), "\u{e004}");
        assert_eq!(glyph(&yahoo(31)), "\u{e005}");
        assert_eq!(glyph(&yahoo(33)), "\u{e005}");
    }

    #[test]
    fn test_yahoo_cloud_family() {
        assert_eq!(glyph(&yahoo(26)), "\u{e008}");
        assert_eq!(glyph(&yahoo(28)), "\u{e008}");
        assert_eq!(glyph(&yahoo(29)), "\u{e006}");
        assert_eq!(glyph(&yahoo(30)), "\u{e006}");
        assert_eq!(glyph(&yahoo(44)), "\u{e006}");
    }

    #[test]
    fn test_yahoo_precipitation_family() {
        assert_eq!(glyph(&yahoo(11)), "\u{e00b}");
        assert_eq!(glyph(&yahoo(40)), "\u{e00b}");
        assert_eq!(glyph(&yahoo(13)), "\u{e00f}");
        assert_eq!(glyph(&yahoo(16)), "\u{e00f}");
        assert_eq!(glyph(&yahoo(43)), "\u{e00f}");
        assert_eq!(glyph(&yahoo(46)), "\u{e00f}");
        assert_eq!(glyph(&yahoo(5)), "\u{e00e}");
        assert_eq!(glyph(&yahoo(18)), "\u{e00e}");
        assert_eq!(glyph(&yahoo(35)), "\u{e00e}");
        assert_eq!(glyph(&yahoo(8)), "\u{e00d}");
        assert_eq!(glyph(&yahoo(17)), "\u{e00d}");
    }

    #[test]
    fn test_yahoo_storm_and_wind_family() {
        assert_eq!(glyph(&yahoo(0)), "\u{e00a}");
        assert_eq!(glyph(&yahoo(19)), "\u{e00a}");
        assert_eq!(glyph(&yahoo(24)), "\u{e00a}");
        assert_eq!(glyph(&yahoo(1)), "\u{e011}");
        assert_eq!(glyph(&yahoo(4)), "\u{e011}");
        assert_eq!(glyph(&yahoo(37)), "\u{e011}");
        assert_eq!(glyph(&yahoo(45)), "\u{e011}");
        assert_eq!(glyph(&yahoo(47)), "\u{e011}");
        assert_eq!(glyph(&yahoo(20)), "\u{e009}");
        assert_eq!(glyph(&yahoo(21)), "\u{e009}");
    }

    #[test]
    fn test_yahoo_codes_without_glyph() {
        assert_eq!(glyph(&yahoo(25)), "");
        assert_eq!(glyph(&yahoo(3200)), "");
        assert_eq!(glyph(&yahoo(48)), "");
        assert_eq!(glyph(&yahoo(-1)), "");
        assert_eq!(glyph(&yahoo(9999)), "");
    }

    #[test]
    fn test_owm_day_and_night_pairs() {
        assert_eq!(glyph(&owm("01d")), "\u{e004}");
        assert_eq!(glyph(&owm("01n")), "\u{e004}");
        assert_eq!(glyph(&owm("02n")), "\u{e004}");
        assert_eq!(glyph(&owm("03d")), "\u{e008}");
        assert_eq!(glyph(&owm("04n")), "\u{e008}");
        assert_eq!(glyph(&owm("09d")), "\u{e00b}");
        assert_eq!(glyph(&owm("10n")), "\u{e00b}");
        assert_eq!(glyph(&owm("11d")), "\u{e011}");
        assert_eq!(glyph(&owm("13n")), "\u{e00f}");
        assert_eq!(glyph(&owm("50d")), "\u{e009}");
    }

    #[test]
    fn test_owm_unknown_codes() {
        assert_eq!(glyph(&owm("")), "");
        assert_eq!(glyph(&owm("01x")), "");
        assert_eq!(glyph(&owm("99d")), "");
        assert_eq!(glyph(&owm("snow")), "");
    }
}
