use log::{warn, Level};
use std::str::FromStr;
use web_sys::HtmlElement;

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug // Verbose while running locally
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

/// Tunables for every interaction on the page.
///
/// Defaults match the stock site. Any value can be overridden per page with a
/// `data-*` attribute on `<body>`, e.g. `<body data-scroll-threshold="500">`.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    /// Scroll offset in px past which the back-to-top button shows.
    pub scroll_threshold: f64,
    pub scroll_debounce_ms: u32,
    /// Margin in px used by both reveal strategies.
    pub reveal_offset: f64,
    pub reveal_threshold: f64,
    /// Keep elements revealed once they have been shown.
    pub reveal_once: bool,
    pub counter_threshold: f64,
    /// Number of frames a counter takes to reach its target.
    pub counter_divisor: f64,
    pub notification_visible_ms: u32,
    pub notification_fade_ms: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: 300.0,
            scroll_debounce_ms: 50,
            reveal_offset: 150.0,
            reveal_threshold: 0.1,
            reveal_once: false,
            counter_threshold: 0.5,
            counter_divisor: 200.0,
            notification_visible_ms: 3000,
            notification_fade_ms: 500,
        }
    }
}

impl SiteConfig {
    pub fn from_body(body: &HtmlElement) -> Self {
        let data = body.dataset();
        Self::from_lookup(|key| data.get(key))
    }

    /// Builds a config from a dataset-style lookup (camelCase keys).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            scroll_threshold: parse_override(
                "scrollThreshold",
                lookup("scrollThreshold"),
                defaults.scroll_threshold,
            ),
            reveal_offset: parse_override(
                "revealOffset",
                lookup("revealOffset"),
                defaults.reveal_offset,
            ),
            reveal_once: lookup("revealOnce").map_or(defaults.reveal_once, |v| v != "false"),
            counter_divisor: positive_or_default(
                "counterDivisor",
                parse_override(
                    "counterDivisor",
                    lookup("counterDivisor"),
                    defaults.counter_divisor,
                ),
                defaults.counter_divisor,
            ),
            notification_visible_ms: parse_override(
                "notificationMs",
                lookup("notificationMs"),
                defaults.notification_visible_ms,
            ),
            ..defaults
        }
    }
}

fn parse_override<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid data-{} value {:?}", key, raw);
                default
            }
        },
    }
}

fn positive_or_default(key: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!("data-{} must be a positive number, using {}", key, default);
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> SiteConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SiteConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_stock_site() {
        let config = SiteConfig::default();
        assert_eq!(config.scroll_threshold, 300.0);
        assert_eq!(config.scroll_debounce_ms, 50);
        assert_eq!(config.reveal_offset, 150.0);
        assert_eq!(config.counter_divisor, 200.0);
        assert_eq!(config.notification_visible_ms, 3000);
        assert_eq!(config.notification_fade_ms, 500);
        assert!(!config.reveal_once);
    }

    #[test]
    fn empty_body_gives_defaults() {
        assert_eq!(config_from(&[]), SiteConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("scrollThreshold", "500"),
            ("revealOffset", " 80 "),
            ("notificationMs", "1000"),
            ("revealOnce", ""),
        ]);
        assert_eq!(config.scroll_threshold, 500.0);
        assert_eq!(config.reveal_offset, 80.0);
        assert_eq!(config.notification_visible_ms, 1000);
        assert!(config.reveal_once);
    }

    #[test]
    fn reveal_once_false_is_respected() {
        assert!(!config_from(&[("revealOnce", "false")]).reveal_once);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let config = config_from(&[("scrollThreshold", "lots"), ("notificationMs", "-5")]);
        assert_eq!(config.scroll_threshold, 300.0);
        assert_eq!(config.notification_visible_ms, 3000);
    }

    #[test]
    fn counter_divisor_must_be_positive() {
        assert_eq!(config_from(&[("counterDivisor", "0")]).counter_divisor, 200.0);
        assert_eq!(config_from(&[("counterDivisor", "-3")]).counter_divisor, 200.0);
        assert_eq!(config_from(&[("counterDivisor", "50")]).counter_divisor, 50.0);
    }
}
