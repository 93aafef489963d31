//! Core data model shared by every page context
//!
//! Records, the cache entry owned by the store, and the user settings with
//! their clamping rules. Persisted shapes use camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lower bound for `Settings::display_count`
pub const DISPLAY_COUNT_MIN: u32 = 3;
/// Upper bound for `Settings::display_count`
pub const DISPLAY_COUNT_MAX: u32 = 10;
/// Lower bound for `Settings::ttl_minutes`
pub const TTL_MINUTES_MIN: u32 = 1;
/// Upper bound for `Settings::ttl_minutes` (one day)
pub const TTL_MINUTES_MAX: u32 = 1440;

/// A single saved video, normalized from the source page
///
/// Identity is `id`; two records with the same id are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_label: Option<String>,
    pub thumbnail_low_res: String,
    pub thumbnail_mid_res: String,
    pub thumbnail_high_res: String,
}

impl VideoRecord {
    /// Thumbnail URL for the configured variant
    pub fn thumbnail_for(&self, variant: ThumbnailVariant) -> &str {
        match variant {
            ThumbnailVariant::Compact => &self.thumbnail_mid_res,
            ThumbnailVariant::Large => &self.thumbnail_high_res,
        }
    }
}

/// Where a cache entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOrigin {
    #[default]
    Scraped,
}

/// The persisted playlist snapshot
///
/// `records` keeps source order. Entries are replaced whole, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub records: Vec<VideoRecord>,
    /// Epoch milliseconds
    pub captured_at: i64,
    #[serde(default)]
    pub origin: CacheOrigin,
}

impl CacheEntry {
    /// Negative when the stamp lies in the future
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.captured_at)
    }

    pub fn is_confirmed_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which thumbnail resolution the shelf renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailVariant {
    #[default]
    Compact,
    Large,
}

/// User settings
///
/// Numeric fields are always inside their bounds: every constructor path goes
/// through [`Settings::apply`] or [`Settings::from_stored`], both of which clamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub display_count: u32,
    pub ttl_minutes: u32,
    pub thumbnail_variant: ThumbnailVariant,
    pub show_empty_state: bool,
    pub auto_refresh_on_visit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            display_count: 5,
            ttl_minutes: 20,
            thumbnail_variant: ThumbnailVariant::Compact,
            show_empty_state: true,
            auto_refresh_on_visit: false,
        }
    }
}

impl Settings {
    /// Merge a partial update over `self`, clamping numeric fields
    pub fn apply(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            enabled: patch.enabled.unwrap_or(self.enabled),
            display_count: patch
                .display_count
                .map(clamp_display_count)
                .unwrap_or_else(|| clamp_display_count(self.display_count as i64)),
            ttl_minutes: patch
                .ttl_minutes
                .map(clamp_ttl_minutes)
                .unwrap_or_else(|| clamp_ttl_minutes(self.ttl_minutes as i64)),
            thumbnail_variant: patch.thumbnail_variant.unwrap_or(self.thumbnail_variant),
            show_empty_state: patch.show_empty_state.unwrap_or(self.show_empty_state),
            auto_refresh_on_visit: patch
                .auto_refresh_on_visit
                .unwrap_or(self.auto_refresh_on_visit),
        }
    }

    /// Build settings from a stored blob, each field falling back to its default
    /// independently when missing or malformed.
    pub fn from_stored(value: &Value) -> Settings {
        Settings::default().apply(&SettingsPatch::from_value(value))
    }

    pub fn ttl_millis(&self) -> i64 {
        self.ttl_minutes as i64 * 60_000
    }
}

/// A partial settings update
///
/// Numeric fields are signed and unbounded so out-of-range input can be
/// clamped instead of rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_variant: Option<ThumbnailVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_empty_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh_on_visit: Option<bool>,
}

impl SettingsPatch {
    /// Lenient per-field read of an arbitrary JSON object
    ///
    /// Unlike `serde_json::from_value`, a single field of the wrong type does not
    /// discard the rest of the object.
    pub fn from_value(value: &Value) -> SettingsPatch {
        let field = |name: &str| value.get(name);
        SettingsPatch {
            enabled: field("enabled").and_then(Value::as_bool),
            display_count: field("displayCount").and_then(as_integer),
            ttl_minutes: field("ttlMinutes").and_then(as_integer),
            thumbnail_variant: field("thumbnailVariant")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            show_empty_state: field("showEmptyState").and_then(Value::as_bool),
            auto_refresh_on_visit: field("autoRefreshOnVisit").and_then(Value::as_bool),
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
}

pub fn clamp_display_count(raw: i64) -> u32 {
    raw.clamp(DISPLAY_COUNT_MIN as i64, DISPLAY_COUNT_MAX as i64) as u32
}

pub fn clamp_ttl_minutes(raw: i64) -> u32 {
    raw.clamp(TTL_MINUTES_MIN as i64, TTL_MINUTES_MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_count_is_clamped_both_ways() {
        let base = Settings::default();
        let high = base.apply(&SettingsPatch {
            display_count: Some(99),
            ..Default::default()
        });
        assert_eq!(high.display_count, 10);

        let low = base.apply(&SettingsPatch {
            display_count: Some(0),
            ..Default::default()
        });
        assert_eq!(low.display_count, 3);
    }

    #[test]
    fn ttl_is_clamped_both_ways() {
        let base = Settings::default();
        for (input, expected) in [(-5, 1), (0, 1), (1, 1), (720, 720), (100_000, 1440)] {
            let s = base.apply(&SettingsPatch {
                ttl_minutes: Some(input),
                ..Default::default()
            });
            assert_eq!(s.ttl_minutes, expected, "input {input}");
        }
    }

    #[test]
    fn stored_settings_fall_back_per_field() {
        let stored = json!({
            "enabled": false,
            "displayCount": "seven",
            "ttlMinutes": 45,
            "legacyFlag": true
        });
        let s = Settings::from_stored(&stored);
        assert!(!s.enabled);
        assert_eq!(s.display_count, Settings::default().display_count);
        assert_eq!(s.ttl_minutes, 45);
        assert_eq!(s.thumbnail_variant, ThumbnailVariant::Compact);
        assert!(s.show_empty_state);
    }

    #[test]
    fn stored_out_of_range_values_are_clamped_on_read() {
        let s = Settings::from_stored(&json!({ "displayCount": 42, "ttlMinutes": 0 }));
        assert_eq!(s.display_count, 10);
        assert_eq!(s.ttl_minutes, 1);
    }

    #[test]
    fn settings_serialize_with_camel_case_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value["displayCount"], 5);
        assert_eq!(value["thumbnailVariant"], "compact");
        assert_eq!(value["autoRefreshOnVisit"], false);
    }

    #[test]
    fn thumbnail_variant_selects_resolution() {
        let record = VideoRecord {
            id: "a".into(),
            title: "A".into(),
            owner_name: "Owner".into(),
            owner_id: None,
            duration_label: None,
            thumbnail_low_res: "low".into(),
            thumbnail_mid_res: "mid".into(),
            thumbnail_high_res: "high".into(),
        };
        assert_eq!(record.thumbnail_for(ThumbnailVariant::Compact), "mid");
        assert_eq!(record.thumbnail_for(ThumbnailVariant::Large), "high");
    }
}
