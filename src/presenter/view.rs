//! Render decisions and the view model handed to the feed surface

use serde::{Deserialize, Serialize};

use super::state::FailureKind;
use crate::messaging::{CachedRecords, MissingReason};
use crate::model::{Settings, ThumbnailVariant, VideoRecord};
use crate::utils::constants::WATCH_URL_PREFIX;

/// Display ordering; a presentation policy, never stored with the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelfOrder {
    /// Reverse source order; the source appends newest items at the end
    #[default]
    NewestFirst,
    SourceOrder,
}

/// Apply ordering, then truncate to `count`
pub fn select_for_display(records: &[VideoRecord], order: ShelfOrder, count: u32) -> Vec<VideoRecord> {
    let take = count as usize;
    match order {
        ShelfOrder::NewestFirst => records.iter().rev().take(take).cloned().collect(),
        ShelfOrder::SourceOrder => records.iter().take(take).cloned().collect(),
    }
}

/// Outcome of the "container ready" decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    FirstRun,
    Empty,
    /// Confirmed empty with the empty state switched off
    Nothing,
    Content(Vec<VideoRecord>),
}

pub fn decide(reply: &CachedRecords, settings: &Settings, order: ShelfOrder) -> RenderDecision {
    let empty = || {
        if settings.show_empty_state {
            RenderDecision::Empty
        } else {
            RenderDecision::Nothing
        }
    };

    match reply {
        CachedRecords::Found { records, .. } if records.is_empty() => empty(),
        CachedRecords::Found { records, .. } => RenderDecision::Content(select_for_display(
            records,
            order,
            settings.display_count,
        )),
        // A stale confirmed-empty entry is still the confirmed-empty marker
        CachedRecords::Missing {
            reason: MissingReason::Stale,
            last_known: Some(entry),
        } if entry.is_confirmed_empty() => empty(),
        CachedRecords::Missing { .. } => RenderDecision::FirstRun,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfItem {
    pub id: String,
    pub title: String,
    pub owner_name: String,
    pub duration_label: Option<String>,
    pub thumbnail: String,
    pub href: String,
}

impl ShelfItem {
    pub fn from_record(record: &VideoRecord, variant: ThumbnailVariant) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            owner_name: record.owner_name.clone(),
            duration_label: record.duration_label.clone(),
            thumbnail: record.thumbnail_for(variant).to_string(),
            href: format!("{}{}", WATCH_URL_PREFIX, record.id),
        }
    }
}

/// Everything the surface needs to paint the shelf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShelfView {
    Content {
        items: Vec<ShelfItem>,
        variant: ThumbnailVariant,
    },
    Empty,
    FirstRun {
        source_url: String,
    },
    Error {
        failure: FailureKind,
        message: String,
    },
}

impl ShelfView {
    pub fn content(records: &[VideoRecord], variant: ThumbnailVariant) -> Self {
        ShelfView::Content {
            items: records
                .iter()
                .map(|r| ShelfItem::from_record(r, variant))
                .collect(),
            variant,
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            ShelfView::Content { items, .. } => items.len(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CacheEntry, CacheOrigin};

    fn records(n: usize) -> Vec<VideoRecord> {
        (0..n)
            .map(|i| VideoRecord {
                id: i.to_string(),
                title: format!("Video {i}"),
                owner_name: "Owner".into(),
                owner_id: None,
                duration_label: None,
                thumbnail_low_res: "l".into(),
                thumbnail_mid_res: "m".into(),
                thumbnail_high_res: "h".into(),
            })
            .collect()
    }

    fn ids(records: &[VideoRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn newest_first_reverses_then_truncates() {
        let shown = select_for_display(&records(5), ShelfOrder::NewestFirst, 3);
        assert_eq!(ids(&shown), ["4", "3", "2"]);

        let shown = select_for_display(&records(5), ShelfOrder::SourceOrder, 3);
        assert_eq!(ids(&shown), ["0", "1", "2"]);

        let shown = select_for_display(&records(2), ShelfOrder::NewestFirst, 10);
        assert_eq!(ids(&shown), ["1", "0"]);
    }

    #[test]
    fn decision_table() {
        let settings = Settings {
            display_count: 3,
            ..Settings::default()
        };
        let found = |records| CachedRecords::Found {
            records,
            captured_at: 0,
            display_count: 3,
        };

        assert_eq!(
            decide(
                &CachedRecords::Missing {
                    reason: MissingReason::NoData,
                    last_known: None
                },
                &settings,
                ShelfOrder::NewestFirst
            ),
            RenderDecision::FirstRun
        );
        assert_eq!(
            decide(&found(vec![]), &settings, ShelfOrder::NewestFirst),
            RenderDecision::Empty
        );

        let quiet = Settings {
            show_empty_state: false,
            ..settings.clone()
        };
        assert_eq!(
            decide(&found(vec![]), &quiet, ShelfOrder::NewestFirst),
            RenderDecision::Nothing
        );

        match decide(&found(records(5)), &settings, ShelfOrder::NewestFirst) {
            RenderDecision::Content(shown) => assert_eq!(ids(&shown), ["4", "3", "2"]),
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn stale_entries_split_on_confirmed_empty() {
        let settings = Settings::default();
        let stale = |records| CachedRecords::Missing {
            reason: MissingReason::Stale,
            last_known: Some(CacheEntry {
                records,
                captured_at: 0,
                origin: CacheOrigin::Scraped,
            }),
        };
        assert_eq!(
            decide(&stale(records(2)), &settings, ShelfOrder::NewestFirst),
            RenderDecision::FirstRun
        );
        assert_eq!(
            decide(&stale(vec![]), &settings, ShelfOrder::NewestFirst),
            RenderDecision::Empty
        );
    }

    #[test]
    fn view_serializes_with_kind_tag() {
        let view = ShelfView::content(&records(1), ThumbnailVariant::Large);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "content");
        assert_eq!(json["items"][0]["thumbnail"], "h");
        assert!(json["items"][0]["href"].as_str().unwrap().ends_with("v=0"));
        assert_eq!(view.item_count(), 1);
    }
}
