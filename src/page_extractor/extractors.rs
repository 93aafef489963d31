//! Playlist item location and normalization
//!
//! The embedded state is an undocumented, versioned structure owned by the
//! host site. Every path into it lives in this file.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, trace};

use crate::model::VideoRecord;
use crate::utils::constants::THUMBNAIL_URL_TEMPLATE;

#[derive(Debug, Clone, Copy)]
enum Step {
    Key(&'static str),
    Index(usize),
}

use Step::{Index, Key};

const PRIMARY_ITEMS_PATH: &[Step] = &[
    Key("contents"),
    Key("twoColumnBrowseResultsRenderer"),
    Key("tabs"),
    Index(0),
    Key("tabRenderer"),
    Key("content"),
    Key("sectionListRenderer"),
    Key("contents"),
    Index(0),
    Key("itemSectionRenderer"),
    Key("contents"),
    Index(0),
    Key("playlistVideoListRenderer"),
    Key("contents"),
];

const ALTERNATE_ITEMS_PATH: &[Step] = &[
    Key("contents"),
    Key("twoColumnBrowseResultsRenderer"),
    Key("tabs"),
    Index(0),
    Key("tabRenderer"),
    Key("content"),
    Key("richGridRenderer"),
    Key("contents"),
];

fn walk<'a>(root: &'a Value, path: &[Step]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, step| match step {
        Key(key) => node.get(key),
        Index(i) => node.get(i),
    })
}

/// True when the state root carries its populated marker, not just a declaration
pub fn has_populated_marker(root: &Value) -> bool {
    root.get("contents").is_some_and(|c| !c.is_null())
}

/// Locate the raw playlist item array, primary path first
pub fn locate_items(root: &Value) -> Option<&Vec<Value>> {
    if let Some(items) = walk(root, PRIMARY_ITEMS_PATH).and_then(Value::as_array) {
        return Some(items);
    }
    let items = walk(root, ALTERNATE_ITEMS_PATH).and_then(Value::as_array);
    if items.is_some() {
        debug!("Primary item path missing, using alternate path");
    }
    items
}

/// Extract normalized records from the embedded state
///
/// `None` means the item array could not be located. `Some(vec![])` means the
/// playlist is confirmed empty, including when every raw item was malformed.
pub fn extract_records(root: &Value) -> Option<Vec<VideoRecord>> {
    let items = locate_items(root)?;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for item in items {
        match normalize_item(item) {
            Some(record) => {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                } else {
                    trace!("Skipping duplicate id {}", record.id);
                }
            }
            None => dropped += 1,
        }
    }

    trace!(
        "Normalized {} record(s) from {} raw item(s), {} dropped",
        records.len(),
        items.len(),
        dropped
    );
    Some(records)
}

/// Unwrap the renderer object carrying video fields
fn video_renderer(item: &Value) -> Option<&Value> {
    item.get("playlistVideoRenderer")
        .or_else(|| item.get("videoRenderer"))
        .or_else(|| {
            let content = item.get("richItemRenderer")?.get("content")?;
            content
                .get("playlistVideoRenderer")
                .or_else(|| content.get("videoRenderer"))
        })
}

/// Normalize one raw item; `None` for ads, continuations and malformed entries
pub fn normalize_item(item: &Value) -> Option<VideoRecord> {
    let renderer = video_renderer(item)?;

    let id = renderer
        .get("videoId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();
    let title = text_of(renderer.get("title")?).filter(|s| !s.is_empty())?;

    let byline = renderer
        .get("shortBylineText")
        .or_else(|| renderer.get("ownerText"));
    let owner_name = byline.and_then(text_of).unwrap_or_default();
    let owner_id = byline
        .and_then(|b| b.get("runs")?.get(0)?.get("navigationEndpoint"))
        .and_then(|e| e.get("browseEndpoint")?.get("browseId")?.as_str())
        .map(str::to_string);

    let duration_label = renderer
        .get("lengthText")
        .and_then(text_of)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            renderer
                .get("lengthSeconds")
                .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_u64()))
                .map(format_duration)
        });

    let urls: Vec<&str> = renderer
        .get("thumbnail")
        .and_then(|t| t.get("thumbnails"))
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|t| t.get("url").and_then(Value::as_str))
                .filter(|u| !u.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let (low, mid, high) = select_thumbnails(&urls, &id);

    Some(VideoRecord {
        id,
        title,
        owner_name,
        owner_id,
        duration_label,
        thumbnail_low_res: low,
        thumbnail_mid_res: mid,
        thumbnail_high_res: high,
    })
}

/// Text of a `{simpleText}` or `{runs: [{text}]}` node
fn text_of(node: &Value) -> Option<String> {
    if let Some(simple) = node.get("simpleText").and_then(Value::as_str) {
        return Some(simple.trim().to_string());
    }
    let runs = node.get("runs")?.as_array()?;
    let joined: String = runs
        .iter()
        .filter_map(|r| r.get("text").and_then(Value::as_str))
        .collect();
    Some(joined.trim().to_string())
}

/// Low = first, mid = second (or first), high = last
///
/// With no thumbnails at all, the canonical per-id URLs are used.
pub fn select_thumbnails(urls: &[&str], id: &str) -> (String, String, String) {
    match urls {
        [] => (
            canonical_thumbnail(id, "default"),
            canonical_thumbnail(id, "mqdefault"),
            canonical_thumbnail(id, "hqdefault"),
        ),
        [only] => (only.to_string(), only.to_string(), only.to_string()),
        [first, second, ..] => (
            first.to_string(),
            second.to_string(),
            urls[urls.len() - 1].to_string(),
        ),
    }
}

fn canonical_thumbnail(id: &str, name: &str) -> String {
    THUMBNAIL_URL_TEMPLATE
        .replace("{id}", id)
        .replace("{name}", name)
}

fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
