//! JavaScript evaluated inside the feed page
//!
//! [`FEED_HOOKS`] installs `window.__playlistShelfFeed` once per document: the
//! shelf painter, focus and scroll helpers, and a queue that collects key
//! presses, retry clicks and shelf removals until Rust drains it.

use serde::{Deserialize, Serialize};

/// Installer; called with the hook configuration, returns the hook object
const FEED_HOOKS: &str = r#"function (cfg) {
    const existing = window.__playlistShelfFeed;
    if (existing && existing.shelfId === cfg.shelfId) { return existing; }

    const feed = { shelfId: cfg.shelfId, queue: [], rendered: false };
    const push = (event) => { if (feed.queue.length < 256) { feed.queue.push(event); } };
    const el = (tag, className, text) => {
        const node = document.createElement(tag);
        if (className) { node.className = className; }
        if (text !== undefined && text !== null) { node.textContent = text; }
        return node;
    };

    feed.shelf = () => document.getElementById(cfg.shelfId);
    feed.scroller = () => {
        const shelf = feed.shelf();
        return shelf ? shelf.querySelector('.playlist-shelf__items') : null;
    };
    feed.items = () => {
        const scroller = feed.scroller();
        return scroller ? Array.from(scroller.querySelectorAll('.playlist-shelf__item')) : [];
    };

    feed.clear = () => {
        feed.rendered = false;
        const shelf = feed.shelf();
        if (shelf) { shelf.remove(); }
        return true;
    };

    feed.paint = (view) => {
        const container = document.querySelector(cfg.container);
        if (!container || !container.parentElement) { return false; }
        feed.clear();

        const shelf = el('section', 'playlist-shelf playlist-shelf--' + view.kind);
        shelf.id = cfg.shelfId;
        shelf.appendChild(el('h2', 'playlist-shelf__heading', cfg.heading));

        if (view.kind === 'content') {
            const list = el('ul', 'playlist-shelf__items');
            list.style.display = 'flex';
            list.style.overflowX = 'auto';
            list.style.position = 'relative';
            view.items.forEach((item, index) => {
                const entry = el('li', 'playlist-shelf__item');
                const link = el('a', 'playlist-shelf__link');
                link.href = item.href;
                link.tabIndex = index === 0 ? 0 : -1;
                const thumb = el('img', 'playlist-shelf__thumb');
                thumb.src = item.thumbnail;
                thumb.alt = '';
                thumb.loading = 'lazy';
                link.append(thumb, el('span', 'playlist-shelf__title', item.title),
                    el('span', 'playlist-shelf__owner', item.owner_name));
                if (item.duration_label) {
                    link.appendChild(el('span', 'playlist-shelf__duration', item.duration_label));
                }
                entry.appendChild(link);
                list.appendChild(entry);
            });
            shelf.appendChild(list);
        } else if (view.kind === 'empty') {
            shelf.appendChild(el('p', 'playlist-shelf__note', cfg.emptyText));
        } else if (view.kind === 'first_run') {
            shelf.appendChild(el('p', 'playlist-shelf__note', cfg.firstRunText));
            const link = el('a', 'playlist-shelf__source', cfg.firstRunLink);
            link.href = view.source_url;
            shelf.appendChild(link);
        } else if (view.kind === 'error') {
            shelf.appendChild(el('p', 'playlist-shelf__error', view.message));
            const retry = el('button', 'playlist-shelf__retry', cfg.retryText);
            retry.type = 'button';
            retry.addEventListener('click', () => push({ type: 'retry' }));
            shelf.appendChild(retry);
        }

        container.parentElement.insertBefore(shelf, container);
        feed.rendered = true;
        return true;
    };

    feed.focusItem = (index) => {
        const items = feed.items();
        if (!items[index]) { return false; }
        items.forEach((item, i) => {
            const link = item.querySelector('a');
            if (link) { link.tabIndex = i === index ? 0 : -1; }
        });
        const target = items[index].querySelector('a') || items[index];
        target.focus({ preventScroll: true });
        return true;
    };

    feed.itemSpan = (index) => {
        const item = feed.items()[index];
        if (!item) { return null; }
        return { start: item.offsetLeft, end: item.offsetLeft + item.offsetWidth };
    };

    feed.viewport = () => {
        const scroller = feed.scroller();
        if (!scroller) { return null; }
        return { start: scroller.scrollLeft, end: scroller.scrollLeft + scroller.clientWidth };
    };

    feed.scrollTo = (offset) => {
        const scroller = feed.scroller();
        if (!scroller) { return false; }
        scroller.scrollLeft = offset;
        return true;
    };

    feed.drain = () => feed.queue.splice(0, feed.queue.length);

    document.addEventListener('keydown', (event) => {
        const shelf = feed.shelf();
        if (!shelf || !shelf.contains(document.activeElement)) { return; }
        if (['ArrowLeft', 'ArrowRight', 'Home', 'End'].includes(event.key)) {
            event.preventDefault();
            push({ type: 'key', key: event.key });
        }
    }, true);

    feed.observer = new MutationObserver(() => {
        if (feed.rendered && !feed.shelf()) {
            feed.rendered = false;
            push({ type: 'removed' });
        }
    });
    feed.observer.observe(document.body, { childList: true, subtree: true });

    window.__playlistShelfFeed = feed;
    return feed;
}"#;

/// Values baked into the installed hooks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HookConfig {
    pub shelf_id: String,
    pub container: String,
    pub heading: &'static str,
    pub empty_text: &'static str,
    pub first_run_text: &'static str,
    pub first_run_link: &'static str,
    pub retry_text: &'static str,
}

impl HookConfig {
    pub fn new(shelf_id: &str, container: &str) -> Self {
        Self {
            shelf_id: shelf_id.to_string(),
            container: container.to_string(),
            heading: "Watch later",
            empty_text: "Your Watch later playlist is empty.",
            first_run_text: "Open your Watch later playlist once to fill this shelf.",
            first_run_link: "Open Watch later",
            retry_text: "Retry",
        }
    }
}

/// Script that installs the hooks if needed, then evaluates `call` with `feed` bound
pub(super) fn feed_call(config_json: &str, call: &str) -> String {
    format!("(() => {{ const feed = ({FEED_HOOKS})({config_json}); return {call}; }})()")
}

/// Entries drained from the page-side queue
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum PageEvent {
    Key { key: String },
    Retry,
    Removed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_embeds_config_and_expression() {
        let config = serde_json::to_string(&HookConfig::new("shelf", "#contents")).unwrap();
        let script = feed_call(&config, "feed.drain()");
        assert!(script.starts_with("(() => { const feed = (function (cfg)"));
        assert!(script.contains(r##""shelfId":"shelf""##));
        assert!(script.contains(r##""container":"#contents""##));
        assert!(script.ends_with("return feed.drain(); })()"));
    }

    #[test]
    fn page_events_parse() {
        let events: Vec<PageEvent> = serde_json::from_str(
            r#"[{"type":"key","key":"ArrowLeft"},{"type":"retry"},{"type":"removed"}]"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                PageEvent::Key {
                    key: "ArrowLeft".into()
                },
                PageEvent::Retry,
                PageEvent::Removed,
            ]
        );
    }
}
