//! JavaScript evaluated inside the source playlist page
//!
//! Each script is an IIFE returning a JSON-serializable value.

/// Reports whether the embedded state root exists and whether it is populated
pub const PROBE_STATE: &str = r#"(() => {
    const root = window.ytInitialData;
    return {
        root: root !== undefined && root !== null,
        populated: !!(root && root.contents)
    };
})()"#;

/// Returns the embedded state object, or null
pub const READ_STATE: &str = r#"(() => window.ytInitialData || null)()"#;

/// Returns the text of every inline script mentioning the state root
pub const INLINE_SCRIPTS: &str = r#"(() => Array.from(document.querySelectorAll('script:not([src])'))
    .map(s => s.textContent || '')
    .filter(t => t.includes('ytInitialData')))()"#;

/// Installs (or re-attaches) a mutation counter on the playlist list container
///
/// Returns the current counter value. The observer is re-bound when the host
/// page swaps the container element out.
pub const INSTALL_MUTATION_COUNTER: &str = r#"(() => {
    const state = window.__playlistShelfSource = window.__playlistShelfSource || { count: 0, observer: null, target: null };
    const target = document.querySelector('ytd-playlist-video-list-renderer #contents')
        || document.querySelector('ytd-playlist-video-list-renderer');
    if (target && state.target !== target) {
        if (state.observer) { state.observer.disconnect(); }
        state.observer = new MutationObserver(() => { state.count += 1; });
        state.observer.observe(target, { childList: true, subtree: true });
        state.target = target;
    }
    return state.count;
})()"#;

/// Disconnects the mutation counter
pub const REMOVE_MUTATION_COUNTER: &str = r#"(() => {
    const state = window.__playlistShelfSource;
    if (state && state.observer) { state.observer.disconnect(); }
    window.__playlistShelfSource = undefined;
    return true;
})()"#;
