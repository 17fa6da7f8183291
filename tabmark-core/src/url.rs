//! URL classification helpers.

const NEW_TAB_PAGES: &[&str] = &["chrome://newtab/", "about:newtab", "edge://newtab/"];

/// Only http(s) pages can be bookmarked; everything else short-circuits.
pub fn is_bookmarkable(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Browser new-tab pages, which the add-bookmark UI redirects away from.
pub fn is_new_tab_page(url: &str) -> bool {
    NEW_TAB_PAGES.contains(&url)
}
