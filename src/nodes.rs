//! Typed views over the session-store document tree.
//!
//! Session → Window → Tab → Entry, each retaining the raw mapping it was
//! built from. Only explicitly modeled keys (child lists, selected indices,
//! the closed-tab `state` nesting) may change value on dump; everything else
//! is passthrough data.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::collection::{CollectionKeys, DocumentNode, SelectionCollection};
use crate::error::SessionError;
use crate::store;

/// File stem of the primary session store; any other stem is surfaced as a
/// warning marker in the session label.
pub const PRIMARY_STEM: &str = "sessionstore";

fn as_object<'a>(
    value: &'a Value,
    node: &'static str,
    key: &'static str,
) -> Result<&'a Map<String, Value>, SessionError> {
    value
        .as_object()
        .ok_or_else(|| SessionError::missing_key(node, key))
}

/// One visited page in a tab's history. The leaf of the tree.
///
/// Identity is the URL alone; title, referrer, and the various Gecko
/// identifiers (`id`, `docshellID`, `docIdentifier`) ride along untouched.
#[derive(Debug, Clone)]
pub struct Entry {
    data: Map<String, Value>,
    url: String,
    title: Option<String>,
    referrer: Option<String>,
}

impl Entry {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    /// Host component of the URL: the third `/`-delimited segment of the raw
    /// string. Not a validated URL parse, matching the loose scheme the
    /// session JSON itself uses.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.url.split('/').nth(2).filter(|host| !host.is_empty())
    }
}

impl DocumentNode for Entry {
    const NODE_NAME: &'static str = "entry";
    const REQUIRED_KEY: &'static str = "url";

    fn from_value(value: &Value, _is_closed: bool) -> Result<Self, SessionError> {
        let data = as_object(value, Self::NODE_NAME, Self::REQUIRED_KEY)?;
        let url = data
            .get(Self::REQUIRED_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::missing_key(Self::NODE_NAME, Self::REQUIRED_KEY))?
            .to_string();
        let title = data.get("title").and_then(Value::as_str).map(str::to_string);
        let referrer = data
            .get("referrer")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            data: data.clone(),
            url,
            title,
            referrer,
        })
    }

    /// Entries never mutate their mapping; the dump is the retained data.
    fn dump(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry {}", self.url)
    }
}

/// One tab and its navigation history.
///
/// A closed tab's real data is nested one level down under `state`; the outer
/// mapping's sibling keys are retained verbatim and merged back around the
/// re-dumped state on save.
#[derive(Debug)]
pub struct Tab {
    // Full outer mapping, present only for nested (closed) records.
    outer: Option<Map<String, Value>>,
    collection: SelectionCollection<Entry>,
    is_closed: bool,
}

impl Tab {
    const KEYS: CollectionKeys = CollectionKeys {
        node_name: Self::NODE_NAME,
        items_key: Self::REQUIRED_KEY,
        index_key: "index",
        closed_key: None,
    };

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.collection.items()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    #[must_use]
    pub fn selected_idx(&self) -> usize {
        self.collection.selected_idx()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Entry> {
        self.collection.selected()
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.collection.set_selected(idx);
    }

    #[must_use]
    pub fn selected_url(&self) -> Option<&str> {
        self.selected().map(Entry::url)
    }

    #[must_use]
    pub fn selected_title(&self) -> Option<&str> {
        self.selected().and_then(Entry::title)
    }

    #[must_use]
    pub fn selected_domain(&self) -> Option<&str> {
        self.selected().and_then(Entry::domain)
    }
}

impl DocumentNode for Tab {
    const NODE_NAME: &'static str = "tab";
    const REQUIRED_KEY: &'static str = "entries";

    fn from_value(value: &Value, is_closed: bool) -> Result<Self, SessionError> {
        let data = as_object(value, Self::NODE_NAME, Self::REQUIRED_KEY)?;

        // Closed-tab records nest the real tab data under `state`.
        let (outer, state) = match data.get("state") {
            Some(state_value) => {
                let state = as_object(state_value, Self::NODE_NAME, Self::REQUIRED_KEY)?;
                (Some(data.clone()), state)
            }
            None => (None, data),
        };
        let nested = outer.is_some();
        let collection = SelectionCollection::from_mapping(state, Self::KEYS)?;

        Ok(Self {
            outer,
            collection,
            is_closed: is_closed || nested,
        })
    }

    fn dump(&self) -> Value {
        let state = self.collection.dump();
        match &self.outer {
            Some(outer) => {
                let mut data = outer.clone();
                data.insert("state".to_string(), Value::Object(state));
                Value::Object(data)
            }
            None => Value::Object(state),
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tab")?;
        if self.is_closed {
            write!(f, " closed!")?;
        }
        write!(f, " entries={}", self.entries().len())?;
        if let Some(title) = self.selected_title() {
            write!(f, " selected=\"{title}\"")?;
        }
        Ok(())
    }
}

/// One browser window: its current tabs plus the reopenable closed ones.
#[derive(Debug)]
pub struct Window {
    collection: SelectionCollection<Tab>,
    is_closed: bool,
}

impl Window {
    const KEYS: CollectionKeys = CollectionKeys {
        node_name: Self::NODE_NAME,
        items_key: Self::REQUIRED_KEY,
        index_key: "selected",
        closed_key: Some("_closedTabs"),
    };

    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        self.collection.items()
    }

    #[must_use]
    pub fn tabs_mut(&mut self) -> &mut [Tab] {
        self.collection.items_mut()
    }

    #[must_use]
    pub fn closed_tabs(&self) -> &[Tab] {
        self.collection.closed_items()
    }

    /// Whether this window came from the session's closed-windows list.
    /// Informational only; closed windows keep the regular window structure.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    #[must_use]
    pub fn selected_idx(&self) -> usize {
        self.collection.selected_idx()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Tab> {
        self.collection.selected()
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.collection.set_selected(idx);
    }

    /// Selected-entry URL of every current tab, in tab order. `None` marks a
    /// tab with no selectable entry so the list mirrors the tab structure.
    #[must_use]
    pub fn current_urls(&self) -> Vec<Option<&str>> {
        self.tabs().iter().map(Tab::selected_url).collect()
    }

    /// Frequency count of the current tabs' selected-entry domains, sorted by
    /// descending count; ties keep encounter order.
    #[must_use]
    pub fn by_domain(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for tab in self.tabs() {
            let Some(domain) = tab.selected_domain() else {
                continue;
            };
            match counts.iter_mut().find(|(seen, _)| *seen == domain) {
                Some((_, count)) => *count += 1,
                None => counts.push((domain, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}

impl DocumentNode for Window {
    const NODE_NAME: &'static str = "window";
    const REQUIRED_KEY: &'static str = "tabs";

    fn from_value(value: &Value, is_closed: bool) -> Result<Self, SessionError> {
        let data = as_object(value, Self::NODE_NAME, Self::REQUIRED_KEY)?;
        let collection = SelectionCollection::from_mapping(data, Self::KEYS)?;

        Ok(Self {
            collection,
            is_closed,
        })
    }

    fn dump(&self) -> Value {
        Value::Object(self.collection.dump())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window")?;
        if self.is_closed {
            write!(f, " closed!")?;
        }
        write!(f, " tabs={}", self.tabs().len())?;
        if !self.closed_tabs().is_empty() {
            write!(f, " closed={}", self.closed_tabs().len())?;
        }
        Ok(())
    }
}

/// The document root: every open window plus the reopenable closed ones.
///
/// Optionally carries the path it was loaded from, used for reloading,
/// implicit saves, and the backup-warning label.
#[derive(Debug)]
pub struct Session {
    collection: SelectionCollection<Window>,
    path: Option<PathBuf>,
}

impl Session {
    const KEYS: CollectionKeys = CollectionKeys {
        node_name: Self::NODE_NAME,
        items_key: Self::REQUIRED_KEY,
        index_key: "selectedWindow",
        closed_key: Some("_closedWindows"),
    };

    #[must_use]
    pub fn windows(&self) -> &[Window] {
        self.collection.items()
    }

    #[must_use]
    pub fn windows_mut(&mut self) -> &mut [Window] {
        self.collection.items_mut()
    }

    #[must_use]
    pub fn closed_windows(&self) -> &[Window] {
        self.collection.closed_items()
    }

    #[must_use]
    pub fn selected_idx(&self) -> usize {
        self.collection.selected_idx()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Window> {
        self.collection.selected()
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.collection.set_selected(idx);
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// Per-window lists of the selected-entry URL of each current tab,
    /// mirroring the window → tab structure.
    #[must_use]
    pub fn current_urls(&self) -> Vec<Vec<Option<&str>>> {
        self.windows().iter().map(Window::current_urls).collect()
    }

    /// Human-readable summary. When the source file's stem is not the
    /// canonical `sessionstore`, it is surfaced as a warning marker flagging
    /// a recovery/backup load.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }

    fn file_warning(&self) -> Option<&str> {
        let stem = self.path.as_deref()?.file_stem()?.to_str()?;
        (stem != PRIMARY_STEM).then_some(stem)
    }

    /// Re-reads the document from the associated path, replacing this
    /// session's contents.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        let path = self.path.clone().ok_or(SessionError::PathNotSet)?;
        *self = store::load_file(&path)?.into_session()?;
        Ok(())
    }

    /// Serializes to `path`, or to the associated path when `path` is `None`.
    /// The `jsonlz4` extension selects the compressed container format.
    pub fn save(&self, path: Option<&Path>) -> Result<(), SessionError> {
        let path = path
            .or_else(|| self.path.as_deref())
            .ok_or(SessionError::PathNotSet)?;
        store::write_document(&self.dump(), path)
    }
}

impl DocumentNode for Session {
    const NODE_NAME: &'static str = "session";
    const REQUIRED_KEY: &'static str = "windows";

    fn from_value(value: &Value, _is_closed: bool) -> Result<Self, SessionError> {
        let data = as_object(value, Self::NODE_NAME, Self::REQUIRED_KEY)?;
        let collection = SelectionCollection::from_mapping(data, Self::KEYS)?;

        Ok(Self {
            collection,
            path: None,
        })
    }

    fn dump(&self) -> Value {
        Value::Object(self.collection.dump())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session")?;
        if let Some(warning) = self.file_warning() {
            write!(f, "#{warning}")?;
        }
        write!(f, " windows={}", self.windows().len())?;
        if !self.closed_windows().is_empty() {
            write!(f, " closed={}", self.closed_windows().len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DocumentNode, Entry, Session, Tab, Window};

    fn entry(value: serde_json::Value) -> Entry {
        Entry::from_value(&value, false).expect("entry fixture must load")
    }

    #[test]
    fn entry_domain_is_the_third_slash_segment() {
        assert_eq!(
            entry(json!({"url": "https://example.org/path"})).domain(),
            Some("example.org")
        );
        assert_eq!(entry(json!({"url": "about:blank"})).domain(), None);
    }

    #[test]
    fn entry_identity_is_the_url_alone() {
        let a = entry(json!({"url": "https://a/", "title": "first"}));
        let b = entry(json!({"url": "https://a/", "title": "second"}));
        let c = entry(json!({"url": "https://c/"}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn closed_tab_state_nesting_round_trips_sibling_keys() {
        let raw = json!({
            "pos": 3,
            "state": {"entries": [{"url": "a"}], "index": 1},
        });

        let tab = Tab::from_value(&raw, false).expect("closed tab must load");
        assert!(tab.is_closed());
        assert_eq!(tab.selected_url(), Some("a"));
        assert_eq!(tab.dump(), raw);
    }

    #[test]
    fn open_tab_dump_is_the_flat_mapping() {
        let raw = json!({"entries": [{"url": "a"}], "index": 1, "hidden": false});
        let tab = Tab::from_value(&raw, false).expect("tab must load");
        assert!(!tab.is_closed());
        assert_eq!(tab.dump(), raw);
    }

    #[test]
    fn by_domain_sorts_by_count_with_encounter_order_ties() {
        let window = Window::from_value(
            &json!({
                "tabs": [
                    {"entries": [{"url": "https://b/1"}], "index": 1},
                    {"entries": [{"url": "https://a/1"}], "index": 1},
                    {"entries": [{"url": "https://a/2"}], "index": 1},
                    {"entries": [{"url": "https://c/1"}], "index": 1},
                ],
                "selected": 1,
            }),
            false,
        )
        .expect("window must load");

        assert_eq!(window.by_domain(), vec![("a", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn session_label_flags_non_primary_file_stems() {
        let raw = json!({"windows": [], "_closedWindows": [], "selectedWindow": 0});

        let mut session = Session::from_value(&raw, false).expect("session must load");
        session.set_path("/profile/sessionstore-backups/recovery.jsonlz4");
        assert_eq!(session.label(), "Session#recovery windows=0");

        session.set_path("/profile/sessionstore.jsonlz4");
        assert_eq!(session.label(), "Session windows=0");
    }
}
