//! Shared "items + closed items + selected index" behavior.
//!
//! Sessions select a window, windows select a tab, tabs select a history
//! entry. All three share the same shape: an ordered child list, optionally a
//! parallel list of closed children, and a 1-based selected index that is
//! clamped on load and ignores invalid writes.

use serde_json::{Map, Value};

use crate::error::SessionError;

/// Per-node-type key configuration for a [`SelectionCollection`].
///
/// Resolved at compile time as constants on each node type; the items key
/// doubles as the node's required key.
#[derive(Debug, Clone, Copy)]
pub struct CollectionKeys {
    pub node_name: &'static str,
    pub items_key: &'static str,
    pub index_key: &'static str,
    pub closed_key: Option<&'static str>,
}

/// Construction and dump contract every document node implements.
///
/// `from_value` receives the closed flag from the parent collection; `dump`
/// must reproduce every key of the original mapping the node does not model.
pub trait DocumentNode: Sized {
    /// Node name used in error messages.
    const NODE_NAME: &'static str;
    /// Key whose presence identifies this node type in a raw mapping.
    const REQUIRED_KEY: &'static str;

    fn from_value(value: &Value, is_closed: bool) -> Result<Self, SessionError>;

    fn dump(&self) -> Value;
}

/// Ordered children plus an optional closed-children list and a clamped,
/// 1-based selected index (0 means no selection).
///
/// Retains the raw mapping it was built from so unmodeled keys survive
/// [`SelectionCollection::dump`] untouched.
#[derive(Debug)]
pub struct SelectionCollection<T> {
    keys: CollectionKeys,
    data: Map<String, Value>,
    items: Vec<T>,
    closed_items: Option<Vec<T>>,
    selected_idx: usize,
}

impl<T: DocumentNode> SelectionCollection<T> {
    /// Builds the collection from a raw mapping.
    ///
    /// Children under the items key load with `is_closed = false`, children
    /// under the closed key with `is_closed = true`. An absent closed key is
    /// tolerated and never written back. The selected index is sanitized per
    /// the clamp rule: anything outside `[1, len]` becomes `len`.
    pub fn from_mapping(data: &Map<String, Value>, keys: CollectionKeys) -> Result<Self, SessionError> {
        let raw_items = data
            .get(keys.items_key)
            .and_then(Value::as_array)
            .ok_or_else(|| SessionError::missing_key(keys.node_name, keys.items_key))?;
        let items = raw_items
            .iter()
            .map(|value| T::from_value(value, false))
            .collect::<Result<Vec<_>, _>>()?;

        let closed_items = keys
            .closed_key
            .and_then(|key| data.get(key))
            .and_then(Value::as_array)
            .map(|raw_closed| {
                raw_closed
                    .iter()
                    .map(|value| T::from_value(value, true))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let selected_idx = sanitize_index(data.get(keys.index_key), items.len());

        Ok(Self {
            keys,
            data: data.clone(),
            items,
            closed_items,
            selected_idx,
        })
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    #[must_use]
    pub fn closed_items(&self) -> &[T] {
        self.closed_items.as_deref().unwrap_or_default()
    }

    /// Sanitized 1-based selected index; 0 when the collection is empty.
    #[must_use]
    pub fn selected_idx(&self) -> usize {
        self.selected_idx
    }

    /// The currently selected child, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&T> {
        self.selected_idx
            .checked_sub(1)
            .and_then(|index| self.items.get(index))
    }

    /// Accepts `idx` only when `1 <= idx <= len`; invalid writes are ignored,
    /// never an error.
    pub fn set_selected(&mut self, idx: usize) {
        if idx >= 1 && idx <= self.items.len() {
            self.selected_idx = idx;
        }
    }

    /// Writes the sanitized index and re-dumped children back over the
    /// retained mapping; every other key passes through untouched.
    #[must_use]
    pub fn dump(&self) -> Map<String, Value> {
        let mut data = self.data.clone();
        data.insert(
            self.keys.index_key.to_string(),
            Value::from(self.selected_idx as u64),
        );
        data.insert(
            self.keys.items_key.to_string(),
            Value::Array(self.items.iter().map(T::dump).collect()),
        );
        if let (Some(closed_key), Some(closed_items)) = (self.keys.closed_key, &self.closed_items) {
            data.insert(
                closed_key.to_string(),
                Value::Array(closed_items.iter().map(T::dump).collect()),
            );
        }
        data
    }
}

fn sanitize_index(raw: Option<&Value>, len: usize) -> usize {
    match raw.and_then(Value::as_u64) {
        Some(idx) if idx >= 1 && (idx as usize) <= len => idx as usize,
        _ => len,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CollectionKeys, SelectionCollection};
    use crate::error::SessionError;
    use crate::nodes::Entry;

    const KEYS: CollectionKeys = CollectionKeys {
        node_name: "entry",
        items_key: "entries",
        index_key: "index",
        closed_key: None,
    };

    fn collection(value: serde_json::Value) -> SelectionCollection<Entry> {
        let map = value.as_object().expect("fixture must be an object");
        SelectionCollection::from_mapping(map, KEYS).expect("fixture must load")
    }

    #[test]
    fn keeps_index_within_range() {
        let collection = collection(json!({
            "entries": [{"url": "a"}, {"url": "b"}, {"url": "c"}],
            "index": 2,
        }));
        assert_eq!(collection.selected_idx(), 2);
        assert_eq!(collection.selected().map(Entry::url), Some("b"));
    }

    #[test]
    fn clamps_out_of_range_index_to_last_item() {
        let collection = collection(json!({
            "entries": [{"url": "a"}, {"url": "b"}],
            "index": 5,
        }));
        assert_eq!(collection.selected_idx(), 2);
        assert_eq!(collection.selected().map(Entry::url), Some("b"));
    }

    #[test]
    fn missing_index_selects_last_item() {
        let collection = collection(json!({"entries": [{"url": "a"}]}));
        assert_eq!(collection.selected_idx(), 1);
    }

    #[test]
    fn zero_index_clamps_like_any_out_of_range_value() {
        let collection = collection(json!({
            "entries": [{"url": "a"}, {"url": "b"}],
            "index": 0,
        }));
        assert_eq!(collection.selected_idx(), 2);
    }

    #[test]
    fn empty_collection_has_no_selection() {
        let collection = collection(json!({"entries": [], "index": 3}));
        assert_eq!(collection.selected_idx(), 0);
        assert!(collection.selected().is_none());
    }

    #[test]
    fn invalid_set_selected_is_a_no_op() {
        let mut collection = collection(json!({
            "entries": [{"url": "a"}, {"url": "b"}],
            "index": 1,
        }));

        collection.set_selected(0);
        assert_eq!(collection.selected_idx(), 1);
        collection.set_selected(3);
        assert_eq!(collection.selected_idx(), 1);
        collection.set_selected(2);
        assert_eq!(collection.selected_idx(), 2);
    }

    #[test]
    fn dump_writes_sanitized_index_and_passes_unknown_keys_through() {
        let collection = collection(json!({
            "entries": [{"url": "a"}, {"url": "b"}],
            "index": 9,
            "lastUpdated": 1700000000,
        }));

        let dumped = collection.dump();
        assert_eq!(dumped.get("index"), Some(&json!(2)));
        assert_eq!(dumped.get("lastUpdated"), Some(&json!(1700000000)));
        assert_eq!(dumped.get("entries"), Some(&json!([{"url": "a"}, {"url": "b"}])));
    }

    #[test]
    fn missing_items_key_is_a_schema_error() {
        let value = json!({"index": 1});
        let map = value.as_object().expect("fixture must be an object");
        let error = SelectionCollection::<Entry>::from_mapping(map, KEYS)
            .err()
            .expect("missing items key must fail");
        assert!(matches!(
            error,
            SessionError::MissingKey { node: "entry", key: "entries" }
        ));
    }
}
