//! Top-level load/save round trip and node-type dispatch.
//!
//! A document root is identified by which node's required key it carries
//! (`windows`, `tabs`, `entries`, or `url`). The registry is assembled once
//! at first use and never mutated afterwards.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::codec;
use crate::collection::DocumentNode;
use crate::error::SessionError;
use crate::nodes::{Entry, Session, Tab, Window};

/// Extension that selects the compressed container format on save.
const COMPRESSED_EXTENSION: &str = "jsonlz4";

/// A document of any level loaded through the dispatching entry points.
#[derive(Debug)]
pub enum SessionNode {
    Session(Session),
    Window(Window),
    Tab(Tab),
    Entry(Entry),
}

impl SessionNode {
    #[must_use]
    pub fn dump(&self) -> Value {
        match self {
            Self::Session(session) => session.dump(),
            Self::Window(window) => window.dump(),
            Self::Tab(tab) => tab.dump(),
            Self::Entry(entry) => entry.dump(),
        }
    }

    /// Unwraps the session variant; any other node fails with
    /// [`SessionError::UnrecognizedDocument`].
    pub fn into_session(self) -> Result<Session, SessionError> {
        match self {
            Self::Session(session) => Ok(session),
            _ => Err(SessionError::UnrecognizedDocument),
        }
    }

    /// Serializes to `path`; the `jsonlz4` extension selects the compressed
    /// container format.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        write_document(&self.dump(), path)
    }
}

type NodeConstructor = fn(&Value) -> Result<SessionNode, SessionError>;

static REGISTRY: Lazy<Vec<(&'static str, NodeConstructor)>> = Lazy::new(|| {
    vec![
        (Session::REQUIRED_KEY, |value| {
            Session::from_value(value, false).map(SessionNode::Session)
        }),
        (Window::REQUIRED_KEY, |value| {
            Window::from_value(value, false).map(SessionNode::Window)
        }),
        (Tab::REQUIRED_KEY, |value| {
            Tab::from_value(value, false).map(SessionNode::Tab)
        }),
        (Entry::REQUIRED_KEY, |value| {
            Entry::from_value(value, false).map(SessionNode::Entry)
        }),
    ]
});

/// Dispatches a decoded document root to the node type whose required key it
/// carries. The optional `path` is attached to sessions for labeling,
/// reloading, and implicit saves.
pub fn load(value: &Value, path: Option<&Path>) -> Result<SessionNode, SessionError> {
    let data = value.as_object().ok_or(SessionError::NotAMapping)?;
    let constructor = REGISTRY
        .iter()
        .find(|(key, _)| data.contains_key(*key))
        .map(|(_, constructor)| constructor)
        .ok_or(SessionError::UnrecognizedDocument)?;

    let mut node = constructor(value)?;
    if let (SessionNode::Session(session), Some(path)) = (&mut node, path) {
        session.set_path(path);
    }
    Ok(node)
}

/// Loads a document from raw bytes: container decode, then JSON parse, then
/// dispatch.
pub fn load_bytes(bytes: &[u8], path: Option<&Path>) -> Result<SessionNode, SessionError> {
    let text = codec::decode(bytes)?;
    let value: Value =
        serde_json::from_str(&text).map_err(|source| SessionError::JsonParse { source })?;
    load(&value, path)
}

/// Loads a document from a session-store file.
pub fn load_file(path: impl AsRef<Path>) -> Result<SessionNode, SessionError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|source| SessionError::io("reading session file", path, source))?;
    load_bytes(&bytes, Some(path))
}

pub(crate) fn write_document(value: &Value, path: &Path) -> Result<(), SessionError> {
    let text =
        serde_json::to_string(value).map_err(|source| SessionError::JsonSerialize { source })?;

    let compressed = path
        .extension()
        .is_some_and(|extension| extension == COMPRESSED_EXTENSION);
    let written = if compressed {
        fs::write(path, codec::encode(&text)?)
    } else {
        fs::write(path, &text)
    };
    written.map_err(|source| SessionError::io("writing session file", path, source))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{load, SessionNode};
    use crate::error::SessionError;

    #[test]
    fn empty_session_mapping_dispatches_to_session() {
        let raw = json!({"windows": [], "_closedWindows": [], "selectedWindow": 0});

        let node = load(&raw, None).expect("empty session must load");
        let session = match node {
            SessionNode::Session(session) => session,
            other => panic!("expected a session, got {other:?}"),
        };
        assert!(session.windows().is_empty());
        assert!(session.closed_windows().is_empty());
        assert!(session.selected().is_none());
    }

    #[test]
    fn each_required_key_dispatches_to_its_node_type() {
        let window = json!({"tabs": [], "selected": 0});
        assert!(matches!(
            load(&window, None),
            Ok(SessionNode::Window(_))
        ));

        let tab = json!({"entries": [{"url": "a"}], "index": 1});
        assert!(matches!(load(&tab, None), Ok(SessionNode::Tab(_))));

        let entry = json!({"url": "https://example.org/"});
        assert!(matches!(load(&entry, None), Ok(SessionNode::Entry(_))));
    }

    #[test]
    fn unrecognized_mapping_is_a_schema_error() {
        let error = load(&json!({"bookmarks": []}), None)
            .err()
            .expect("unknown root must fail");
        assert!(matches!(error, SessionError::UnrecognizedDocument));
    }

    #[test]
    fn non_mapping_root_is_a_schema_error() {
        let error = load(&json!([1, 2, 3]), None)
            .err()
            .expect("array root must fail");
        assert!(matches!(error, SessionError::NotAMapping));
    }
}
