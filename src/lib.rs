//! Reader/writer for Firefox session-store files.
//!
//! Session stores are JSON documents describing every open and closed
//! window, tab, and history entry, usually wrapped in the single-block
//! mozLz4 container format. This crate decodes the container, parses the
//! document into a Session → Window → Tab → Entry tree, and serializes it
//! back with byte-for-byte fidelity for every key the model does not
//! explicitly understand.

pub mod codec;

mod collection;
mod error;
mod nodes;
mod profiles;
mod store;

pub use collection::{CollectionKeys, DocumentNode, SelectionCollection};
pub use error::SessionError;
pub use nodes::{Entry, Session, Tab, Window, PRIMARY_STEM};
pub use profiles::{Profile, Profiles};
pub use store::{load, load_bytes, load_file, SessionNode};
