//! Discovery of installed browser profiles via `profiles.ini`.
//!
//! Each `[ProfileN]` section names a profile and its directory; from there
//! the primary session store is `sessionstore.jsonlz4` (or the uncompressed
//! `sessionstore.js`), with a periodic recovery snapshot under
//! `sessionstore-backups/`.

use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::SessionError;
use crate::nodes::Session;
use crate::store;

const PROFILES_FILE: &str = "profiles.ini";
const BACKUPS_DIR: &str = "sessionstore-backups";
const PRIMARY_FILES: [&str; 2] = ["sessionstore.jsonlz4", "sessionstore.js"];
const RECOVERY_FILES: [&str; 2] = ["recovery.jsonlz4", "recovery.js"];

/// The set of profiles defined by a firefox directory's `profiles.ini`.
#[derive(Debug)]
pub struct Profiles {
    firefox_dir: PathBuf,
    profiles: Vec<(String, ProfileRecord)>,
}

#[derive(Debug)]
struct ProfileRecord {
    path: String,
    is_relative: bool,
}

impl Profiles {
    /// Parses `profiles.ini` under `firefox_dir` (typically
    /// `~/.mozilla/firefox`). Sections whose name starts with `Profile`
    /// define profiles, keyed by their `Name` field, kept in file order.
    pub fn open(firefox_dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let firefox_dir = firefox_dir.into();
        let ini_path = firefox_dir.join(PROFILES_FILE);
        let ini = Ini::load_from_file(&ini_path).map_err(|source| SessionError::Ini {
            path: ini_path,
            source,
        })?;

        let mut profiles = Vec::new();
        for (section, properties) in ini.iter() {
            let is_profile = section.is_some_and(|name| name.starts_with("Profile"));
            if !is_profile {
                continue;
            }
            let (Some(name), Some(path)) = (properties.get("Name"), properties.get("Path"))
            else {
                continue;
            };
            profiles.push((
                name.to_string(),
                ProfileRecord {
                    path: path.to_string(),
                    is_relative: properties.get("IsRelative") == Some("1"),
                },
            ));
        }

        Ok(Self {
            firefox_dir,
            profiles,
        })
    }

    /// Profile names in `profiles.ini` order.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.profiles.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Profile> {
        let (_, record) = self.profiles.iter().find(|(known, _)| known == name)?;
        let dir = if record.is_relative {
            self.firefox_dir.join(&record.path)
        } else {
            PathBuf::from(&record.path)
        };
        Some(Profile {
            name: name.to_string(),
            dir,
        })
    }
}

/// A single resolved profile directory.
#[derive(Debug)]
pub struct Profile {
    name: String,
    dir: PathBuf,
}

impl Profile {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the profile's session: the primary store first, falling back to
    /// the recovery snapshot on any load failure. A recovery failure after a
    /// failed primary attempt propagates as-is.
    pub fn session(&self) -> Result<Session, SessionError> {
        if let Some(path) = first_existing(&self.dir, &PRIMARY_FILES) {
            if let Ok(session) = load_session(&path) {
                return Ok(session);
            }
        }
        self.recovery_session()
    }

    /// Loads the recovery snapshot directly.
    pub fn recovery_session(&self) -> Result<Session, SessionError> {
        let backups_dir = self.dir.join(BACKUPS_DIR);
        let path = first_existing(&backups_dir, &RECOVERY_FILES).ok_or_else(|| {
            SessionError::NoSessionFile {
                dir: self.dir.clone(),
            }
        })?;
        load_session(&path)
    }
}

fn first_existing(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn load_session(path: &Path) -> Result<Session, SessionError> {
    store::load_file(path)?.into_session()
}
