//! Keyed archives: an object graph stored as a flat `$objects` table plus
//! integer back-references, with the root named by `$top.root`.

mod resolver;

pub use resolver::{
    resolve, resolve_with, ResolveOptions, CLASS_KEY, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES,
};

use thiserror::Error;

use crate::value::{Mapping, Value};

pub const ARCHIVER_KEY: &str = "$archiver";
pub const VERSION_KEY: &str = "$version";
pub const OBJECTS_KEY: &str = "$objects";
pub const TOP_KEY: &str = "$top";
pub const ROOT_KEY: &str = "root";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("top-level value is not a mapping")]
    NotAnArchive,
    #[error("`$objects` is missing or not a sequence")]
    InvalidObjects,
    #[error("`$top` is missing or not a mapping")]
    MissingTop,
    #[error("`$top` has no `root` entry")]
    MissingRoot,
}

/// The envelope of a keyed archive, split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedArchive {
    pub archiver: Option<String>,
    pub version: Option<i64>,
    pub top: Mapping,
    pub objects: Vec<Value>,
}

impl KeyedArchive {
    /// Returns `true` when `value` looks like a keyed archive envelope.
    pub fn is_keyed_archive(value: &Value) -> bool {
        matches!(value.get(OBJECTS_KEY), Some(Value::Sequence(_)))
            && matches!(value.get(TOP_KEY), Some(Value::Mapping(_)))
    }

    pub fn from_plist(value: Value) -> Result<Self, ArchiveError> {
        let Value::Mapping(mut map) = value else {
            return Err(ArchiveError::NotAnArchive);
        };
        let objects = match map.shift_remove(OBJECTS_KEY) {
            Some(Value::Sequence(objects)) => objects,
            _ => return Err(ArchiveError::InvalidObjects),
        };
        let top = match map.shift_remove(TOP_KEY) {
            Some(Value::Mapping(top)) => top,
            _ => return Err(ArchiveError::MissingTop),
        };
        let archiver = map
            .get(ARCHIVER_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned);
        let version = map.get(VERSION_KEY).and_then(Value::as_i64);
        Ok(Self {
            archiver,
            version,
            top,
            objects,
        })
    }

    /// The root entry of `$top`, usually a [`Value::Reference`].
    pub fn root(&self) -> Result<&Value, ArchiveError> {
        self.top.get(ROOT_KEY).ok_or(ArchiveError::MissingRoot)
    }

    pub fn unarchive(&self) -> Result<Value, ArchiveError> {
        self.unarchive_with(&ResolveOptions::default())
    }

    /// Resolves the root object against the object table.
    pub fn unarchive_with(&self, options: &ResolveOptions) -> Result<Value, ArchiveError> {
        let root = self.root()?;
        Ok(resolve_with(root, &self.objects, options))
    }
}
