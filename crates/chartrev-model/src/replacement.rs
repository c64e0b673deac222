//! Variable replacement map
//!
//! Produced by a dataset import: a JSON object whose keys and values are
//! decimal-integer strings, e.g. `{"2032": "147395", "2033": "147396"}`.
//! Keys are unique and the document order is preserved.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ModelError;
use crate::ids::VariableId;

/// File name used by dataset imports for their replacement map
pub const REPLACEMENTS_FILE_NAME: &str = "variable_replacements.json";

/// Ordered, immutable old -> new variable id mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableReplacementMap {
    pairs: IndexMap<VariableId, VariableId>,
}

impl VariableReplacementMap {
    /// Build from (old, new) pairs
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateVariable`] if an old id repeats, or
    /// [`ModelError::InvalidVariableId`] for non-positive ids.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (VariableId, VariableId)>,
    {
        let mut map = IndexMap::new();
        for (old, new) in pairs {
            for id in [old, new] {
                if id.get() <= 0 {
                    return Err(ModelError::InvalidVariableId(id.to_string()));
                }
            }
            if map.insert(old, new).is_some() {
                return Err(ModelError::DuplicateVariable(old));
            }
        }
        Ok(Self { pairs: map })
    }

    /// Parse the import's JSON document
    ///
    /// # Errors
    /// Returns error if the document is not an object of positive decimal ids
    /// or repeats a key.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(ModelError::from)
    }

    /// Read and parse a replacement map file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Where a dataset import writes its replacement map
    #[must_use]
    pub fn conventional_path(dataset_dir: impl AsRef<Path>) -> PathBuf {
        dataset_dir.as_ref().join("output").join(REPLACEMENTS_FILE_NAME)
    }

    /// Replacement for `old`, if any
    #[inline]
    #[must_use]
    pub fn get(&self, old: VariableId) -> Option<VariableId> {
        self.pairs.get(&old).copied()
    }

    /// Whether `id` is one of the ids being replaced
    #[inline]
    #[must_use]
    pub fn replaces(&self, id: VariableId) -> bool {
        self.pairs.contains_key(&id)
    }

    /// Old ids in document order
    pub fn old_ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.pairs.keys().copied()
    }

    /// New ids in document order
    pub fn new_ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.pairs.values().copied()
    }

    /// Union of old and new ids
    #[must_use]
    pub fn all_ids(&self) -> BTreeSet<VariableId> {
        self.old_ids().chain(self.new_ids()).collect()
    }

    /// (old, new) pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, VariableId)> + '_ {
        self.pairs.iter().map(|(old, new)| (*old, *new))
    }

    /// Number of pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the map has no pairs
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Serialize for VariableReplacementMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.pairs
                .iter()
                .map(|(old, new)| (old.to_string(), new.to_string())),
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdLiteral {
    Text(String),
    Number(i64),
}

impl IdLiteral {
    fn into_id<E: de::Error>(self) -> Result<VariableId, E> {
        match self {
            Self::Text(text) => VariableId::parse_positive(&text).map_err(E::custom),
            Self::Number(n) if n > 0 => Ok(VariableId(n)),
            Self::Number(n) => Err(E::custom(ModelError::InvalidVariableId(n.to_string()))),
        }
    }
}

struct ReplacementVisitor;

impl<'de> Visitor<'de> for ReplacementVisitor {
    type Value = VariableReplacementMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping old variable ids to new variable ids")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut pairs = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, IdLiteral>()? {
            let old = VariableId::parse_positive(&key).map_err(de::Error::custom)?;
            let new = value.into_id()?;
            if pairs.insert(old, new).is_some() {
                return Err(de::Error::custom(ModelError::DuplicateVariable(old)));
            }
        }
        Ok(VariableReplacementMap { pairs })
    }
}

impl<'de> Deserialize<'de> for VariableReplacementMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ReplacementVisitor)
    }
}
