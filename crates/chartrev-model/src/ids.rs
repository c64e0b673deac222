//! Identifier newtypes
//!
//! Every table key gets its own type so a chart id can never be passed where
//! a variable id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw integer value
            #[inline]
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Internal identifier of one time-series a chart can plot
    VariableId
);
id_type!(
    /// Chart primary key
    ChartId
);
id_type!(
    /// `chart_dimensions` primary key
    DimensionRowId
);
id_type!(
    /// `suggested_chart_revisions` primary key
    RevisionId
);
id_type!(
    /// Author recorded on staged revisions
    UserId
);

impl VariableId {
    /// Parse a decimal-integer literal, rejecting zero and negatives
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidVariableId`] for anything that is not a
    /// positive decimal integer.
    pub fn parse_positive(literal: &str) -> Result<Self, ModelError> {
        let trimmed = literal.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidVariableId(literal.to_string()));
        }
        match trimmed.parse::<i64>() {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(ModelError::InvalidVariableId(literal.to_string())),
        }
    }
}

impl FromStr for VariableId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_positive(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_id_parses_decimal() {
        assert_eq!(VariableId::parse_positive("2032").unwrap(), VariableId(2032));
        assert_eq!(" 147395 ".parse::<VariableId>().unwrap(), VariableId(147_395));
    }

    #[test]
    fn variable_id_rejects_non_positive() {
        assert!(VariableId::parse_positive("0").is_err());
        assert!(VariableId::parse_positive("-4").is_err());
        assert!(VariableId::parse_positive("12a").is_err());
        assert!(VariableId::parse_positive("").is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ChartId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
