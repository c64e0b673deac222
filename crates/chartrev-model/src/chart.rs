//! Chart config and dimension types
//!
//! The stored config is a JSON document. Only the substructures the revision
//! engine may touch are modelled as typed fields; every other key is kept
//! verbatim in `extra` so a parse/serialize cycle never drops user settings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ModelError;
use crate::ids::{ChartId, DimensionRowId, VariableId};

/// Available data years of one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// Create a range; bounds are swapped if given out of order
    #[inline]
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

/// Variable id -> year range. A missing key means the variable has no data points.
pub type YearRanges = BTreeMap<VariableId, YearRange>;

/// One bound of a chart's time window (`minTime`, `maxTime`, `map.time`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeBound", into = "RawTimeBound")]
pub enum TimeBound {
    /// Fixed year
    Year(i32),
    /// Track the earliest year with data
    Earliest,
    /// Track the latest year with data
    Latest,
}

impl TimeBound {
    /// Numeric year, if this bound is not a sentinel
    #[inline]
    #[must_use]
    pub fn year(self) -> Option<i32> {
        match self {
            Self::Year(year) => Some(year),
            Self::Earliest | Self::Latest => None,
        }
    }

    /// Whether this bound is `"earliest"` or `"latest"`
    #[inline]
    #[must_use]
    pub fn is_sentinel(self) -> bool {
        !matches!(self, Self::Year(_))
    }
}

impl fmt::Display for TimeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Earliest => f.write_str("earliest"),
            Self::Latest => f.write_str("latest"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTimeBound {
    Number(i64),
    Text(String),
}

impl TryFrom<RawTimeBound> for TimeBound {
    type Error = String;

    fn try_from(raw: RawTimeBound) -> Result<Self, Self::Error> {
        match raw {
            RawTimeBound::Number(n) => i32::try_from(n)
                .map(TimeBound::Year)
                .map_err(|_| format!("time value out of range: {n}")),
            RawTimeBound::Text(text) => match text.as_str() {
                "earliest" => Ok(TimeBound::Earliest),
                "latest" => Ok(TimeBound::Latest),
                other => Err(format!("unknown time sentinel: {other:?}")),
            },
        }
    }
}

impl From<TimeBound> for RawTimeBound {
    fn from(bound: TimeBound) -> Self {
        match bound {
            TimeBound::Year(year) => RawTimeBound::Number(i64::from(year)),
            TimeBound::Earliest => RawTimeBound::Text("earliest".to_string()),
            TimeBound::Latest => RawTimeBound::Text("latest".to_string()),
        }
    }
}

/// One plotted series binding within `config.dimensions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub variable_id: VariableId,
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Dimension {
    /// Create a dimension with no extra settings
    #[must_use]
    pub fn new(variable_id: VariableId, property: impl Into<String>, order: u32) -> Self {
        Self {
            variable_id,
            property: property.into(),
            order: Some(order),
            extra: Map::new(),
        }
    }
}

/// Choropleth map layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<VariableId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_year: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Structured chart config
///
/// # Invariants
/// - `dimensions[d].order` is a stable positional index
/// - a variable appears in `dimensions` or `map.variable_id` once per series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<Dimension>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_time: Option<TimeBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<TimeBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ChartConfig {
    /// Parse a stored config document
    ///
    /// # Errors
    /// Returns error if the JSON does not match the config structure
    pub fn from_json(chart_id: ChartId, json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|source| ModelError::InvalidChartConfig { chart_id, source })
    }

    /// Serialize to a compact JSON document
    ///
    /// # Errors
    /// Returns error if serialization fails (rare for JSON)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Config version, `1` when the document does not carry one
    #[inline]
    #[must_use]
    pub fn version_or_default(&self) -> u32 {
        self.version.unwrap_or(1)
    }

    /// Every variable id referenced by dimensions or the map layer
    #[must_use]
    pub fn referenced_variables(&self) -> Vec<VariableId> {
        let mut ids: Vec<VariableId> = self
            .dimensions
            .iter()
            .flatten()
            .map(|d| d.variable_id)
            .collect();
        if let Some(id) = self.map.as_ref().and_then(|m| m.variable_id) {
            ids.push(id);
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A chart as read from the `charts` table
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub id: ChartId,
    pub config: ChartConfig,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chart {
    /// Create chart without timestamps
    #[inline]
    #[must_use]
    pub fn new(id: ChartId, config: ChartConfig) -> Self {
        Self {
            id,
            config,
            created_at: None,
            updated_at: None,
        }
    }

    /// Config version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.config.version_or_default()
    }
}

/// Persisted mirror of one `config.dimensions` entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDimensionRow {
    pub id: DimensionRowId,
    pub chart_id: ChartId,
    pub variable_id: VariableId,
    pub property: String,
    pub order: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn config_parses_optional_substructures() {
        let config: ChartConfig = serde_json::from_value(json!({
            "title": "Life expectancy",
            "minTime": 1990,
            "maxTime": "latest",
            "dimensions": [{"variableId": 100, "property": "y", "order": 0}],
            "map": {"variableId": 100, "targetYear": 2015, "time": "latest"},
            "type": "LineChart"
        }))
        .unwrap();

        assert_eq!(config.min_time, Some(TimeBound::Year(1990)));
        assert_eq!(config.max_time, Some(TimeBound::Latest));
        assert_eq!(config.dimensions.as_ref().map(Vec::len), Some(1));
        let map = config.map.as_ref().unwrap();
        assert_eq!(map.variable_id, Some(VariableId(100)));
        assert_eq!(map.time, Some(TimeBound::Latest));
        assert_eq!(config.extra.get("type"), Some(&json!("LineChart")));
        assert_eq!(config.subtitle, None);
    }

    #[test]
    fn config_keeps_unknown_keys() {
        let doc = json!({
            "dimensions": [{"variableId": 5, "property": "y", "display": {"unit": "%"}}],
            "map": {"variableId": 5, "colorScale": {"baseColorScheme": "Reds"}},
            "selectedEntityNames": ["France"],
            "version": 3
        });
        let config: ChartConfig = serde_json::from_value(doc.clone()).unwrap();
        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn time_bound_rejects_unknown_sentinel() {
        let result: Result<TimeBound, _> = serde_json::from_value(json!("first"));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_config_names_chart() {
        let err = ChartConfig::from_json(ChartId(9), r#"{"minTime": "soon"}"#).unwrap_err();
        assert!(err.to_string().contains("chart 9"));
    }

    #[test]
    fn referenced_variables_union() {
        let config = ChartConfig {
            dimensions: Some(vec![
                Dimension::new(VariableId(2), "y", 0),
                Dimension::new(VariableId(1), "x", 1),
            ]),
            map: Some(MapConfig {
                variable_id: Some(VariableId(2)),
                ..MapConfig::default()
            }),
            ..ChartConfig::default()
        };
        assert_eq!(config.referenced_variables(), vec![VariableId(1), VariableId(2)]);
    }

    #[test]
    fn year_range_orders_bounds() {
        assert_eq!(YearRange::new(2020, 1995), YearRange { min: 1995, max: 2020 });
    }
}
