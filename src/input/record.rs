use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell read from the tabular input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Coerce the cell into a non-negative count.
    ///
    /// Text has thousands separators and whitespace stripped before parsing.
    /// Anything that still fails to parse, negative numbers, NaN and empty
    /// cells all come out as zero.
    pub fn as_count(&self) -> u64 {
        match self {
            CellValue::Integer(n) => u64::try_from(*n).unwrap_or(0),
            CellValue::Float(f) => {
                if f.is_finite() && *f > 0.0 {
                    f.trunc() as u64
                } else {
                    0
                }
            }
            CellValue::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| *c != ',' && !c.is_whitespace())
                    .collect();
                cleaned
                    .parse::<i64>()
                    .ok()
                    .and_then(|n| u64::try_from(n).ok())
                    .unwrap_or(0)
            }
            CellValue::Empty => 0,
        }
    }

    /// Text view of the cell, `None` for empty cells
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

/// Coerce an optional cell into a count, treating a missing cell as zero
pub fn coerce_count(value: Option<&CellValue>) -> u64 {
    value.map(CellValue::as_count).unwrap_or(0)
}

/// A row as read from the input: original header paired with its cell,
/// in column order
pub type RawRow = Vec<(String, CellValue)>;

/// The engagement counters a post can be ranked by
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    /// Number of views
    #[default]
    #[value(name = "view_count")]
    ViewCount,
    /// Number of likes
    #[value(name = "like_count")]
    LikeCount,
    /// Number of comments
    #[value(name = "comment_count")]
    CommentCount,
}

impl CountField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountField::ViewCount => "view_count",
            CountField::LikeCount => "like_count",
            CountField::CommentCount => "comment_count",
        }
    }
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CountField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view_count" | "views" => Ok(CountField::ViewCount),
            "like_count" | "likes" => Ok(CountField::LikeCount),
            "comment_count" | "comments" => Ok(CountField::CommentCount),
            other => anyhow::bail!("Unknown sort field: {}", other),
        }
    }
}

/// A post after column normalization.
///
/// Counters keep the cell exactly as it appeared in the input so the report
/// can echo it back; [`PostRecord::count`] is the only place they are turned
/// into numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostRecord {
    pub url: Option<String>,
    pub view_count: Option<CellValue>,
    pub like_count: Option<CellValue>,
    pub comment_count: Option<CellValue>,
    pub profile_name: Option<String>,

    /// Columns outside the canonical vocabulary, lower-cased
    pub extra: Vec<(String, CellValue)>,
}

impl PostRecord {
    /// Raw cell for one of the counters
    pub fn count_cell(&self, field: CountField) -> Option<&CellValue> {
        match field {
            CountField::ViewCount => self.view_count.as_ref(),
            CountField::LikeCount => self.like_count.as_ref(),
            CountField::CommentCount => self.comment_count.as_ref(),
        }
    }

    /// Numeric value of a counter, zero when missing or unparsable
    pub fn count(&self, field: CountField) -> u64 {
        coerce_count(self.count_cell(field))
    }

    /// Counter as it should be displayed, `N/A` when the column was absent
    pub fn display_count(&self, field: CountField) -> String {
        match self.count_cell(field) {
            Some(cell) => cell.to_string(),
            None => "N/A".to_string(),
        }
    }

    /// The post URL, ignoring blank values
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Turn the record back into a row keyed by canonical names
    pub fn to_row(&self) -> RawRow {
        let mut row = Vec::new();
        if let Some(url) = &self.url {
            row.push(("url".to_string(), CellValue::Text(url.clone())));
        }
        for field in [
            CountField::ViewCount,
            CountField::LikeCount,
            CountField::CommentCount,
        ] {
            if let Some(cell) = self.count_cell(field) {
                row.push((field.as_str().to_string(), cell.clone()));
            }
        }
        if let Some(profile) = &self.profile_name {
            row.push(("profile_name".to_string(), CellValue::Text(profile.clone())));
        }
        row.extend(self.extra.iter().cloned());
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_coercion_is_total() {
        assert_eq!(CellValue::Text("1,000".into()).as_count(), 1000);
        assert_eq!(CellValue::Text(" 2 500 ".into()).as_count(), 2500);
        assert_eq!(CellValue::Text("12k".into()).as_count(), 0);
        assert_eq!(CellValue::Text("".into()).as_count(), 0);
        assert_eq!(CellValue::Text("-5".into()).as_count(), 0);
        assert_eq!(CellValue::Text("1.5".into()).as_count(), 0);
        assert_eq!(CellValue::Integer(42).as_count(), 42);
        assert_eq!(CellValue::Integer(-42).as_count(), 0);
        assert_eq!(CellValue::Float(99.9).as_count(), 99);
        assert_eq!(CellValue::Float(f64::NAN).as_count(), 0);
        assert_eq!(CellValue::Float(f64::INFINITY).as_count(), 0);
        assert_eq!(CellValue::Empty.as_count(), 0);
        assert_eq!(coerce_count(None), 0);
    }

    #[test]
    fn test_display_count_preserves_raw_text() {
        let record = PostRecord {
            view_count: Some(CellValue::Text("1,000".into())),
            like_count: Some(CellValue::Integer(7)),
            ..Default::default()
        };

        assert_eq!(record.display_count(CountField::ViewCount), "1,000");
        assert_eq!(record.display_count(CountField::LikeCount), "7");
        assert_eq!(record.display_count(CountField::CommentCount), "N/A");
        assert_eq!(record.count(CountField::ViewCount), 1000);
    }

    #[test]
    fn test_blank_url_is_treated_as_missing() {
        let record = PostRecord {
            url: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(record.url(), None);
    }

    #[test]
    fn test_count_field_parsing() {
        assert_eq!("like_count".parse::<CountField>().unwrap(), CountField::LikeCount);
        assert_eq!("Views".parse::<CountField>().unwrap(), CountField::ViewCount);
        assert!("shares".parse::<CountField>().is_err());
    }
}
