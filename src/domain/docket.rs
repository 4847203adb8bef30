use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::CrawlError;

/// Filing channel of a docket, as printed on the listing page.
///
/// Stored as its numeric code. Labels are matched exactly; anything else is
/// an [`CrawlError::UnknownEnumValue`] so bad source data never lands in the
/// database under a guessed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Physical = 1,
    Electronic = 2,
}

impl ChannelKind {
    pub fn from_label(label: &str) -> Result<Self, CrawlError> {
        match label {
            "Físico" => Ok(Self::Physical),
            "Eletrônico" => Ok(Self::Electronic),
            other => Err(CrawlError::UnknownEnumValue {
                field: "channel".to_string(),
                label: other.to_string(),
            }),
        }
    }

    pub fn as_code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self, CrawlError> {
        match code {
            1 => Ok(Self::Physical),
            2 => Ok(Self::Electronic),
            other => Err(CrawlError::UnknownEnumValue {
                field: "channel".to_string(),
                label: other.to_string(),
            }),
        }
    }
}

/// Visibility class of a docket (public, under judicial secrecy, sealed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityKind {
    Public = 1,
    Restricted = 2,
    Sealed = 3,
}

impl VisibilityKind {
    pub fn from_label(label: &str) -> Result<Self, CrawlError> {
        match label {
            "Público" => Ok(Self::Public),
            "Segredo de Justiça" => Ok(Self::Restricted),
            "Sigiloso" => Ok(Self::Sealed),
            other => Err(CrawlError::UnknownEnumValue {
                field: "visibility".to_string(),
                label: other.to_string(),
            }),
        }
    }

    pub fn as_code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self, CrawlError> {
        match code {
            1 => Ok(Self::Public),
            2 => Ok(Self::Restricted),
            3 => Ok(Self::Sealed),
            other => Err(CrawlError::UnknownEnumValue {
                field: "visibility".to_string(),
                label: other.to_string(),
            }),
        }
    }
}

/// One discovered docket, as extracted from a listing page row.
///
/// `incident_id` is the portal's own primary key and is stable across
/// re-discovery; re-observing the same incident only refreshes
/// `discovered_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocketRecord {
    pub incident_id: i64,
    /// The id-space value whose listing page produced this record.
    pub source_id: i64,
    /// Short process class tag, e.g. "ADI".
    pub class_code: String,
    /// Normalized unified number; empty when the docket has none.
    pub unique_number: String,
    pub channel: ChannelKind,
    pub visibility: VisibilityKind,
    pub filed_date: NaiveDate,
    pub discovered_at: NaiveDate,
}

/// Enrichment payload attached to a [`DocketRecord`] after draining.
///
/// Written as a full overwrite of the detail columns; a docket is complete
/// once these have been attached at least once, and completeness never
/// reverts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields {
    pub class_label: String,
    /// Ordered (role, name) pairs in source order.
    pub parties: Vec<(String, String)>,
    /// Ordered subject strings, one per subject list entry.
    pub subjects: Vec<String>,
    pub origin_court: String,
    pub origin_place: String,
    /// May be empty; absence of the origin-number block is not an error.
    pub origin_numbers: Vec<String>,
}

/// Durable staging row: discovered but not yet enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub incident_id: i64,
    pub source_id: i64,
}

/// Resume strategy for the range scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Resume from the maximum checkpoint across all classes. Use on the
    /// first run or to keep moving forward.
    Highest,
    /// Resume from the minimum checkpoint, to re-cover earlier ranges.
    Lowest,
    /// Resume from the checkpoint of one explicit process class.
    Category(String),
}

impl ScanMode {
    /// Build a scan mode from its textual name plus the optional class
    /// argument. `category` mode without a class is a configuration error,
    /// raised here before any work is dispatched.
    pub fn from_parts(mode: &str, category: Option<String>) -> Result<Self, CrawlError> {
        match mode {
            "highest" => Ok(Self::Highest),
            "lowest" => Ok(Self::Lowest),
            "category" => match category {
                Some(class_code) if !class_code.is_empty() => Ok(Self::Category(class_code)),
                _ => Err(CrawlError::Configuration(
                    "category scan mode requires a class code".to_string(),
                )),
            },
            other => Err(CrawlError::Configuration(format!(
                "unknown scan mode {other:?}"
            ))),
        }
    }
}
