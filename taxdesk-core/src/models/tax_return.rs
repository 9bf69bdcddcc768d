use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value::{optional, parse_bool};
use crate::db::error::DomainViolation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxReturn {
    pub id: i64,
    pub client_id: i64,
    /// `true` once the return has been filed.
    pub status: bool,
    pub filing_timestamp: Option<DateTime<Utc>>,
    pub checked_by_preparer: bool,
    pub filed_by_assistant: bool,
}

/// For creating new tax returns (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxReturn {
    pub client_id: i64,
    pub status: bool,
    pub filing_timestamp: Option<DateTime<Utc>>,
    pub checked_by_preparer: bool,
    pub filed_by_assistant: bool,
}

impl NewTaxReturn {
    /// An unfiled, unchecked return for `client_id`.
    pub fn for_client(client_id: i64) -> Self {
        Self {
            client_id,
            status: false,
            filing_timestamp: None,
            checked_by_preparer: false,
            filed_by_assistant: false,
        }
    }
}

/// Columns of `tax_returns` that may be changed after insert. `client_id` is
/// deliberately absent: a return never moves to another client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxReturnField {
    Status,
    FilingTimestamp,
    CheckedByPreparer,
    FiledByAssistant,
}

impl TaxReturnField {
    pub const ALL: [TaxReturnField; 4] = [
        Self::Status,
        Self::FilingTimestamp,
        Self::CheckedByPreparer,
        Self::FiledByAssistant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::FilingTimestamp => "filing_timestamp",
            Self::CheckedByPreparer => "checked_by_preparer",
            Self::FiledByAssistant => "filed_by_assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxReturnUpdate {
    Status(bool),
    FilingTimestamp(Option<DateTime<Utc>>),
    CheckedByPreparer(bool),
    FiledByAssistant(bool),
}

impl TaxReturnUpdate {
    pub fn field(&self) -> TaxReturnField {
        match self {
            Self::Status(_) => TaxReturnField::Status,
            Self::FilingTimestamp(_) => TaxReturnField::FilingTimestamp,
            Self::CheckedByPreparer(_) => TaxReturnField::CheckedByPreparer,
            Self::FiledByAssistant(_) => TaxReturnField::FiledByAssistant,
        }
    }

    /// Build an update from a caller-supplied column name and raw value.
    ///
    /// Timestamps are RFC 3339; an empty value clears `filing_timestamp`.
    pub fn parse(
        field: &str,
        value: &str,
    ) -> Result<Self, DomainViolation> {
        let column = TaxReturnField::parse(field).ok_or_else(|| DomainViolation::UnknownField {
            entity: "tax return",
            field: field.to_string(),
        })?;
        let invalid = |reason: &str| DomainViolation::InvalidValue {
            field: column.as_str(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let flag = || parse_bool(value).ok_or_else(|| invalid("expected true or false"));

        match column {
            TaxReturnField::Status => flag().map(Self::Status),
            TaxReturnField::CheckedByPreparer => flag().map(Self::CheckedByPreparer),
            TaxReturnField::FiledByAssistant => flag().map(Self::FiledByAssistant),
            TaxReturnField::FilingTimestamp => optional(value)
                .map(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .map(|ts| ts.with_timezone(&Utc))
                        .map_err(|e| invalid(&e.to_string()))
                })
                .transpose()
                .map(Self::FilingTimestamp),
        }
    }
}
