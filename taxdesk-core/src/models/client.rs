use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value::{optional, parse_bool};
use crate::db::error::DomainViolation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub income: Option<Decimal>,
    pub materials_submitted: bool,
    pub preparer_id: Option<i64>,
}

/// For creating new clients (no id; materials start out not submitted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub address: Option<String>,
    pub income: Option<Decimal>,
    pub preparer_id: Option<i64>,
}

/// Decimal places stored for `income`, a `DECIMAL(10, 2)` column.
pub const INCOME_SCALE: u32 = 2;

/// Check that `income` fits `DECIMAL(10, 2)`: at most two decimal places and
/// eight digits before the point.
pub fn validate_income(income: Decimal) -> Result<Decimal, DomainViolation> {
    let invalid = |reason: &str| DomainViolation::InvalidValue {
        field: ClientField::Income.as_str(),
        value: income.to_string(),
        reason: reason.to_string(),
    };
    if income.normalize().scale() > INCOME_SCALE {
        return Err(invalid("at most two decimal places"));
    }
    if income.abs() >= Decimal::from(100_000_000) {
        return Err(invalid("must be less than 100000000"));
    }
    Ok(income)
}

impl NewClient {
    pub fn validate(&self) -> Result<(), DomainViolation> {
        self.income.map(validate_income).transpose()?;
        Ok(())
    }
}

/// Columns of `clients` that may be changed after insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientField {
    Name,
    Address,
    Income,
    MaterialsSubmitted,
    PreparerId,
}

impl ClientField {
    pub const ALL: [ClientField; 5] = [
        Self::Name,
        Self::Address,
        Self::Income,
        Self::MaterialsSubmitted,
        Self::PreparerId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::Income => "income",
            Self::MaterialsSubmitted => "materials_submitted",
            Self::PreparerId => "preparer_id",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
    }
}

/// A single-column change to a client, carrying a value of the column's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientUpdate {
    Name(String),
    Address(Option<String>),
    Income(Option<Decimal>),
    MaterialsSubmitted(bool),
    PreparerId(Option<i64>),
}

impl ClientUpdate {
    pub fn field(&self) -> ClientField {
        match self {
            Self::Name(_) => ClientField::Name,
            Self::Address(_) => ClientField::Address,
            Self::Income(_) => ClientField::Income,
            Self::MaterialsSubmitted(_) => ClientField::MaterialsSubmitted,
            Self::PreparerId(_) => ClientField::PreparerId,
        }
    }

    pub fn validate(&self) -> Result<(), DomainViolation> {
        if let Self::Income(Some(income)) = self {
            validate_income(*income)?;
        }
        Ok(())
    }

    /// Build an update from a caller-supplied column name and raw value.
    ///
    /// An empty value clears nullable columns.
    pub fn parse(
        field: &str,
        value: &str,
    ) -> Result<Self, DomainViolation> {
        let column = ClientField::parse(field).ok_or_else(|| DomainViolation::UnknownField {
            entity: "client",
            field: field.to_string(),
        })?;
        let invalid = |reason: String| DomainViolation::InvalidValue {
            field: column.as_str(),
            value: value.to_string(),
            reason,
        };

        match column {
            ClientField::Name => {
                let name = value.trim();
                if name.is_empty() {
                    return Err(invalid("name must not be empty".to_string()));
                }
                Ok(Self::Name(name.to_string()))
            }
            ClientField::Address => Ok(Self::Address(optional(value).map(str::to_string))),
            ClientField::Income => optional(value)
                .map(|raw| {
                    Decimal::from_str(raw)
                        .map_err(|e| invalid(e.to_string()))
                        .and_then(validate_income)
                })
                .transpose()
                .map(Self::Income),
            ClientField::MaterialsSubmitted => parse_bool(value)
                .map(Self::MaterialsSubmitted)
                .ok_or_else(|| invalid("expected true or false".to_string())),
            ClientField::PreparerId => optional(value)
                .map(str::parse::<i64>)
                .transpose()
                .map(Self::PreparerId)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in ClientField::ALL {
            assert_eq!(ClientField::parse(field.as_str()), Some(field));
        }
    }

    #[test]
    fn field_parse_ignores_case_and_whitespace() {
        assert_eq!(ClientField::parse(" Income "), Some(ClientField::Income));
    }

    #[test]
    fn parse_rejects_columns_outside_allow_list() {
        for field in ["id", "name = 'x'; --", "cpa_id", ""] {
            assert_eq!(
                ClientUpdate::parse(field, "1"),
                Err(DomainViolation::UnknownField {
                    entity: "client",
                    field: field.to_string(),
                })
            );
        }
    }

    #[test]
    fn parse_typed_values() {
        assert_eq!(
            ClientUpdate::parse("income", "61250.75"),
            Ok(ClientUpdate::Income(Some(dec!(61250.75))))
        );
        assert_eq!(
            ClientUpdate::parse("preparer_id", "3"),
            Ok(ClientUpdate::PreparerId(Some(3)))
        );
        assert_eq!(
            ClientUpdate::parse("materials_submitted", "yes"),
            Ok(ClientUpdate::MaterialsSubmitted(true))
        );
        assert_eq!(
            ClientUpdate::parse("name", "  Bob  "),
            Ok(ClientUpdate::Name("Bob".to_string()))
        );
    }

    #[test]
    fn parse_empty_value_clears_nullable_columns() {
        assert_eq!(ClientUpdate::parse("address", ""), Ok(ClientUpdate::Address(None)));
        assert_eq!(ClientUpdate::parse("income", " "), Ok(ClientUpdate::Income(None)));
        assert_eq!(
            ClientUpdate::parse("preparer_id", ""),
            Ok(ClientUpdate::PreparerId(None))
        );
    }

    #[test]
    fn income_must_fit_two_decimal_places() {
        assert_eq!(validate_income(dec!(99999999.99)), Ok(dec!(99999999.99)));
        assert_eq!(validate_income(dec!(50000.500)), Ok(dec!(50000.500)));
        assert!(matches!(
            validate_income(dec!(100000000)),
            Err(DomainViolation::InvalidValue { field: "income", .. })
        ));
        assert!(matches!(
            ClientUpdate::parse("income", "4503599627370496.01"),
            Err(DomainViolation::InvalidValue { field: "income", .. })
        ));
        assert!(matches!(
            ClientUpdate::parse("income", "10.125"),
            Err(DomainViolation::InvalidValue { field: "income", .. })
        ));
    }

    #[test]
    fn validate_checks_income_only() {
        let client = NewClient {
            name: "Bob".to_string(),
            address: None,
            income: Some(dec!(-0.001)),
            preparer_id: None,
        };

        assert!(client.validate().is_err());
        assert_eq!(NewClient { income: None, ..client }.validate(), Ok(()));
        assert!(ClientUpdate::Income(Some(dec!(1000000000))).validate().is_err());
        assert_eq!(ClientUpdate::Name("x".to_string()).validate(), Ok(()));
    }

    #[test]
    fn parse_rejects_bad_values() {
        assert!(matches!(
            ClientUpdate::parse("income", "lots"),
            Err(DomainViolation::InvalidValue { field: "income", .. })
        ));
        assert!(matches!(
            ClientUpdate::parse("name", ""),
            Err(DomainViolation::InvalidValue { field: "name", .. })
        ));
        assert!(matches!(
            ClientUpdate::parse("materials_submitted", "maybe"),
            Err(DomainViolation::InvalidValue { .. })
        ));
    }

    #[test]
    fn update_reports_its_field() {
        assert_eq!(ClientUpdate::Income(None).field(), ClientField::Income);
        assert_eq!(
            ClientUpdate::MaterialsSubmitted(true).field(),
            ClientField::MaterialsSubmitted
        );
    }
}
