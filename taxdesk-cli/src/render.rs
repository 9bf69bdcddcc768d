//! Plain-text lines for command output.

use chrono::SecondsFormat;
use taxdesk_core::{Assistant, Client, Preparer, TaxReturn};

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

pub fn preparer(p: &Preparer) -> String {
    format!("{:>4}  {}", p.id, p.name)
}

pub fn assistant(a: &Assistant) -> String {
    format!("{:>4}  {}", a.id, a.name)
}

pub fn client(c: &Client) -> String {
    format!(
        "{:>4}  {}  address={}  income={}  materials_submitted={}  preparer={}",
        c.id,
        c.name,
        or_dash(c.address.clone()),
        or_dash(c.income.map(|i| i.to_string())),
        c.materials_submitted,
        or_dash(c.preparer_id.map(|id| id.to_string())),
    )
}

pub fn tax_return(r: &TaxReturn) -> String {
    format!(
        "{:>4}  client={}  filed={}  filed_at={}  checked_by_preparer={}  filed_by_assistant={}",
        r.id,
        r.client_id,
        r.status,
        or_dash(
            r.filing_timestamp
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        ),
        r.checked_by_preparer,
        r.filed_by_assistant,
    )
}

/// One line per item, or a note when there is nothing to show.
pub fn list<T>(
    items: &[T],
    line: fn(&T) -> String,
) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items.iter().map(line).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn client_line_shows_missing_values_as_dash() {
        let c = Client {
            id: 2,
            name: "Bob".to_string(),
            address: None,
            income: Some(dec!(48250.75)),
            materials_submitted: false,
            preparer_id: None,
        };

        assert_eq!(
            client(&c),
            "   2  Bob  address=-  income=48250.75  materials_submitted=false  preparer=-"
        );
    }

    #[test]
    fn tax_return_line_uses_utc_timestamp() {
        let r = TaxReturn {
            id: 1,
            client_id: 1,
            status: true,
            filing_timestamp: Some(Utc.with_ymd_and_hms(2025, 4, 15, 9, 30, 0).unwrap()),
            checked_by_preparer: false,
            filed_by_assistant: true,
        };

        assert_eq!(
            tax_return(&r),
            "   1  client=1  filed=true  filed_at=2025-04-15T09:30:00Z  \
             checked_by_preparer=false  filed_by_assistant=true"
        );
    }

    #[test]
    fn empty_list() {
        assert_eq!(list::<Preparer>(&[], preparer), "(none)");
    }

    #[test]
    fn list_joins_lines() {
        let people = vec![
            Preparer {
                id: 1,
                name: "Jane".to_string(),
            },
            Preparer {
                id: 2,
                name: "Omar".to_string(),
            },
        ];

        assert_eq!(list(&people, preparer), "   1  Jane\n   2  Omar");
    }
}
