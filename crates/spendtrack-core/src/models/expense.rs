use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ExpenseRecord {
    pub amount: f64,
    pub merchant: String,
    pub currency: String,
    #[serde(rename = "created_at", deserialize_with = "deserialize_timestamp")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    pub fn display_amount(&self) -> String {
        format!("{:.2} {}", self.amount, self.currency)
    }

    pub fn display_date(&self) -> String {
        self.created_at.format("%b %d, %Y").to_string()
    }
}

/// Aggregate shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseSummary {
    pub count: usize,
    /// Totals keyed by currency code, sorted for stable display
    pub totals: BTreeMap<String, f64>,
    pub latest: Option<DateTime<Utc>>,
}

impl ExpenseSummary {
    pub fn from_records(records: &[ExpenseRecord]) -> Self {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for record in records {
            *totals.entry(record.currency.clone()).or_default() += record.amount;
        }
        Self {
            count: records.len(),
            totals,
            latest: records.iter().map(|r| r.created_at).max(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC), or epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", ms))),
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {}", text))),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64, currency: &str, created_at: &str) -> ExpenseRecord {
        ExpenseRecord {
            amount,
            merchant: "Cafe".to_string(),
            currency: currency.to_string(),
            created_at: parse_timestamp(created_at).unwrap(),
        }
    }

    #[test]
    fn test_parse_expense_list() {
        let json = r#"[
            {"amount": 12.5, "merchant": "Cafe", "currency": "USD", "created_at": "2024-03-01T10:15:00Z"},
            {"amount": 300, "merchant": "Grocer", "currency": "INR", "created_at": "2024-03-02T08:00:00.123"},
            {"amount": 7, "merchant": "Kiosk", "currency": "USD", "created_at": 1709280000000}
        ]"#;

        let expenses: Vec<ExpenseRecord> = serde_json::from_str(json)
            .expect("Failed to parse expenses test JSON");
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses[0].merchant, "Cafe");
        assert_eq!(expenses[1].amount, 300.0);
        assert_eq!(expenses[2].created_at.timestamp(), 1709280000);
        assert_eq!(expenses[0].display_date(), "Mar 01, 2024");
        assert_eq!(expenses[0].display_amount(), "12.50 USD");
    }

    #[test]
    fn test_rejects_garbage_timestamp() {
        let json = r#"{"amount": 1, "merchant": "m", "currency": "USD", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<ExpenseRecord>(json).is_err());
    }

    #[test]
    fn test_summary_groups_by_currency() {
        let records = vec![
            record(10.0, "USD", "2024-01-01T00:00:00Z"),
            record(5.5, "USD", "2024-02-01T00:00:00Z"),
            record(100.0, "EUR", "2024-01-15T00:00:00Z"),
        ];
        let summary = ExpenseSummary::from_records(&records);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.totals["USD"], 15.5);
        assert_eq!(summary.totals["EUR"], 100.0);
        assert_eq!(summary.latest, parse_timestamp("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn test_summary_empty() {
        let summary = ExpenseSummary::from_records(&[]);
        assert_eq!(summary, ExpenseSummary::default());
    }
}
