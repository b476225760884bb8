use std::collections::BTreeMap;

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Per-currency totals joined for a single line, e.g. `42.10 EUR, 12.50 USD`
pub fn format_totals(totals: &BTreeMap<String, f64>) -> String {
    if totals.is_empty() {
        return "-".to_string();
    }
    totals
        .iter()
        .map(|(currency, amount)| format!("{:.2} {}", amount, currency))
        .collect::<Vec<_>>()
        .join(", ")
}
