//! Conversion between relational rows and application records.
//!
//! Adapters are pure and total: every row the schema admits converts to a
//! record, and `to_remote(&to_internal(row)) == row` for every column.
//! Product list columns keep the text they were loaded with until the list
//! itself changes, then are rewritten as JSON arrays.
//! Enum columns stored as text fall back to a fixed variant when the value is
//! unknown (`other` for payment methods, `completed` for sale status,
//! `adjustment` for movement kinds).

mod catalog;
mod sale;
mod stock;

pub use catalog::{CategoryAdapter, GoalAdapter, ProductAdapter, SellerAdapter};
pub use sale::SaleAdapter;
pub use stock::StockMovementAdapter;

/// Two-way mapping between a stored row and the record the application works with.
pub trait PersistenceAdapter {
    type Row;
    type Record;

    fn to_internal(row: Self::Row) -> Self::Record;

    fn to_remote(record: &Self::Record) -> Self::Row;
}

/// Reads a list column. New rows hold a JSON array of strings; anything
/// else is treated as comma-separated text from older rows.
pub(crate) fn decode_list(column: Option<&str>) -> Vec<String> {
    let Some(raw) = column else {
        return Vec::new();
    };
    if let Ok(entries) = serde_json::from_str::<Vec<String>>(raw) {
        return entries;
    }
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Writes a list column as a JSON array; an empty list is stored as NULL.
pub(crate) fn encode_list(entries: &[String]) -> Option<String> {
    if entries.is_empty() {
        None
    } else {
        serde_json::to_string(entries).ok()
    }
}

/// Keeps the loaded column text while it still decodes to `entries`.
pub(crate) fn list_column(stored: &Option<String>, entries: &[String]) -> Option<String> {
    if decode_list(stored.as_deref()) == entries {
        stored.clone()
    } else {
        encode_list(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_columns_hold_json_arrays() {
        let sizes = vec!["10,12".to_string(), " P ".to_string()];
        let column = encode_list(&sizes);
        assert_eq!(column.as_deref(), Some(r#"["10,12"," P "]"#));
        assert_eq!(decode_list(column.as_deref()), sizes);
        assert_eq!(encode_list(&[]), None);
    }

    #[test]
    fn older_comma_separated_rows_still_read() {
        assert_eq!(decode_list(Some("P, M,,G")), vec!["P", "M", "G"]);
        assert!(decode_list(None).is_empty());
        assert!(decode_list(Some("")).is_empty());
    }

    #[test]
    fn untouched_lists_keep_their_column_text() {
        let stored = Some("P, M".to_string());
        assert_eq!(list_column(&stored, &["P".into(), "M".into()]), stored);
        assert_eq!(list_column(&Some(String::new()), &[]), Some(String::new()));
        assert_eq!(
            list_column(&stored, &["G".into()]).as_deref(),
            Some(r#"["G"]"#)
        );
    }
}
