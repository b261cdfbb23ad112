//! Rows of the remote invoice table.
//!
//! The table is loosely typed: money may arrive as a JSON number or a numeric
//! string, ids as numbers or strings, and `documents` as a list, a JSON-encoded
//! list or a bare string. Everything is normalized on deserialization.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoiceRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub load_number: Option<String>,
    #[serde(default)]
    pub purchase_file_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "money")]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "money")]
    pub balance: Option<Decimal>,
    #[serde(default, deserialize_with = "money")]
    pub fee: Option<Decimal>,
    #[serde(default, deserialize_with = "documents")]
    pub documents: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// Document URLs from whatever shape the table stored them in.
///
/// Accepts a list, a JSON-encoded list or a single string. Non-string and
/// blank entries are dropped.
pub fn normalize_documents(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => non_blank_strings(items),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => non_blank_strings(&items),
            Ok(Value::String(inner)) => single(inner),
            _ => single(text.clone()),
        },
        _ => Vec::new(),
    }
}

fn non_blank_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn single(text: String) -> Vec<String> {
    if text.trim().is_empty() { Vec::new() } else { vec![text] }
}

/// Decimal from a JSON number or a `$`/`,`-decorated numeric string.
pub(crate) fn money_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().chars().filter(|c| *c != '$' && *c != ',').collect(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn money<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(money_from_value))
}

fn documents<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_documents(&value))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn json_encoded_list_is_filtered() {
        let value = json!("[\"http://a\",\"\",null]");
        assert_eq!(normalize_documents(&value), vec!["http://a".to_string()]);
    }

    #[test]
    fn bare_string_is_wrapped() {
        assert_eq!(
            normalize_documents(&json!("https://files.test/bol.pdf")),
            vec!["https://files.test/bol.pdf".to_string()]
        );
        assert!(normalize_documents(&json!("   ")).is_empty());
    }

    #[test]
    fn list_and_other_shapes() {
        assert_eq!(
            normalize_documents(&json!(["a", 1, " ", "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(normalize_documents(&Value::Null).is_empty());
        assert!(normalize_documents(&json!({"url": "a"})).is_empty());
    }

    #[test]
    fn row_accepts_loose_types() {
        let row: InvoiceRow = serde_json::from_value(json!({
            "id": 42,
            "invoice_number": "6834",
            "amount": "1,250.50",
            "balance": 150,
            "fee": null,
            "documents": "[\"https://files.test/a.pdf\"]"
        }))
        .unwrap();

        assert_eq!(row.id, "42");
        assert_eq!(row.amount, Some(Decimal::new(125050, 2)));
        assert_eq!(row.balance, Some(Decimal::from(150)));
        assert_eq!(row.fee, None);
        assert_eq!(row.documents, vec!["https://files.test/a.pdf".to_string()]);
        assert_eq!(row.customer_name, None);
    }

    #[test]
    fn unparsable_money_is_missing() {
        assert_eq!(money_from_value(&json!("n/a")), None);
        assert_eq!(money_from_value(&json!(true)), None);
        assert_eq!(money_from_value(&json!(1e3)), Some(Decimal::from(1000)));
    }

    #[test]
    fn row_without_id_is_rejected() {
        assert!(serde_json::from_value::<InvoiceRow>(json!({"invoice_number": "1"})).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalized documents never contain blank entries, whether
        /// the list arrives as JSON or JSON-in-a-string.
        #[test]
        fn normalized_documents_are_non_blank(
            items in prop::collection::vec(prop_oneof![
                "[ a-z:/.]{0,12}".prop_map(Value::String),
                Just(Value::Null),
                any::<i64>().prop_map(|n| json!(n)),
            ], 0..12)
        ) {
            let list = Value::Array(items);
            let encoded = Value::String(list.to_string());
            for docs in [normalize_documents(&list), normalize_documents(&encoded)] {
                prop_assert!(docs.iter().all(|d| !d.trim().is_empty()));
            }
            prop_assert_eq!(normalize_documents(&list), normalize_documents(&encoded));
        }
    }
}
