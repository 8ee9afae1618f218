//! Outbound record assembly
//!
//! Merges the reconciled asset into the entity's asset field and normalizes
//! the other form values by declared type. Every transform is a pure
//! function of the raw value; required-field checks happen before this and
//! nothing here rejects input.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde_json::{Map, Number, Value};

use crate::reconcile::AssetReconciliationOutcome;

pub type FormFields = Map<String, Value>;
pub type OutboundRecord = Map<String, Value>;

/// Wire format for date-only fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for date-and-time fields
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
const DATE_TIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// Masked phone input, sent as digits only
    Phone,
    /// Promo codes, registry codes: trimmed and upper-cased
    Code,
    Date,
    DateTime,
    /// Optional count, blank means the configured default
    Quantity,
    /// Optional amount, blank means the configured default
    Price,
}

/// One declared form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// Substitutes for blank optional numeric fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericDefaults {
    pub quantity: i64,
    pub price: f64,
}

impl Default for NumericDefaults {
    fn default() -> Self {
        Self {
            quantity: 0,
            price: 0.0,
        }
    }
}

/// The reconciled asset together with what it is reconciled against
#[derive(Debug, Clone, Copy)]
pub struct AssetBinding<'a> {
    /// Record key holding the asset (`photo`, `image`, `file`, ...)
    pub key: &'a str,
    pub prior: Option<&'a str>,
    pub outcome: &'a AssetReconciliationOutcome,
}

impl AssetBinding<'_> {
    /// Value for the asset key; `None` means the key is left out.
    pub fn value(&self) -> Option<Value> {
        match self.outcome {
            AssetReconciliationOutcome::Unchanged => {
                self.prior.map(|reference| Value::String(reference.to_string()))
            }
            AssetReconciliationOutcome::Replaced(asset) => Some(Value::String(asset.to_data_uri())),
            AssetReconciliationOutcome::Removed => Some(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmitAssembler<'a> {
    fields: &'a [FieldSpec],
    defaults: NumericDefaults,
}

impl<'a> SubmitAssembler<'a> {
    pub fn new(fields: &'a [FieldSpec], defaults: NumericDefaults) -> Self {
        Self { fields, defaults }
    }

    pub fn assemble(&self, form: &FormFields, asset: &AssetBinding<'_>) -> OutboundRecord {
        let mut record = form.clone();

        for field in self.fields {
            let raw = record.get(field.name);
            if let Some(value) = self.transform(field, raw) {
                record.insert(field.name.to_string(), value);
            }
        }

        match asset.value() {
            Some(value) => {
                record.insert(asset.key.to_string(), value);
            }
            None => {
                record.remove(asset.key);
            }
        }

        debug!("assembled record with {} field(s)", record.len());
        record
    }

    /// New value for a field, or `None` to leave the record as it is
    fn transform(&self, field: &FieldSpec, raw: Option<&Value>) -> Option<Value> {
        match field.field_type {
            FieldType::Text => None,
            FieldType::Phone => raw.and_then(as_text).map(|s| Value::String(strip_phone(&s))),
            FieldType::Code => raw.and_then(as_text).map(|s| Value::String(normalize_code(&s))),
            FieldType::Date => raw.and_then(as_text).map(|s| serialize_date_value(&s, false)),
            FieldType::DateTime => raw.and_then(as_text).map(|s| serialize_date_value(&s, true)),
            FieldType::Quantity => Some(numeric_or(raw, Value::from(self.defaults.quantity))),
            FieldType::Price => Some(numeric_or(
                raw,
                Number::from_f64(self.defaults.price)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            )),
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// "+7 (912) 345-67-89" -> "79123456789"
pub fn strip_phone(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_code(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Serialize a date-picker value to the wire format.
///
/// Accepts ISO dates, RFC 3339 timestamps (the date is taken in the
/// timestamp's own offset) and day-first dotted dates. Returns `None` when
/// the value matches none of them.
pub fn serialize_date(value: &str, with_time: bool) -> Option<String> {
    let value = value.trim();
    let format = if with_time { DATE_TIME_FORMAT } else { DATE_FORMAT };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.naive_local().format(format).to_string());
    }
    for input in DATE_TIME_INPUTS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, input) {
            return Some(datetime.format(format).to_string());
        }
    }
    for input in DATE_INPUTS {
        if let Ok(date) = NaiveDate::parse_from_str(value, input) {
            return Some(date.and_hms_opt(0, 0, 0)?.format(format).to_string());
        }
    }
    None
}

fn serialize_date_value(value: &str, with_time: bool) -> Value {
    if value.trim().is_empty() {
        return Value::Null;
    }
    match serialize_date(value, with_time) {
        Some(serialized) => Value::String(serialized),
        None => {
            warn!("unrecognized date value {:?}, sending as-is", value);
            Value::String(value.to_string())
        }
    }
}

/// Blank -> default, numeric text -> number, anything else unchanged
fn numeric_or(raw: Option<&Value>, default: Value) -> Value {
    match raw {
        None | Some(Value::Null) => default,
        Some(Value::String(s)) if s.trim().is_empty() => default,
        Some(Value::String(s)) => parse_number(s).unwrap_or_else(|| Value::String(s.clone())),
        Some(other) => other.clone(),
    }
}

/// Spaces are thousands separators. A single comma is a decimal point only
/// when it is the sole separator and at most two digits follow it
/// ("12,5", "99,90"); anything else with a comma ("1,500", "1.500,00") is
/// ambiguous and stays text.
fn parse_number(text: &str) -> Option<Value> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let text = match text.split_once(',') {
        None => text,
        Some((whole, fraction))
            if !whole.contains('.')
                && (1..=2).contains(&fraction.len())
                && fraction.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{}.{}", whole, fraction)
        }
        Some(_) => return None,
    };
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::EncodedAsset;
    use rstest::rstest;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::optional("phone", FieldType::Phone),
        FieldSpec::optional("promo_code", FieldType::Code),
        FieldSpec::optional("starts_on", FieldType::Date),
        FieldSpec::optional("seats", FieldType::Quantity),
        FieldSpec::optional("price", FieldType::Price),
    ];

    fn form(value: Value) -> FormFields {
        value.as_object().cloned().unwrap()
    }

    fn assemble(form: &FormFields, binding: &AssetBinding<'_>) -> OutboundRecord {
        SubmitAssembler::new(FIELDS, NumericDefaults::default()).assemble(form, binding)
    }

    #[rstest]
    #[case("+7 (912) 345-67-89", "79123456789")]
    #[case("8 912 345 67 89", "89123456789")]
    #[case("", "")]
    fn phone_mask_stripped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_phone(input), expected);
    }

    #[test]
    fn test_code_upper_cased() {
        assert_eq!(normalize_code("  spring-24 "), "SPRING-24");
    }

    #[rstest]
    #[case("2024-05-01", false, Some("2024-05-01"))]
    #[case("01.05.2024", false, Some("2024-05-01"))]
    #[case("2024-05-01T10:30:00+03:00", false, Some("2024-05-01"))]
    #[case("2024-05-01T10:30:00.000Z", true, Some("2024-05-01T10:30:00"))]
    #[case("2024-05-01 10:30", true, Some("2024-05-01T10:30:00"))]
    #[case("2024-05-01", true, Some("2024-05-01T00:00:00"))]
    #[case("next tuesday", false, None)]
    fn date_serialization(
        #[case] input: &str,
        #[case] with_time: bool,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(serialize_date(input, with_time).as_deref(), expected);
    }

    #[rstest]
    #[case("1 500", Some(json!(1500)))]
    #[case("12,5", Some(json!(12.5)))]
    #[case("99,90", Some(json!(99.9)))]
    #[case("1500.25", Some(json!(1500.25)))]
    #[case("1,500", None)]
    #[case("1.500,00", None)]
    #[case("1,2,3", None)]
    #[case("free", None)]
    fn number_parsing(#[case] input: &str, #[case] expected: Option<Value>) {
        assert_eq!(parse_number(input), expected);
    }

    #[test]
    fn test_ambiguous_price_is_sent_as_text() {
        let outcome = AssetReconciliationOutcome::Unchanged;
        let binding = AssetBinding {
            key: "image",
            prior: None,
            outcome: &outcome,
        };

        let record = assemble(&form(json!({ "price": "1,500", "seats": "3" })), &binding);

        assert_eq!(record["price"], json!("1,500"));
        assert_eq!(record["seats"], json!(3));
    }

    #[test]
    fn test_field_transforms() {
        let form = form(json!({
            "title": "  Spring meetup ",
            "phone": "+7 (912) 345-67-89",
            "promo_code": " spring ",
            "starts_on": "01.05.2024",
            "seats": "",
            "price": "1 500",
            "extra": true,
        }));
        let outcome = AssetReconciliationOutcome::Unchanged;
        let binding = AssetBinding {
            key: "image",
            prior: None,
            outcome: &outcome,
        };

        let record = assemble(&form, &binding);

        assert_eq!(record["title"], json!("  Spring meetup "));
        assert_eq!(record["phone"], json!("79123456789"));
        assert_eq!(record["promo_code"], json!("SPRING"));
        assert_eq!(record["starts_on"], json!("2024-05-01"));
        assert_eq!(record["seats"], json!(0));
        assert_eq!(record["price"], json!(1500));
        assert_eq!(record["extra"], json!(true));
    }

    #[test]
    fn test_missing_numeric_fields_get_defaults() {
        let defaults = NumericDefaults { quantity: 10, price: 99.5 };
        let outcome = AssetReconciliationOutcome::Unchanged;
        let binding = AssetBinding {
            key: "image",
            prior: None,
            outcome: &outcome,
        };

        let assembler = SubmitAssembler::new(FIELDS, defaults);
        let record = assembler.assemble(&form(json!({ "title": "x" })), &binding);

        assert_eq!(record["seats"], json!(10));
        assert_eq!(record["price"], json!(99.5));
        assert!(!record.contains_key("phone"));
    }

    #[test]
    fn test_blank_date_becomes_null() {
        let outcome = AssetReconciliationOutcome::Unchanged;
        let binding = AssetBinding {
            key: "image",
            prior: None,
            outcome: &outcome,
        };
        let record = assemble(&form(json!({ "starts_on": " " })), &binding);
        assert_eq!(record["starts_on"], Value::Null);
    }

    #[test]
    fn test_unchanged_resends_prior_verbatim() {
        let prior = "https://cdn.example.org/a.png?sig=abc%20def";
        let outcome = AssetReconciliationOutcome::Unchanged;
        let binding = AssetBinding {
            key: "image",
            prior: Some(prior),
            outcome: &outcome,
        };

        let record = assemble(&form(json!({ "image": "stale form value" })), &binding);

        assert_eq!(record["image"], json!(prior));
    }

    #[test]
    fn test_unchanged_without_prior_leaves_key_out() {
        let outcome = AssetReconciliationOutcome::Unchanged;
        let binding = AssetBinding {
            key: "image",
            prior: None,
            outcome: &outcome,
        };

        let record = assemble(&form(json!({ "title": "x", "image": null })), &binding);

        assert!(!record.contains_key("image"));
    }

    #[test]
    fn test_replaced_writes_data_string() {
        let asset = EncodedAsset::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let outcome = AssetReconciliationOutcome::Replaced(asset);
        let binding = AssetBinding {
            key: "photo",
            prior: Some("https://x/old.jpg"),
            outcome: &outcome,
        };

        let record = assemble(&form(json!({ "title": "x" })), &binding);

        assert_eq!(record["photo"], json!("data:image/jpeg;base64,/9j/2Q=="));
    }

    #[test]
    fn test_removed_writes_explicit_null() {
        let outcome = AssetReconciliationOutcome::Removed;
        let binding = AssetBinding {
            key: "file",
            prior: Some("https://x/doc.pdf"),
            outcome: &outcome,
        };

        let record = assemble(&form(json!({ "title": "x" })), &binding);

        assert!(record.contains_key("file"));
        assert_eq!(record["file"], Value::Null);
    }
}
