//! Field rules shared by every public form.
//!
//! Each form declares a static table of [`FieldSpec`]s; the same table drives
//! the per-field check a client runs when a field loses focus and the
//! whole-form check run before anything is sent upstream.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Required free text with inclusive character bounds.
    Text { min: usize, max: usize },
    /// Free text that may be left empty.
    OptionalText { max: usize },
    Email,
    /// Required single choice from a select input.
    Choice,
    /// Multi-select requiring at least one entry.
    Selection,
    /// Optional list without a minimum.
    OptionalList,
    /// Optional absolute http(s) URL.
    Url,
    /// Optional whole number within inclusive bounds.
    Range { min: i64, max: i64 },
    /// Checkbox that must be ticked.
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rule: FieldRule,
}

/// Value of a single field, detached from the form it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Text(String),
    List(Vec<String>),
    Number(i64),
    Flag(bool),
}

impl FieldValue {
    pub fn text(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::text)
    }

    pub fn optional_number(value: Option<u32>) -> Self {
        value.map_or(FieldValue::Missing, |number| FieldValue::Number(i64::from(number)))
    }

    /// Interpret a JSON value sent by a client for on-blur checks.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Missing,
            Value::String(text) => FieldValue::Text(text.clone()),
            Value::Bool(flag) => FieldValue::Flag(*flag),
            Value::Number(number) => number
                .as_i64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(number.to_string())),
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            Value::Object(_) => FieldValue::Text(value.to_string()),
        }
    }

    /// Human-readable rendering used by review summaries.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Text(text) => text.trim().to_string(),
            FieldValue::List(items) => items.join(", "),
            FieldValue::Number(number) => number.to_string(),
            FieldValue::Flag(true) => "Yes".to_string(),
            FieldValue::Flag(false) => "No".to_string(),
        }
    }
}

impl FieldRule {
    pub fn check(&self, label: &str, value: &FieldValue) -> Result<(), String> {
        match self {
            FieldRule::Text { min, max } => {
                let text = text_of(value);
                if text.is_empty() {
                    return Err(format!("{label} is required"));
                }
                check_length(label, text, *min, *max)
            }
            FieldRule::OptionalText { max } => {
                let text = text_of(value);
                if text.is_empty() {
                    Ok(())
                } else {
                    check_length(label, text, 0, *max)
                }
            }
            FieldRule::Email => {
                let text = text_of(value);
                if text.is_empty() {
                    Err(format!("{label} is required"))
                } else if is_email(text) {
                    Ok(())
                } else {
                    Err("Please enter a valid email address".to_string())
                }
            }
            FieldRule::Choice => {
                if text_of(value).is_empty() {
                    Err(format!("Please select {}", with_article(label)))
                } else {
                    Ok(())
                }
            }
            FieldRule::Selection => match value {
                FieldValue::List(items) if items.iter().any(|item| !item.trim().is_empty()) => {
                    Ok(())
                }
                _ => Err(format!("Please select at least one {}", label.to_lowercase())),
            },
            FieldRule::OptionalList => match value {
                FieldValue::Missing | FieldValue::List(_) => Ok(()),
                _ => Err(format!("{label} must be a list")),
            },
            FieldRule::Url => {
                let text = text_of(value);
                if text.is_empty() || is_url(text) {
                    Ok(())
                } else {
                    Err(format!("{label} must be a valid URL"))
                }
            }
            FieldRule::Range { min, max } => match value {
                FieldValue::Missing => Ok(()),
                FieldValue::Number(number) if (*min..=*max).contains(number) => Ok(()),
                _ => Err(format!("{label} must be between {min} and {max}")),
            },
            FieldRule::Accepted => match value {
                FieldValue::Flag(true) => Ok(()),
                _ => Err(format!("You must accept {}", label.to_lowercase())),
            },
        }
    }
}

fn text_of(value: &FieldValue) -> &str {
    match value {
        FieldValue::Text(text) => text.trim(),
        _ => "",
    }
}

fn check_length(label: &str, text: &str, min: usize, max: usize) -> Result<(), String> {
    let length = text.chars().count();
    if length < min {
        Err(format!("{label} must be at least {min} characters"))
    } else if length > max {
        Err(format!("{label} must be at most {max} characters"))
    } else {
        Ok(())
    }
}

fn with_article(label: &str) -> String {
    let lower = label.to_lowercase();
    match lower.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {lower}"),
        _ => format!("a {lower}"),
    }
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

pub fn is_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            host.contains('.') && !host.starts_with('.') && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Field name to message, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, message) in other.fields {
            self.fields.entry(field).or_insert(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "please correct the following fields: {}", names.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Run every rule in `specs` against the values produced by `value_of`.
pub fn validate_fields<F>(specs: &[FieldSpec], mut value_of: F) -> Result<(), ValidationErrors>
where
    F: FnMut(&str) -> FieldValue,
{
    let mut errors = ValidationErrors::new();
    for spec in specs {
        if let Err(message) = spec.rule.check(spec.label, &value_of(spec.name)) {
            errors.add(spec.name, message);
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_shape() {
        assert!(is_email("ada@example.org"));
        assert!(is_email("first.last+tag@mail.example.co"));
        assert!(!is_email("ada@example"));
        assert!(!is_email("@example.org"));
        assert!(!is_email("ada@@example.org"));
        assert!(!is_email("ada @example.org"));
        assert!(!is_email("ada@example..org"));
    }

    #[test]
    fn url_shape() {
        assert!(is_url("https://linkedin.com/in/ada"));
        assert!(is_url("http://portfolio.example.org"));
        assert!(!is_url("linkedin.com/in/ada"));
        assert!(!is_url("https://localhost"));
    }

    #[test]
    fn text_bounds_count_characters() {
        let rule = FieldRule::Text { min: 2, max: 4 };
        assert_eq!(rule.check("Name", &FieldValue::text("  ")), Err("Name is required".to_string()));
        assert_eq!(
            rule.check("Name", &FieldValue::text("A")),
            Err("Name must be at least 2 characters".to_string())
        );
        assert!(rule.check("Name", &FieldValue::text("Éloï")).is_ok());
        assert_eq!(
            rule.check("Name", &FieldValue::text("Ada Lovelace")),
            Err("Name must be at most 4 characters".to_string())
        );
    }

    #[test]
    fn choice_and_selection_messages() {
        assert_eq!(
            FieldRule::Choice.check("Industry", &FieldValue::Missing),
            Err("Please select an industry".to_string())
        );
        assert_eq!(
            FieldRule::Selection.check("Skill", &FieldValue::List(vec![" ".to_string()])),
            Err("Please select at least one skill".to_string())
        );
        assert!(FieldRule::Selection
            .check("Skill", &FieldValue::List(vec!["Rust".to_string()]))
            .is_ok());
    }

    #[test]
    fn json_values_map_to_field_values() {
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Missing);
        assert_eq!(FieldValue::from_json(&json!(12)), FieldValue::Number(12));
        assert_eq!(
            FieldValue::from_json(&json!(["a", 1, "b"])),
            FieldValue::List(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(FieldValue::from_json(&json!(true)), FieldValue::Flag(true));
    }

    #[test]
    fn range_and_acceptance() {
        let years = FieldRule::Range { min: 0, max: 60 };
        assert!(years.check("Years", &FieldValue::Missing).is_ok());
        assert!(years.check("Years", &FieldValue::Number(61)).is_err());
        assert!(FieldRule::Accepted
            .check("The privacy policy", &FieldValue::Flag(false))
            .is_err());
    }

    #[test]
    fn validate_fields_collects_first_error_per_field() {
        const SPECS: &[FieldSpec] = &[
            FieldSpec {
                name: "name",
                label: "Name",
                rule: FieldRule::Text { min: 2, max: 10 },
            },
            FieldSpec {
                name: "email",
                label: "Email",
                rule: FieldRule::Email,
            },
        ];

        let errors = validate_fields(SPECS, |_| FieldValue::Missing).expect_err("both missing");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert!(errors.to_string().contains("email, name"));
    }
}
