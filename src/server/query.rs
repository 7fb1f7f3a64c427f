//! `/topdf` query string parsing.
//!
//! Accepted keys:
//!
//! - `pdf` (or `pdf[]`), repeatable: one URL per occurrence, in order
//! - `pdfDir`: target directory
//! - `options`: a JSON object, or `options[key]=value` pairs
//!
//! Values are percent-decoded exactly once. Empty `pdf` and `pdfDir` values
//! count as absent.

use serde_json::{Map, Number, Value};
use url::form_urlencoded;

use crate::error::{Result, UrlCatError};

/// Parsed `/topdf` parameters.
#[derive(Debug, Default, PartialEq)]
pub struct TopdfQuery {
    /// URLs in query order.
    pub pdf: Vec<String>,

    /// Target directory as given.
    pub pdf_dir: Option<String>,

    /// Render option overrides.
    pub options: Map<String, Value>,
}

impl TopdfQuery {
    /// Parse a raw query string. `None` means no query at all.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `options` is not a JSON object.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return Ok(query);
        };

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "pdf" | "pdf[]" => {
                    if !value.trim().is_empty() {
                        query.pdf.push(value.into_owned());
                    }
                }
                "pdfDir" => {
                    query.pdf_dir = Some(value.into_owned()).filter(|dir| !dir.trim().is_empty());
                }
                "options" => query.options.extend(parse_options_json(&value)?),
                other => {
                    if let Some(name) = other
                        .strip_prefix("options[")
                        .and_then(|rest| rest.strip_suffix(']'))
                        .filter(|name| !name.is_empty())
                    {
                        insert_option(&mut query.options, name, coerce(&value));
                    }
                }
            }
        }

        Ok(query)
    }
}

fn parse_options_json(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(UrlCatError::validation("options must be a JSON object")),
        Err(e) => Err(UrlCatError::validation(format!("options is not valid JSON: {e}"))),
    }
}

/// A repeated bracket key collects its values into an array.
fn insert_option(options: &mut Map<String, Value>, name: &str, value: Value) {
    match options.get_mut(name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            options.insert(name.to_string(), value);
        }
    }
}

fn coerce(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }

    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_no_query() {
        assert_eq!(TopdfQuery::parse(None).unwrap(), TopdfQuery::default());
    }

    #[test]
    fn test_repeated_pdf_keeps_order() {
        let query = TopdfQuery::parse(Some(
            "pdf=https%3A%2F%2Fb.test%2F&pdf[]=https://a.test/x%3Fy%3D1&pdfDir=public%2Fpdf",
        ))
        .unwrap();

        assert_eq!(query.pdf, vec!["https://b.test/", "https://a.test/x?y=1"]);
        assert_eq!(query.pdf_dir.as_deref(), Some("public/pdf"));
    }

    #[test]
    fn test_decodes_once() {
        let query = TopdfQuery::parse(Some("pdf=https%3A%2F%2Fa.test%2F%3Fq%3Da%2520b")).unwrap();
        assert_eq!(query.pdf, vec!["https://a.test/?q=a%20b"]);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let query = TopdfQuery::parse(Some("pdf=&pdfDir=")).unwrap();
        assert!(query.pdf.is_empty());
        assert!(query.pdf_dir.is_none());
    }

    #[test]
    fn test_options_json() {
        let query =
            TopdfQuery::parse(Some("options=%7B%22dpi%22%3A300%2C%22grayscale%22%3Atrue%7D"))
                .unwrap();

        assert_eq!(Value::Object(query.options), json!({"dpi": 300, "grayscale": true}));
    }

    #[rstest]
    #[case("options=%5B1%5D")]
    #[case("options=%7Bbroken")]
    fn test_bad_options_json(#[case] raw: &str) {
        let err = TopdfQuery::parse(Some(raw)).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[rstest]
    #[case("true", json!(true))]
    #[case("false", json!(false))]
    #[case("300", json!(300))]
    #[case("0.5", json!(0.5))]
    #[case("Letter", json!("Letter"))]
    fn test_bracket_options_coerced(#[case] raw: &str, #[case] expected: Value) {
        let query = TopdfQuery::parse(Some(&format!("options[value]={raw}"))).unwrap();
        assert_eq!(query.options.get("value"), Some(&expected));
    }

    #[test]
    fn test_repeated_bracket_option_becomes_array() {
        let query = TopdfQuery::parse(Some(
            "options[allow]=a&options[allow]=b&options[allow]=c",
        ))
        .unwrap();

        assert_eq!(query.options.get("allow"), Some(&json!(["a", "b", "c"])));
    }
}
