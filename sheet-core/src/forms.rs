//! Reading raw step input.
//!
//! Step input arrives as a JSON object, typically straight from a submitted
//! form. [`FormReader`] pulls typed values out of it and records a field error
//! for every value it cannot use, so one pass over a form reports every
//! problem at once. Unknown fields are ignored.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::catalog::UnknownOption;
use crate::validation::{FieldErrors, RuleViolation, GLOBAL_PATH};

/// Field carrying the submit intent (`select`, `submit`, `restart`).
pub const INTENT_FIELD: &str = "intent";

/// Typed access to one JSON object, collecting errors as it goes.
pub struct FormReader<'a> {
    fields: Option<&'a Map<String, Value>>,
    prefix: String,
    errors: FieldErrors,
}

impl<'a> FormReader<'a> {
    pub fn new(input: &'a Value) -> Self {
        let mut reader = Self {
            fields: input.as_object(),
            prefix: String::new(),
            errors: FieldErrors::new(),
        };
        if reader.fields.is_none() && !input.is_null() {
            reader.errors.add(
                GLOBAL_PATH,
                RuleViolation::InvalidType { expected: "object" },
            );
        }
        reader
    }

    /// Full path of a field, including the nesting prefix.
    pub fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    /// Record an error against a field of this reader.
    pub fn reject(&mut self, field: &str, violation: RuleViolation) {
        let path = self.path(field);
        self.errors.add(path, violation);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    /// Everything collected so far, leaving the reader empty.
    pub fn fail(&mut self) -> FieldErrors {
        std::mem::take(&mut self.errors)
    }

    /// `Err` with everything collected so far, if anything was collected.
    pub fn finish(&mut self) -> Result<(), FieldErrors> {
        self.fail().into_result()
    }

    /// Add errors produced by a rule check, with paths relative to this
    /// reader's fields.
    pub fn merge(&mut self, errors: FieldErrors) {
        if self.prefix.is_empty() {
            self.errors.merge(errors);
        } else {
            self.errors.merge(errors.prefixed(&self.prefix));
        }
    }

    /// Whether an error was already recorded for a field.
    pub fn rejected(&self, field: &str) -> bool {
        self.errors.contains(&self.path(field))
    }

    /// Whether a field was given a non-null value.
    pub fn is_present(&self, field: &str) -> bool {
        self.raw(field).is_some()
    }

    /// Reader over the same fields that reports paths under `prefix`.
    pub fn scoped(&self, prefix: &str) -> FormReader<'a> {
        FormReader {
            fields: self.fields,
            prefix: self.path(prefix),
            errors: FieldErrors::new(),
        }
    }

    /// Non-null value of a field.
    fn raw(&self, field: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|fields| fields.get(field))
            .filter(|value| !value.is_null())
    }

    /// The submit intent, lowercased. Absent means a plain submit.
    pub fn intent(&self) -> Option<String> {
        self.raw(INTENT_FIELD)
            .and_then(Value::as_str)
            .map(|intent| intent.trim().to_lowercase())
    }

    /// Required non-empty text, trimmed.
    pub fn text(&mut self, field: &str) -> Option<String> {
        let value = self.optional_text_inner(field, true);
        if value.is_none() && !self.rejected(field) {
            self.reject(field, RuleViolation::Missing);
        }
        value
    }

    /// Optional text; blank counts as absent.
    pub fn optional_text(&mut self, field: &str) -> Option<String> {
        self.optional_text_inner(field, false)
    }

    fn optional_text_inner(&mut self, field: &str, required: bool) -> Option<String> {
        match self.raw(field)? {
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    if required {
                        self.reject(field, RuleViolation::Empty);
                    }
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            _ => {
                self.reject(field, RuleViolation::InvalidType { expected: "text" });
                None
            }
        }
    }

    /// Required catalog value.
    pub fn choice<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownOption>,
    {
        let value = self.optional_choice(field);
        if value.is_none() && !self.rejected(field) {
            self.reject(field, RuleViolation::Missing);
        }
        value
    }

    /// Optional catalog value; blank text counts as absent.
    pub fn optional_choice<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownOption>,
    {
        let raw = self.raw(field)?;
        let path = self.path(field);
        let parsed = parse_scalar(raw)?;
        match parsed {
            Ok(value) => Some(value),
            Err(violation) => {
                self.errors.add(path, violation);
                None
            }
        }
    }

    /// Required list of catalog values. An empty list is allowed; arity rules
    /// belong to the caller. Bad entries are reported as `field[i]`.
    pub fn choices<T>(&mut self, field: &str) -> Option<Vec<T>>
    where
        T: FromStr<Err = UnknownOption>,
    {
        if self.raw(field).is_none() {
            self.reject(field, RuleViolation::Missing);
            return None;
        }
        self.optional_choices(field)
    }

    /// List of catalog values where an absent field reads as empty.
    pub fn optional_choices<T>(&mut self, field: &str) -> Option<Vec<T>>
    where
        T: FromStr<Err = UnknownOption>,
    {
        let Some(raw) = self.raw(field) else {
            return Some(Vec::new());
        };
        let Some(items) = raw.as_array() else {
            self.reject(field, RuleViolation::InvalidType { expected: "list" });
            return None;
        };

        let mut values = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, item) in items.iter().enumerate() {
            match parse_scalar::<T>(item) {
                Some(Ok(value)) => values.push(value),
                Some(Err(violation)) => {
                    self.reject(&format!("{field}[{index}]"), violation);
                    failed = true;
                }
                None => {
                    self.reject(&format!("{field}[{index}]"), RuleViolation::Missing);
                    failed = true;
                }
            }
        }
        (!failed).then_some(values)
    }

    /// Required list of text entries with at least one non-blank entry.
    /// Blank entries are dropped.
    pub fn text_list(&mut self, field: &str) -> Option<Vec<String>> {
        let entries = self.optional_text_list(field)?;
        if entries.is_empty() {
            self.reject(field, RuleViolation::Empty);
            return None;
        }
        Some(entries)
    }

    /// Like [`text_list`](Self::text_list) but absent or empty is fine.
    /// A single string is read as a one-entry list.
    pub fn optional_text_list(&mut self, field: &str) -> Option<Vec<String>> {
        let Some(raw) = self.raw(field) else {
            return Some(Vec::new());
        };
        let items: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            single @ Value::String(_) => vec![single],
            _ => {
                self.reject(field, RuleViolation::InvalidType { expected: "list" });
                return None;
            }
        };

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item.as_str() {
                Some(text) if !text.trim().is_empty() => entries.push(text.trim().to_string()),
                Some(_) => {}
                None => {
                    self.reject(
                        &format!("{field}[{index}]"),
                        RuleViolation::InvalidType { expected: "text" },
                    );
                    return None;
                }
            }
        }
        Some(entries)
    }

    /// Required integer within `min..=max`. Numeric strings are accepted.
    pub fn integer(&mut self, field: &str, min: i64, max: i64) -> Option<i64> {
        let Some(raw) = self.raw(field) else {
            self.reject(field, RuleViolation::Missing);
            return None;
        };
        let value = match raw {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(value) = value else {
            self.reject(
                field,
                RuleViolation::InvalidType {
                    expected: "whole number",
                },
            );
            return None;
        };
        if !(min..=max).contains(&value) {
            self.reject(field, RuleViolation::OutOfRange { value, min, max });
            return None;
        }
        Some(value)
    }

    /// Reader over a required nested object. Its errors are merged back
    /// with [`absorb`](Self::absorb).
    pub fn nested(&mut self, field: &str) -> Option<FormReader<'a>> {
        let Some(raw) = self.raw(field) else {
            self.reject(field, RuleViolation::Missing);
            return None;
        };
        let Some(fields) = raw.as_object() else {
            self.reject(field, RuleViolation::InvalidType { expected: "object" });
            return None;
        };
        Some(FormReader {
            fields: Some(fields),
            prefix: self.path(field),
            errors: FieldErrors::new(),
        })
    }

    /// Take over the errors of a nested reader.
    pub fn absorb(&mut self, nested: FormReader<'_>) {
        self.errors.merge(nested.errors);
    }
}

/// Parse a string or number into a catalog value. `None` for blank input.
fn parse_scalar<T>(raw: &Value) -> Option<Result<T, RuleViolation>>
where
    T: FromStr<Err = UnknownOption>,
{
    let text = match raw {
        Value::String(text) if text.trim().is_empty() => return None,
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => {
            return Some(Err(RuleViolation::InvalidType {
                expected: "an option name",
            }))
        }
    };
    Some(text.parse::<T>().map_err(|err| RuleViolation::UnknownOption {
        kind: err.kind,
        value: err.value,
    }))
}
