//! Request payload validation.
//!
//! Every write payload implements [`Validate`]. One payload type serves both
//! create and update: on create the required fields must be present, on update
//! every field is optional and only the fields that were sent are checked.

use rust_decimal::Decimal;
use serde::Serialize;

use storedesk_core::{Email, MAX_MONEY};

/// Whether a payload creates a record or patches an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field errors found in one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// A single-field error.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.to_owned(),
                message: message.into(),
            }],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Implemented by every write payload.
pub trait Validate {
    /// Check field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors>;
}

/// Accumulates field errors.
#[derive(Debug)]
pub struct Validator {
    mode: Mode,
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    /// Record an error for `field`.
    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Record an error unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.fail(field, message);
        }
    }

    /// On create, the field must be present.
    pub fn required<T: ?Sized>(&mut self, field: &str, value: Option<&T>) {
        if self.mode == Mode::Create && value.is_none() {
            self.fail(field, format!("{field} is required"));
        }
    }

    /// Trimmed length must be within `min..=max` characters.
    ///
    /// A present string shorter than `min` fails even on update.
    pub fn text(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) {
        let Some(value) = value else {
            return;
        };
        let len = value.trim().chars().count();
        if len < min {
            if min == 1 {
                self.fail(field, format!("{field} must not be empty"));
            } else {
                self.fail(field, format!("{field} must be at least {min} characters"));
            }
        } else if len > max {
            self.fail(field, format!("{field} must be at most {max} characters"));
        }
    }

    /// Required on create, then length-checked.
    pub fn required_text(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) {
        self.required(field, value);
        self.text(field, value, min, max);
    }

    /// Must be a well-formed email address.
    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            if value.len() > 100 {
                self.fail(field, format!("{field} must be at most 100 characters"));
            } else if Email::parse(value).is_err() {
                self.fail(field, format!("{field} must be a valid email"));
            }
        }
    }

    /// Must be an absolute `http`/`https` URL or a site-relative path.
    pub fn url(&mut self, field: &str, value: Option<&str>, max: usize) {
        let Some(value) = value else {
            return;
        };
        self.text(field, Some(value), 0, max);
        if value.is_empty() || value.starts_with('/') {
            return;
        }
        match url::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => self.fail(field, format!("{field} must be a valid URL")),
        }
    }

    /// Integer within `min..=max`.
    pub fn int_range(&mut self, field: &str, value: Option<i32>, min: i32, max: i32) {
        if let Some(value) = value {
            if value < min {
                self.fail(field, format!("{field} must be at least {min}"));
            } else if value > max {
                self.fail(field, format!("{field} must be at most {max}"));
            }
        }
    }

    /// Integer of at least `min`.
    pub fn int_min(&mut self, field: &str, value: Option<i32>, min: i32) {
        self.int_range(field, value, min, i32::MAX);
    }

    /// Amount of zero or more.
    pub fn non_negative(&mut self, field: &str, value: Option<Decimal>) {
        if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
            self.fail(field, format!("{field} must not be negative"));
        } else {
            self.storable(field, value);
        }
    }

    /// Amount strictly greater than zero.
    pub fn positive(&mut self, field: &str, value: Option<Decimal>) {
        if value.is_some_and(|v| v <= Decimal::ZERO) {
            self.fail(field, format!("{field} must be greater than 0"));
        } else {
            self.storable(field, value);
        }
    }

    fn storable(&mut self, field: &str, value: Option<Decimal>) {
        if value.is_some_and(|v| v > MAX_MONEY) {
            self.fail(field, format!("{field} must be at most {MAX_MONEY}"));
        }
    }

    /// Amount within `min..=max`.
    pub fn decimal_range(&mut self, field: &str, value: Option<Decimal>, min: Decimal, max: Decimal) {
        if value.is_some_and(|v| v < min || v > max) {
            self.fail(field, format!("{field} must be between {min} and {max}"));
        }
    }

    /// A JSON value that must be an object when present.
    pub fn object(&mut self, field: &str, value: Option<&serde_json::Value>) {
        if value.is_some_and(|v| !v.is_object() && !v.is_null()) {
            self.fail(field, format!("{field} must be an object"));
        }
    }

    /// Every element must be within the length bounds.
    pub fn each_text(&mut self, field: &str, values: Option<&[String]>, min: usize, max: usize) {
        for value in values.unwrap_or_default() {
            self.text(field, Some(value), min, max);
        }
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns the accumulated errors, if any.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}
