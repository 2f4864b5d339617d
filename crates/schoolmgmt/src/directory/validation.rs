use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::domain::EntityId;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";
pub(crate) const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Field name → messages, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// How much of a payload must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Replace,
    Patch,
}

impl WriteMode {
    pub const fn requires_all(self) -> bool {
        !matches!(self, WriteMode::Patch)
    }
}

/// Applies optional payload fields onto a record, collecting every failure.
pub(crate) struct FieldWriter {
    mode: WriteMode,
    errors: FieldErrors,
}

impl FieldWriter {
    pub(crate) fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            errors: FieldErrors::new(),
        }
    }

    pub(crate) fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub(crate) fn required_text(
        &mut self,
        field: &str,
        value: Option<String>,
        max_len: usize,
        target: &mut String,
    ) {
        match value {
            Some(raw) => match clean_text(&raw, max_len) {
                Ok(Some(text)) => *target = text,
                Ok(None) => self.error(field, BLANK),
                Err(message) => self.error(field, message),
            },
            None if self.mode.requires_all() => self.error(field, REQUIRED),
            None => {}
        }
    }

    /// Non-null text where blank is allowed.
    pub(crate) fn plain_text(
        &mut self,
        field: &str,
        value: Option<String>,
        max_len: usize,
        target: &mut String,
    ) {
        let Some(raw) = value else {
            return;
        };
        match clean_text(&raw, max_len) {
            Ok(text) => *target = text.unwrap_or_default(),
            Err(message) => self.error(field, message),
        }
    }

    /// Blank input clears the field.
    pub(crate) fn optional_text(
        &mut self,
        field: &str,
        value: Option<String>,
        max_len: Option<usize>,
        target: &mut Option<String>,
    ) {
        let Some(raw) = value else {
            return;
        };
        match clean_text(&raw, max_len.unwrap_or(usize::MAX)) {
            Ok(text) => *target = text,
            Err(message) => self.error(field, message),
        }
    }

    pub(crate) fn required_email(&mut self, field: &str, value: Option<String>, target: &mut String) {
        let mut cleaned = target.clone();
        self.required_text(field, value, 254, &mut cleaned);
        if self.errors.contains(field) {
            return;
        }
        if is_valid_email(&cleaned) {
            *target = cleaned;
        } else {
            self.error(field, INVALID_EMAIL);
        }
    }

    pub(crate) fn optional_email(
        &mut self,
        field: &str,
        value: Option<String>,
        target: &mut Option<String>,
    ) {
        let mut cleaned = target.clone();
        self.optional_text(field, value, Some(254), &mut cleaned);
        match cleaned {
            Some(email) if !is_valid_email(&email) => self.error(field, INVALID_EMAIL),
            other if !self.errors.contains(field) => *target = other,
            _ => {}
        }
    }

    pub(crate) fn required_reference(
        &mut self,
        field: &str,
        value: Option<EntityId>,
        target: &mut EntityId,
    ) {
        match value {
            Some(id) => *target = id,
            None if self.mode.requires_all() => self.error(field, REQUIRED),
            None => {}
        }
    }

    pub(crate) fn set<T>(&mut self, value: Option<T>, target: &mut T) {
        if let Some(value) = value {
            *target = value;
        }
    }

    pub(crate) fn finish(self) -> Result<(), FieldErrors> {
        self.errors.into_result()
    }
}

/// Trim, then reject over-long text. `Ok(None)` means the input was blank.
fn clean_text(raw: &str, max_len: usize) -> Result<Option<String>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max_len {
        return Err(format!(
            "Ensure this field has no more than {max_len} characters."
        ));
    }
    Ok(Some(trimmed.to_string()))
}

pub(crate) fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
