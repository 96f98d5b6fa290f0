//! Application messages and message-key sanitization.
//!
//! # Design
//! Message keys are translation identifiers. The server is not trusted to
//! send only keys the client can translate, so `ErrorMessageKey` is a closed
//! enum and every conversion from a raw string goes through
//! `sanitize_message`: a known identifier maps to its key, anything else
//! collapses to `InvalidValue`. Deserialization uses the same rule, so a
//! foreign key can never enter the typed layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of message keys understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorMessageKey {
    Required,
    InvalidValue,
    InvalidEmail,
    FormErrors,
    UserWasCreated,
}

impl ErrorMessageKey {
    pub const ALL: [ErrorMessageKey; 5] = [
        ErrorMessageKey::Required,
        ErrorMessageKey::InvalidValue,
        ErrorMessageKey::InvalidEmail,
        ErrorMessageKey::FormErrors,
        ErrorMessageKey::UserWasCreated,
    ];

    /// Wire identifier, also used as translation key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorMessageKey::Required => "api.v1.required",
            ErrorMessageKey::InvalidValue => "api.v1.invalidValue",
            ErrorMessageKey::InvalidEmail => "api.v1.invalidEmail",
            ErrorMessageKey::FormErrors => "api.v1.formErrors",
            ErrorMessageKey::UserWasCreated => "api.v1.userWasCreated",
        }
    }
}

impl fmt::Display for ErrorMessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by `ErrorMessageKey::from_str` for identifiers outside the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessageKey(pub String);

impl fmt::Display for UnknownMessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown message key {:?}", self.0)
    }
}

impl std::error::Error for UnknownMessageKey {}

impl FromStr for ErrorMessageKey {
    type Err = UnknownMessageKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorMessageKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownMessageKey(s.to_string()))
    }
}

/// Map a raw identifier onto the closed key set.
pub fn sanitize_message(raw: &str) -> ErrorMessageKey {
    raw.parse().unwrap_or(ErrorMessageKey::InvalidValue)
}

impl Serialize for ErrorMessageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorMessageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(sanitize_message(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: ErrorMessageKey,
}

/// A user-facing message produced by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub severity: Severity,
    pub translation: Translation,
}

impl Message {
    pub fn new(id: impl Into<String>, severity: Severity, key: ErrorMessageKey) -> Self {
        Self {
            id: id.into(),
            severity,
            translation: Translation { id: key },
        }
    }

    pub fn key(&self) -> ErrorMessageKey {
        self.translation.id
    }
}

/// One step of a path into a nested form value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(u64),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        PathSegment::Index(index)
    }
}

/// A message attached to a specific form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub path: Vec<PathSegment>,
    pub message: Message,
}

impl FieldMessage {
    /// True if this message targets the top-level field `name`.
    pub fn is_for_field(&self, name: &str) -> bool {
        matches!(self.path.as_slice(), [PathSegment::Key(k), ..] if k == name)
    }
}
