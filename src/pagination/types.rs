//! Page token types
//!
//! A `PageToken` is the only state exchanged with callers between two page
//! requests. Its wire form is a flat JSON object:
//!
//! ```text
//! {"type": "forward", "key": "-rank", "value": 12, "offset": 3}
//! ```
//!
//! - `type`: one of `first`, `last`, `forward`, `backward`
//! - `key`: the paginator key (absent for `first`)
//! - `value`: the key value at the boundary (`forward`/`backward` only)
//! - `offset`: records sharing `value` already consumed on this side of the
//!   boundary (omitted when 0)

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Page Kind
// ============================================================================

/// How a page is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// The first `per_page` records
    First,
    /// The last `per_page` records
    Last,
    /// `per_page` records starting at the boundary
    Forward,
    /// `per_page` records ending just before the boundary
    Backward,
}

impl PageKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl FromStr for PageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            _ => Err(Error::invalid_token("Invalid or missing \"type\"")),
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Page Token
// ============================================================================

/// Position of a page in the ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPageToken", into = "RawPageToken")]
pub struct PageToken {
    /// How the page is located
    pub kind: PageKind,
    /// Paginator key the token was built for
    pub key: Option<String>,
    /// Serialized key value at the boundary (JSON null for a null key)
    pub value: Option<Value>,
    /// Number of records sharing `value` to skip
    pub offset: usize,
}

impl PageToken {
    /// Token of the first page
    pub fn first() -> Self {
        Self {
            kind: PageKind::First,
            key: None,
            value: None,
            offset: 0,
        }
    }

    /// Token of the last page
    pub fn last(key: impl Into<String>) -> Self {
        Self {
            kind: PageKind::Last,
            key: Some(key.into()),
            value: None,
            offset: 0,
        }
    }

    /// Token of a page starting at `value`
    pub fn forward(key: impl Into<String>, value: Value, offset: usize) -> Self {
        Self {
            kind: PageKind::Forward,
            key: Some(key.into()),
            value: Some(value),
            offset,
        }
    }

    /// Token of a page ending just before `value`
    pub fn backward(key: impl Into<String>, value: Value, offset: usize) -> Self {
        Self {
            kind: PageKind::Backward,
            key: Some(key.into()),
            value: Some(value),
            offset,
        }
    }

    /// Wire form as a JSON object
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::from(self.kind.as_str()));
        if let Some(key) = &self.key {
            map.insert("key".to_string(), Value::from(key.as_str()));
        }
        if let Some(value) = &self.value {
            map.insert("value".to_string(), value.clone());
        }
        if self.offset > 0 {
            map.insert("offset".to_string(), Value::from(self.offset));
        }
        Value::Object(map)
    }

    /// Parse the wire form from a JSON value
    pub fn from_json(value: &Value) -> Result<Self> {
        let raw = RawPageToken::deserialize(value)
            .map_err(|e| Error::invalid_token(format!("Malformed token: {e}")))?;
        Self::try_from(raw)
    }

    /// Compact JSON string, suitable for a URL parameter or a hidden field
    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }

    /// Parse a string produced by [`PageToken::encode`]
    pub fn decode(token: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(token)
            .map_err(|e| Error::invalid_token(format!("Malformed token: {e}")))?;
        Self::from_json(&value)
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl FromStr for PageToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

// ============================================================================
// Wire Form
// ============================================================================

/// Unvalidated wire form
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPageToken {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,

    // null is a legitimate boundary value; only a missing field is None
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Offsets may arrive as numbers or as numeric strings (e.g. from a query string)
fn parse_offset(raw: Option<&Value>) -> Result<usize> {
    let offset = match raw {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match offset {
        None => Err(Error::invalid_token("Invalid \"offset\" (not integer)")),
        Some(n) if n < 0 => Err(Error::invalid_token("Invalid \"offset\" (negative)")),
        Some(n) => usize::try_from(n)
            .map_err(|_| Error::invalid_token("Invalid \"offset\" (too large)")),
    }
}

impl TryFrom<RawPageToken> for PageToken {
    type Error = Error;

    fn try_from(raw: RawPageToken) -> Result<Self> {
        let kind = raw
            .kind
            .as_deref()
            .ok_or_else(|| Error::invalid_token("Invalid or missing \"type\""))?
            .parse::<PageKind>()?;
        let offset = parse_offset(raw.offset.as_ref())?;

        Ok(Self {
            kind,
            key: raw.key,
            value: raw.value,
            offset,
        })
    }
}

impl From<PageToken> for RawPageToken {
    fn from(token: PageToken) -> Self {
        Self {
            kind: Some(token.kind.as_str().to_string()),
            key: token.key,
            value: token.value,
            offset: (token.offset > 0).then(|| Value::from(token.offset)),
        }
    }
}
