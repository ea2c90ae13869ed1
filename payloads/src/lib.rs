pub mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{APIClient, ClientError};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct CategoryId(pub Uuid);

/// A product variant descriptor.
///
/// The admin panel never edits variants, so the contents are opaque and
/// passed back to the server exactly as they were received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(pub serde_json::Value);

/// The canonical product record as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Absolute image URL, or empty if the product has no image yet.
    pub image: String,
    pub name: String,
    /// Whole currency units, non-negative.
    pub price: i64,
    /// Units in stock, non-negative.
    pub stock: i64,
    pub category_id: CategoryId,
    pub variants: Vec<Variant>,
}

/// A numeric form value as typed by the user.
///
/// Text that does not start with an integer becomes `NotANumber`. It is not
/// rejected client side; the server decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericInput {
    Number(i64),
    NotANumber,
}

impl NumericInput {
    /// Parse the leading integer of `text`.
    ///
    /// Leading whitespace and a single sign are accepted, then as many ASCII
    /// digits as follow. Anything after the digits is ignored, so `"12.5"`
    /// parses as 12 and `"7 units"` as 7.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let digits_len =
            rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits_len == 0 {
            return Self::NotANumber;
        }
        let digits = &rest[..digits_len];
        let parsed = if negative {
            format!("-{digits}").parse::<i64>()
        } else {
            digits.parse::<i64>()
        };
        match parsed {
            Ok(n) => Self::Number(n),
            Err(_) => Self::NotANumber,
        }
    }
}

impl std::fmt::Display for NumericInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::NotANumber => f.write_str("NaN"),
        }
    }
}

impl Serialize for NumericInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::NotANumber => serializer.serialize_str("NaN"),
        }
    }
}

impl<'de> Deserialize<'de> for NumericInput {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        struct NumericVisitor;

        impl de::Visitor<'_> for NumericVisitor {
            type Value = NumericInput;

            fn expecting(
                &self,
                f: &mut std::fmt::Formatter<'_>,
            ) -> std::fmt::Result {
                f.write_str("an integer or numeric text")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(NumericInput::Number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(i64::try_from(v)
                    .map(NumericInput::Number)
                    .unwrap_or(NumericInput::NotANumber))
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(NumericInput::NotANumber)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(NumericInput::parse(v))
            }
        }

        deserializer.deserialize_any(NumericVisitor)
    }
}

/// Fields of a product that the server can report validation errors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Image,
    Name,
    Price,
    Stock,
    CategoryId,
    Variants,
}

impl Field {
    /// The key used for this field on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Image => "image",
            Field::Name => "name",
            Field::Price => "price",
            Field::Stock => "stock",
            Field::CategoryId => "categoryId",
            Field::Variants => "variants",
        }
    }
}

/// Per-field validation messages, keyed by wire field name.
///
/// Keys are kept verbatim as the server sent them, including any this
/// client has no `Field` for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.set(field, vec![message.into()]);
        errors
    }

    /// Messages for a field, empty if it has none.
    pub fn get(&self, field: Field) -> &[String] {
        self.0
            .get(field.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replace the messages for a field. An empty list removes the entry.
    pub fn set(&mut self, field: Field, messages: Vec<String>) {
        if messages.is_empty() {
            self.0.remove(field.as_str());
        } else {
            self.0.insert(field.as_str().to_string(), messages);
        }
    }

    pub fn clear_field(&mut self, field: Field) {
        self.0.remove(field.as_str());
    }

    /// True if no field carries a message.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<const N: usize> From<[(Field, Vec<String>); N]> for FieldErrors {
    fn from(entries: [(Field, Vec<String>); N]) -> Self {
        let mut errors = Self::new();
        for (field, messages) in entries {
            errors.set(field, messages);
        }
        errors
    }
}
