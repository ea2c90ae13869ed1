use crate::{CategoryId, NumericInput, ProductId, Variant};
use serde::{Deserialize, Serialize};

/// A single file picked for upload. Sent as the `image` part of a multipart
/// form; no type or size checks happen on this side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Form-encoded body of a product partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub id: ProductId,
    pub image: String,
    pub name: String,
    pub price: NumericInput,
    pub stock: NumericInput,
    pub category_id: CategoryId,
    /// Form fields are flat strings, so variants travel as JSON text.
    #[serde(with = "variants_json")]
    pub variants: Vec<Variant>,
}

mod variants_json {
    use crate::Variant;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        variants: &[Variant],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = serde_json::to_string(variants)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Variant>, D::Error> {
        let text = String::deserialize(deserializer)?;
        serde_json::from_str(&text).map_err(D::Error::custom)
    }
}
