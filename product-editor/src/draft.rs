use payloads::{
    CategoryId, NumericInput, Product, ProductId, Variant, requests,
};

/// The locally edited, not yet persisted copy of a product.
///
/// The id is copied from the product the draft was opened from and cannot be
/// changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableProductDraft {
    id: ProductId,
    pub image: String,
    pub name: String,
    pub price: NumericInput,
    pub stock: NumericInput,
    pub category_id: CategoryId,
    pub variants: Vec<Variant>,
}

impl EditableProductDraft {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            image: product.image.clone(),
            name: product.name.clone(),
            price: NumericInput::Number(product.price),
            stock: NumericInput::Number(product.stock),
            category_id: product.category_id,
            variants: product.variants.clone(),
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn set_price_text(&mut self, text: &str) {
        self.price = NumericInput::parse(text);
    }

    pub fn set_stock_text(&mut self, text: &str) {
        self.stock = NumericInput::parse(text);
    }

    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }

    /// Build the update request.
    ///
    /// The category comes from the caller and the variants from the product
    /// the session was opened with; the draft's own copies of those are not
    /// sent.
    pub fn to_update(
        &self,
        category_id: CategoryId,
        original_variants: &[Variant],
    ) -> requests::UpdateProduct {
        requests::UpdateProduct {
            id: self.id,
            image: self.image.clone(),
            name: self.name.clone(),
            price: self.price,
            stock: self.stock,
            category_id,
            variants: original_variants.to_vec(),
        }
    }
}
