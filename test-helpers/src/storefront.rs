//! In-memory stand-in for the storefront API.
//!
//! Validates product updates the way the backend does and answers with the
//! same status codes and body shapes. Tests can queue a scripted reply or a
//! delay for the next request on a route.

use actix_web::{
    HttpResponse, dev::HttpServiceFactory, get, http::StatusCode, patch,
    post, web,
};
use payloads::{CategoryId, Field, FieldErrors, NumericInput, Product, ProductId, Variant};
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

pub const FORBIDDEN_MESSAGE: &str = "You are not allowed to edit this product";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    UploadImage,
    UpdateProduct,
}

/// A reply queued for the next request on a route.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    pub delay: Option<Duration>,
    /// Status and raw body. `None` falls through to the normal handler.
    pub reply: Option<(u16, String)>,
}

/// A request as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceivedRequest {
    ImageUpload {
        file_name: Option<String>,
        size: usize,
    },
    UpdateProduct {
        product_id: Uuid,
        form: HashMap<String, String>,
    },
}

#[derive(Debug, Default)]
pub struct Storefront {
    products: Mutex<HashMap<ProductId, Product>>,
    forbidden: Mutex<HashSet<ProductId>>,
    scripted: Mutex<HashMap<Route, VecDeque<Scripted>>>,
    received: Mutex<Vec<ReceivedRequest>>,
}

impl Storefront {
    pub fn insert_product(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    pub fn product(&self, product_id: &ProductId) -> Option<Product> {
        self.products.lock().unwrap().get(product_id).cloned()
    }

    /// Answer updates to this product with 403.
    pub fn forbid(&self, product_id: ProductId) {
        self.forbidden.lock().unwrap().insert(product_id);
    }

    pub fn respond_next(
        &self,
        route: Route,
        status: u16,
        body: impl Into<String>,
    ) {
        self.push(
            route,
            Scripted {
                delay: None,
                reply: Some((status, body.into())),
            },
        );
    }

    pub fn respond_next_json(
        &self,
        route: Route,
        status: u16,
        body: serde_json::Value,
    ) {
        self.respond_next(route, status, body.to_string());
    }

    /// Hold the next request on `route` before handling it normally.
    pub fn delay_next(&self, route: Route, delay: Duration) {
        self.push(
            route,
            Scripted {
                delay: Some(delay),
                reply: None,
            },
        );
    }

    pub fn push(&self, route: Route, scripted: Scripted) {
        self.scripted
            .lock()
            .unwrap()
            .entry(route)
            .or_default()
            .push_back(scripted);
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }

    /// Form bodies of every update request, oldest first.
    pub fn update_forms(&self) -> Vec<HashMap<String, String>> {
        self.received()
            .into_iter()
            .filter_map(|request| match request {
                ReceivedRequest::UpdateProduct { form, .. } => Some(form),
                ReceivedRequest::ImageUpload { .. } => None,
            })
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        self.received()
            .iter()
            .filter(|r| matches!(r, ReceivedRequest::ImageUpload { .. }))
            .count()
    }

    fn record(&self, request: ReceivedRequest) {
        self.received.lock().unwrap().push(request);
    }

    fn next_scripted(&self, route: Route) -> Option<Scripted> {
        self.scripted
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front)
    }

    /// Apply a queued script, returning its reply if it has one.
    async fn run_script(&self, route: Route) -> Option<HttpResponse> {
        let scripted = self.next_scripted(route)?;
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        let (status, body) = scripted.reply?;
        let status = StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Some(
            HttpResponse::build(status)
                .content_type("application/json")
                .body(body),
        )
    }
}

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(upload_image)
        .service(get_product)
        .service(update_product)
}

#[post("/images")]
async fn upload_image(
    body: web::Bytes,
    store: web::Data<Storefront>,
) -> HttpResponse {
    let file_name = multipart_file_name(&body, "image");
    store.record(ReceivedRequest::ImageUpload {
        file_name: file_name.clone(),
        size: body.len(),
    });
    if let Some(response) = store.run_script(Route::UploadImage).await {
        return response;
    }

    match file_name {
        Some(name) => HttpResponse::Ok().json(json!({ "image": name })),
        None => HttpResponse::BadRequest()
            .json(json!({ "error": "No image provided" })),
    }
}

#[get("/products/{product_id}")]
async fn get_product(
    product_id: web::Path<Uuid>,
    store: web::Data<Storefront>,
) -> HttpResponse {
    match store.product(&ProductId(product_id.into_inner())) {
        Some(product) => HttpResponse::Ok().json(product),
        None => HttpResponse::NotFound()
            .json(json!({ "error": "Product not found" })),
    }
}

#[patch("/products/{product_id}")]
async fn update_product(
    product_id: web::Path<Uuid>,
    form: web::Form<HashMap<String, String>>,
    store: web::Data<Storefront>,
) -> HttpResponse {
    let product_id = ProductId(product_id.into_inner());
    let form = form.into_inner();
    store.record(ReceivedRequest::UpdateProduct {
        product_id: product_id.0,
        form: form.clone(),
    });
    if let Some(response) = store.run_script(Route::UpdateProduct).await {
        return response;
    }

    if store.forbidden.lock().unwrap().contains(&product_id) {
        return HttpResponse::Forbidden()
            .json(json!({ "error": FORBIDDEN_MESSAGE }));
    }
    let Some(mut product) = store.product(&product_id) else {
        return HttpResponse::NotFound()
            .json(json!({ "error": "Product not found" }));
    };

    let mut errors = FieldErrors::new();
    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or("");

    if field("id") != product_id.to_string() {
        errors.set(Field::Id, vec!["Id does not match product".into()]);
    }
    let image = field("image");
    if image.is_empty() {
        errors.set(Field::Image, vec!["Image can not be empty".into()]);
    }
    let name = field("name").trim();
    if name.is_empty() {
        errors.set(Field::Name, vec!["Name can not be empty".into()]);
    }
    let price = non_negative(field("price"), "Price", Field::Price, &mut errors);
    let stock = non_negative(field("stock"), "Stock", Field::Stock, &mut errors);
    let category_id = match field("categoryId").parse::<Uuid>() {
        Ok(id) => Some(CategoryId(id)),
        Err(_) => {
            errors.set(Field::CategoryId, vec!["Invalid category".into()]);
            None
        }
    };
    let variants = match serde_json::from_str::<Vec<Variant>>(field("variants"))
    {
        Ok(variants) => Some(variants),
        Err(_) => {
            errors.set(Field::Variants, vec!["Invalid variants".into()]);
            None
        }
    };

    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(errors);
    }
    if let (Some(price), Some(stock), Some(category_id), Some(variants)) =
        (price, stock, category_id, variants)
    {
        product.image = image.to_string();
        product.name = name.to_string();
        product.price = price;
        product.stock = stock;
        product.category_id = category_id;
        product.variants = variants;
        store.insert_product(product.clone());
    }
    HttpResponse::Ok().json(product)
}

fn non_negative(
    text: &str,
    label: &str,
    field: Field,
    errors: &mut FieldErrors,
) -> Option<i64> {
    match NumericInput::parse(text) {
        NumericInput::Number(n) if n >= 0 => Some(n),
        NumericInput::Number(_) => {
            errors.set(field, vec![format!("{label} can not be negative")]);
            None
        }
        NumericInput::NotANumber => {
            errors.set(field, vec![format!("{label} must be a number")]);
            None
        }
    }
}

/// File name of the multipart part called `part_name`, if present.
fn multipart_file_name(body: &[u8], part_name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let marker = format!("name=\"{part_name}\"; filename=\"");
    let start = text.find(&marker)? + marker.len();
    let end = text[start..].find('"')? + start;
    Some(text[start..end].to_string())
}
