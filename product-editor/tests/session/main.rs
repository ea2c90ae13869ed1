mod submit;

use payloads::{CategoryId, Product};
use product_editor::{Config, ProductEditSession};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use test_helpers::{APP_HOST, TestApp, spawn_app};

/// Nothing listens here, so requests fail before any response.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

/// Counts calls to the session's update callback.
#[derive(Clone, Default)]
pub struct UpdateCounter(Arc<AtomicUsize>);

impl UpdateCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn config(app: &TestApp) -> Config {
    Config {
        backend_url: app.address(),
        app_host: APP_HOST.to_string(),
    }
}

/// Open a session filed under the product's own category.
pub fn open_session(
    app: &TestApp,
    product: &Product,
) -> (ProductEditSession, UpdateCounter) {
    open_session_in(app, product, product.category_id)
}

pub fn open_session_in(
    app: &TestApp,
    product: &Product,
    category_id: CategoryId,
) -> (ProductEditSession, UpdateCounter) {
    let updates = UpdateCounter::default();
    let session = {
        let updates = updates.clone();
        ProductEditSession::open(
            app.client.clone(),
            config(app),
            product.clone(),
            category_id,
            move || {
                updates.0.fetch_add(1, Ordering::SeqCst);
            },
        )
    };
    (session, updates)
}

#[tokio::test]
async fn fetch_product() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(test_helpers::mock::mug());

    let fetched = app.client.get_product(&product.id).await?;
    assert_eq!(fetched, product);

    Ok(())
}
