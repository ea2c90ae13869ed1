pub mod mock;
pub mod storefront;

use actix_web::{App, HttpServer, web};
use payloads::{Product, ProductId};
use std::net::TcpListener;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, util::SubscriberInitExt};

use crate::storefront::Storefront;

/// Host the tests pretend serves `/uploads`.
pub const APP_HOST: &str = "https://shop.test";

pub struct TestApp {
    pub port: u16,
    pub client: payloads::APIClient,
    pub storefront: web::Data<Storefront>,
}

impl TestApp {
    pub fn address(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Seed a product and return it.
    pub fn add_product(&self, product: Product) -> Product {
        self.storefront.insert_product(product.clone());
        product
    }

    /// The server's current copy of a product.
    pub fn stored_product(&self, product_id: &ProductId) -> Option<Product> {
        self.storefront.product(product_id)
    }
}

pub async fn spawn_app_on_port(port: u16) -> TestApp {
    let subscriber = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_test_writer()
        .finish();
    let _ = LogTracer::init();
    let _ = subscriber.try_init();

    let storefront = web::Data::new(Storefront::default());

    // OS assigns the port if binding to 0
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = {
        let storefront = storefront.clone();
        HttpServer::new(move || {
            App::new()
                .service(storefront::api_services())
                .app_data(storefront.clone())
        })
        .workers(2)
        .listen(listener)
        .unwrap()
        .run()
    };
    tokio::spawn(server);

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        port,
        client: payloads::APIClient {
            address: format!("http://127.0.0.1:{port}"),
            inner_client: client,
        },
        storefront,
    }
}

/// Use OS-assigned port for parallel testing.
pub async fn spawn_app() -> TestApp {
    spawn_app_on_port(0).await
}
