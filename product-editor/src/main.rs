use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use clap::Parser;
use payloads::{APIClient, CategoryId, ProductId, requests};
use product_editor::{
    Config, ProductEditSession, SessionState, SubmitOutcome, UploadOutcome,
    telemetry::{DEFAULT_FILTER, get_subscriber, init_subscriber},
};
use uuid::Uuid;

/// Edit one storefront product from the command line.
///
/// Environment variables can be set directly or loaded from a .env file:
/// - BACKEND_URL: storefront API address
/// - APP_HOST: public host that serves uploaded images
///
/// Example:
/// BACKEND_URL=http://127.0.0.1:8000 APP_HOST=http://127.0.0.1:3000 \
/// cargo run -p product-editor -- <product id> --price 12 --image mug.png
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Product to edit.
    product_id: Uuid,
    /// Category to file the product under. Defaults to its current one.
    #[arg(long)]
    category: Option<Uuid>,
    #[arg(long)]
    name: Option<String>,
    /// Whole units; anything non-numeric is sent as NaN.
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    stock: Option<String>,
    /// Image file to upload before submitting.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if available
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber(DEFAULT_FILTER);
    init_subscriber(subscriber)?;

    let args = Args::parse();
    let config = Config::from_env()?;
    let client = APIClient::new(config.backend_url.clone());

    let product_id = ProductId(args.product_id);
    let product = client
        .get_product(&product_id)
        .await
        .with_context(|| format!("Fetching product {product_id}"))?;
    let category_id =
        args.category.map(CategoryId).unwrap_or(product.category_id);

    let updates = Arc::new(AtomicUsize::new(0));
    let session = {
        let updates = updates.clone();
        ProductEditSession::open(client, config, product, category_id, move || {
            updates.fetch_add(1, Ordering::SeqCst);
        })
    };

    if let Some(path) = &args.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let outcome = session
            .request_image_upload(requests::ImageUpload::new(file_name, bytes))
            .await;
        if !matches!(outcome, UploadOutcome::Stored { .. }) {
            report(&session.state());
            anyhow::bail!("Image upload did not complete: {outcome:?}");
        }
    }
    if let Some(name) = args.name {
        session.set_name(name);
    }
    if let Some(price) = args.price {
        session.set_price(price);
    }
    if let Some(stock) = args.stock {
        session.set_stock(stock);
    }

    let outcome = session.submit().await;
    report(&session.state());
    session.close();

    match outcome {
        SubmitOutcome::Updated => {
            tracing::info!(
                "Update callback ran {} time(s)",
                updates.load(Ordering::SeqCst)
            );
            Ok(())
        }
        other => anyhow::bail!("Product was not updated: {other:?}"),
    }
}

fn report(state: &SessionState) {
    println!("status: {:?}", state.status);
    println!("image:  {}", state.display_image);
    if let Some(message) = &state.success_message {
        println!("{message}");
    }
    if let Some(message) = &state.error_message {
        println!("error: {message}");
    }
    for (field, messages) in state.errors.iter() {
        for message in messages {
            println!("{field}: {message}");
        }
    }
}
