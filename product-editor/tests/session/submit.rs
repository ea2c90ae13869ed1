use payloads::{APIClient, Field, FieldErrors, NumericInput, requests::ImageUpload};
use product_editor::{
    Config, ProductEditSession, SessionStatus, SubmitOutcome,
    session::{EMPTY_IMAGE_ERROR, UPDATE_SUCCESS_MESSAGE},
};
use reqwest::StatusCode;
use serde_json::json;
use test_helpers::{
    APP_HOST,
    mock::{garden_category, imageless_poster, mug, png_bytes},
    spawn_app,
    storefront::{FORBIDDEN_MESSAGE, Route},
};

use crate::{UNREACHABLE, open_session, open_session_in};

#[tokio::test]
async fn empty_image_never_reaches_the_server() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(imageless_poster());
    let (session, updates) = open_session(&app, &product);

    assert_eq!(session.submit().await, SubmitOutcome::EmptyImage);

    let state = session.state();
    assert_eq!(
        state.errors,
        FieldErrors::single(Field::Image, EMPTY_IMAGE_ERROR)
    );
    assert_eq!(state.status, SessionStatus::Idle);
    assert!(app.storefront.update_forms().is_empty());
    assert_eq!(updates.count(), 0);

    // clearing the image of a product that had one is caught the same way
    let product = app.add_product(mug());
    let (session, _) = open_session(&app, &product);
    session.clear_image();
    assert_eq!(session.submit().await, SubmitOutcome::EmptyImage);
    assert_eq!(session.state().errors.get(Field::Image), [EMPTY_IMAGE_ERROR]);
    assert!(app.storefront.update_forms().is_empty());

    Ok(())
}

#[tokio::test]
async fn successful_update_notifies_caller_once() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, updates) = open_session(&app, &product);

    session.set_name("Enamel mug, large");
    session.set_price("14");
    session.set_stock("35");
    assert_eq!(session.submit().await, SubmitOutcome::Updated);

    let state = session.state();
    assert_eq!(state.status, SessionStatus::Success);
    assert_eq!(state.success_message.as_deref(), Some(UPDATE_SUCCESS_MESSAGE));
    assert!(state.success_toast.open);
    assert_eq!(state.success_toast.message, UPDATE_SUCCESS_MESSAGE);
    assert!(!state.error_toast.open);
    assert!(state.errors.is_empty());
    assert_eq!(updates.count(), 1);

    // the caller's refetch sees the new record
    let stored = app.client.get_product(&product.id).await?;
    assert_eq!(stored.name, "Enamel mug, large");
    assert_eq!(stored.price, 14);
    assert_eq!(stored.stock, 35);
    assert_eq!(stored.variants, product.variants);

    session.dismiss_success_toast();
    let state = session.state();
    assert!(!state.success_toast.open);
    assert_eq!(state.success_message.as_deref(), Some(UPDATE_SUCCESS_MESSAGE));

    Ok(())
}

#[tokio::test]
async fn update_carries_external_category_and_original_variants()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, _) = open_session_in(&app, &product, garden_category());

    let outcome = session
        .request_image_upload(ImageUpload::new("mug-blue.png", png_bytes()))
        .await;
    assert!(matches!(outcome, product_editor::UploadOutcome::Stored { .. }));
    assert_eq!(session.submit().await, SubmitOutcome::Updated);

    let forms = app.storefront.update_forms();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form["id"], product.id.to_string());
    assert_eq!(form["image"], format!("{APP_HOST}/uploads/mug-blue.png"));
    assert_eq!(form["name"], product.name);
    assert_eq!(form["price"], "12");
    assert_eq!(form["stock"], "40");
    assert_eq!(form["categoryId"], garden_category().to_string());
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&form["variants"])?,
        serde_json::to_value(&product.variants)?
    );

    let stored = app.client.get_product(&product.id).await?;
    assert_eq!(stored.category_id, garden_category());

    Ok(())
}

#[tokio::test]
async fn non_numeric_input_is_forwarded_as_nan() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, updates) = open_session(&app, &product);

    session.set_price("twelve");
    session.set_stock("a few");
    assert_eq!(session.state().draft.price, NumericInput::NotANumber);
    assert_eq!(session.submit().await, SubmitOutcome::ValidationRejected);

    let forms = app.storefront.update_forms();
    assert_eq!(forms[0]["price"], "NaN");
    assert_eq!(forms[0]["stock"], "NaN");

    let state = session.state();
    assert_eq!(state.status, SessionStatus::RejectedValidation);
    assert_eq!(
        state.errors,
        FieldErrors::from([
            (Field::Price, vec!["Price must be a number".to_string()]),
            (Field::Stock, vec!["Stock must be a number".to_string()]),
        ])
    );
    assert_eq!(updates.count(), 0);

    // fixing the input and resubmitting goes through
    session.set_price("12");
    session.set_stock("40");
    assert_eq!(session.submit().await, SubmitOutcome::Updated);
    assert!(session.state().errors.is_empty());
    assert_eq!(updates.count(), 1);

    Ok(())
}

#[tokio::test]
async fn validation_errors_are_replaced_not_merged() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, _) = open_session(&app, &product);

    app.storefront.respond_next_json(
        Route::UpdateProduct,
        400,
        json!({ "price": ["too cheap"], "stock": ["too many"] }),
    );
    assert_eq!(session.submit().await, SubmitOutcome::ValidationRejected);
    assert_eq!(session.state().errors.get(Field::Price), ["too cheap"]);

    app.storefront.respond_next_json(
        Route::UpdateProduct,
        400,
        json!({ "name": ["too short"] }),
    );
    assert_eq!(session.submit().await, SubmitOutcome::ValidationRejected);

    let state = session.state();
    assert_eq!(state.errors, FieldErrors::single(Field::Name, "too short"));
    assert!(state.errors.get(Field::Price).is_empty());
    assert!(state.errors.get(Field::Stock).is_empty());
    assert_eq!(state.status, SessionStatus::RejectedValidation);

    Ok(())
}

#[tokio::test]
async fn forbidden_update_opens_error_toast() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    app.storefront.forbid(product.id);
    let (session, updates) = open_session(&app, &product);

    assert_eq!(session.submit().await, SubmitOutcome::Forbidden);

    let state = session.state();
    assert_eq!(state.status, SessionStatus::RejectedForbidden);
    assert_eq!(state.error_message.as_deref(), Some(FORBIDDEN_MESSAGE));
    assert!(state.error_toast.open);
    assert_eq!(state.error_toast.message, FORBIDDEN_MESSAGE);
    assert!(!state.success_toast.open);
    assert_eq!(updates.count(), 0);

    session.dismiss_error_toast();
    assert!(!session.state().error_toast.open);

    Ok(())
}

#[tokio::test]
async fn scripted_forbidden_message_is_shown_verbatim() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, _) = open_session(&app, &product);
    app.storefront.respond_next_json(
        Route::UpdateProduct,
        403,
        json!({ "error": "not allowed" }),
    );

    assert_eq!(session.submit().await, SubmitOutcome::Forbidden);
    let state = session.state();
    assert_eq!(state.error_message.as_deref(), Some("not allowed"));
    assert!(state.error_toast.open);

    Ok(())
}

#[tokio::test]
async fn forbidden_without_string_message_shows_nothing() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, updates) = open_session(&app, &product);
    app.storefront.respond_next_json(
        Route::UpdateProduct,
        403,
        json!({ "error": { "code": 7 } }),
    );

    assert_eq!(
        session.submit().await,
        SubmitOutcome::UnexpectedShape {
            status: StatusCode::FORBIDDEN
        }
    );
    let state = session.state();
    assert_eq!(state.error_message, None);
    assert!(!state.error_toast.open);
    assert!(!state.success_toast.open);
    assert_eq!(updates.count(), 0);

    Ok(())
}

#[tokio::test]
async fn unhandled_status_shows_nothing() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, updates) = open_session(&app, &product);
    app.storefront.respond_next_json(
        Route::UpdateProduct,
        500,
        json!({ "error": "database unavailable" }),
    );

    assert_eq!(
        session.submit().await,
        SubmitOutcome::Unhandled {
            status: StatusCode::INTERNAL_SERVER_ERROR
        }
    );
    let state = session.state();
    assert_eq!(state.status, SessionStatus::Idle);
    assert!(state.errors.is_empty());
    assert_eq!(state.error_message, None);
    assert_eq!(state.success_message, None);
    assert!(!state.error_toast.open);
    assert!(!state.success_toast.open);
    assert_eq!(updates.count(), 0);

    // the session is not left busy
    assert_eq!(session.submit().await, SubmitOutcome::Updated);

    Ok(())
}

#[tokio::test]
async fn unreadable_validation_body_clears_errors() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let product = app.add_product(mug());
    let (session, _) = open_session(&app, &product);

    app.storefront.respond_next_json(
        Route::UpdateProduct,
        400,
        json!({ "name": ["too short"] }),
    );
    session.submit().await;
    app.storefront.respond_next(Route::UpdateProduct, 400, "Bad request");

    assert_eq!(
        session.submit().await,
        SubmitOutcome::UnexpectedShape {
            status: StatusCode::BAD_REQUEST
        }
    );
    let state = session.state();
    assert!(state.errors.is_empty());
    assert_eq!(state.status, SessionStatus::Idle);

    Ok(())
}

#[tokio::test]
async fn submit_without_server_reports_network() -> anyhow::Result<()> {
    let product = mug();
    let session = ProductEditSession::open(
        APIClient::new(UNREACHABLE),
        Config {
            backend_url: UNREACHABLE.into(),
            app_host: APP_HOST.into(),
        },
        product.clone(),
        product.category_id,
        || {},
    );

    assert_eq!(session.submit().await, SubmitOutcome::Network);
    let state = session.state();
    assert_eq!(state.status, SessionStatus::Idle);
    assert!(state.errors.is_empty());
    assert!(!state.error_toast.open);

    Ok(())
}
