//! The edit session behind the product edit dialog.
//!
//! A session owns one [`SessionState`] value. Every change (a keystroke, an
//! upload starting, a response arriving) is a [`SessionAction`] reduced into
//! a new state and published through a `watch` channel, so readers never see
//! half of a transition.
//!
//! Uploads and submits are mutually exclusive: whichever starts second is
//! turned away with `Busy`. Each state carries a generation that is bumped
//! when the session is closed or reopened; a response for an older
//! generation is dropped instead of being applied.

use payloads::{
    APIClient, CategoryId, ClientError, Field, FieldErrors, Product,
    requests, responses,
};
use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::draft::EditableProductDraft;
use crate::telemetry::log_error;
use crate::toast::{Toast, ToastType};

pub const EMPTY_IMAGE_ERROR: &str = "Image can not be empty";
pub const UPDATE_SUCCESS_MESSAGE: &str = "Product updated successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    UploadingImage,
    Submitting,
    Success,
    RejectedValidation,
    RejectedForbidden,
}

impl SessionStatus {
    /// A request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::UploadingImage | Self::Submitting)
    }
}

/// Everything the dialog renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub generation: u64,
    pub closed: bool,
    pub status: SessionStatus,
    /// The product the session was opened with.
    pub original: Product,
    /// Category chosen outside the dialog; sent instead of the draft's.
    pub category_id: CategoryId,
    pub draft: EditableProductDraft,
    pub errors: FieldErrors,
    /// The image shown in the preview.
    pub display_image: String,
    pub success_message: Option<String>,
    /// Top-level message from a forbidden update.
    pub error_message: Option<String>,
    pub success_toast: Toast,
    pub error_toast: Toast,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Name(String),
    Price(String),
    Stock(String),
    ClearImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    Edit(DraftEdit),
    UploadStarted,
    ImageStored { url: String },
    ImageRejected { message: String },
    /// Upload finished without anything to show.
    UploadEnded,
    ImageMissing,
    SubmitStarted,
    Updated,
    ValidationRejected(FieldErrors),
    /// A 403, with its message if the body had one.
    Forbidden(Option<String>),
    /// Submit finished without anything to show.
    SubmitEnded,
    DismissSuccessToast,
    DismissErrorToast,
    Reopen {
        product: Product,
        category_id: CategoryId,
    },
    Close,
}

impl SessionState {
    pub fn new(product: Product, category_id: CategoryId) -> Self {
        Self {
            generation: 0,
            closed: false,
            status: SessionStatus::Idle,
            draft: EditableProductDraft::from_product(&product),
            display_image: product.image.clone(),
            original: product,
            category_id,
            errors: FieldErrors::new(),
            success_message: None,
            error_message: None,
            success_toast: Toast::closed(ToastType::Success),
            error_toast: Toast::closed(ToastType::Error),
        }
    }

    /// The state after applying `action`.
    pub fn reduce(&self, action: SessionAction) -> Self {
        if self.closed && !matches!(action, SessionAction::Reopen { .. }) {
            return self.clone();
        }

        let mut next = self.clone();
        match action {
            SessionAction::Edit(edit) => match edit {
                DraftEdit::Name(name) => next.draft.name = name,
                DraftEdit::Price(text) => next.draft.set_price_text(&text),
                DraftEdit::Stock(text) => next.draft.set_stock_text(&text),
                DraftEdit::ClearImage => {
                    next.draft.image.clear();
                    next.display_image.clear();
                }
            },
            SessionAction::UploadStarted => {
                next.errors.clear_field(Field::Image);
                next.status = SessionStatus::UploadingImage;
            }
            SessionAction::ImageStored { url } => {
                next.errors.clear_field(Field::Image);
                next.draft.image = url.clone();
                next.display_image = url;
                next.status = SessionStatus::Idle;
            }
            SessionAction::ImageRejected { message } => {
                next.errors.set(Field::Image, vec![message]);
                next.status = SessionStatus::Idle;
            }
            SessionAction::UploadEnded | SessionAction::SubmitEnded => {
                next.status = SessionStatus::Idle;
            }
            // status is left alone so a running upload stays guarded
            SessionAction::ImageMissing => {
                next.errors = FieldErrors::single(Field::Image, EMPTY_IMAGE_ERROR);
            }
            SessionAction::SubmitStarted => {
                next.errors = FieldErrors::new();
                next.error_message = None;
                next.error_toast.dismiss();
                next.status = SessionStatus::Submitting;
            }
            SessionAction::Updated => {
                next.success_message = Some(UPDATE_SUCCESS_MESSAGE.to_string());
                next.success_toast = Toast::success(UPDATE_SUCCESS_MESSAGE);
                next.status = SessionStatus::Success;
            }
            SessionAction::ValidationRejected(errors) => {
                next.errors = errors;
                next.status = SessionStatus::RejectedValidation;
            }
            SessionAction::Forbidden(message) => {
                if let Some(message) = message {
                    next.error_toast = Toast::error(message.clone());
                    next.error_message = Some(message);
                }
                next.status = SessionStatus::RejectedForbidden;
            }
            SessionAction::DismissSuccessToast => next.success_toast.dismiss(),
            SessionAction::DismissErrorToast => next.error_toast.dismiss(),
            SessionAction::Reopen {
                product,
                category_id,
            } => {
                next = SessionState::new(product, category_id);
                next.generation = self.generation + 1;
            }
            SessionAction::Close => {
                next.closed = true;
                next.generation += 1;
                next.status = SessionStatus::Idle;
            }
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The draft now points at `url`.
    Stored { url: String },
    /// The server refused the file; its message is on the image field.
    Rejected { message: String },
    /// A response came back in a shape this client does not understand.
    /// Nothing is shown to the user.
    UnexpectedShape { status: StatusCode },
    /// No response. Nothing is shown to the user.
    Network,
    /// Another request was in flight; nothing was sent.
    Busy,
    /// The session was closed or reopened while the request was in flight.
    Stale,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Updated,
    /// Rejected locally; nothing was sent.
    EmptyImage,
    /// Another request was in flight; nothing was sent.
    Busy,
    ValidationRejected,
    /// A 403 with a message, now shown in the error toast.
    Forbidden,
    /// A 400 or 403 whose body could not be read. Nothing is shown to the
    /// user.
    UnexpectedShape { status: StatusCode },
    /// A status with no handling. Nothing is shown to the user.
    Unhandled { status: StatusCode },
    /// No response. Nothing is shown to the user.
    Network,
    /// The session was closed or reopened while the request was in flight.
    /// The state is untouched, but a saved update still notifies the caller.
    Stale,
    Closed,
}

type UpdateCallback = Box<dyn Fn() + Send + Sync>;

/// One open edit dialog for one product.
pub struct ProductEditSession {
    client: APIClient,
    config: Config,
    state: watch::Sender<SessionState>,
    on_update: UpdateCallback,
}

impl std::fmt::Debug for ProductEditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductEditSession")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ProductEditSession {
    /// Open a session on `product`.
    ///
    /// `on_update` is called with no arguments after each successful update
    /// so the caller can refetch its view of the product.
    pub fn open(
        client: APIClient,
        config: Config,
        product: Product,
        category_id: CategoryId,
        on_update: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        info!(product_id = %product.id, "Opening product edit session");
        let (state, _) =
            watch::channel(SessionState::new(product, category_id));
        Self {
            client,
            config,
            state,
            on_update: Box::new(on_update),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Follow state changes, e.g. to re-render on every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.dispatch(SessionAction::Edit(DraftEdit::Name(name.into())));
    }

    pub fn set_price(&self, text: impl Into<String>) {
        self.dispatch(SessionAction::Edit(DraftEdit::Price(text.into())));
    }

    pub fn set_stock(&self, text: impl Into<String>) {
        self.dispatch(SessionAction::Edit(DraftEdit::Stock(text.into())));
    }

    pub fn clear_image(&self) {
        self.dispatch(SessionAction::Edit(DraftEdit::ClearImage));
    }

    pub fn dismiss_success_toast(&self) {
        self.dispatch(SessionAction::DismissSuccessToast);
    }

    pub fn dismiss_error_toast(&self) {
        self.dispatch(SessionAction::DismissErrorToast);
    }

    /// Close the dialog. Responses still in flight will be dropped.
    pub fn close(&self) {
        debug!("Closing product edit session");
        self.dispatch(SessionAction::Close);
    }

    /// Start over on another (or a refreshed) product. Responses still in
    /// flight will be dropped.
    pub fn reopen(&self, product: Product, category_id: CategoryId) {
        info!(product_id = %product.id, "Reopening product edit session");
        self.dispatch(SessionAction::Reopen {
            product,
            category_id,
        });
    }

    /// Upload a new product image and point the draft at it.
    #[tracing::instrument(
        skip(self, upload),
        fields(file_name = %upload.file_name, size = upload.bytes.len()),
        ret
    )]
    pub async fn request_image_upload(
        &self,
        upload: requests::ImageUpload,
    ) -> UploadOutcome {
        let mut started = Err(UploadOutcome::Busy);
        self.state.send_if_modified(|state| {
            if state.closed {
                started = Err(UploadOutcome::Closed);
                return false;
            }
            if state.status.is_busy() {
                return false;
            }
            *state = state.reduce(SessionAction::UploadStarted);
            started = Ok(state.generation);
            true
        });
        let generation = match started {
            Ok(generation) => generation,
            Err(outcome) => {
                debug!(?outcome, "Image upload not started");
                return outcome;
            }
        };

        let (outcome, action) = match self.client.upload_image(upload).await {
            Ok(stored) => {
                let url = self.config.image_url(&stored.image);
                (
                    UploadOutcome::Stored { url: url.clone() },
                    SessionAction::ImageStored { url },
                )
            }
            Err(ClientError::APIError(status, body)) => {
                match responses::parse_body::<responses::ErrorMessage>(&body)
                {
                    Ok(body) => (
                        UploadOutcome::Rejected {
                            message: body.error.clone(),
                        },
                        SessionAction::ImageRejected {
                            message: body.error,
                        },
                    ),
                    Err(e) => {
                        warn!(%status, "Image upload error body has unexpected shape: {e}");
                        (
                            UploadOutcome::UnexpectedShape { status },
                            SessionAction::UploadEnded,
                        )
                    }
                }
            }
            Err(ClientError::UnexpectedShape { status, source }) => {
                warn!(%status, "Image upload response has unexpected shape: {source}");
                (
                    UploadOutcome::UnexpectedShape { status },
                    SessionAction::UploadEnded,
                )
            }
            Err(e @ ClientError::Network(_)) => {
                log_error(e);
                (UploadOutcome::Network, SessionAction::UploadEnded)
            }
        };

        if !self.finish(generation, action) {
            debug!("Dropping stale image upload response");
            return UploadOutcome::Stale;
        }
        outcome
    }

    /// Send the draft to the server.
    #[tracing::instrument(skip(self), ret)]
    pub async fn submit(&self) -> SubmitOutcome {
        let mut started = Err(SubmitOutcome::Busy);
        self.state.send_if_modified(|state| {
            if state.closed {
                started = Err(SubmitOutcome::Closed);
                return false;
            }
            if !state.draft.has_image() {
                *state = state.reduce(SessionAction::ImageMissing);
                started = Err(SubmitOutcome::EmptyImage);
                return true;
            }
            if state.status.is_busy() {
                return false;
            }
            *state = state.reduce(SessionAction::SubmitStarted);
            let request = state
                .draft
                .to_update(state.category_id, &state.original.variants);
            started = Ok((state.generation, request));
            true
        });
        let (generation, request) = match started {
            Ok(started) => started,
            Err(outcome) => {
                debug!(?outcome, "Submit not started");
                return outcome;
            }
        };

        let (outcome, action) =
            match self.client.update_product(&request).await {
                Ok(()) => (SubmitOutcome::Updated, SessionAction::Updated),
                Err(ClientError::APIError(status, body)) => {
                    interpret_rejection(status, &body)
                }
                Err(ClientError::UnexpectedShape { status, .. }) => (
                    SubmitOutcome::UnexpectedShape { status },
                    SessionAction::SubmitEnded,
                ),
                Err(e @ ClientError::Network(_)) => {
                    log_error(e);
                    (SubmitOutcome::Network, SessionAction::SubmitEnded)
                }
            };

        let current = self.finish(generation, action);
        if outcome == SubmitOutcome::Updated {
            // the server has the change even if the dialog moved on
            info!(product_id = %request.id, "Product updated");
            (self.on_update)();
        }
        if !current {
            debug!("Dropping stale product update response");
            return SubmitOutcome::Stale;
        }
        outcome
    }

    fn dispatch(&self, action: SessionAction) {
        self.state.send_modify(|state| *state = state.reduce(action));
    }

    /// Apply the result of a request, unless the session moved on since it
    /// was sent.
    fn finish(&self, generation: u64, action: SessionAction) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            *state = state.reduce(action);
            true
        })
    }
}

/// Map a non-success update response to what the dialog shows.
fn interpret_rejection(
    status: StatusCode,
    body: &str,
) -> (SubmitOutcome, SessionAction) {
    match status {
        StatusCode::BAD_REQUEST => {
            match responses::parse_body::<FieldErrors>(body) {
                Ok(errors) => (
                    SubmitOutcome::ValidationRejected,
                    SessionAction::ValidationRejected(errors),
                ),
                Err(e) => {
                    warn!(%status, "Validation errors have unexpected shape: {e}");
                    (
                        SubmitOutcome::UnexpectedShape { status },
                        SessionAction::SubmitEnded,
                    )
                }
            }
        }
        StatusCode::FORBIDDEN => {
            match responses::parse_body::<responses::ErrorMessage>(body) {
                Ok(body) => (
                    SubmitOutcome::Forbidden,
                    SessionAction::Forbidden(Some(body.error)),
                ),
                Err(e) => {
                    warn!(%status, "Forbidden body has unexpected shape: {e}");
                    (
                        SubmitOutcome::UnexpectedShape { status },
                        SessionAction::Forbidden(None),
                    )
                }
            }
        }
        _ => {
            warn!(%status, "Unhandled product update status");
            (
                SubmitOutcome::Unhandled { status },
                SessionAction::SubmitEnded,
            )
        }
    }
}
