//! Client-side edit session for a storefront product: draft state, image
//! upload, partial update, and the feedback the edit dialog shows.

pub mod config;
pub mod draft;
pub mod session;
pub mod telemetry;
pub mod toast;

pub use config::{Config, ConfigError};
pub use draft::EditableProductDraft;
pub use session::{
    ProductEditSession, SessionState, SessionStatus, SubmitOutcome,
    UploadOutcome,
};
