//! # Verimail Axum Integration
//!
//! HTTP surface of the confirmation flow:
//!
//! - `GET /confirm?code=…` redeems a code and records the address
//! - `POST /newsletter` with `{"email": …}` starts a signup
//! - `GET /health` reports whether the code store is reachable
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use verimail_axum::{AppState, routes};
//! use verimail_core::{
//!     CodeStore, ConfirmationService, LinkIssuer, MemoryCodeStore, MemoryRecordingSink,
//!     NewsletterService, RecordingSink,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store: Arc<dyn CodeStore> = Arc::new(MemoryCodeStore::new());
//!     let sink: Arc<dyn RecordingSink> = Arc::new(MemoryRecordingSink::new());
//!
//!     let issuer = Arc::new(LinkIssuer::new(store.clone(), "https://cdlhelp.com"));
//!     let state = AppState::new(
//!         Arc::new(NewsletterService::new(issuer)),
//!         Arc::new(ConfirmationService::new(store, sink)),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, routes(state)).await.unwrap();
//! }
//! ```

mod error;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use routes::create_router;
pub use types::{ConfirmQuery, ConfirmResponse, HealthResponse, MessageResponse, NewsletterRequest};

use std::sync::Arc;

use axum::Router;
use verimail_core::{CodeStore, ConfirmationService, NewsletterService, RecordingSink};

pub type DynNewsletterService = NewsletterService<dyn CodeStore>;
pub type DynConfirmationService = ConfirmationService<dyn CodeStore, dyn RecordingSink>;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub newsletter: Arc<DynNewsletterService>,
    pub confirmation: Arc<DynConfirmationService>,
}

impl AppState {
    pub fn new(
        newsletter: Arc<DynNewsletterService>,
        confirmation: Arc<DynConfirmationService>,
    ) -> Self {
        Self {
            newsletter,
            confirmation,
        }
    }
}

/// Build the verimail router, ready to be served or nested
pub fn routes(state: AppState) -> Router {
    create_router(state)
}
