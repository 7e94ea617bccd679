//! JSON REST API for Among.
//!
//! Exposes an axum [`Router`] backed by any [`among_core::store::FishStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", among_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod fish;
pub mod merge;
pub mod record;

use std::sync::Arc;

use among_core::store::FishStore;
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: FishStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Merge — static segments, registered alongside the `{id}` routes.
    .route("/fish/merge", post(merge::execute::<S>))
    .route("/fish/merge/preview", post(merge::preview::<S>))
    // Fish
    .route("/fish", get(fish::list::<S>).post(fish::create::<S>))
    .route(
      "/fish/{id}",
      get(fish::get_one::<S>).delete(fish::delete_one::<S>),
    )
    // Child records
    .route(
      "/fish/{id}/notes",
      get(record::list_notes::<S>).post(record::create_note::<S>),
    )
    .route(
      "/fish/{id}/audios",
      get(record::list_audios::<S>).post(record::create_audio::<S>),
    )
    .route(
      "/fish/{id}/capture-records",
      get(record::list_captures::<S>).post(record::create_capture::<S>),
    )
    .route(
      "/fish/{id}/classifications",
      get(record::list_classifications::<S>)
        .post(record::create_classification::<S>),
    )
    .with_state(store)
}
