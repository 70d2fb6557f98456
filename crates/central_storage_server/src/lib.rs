//! Server side counterpart of the central storage client.
//!
//! Routes taking a [`auth::SignedConsumer`] only run for requests whose
//! `centralstorage-signature` header matches their query parameters under the
//! secret the [`ConsumerStore`](central_storage_core::traits::ConsumerStore)
//! holds for the `centralstorage-key` header. Every failure is answered with
//! the same `401 Unauthorized`.

pub mod auth;
pub mod consumers;
pub mod state;

pub mod prelude {
    pub use crate::auth::*;
    pub use crate::consumers::*;
    pub use crate::state::*;
}
