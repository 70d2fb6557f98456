use crate::state::VerifierState;
use central_storage_core::prelude::*;
use axum::{
    extract::FromRequestParts,
    http::{self, StatusCode, request::Parts},
};
use tracing::warn;

/// The consumer key of a request whose signature checked out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedConsumer(pub String);

fn unauthorized() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

fn method_of(method: &http::Method) -> Method {
    match *method {
        http::Method::POST => Method::Post,
        http::Method::PUT => Method::Put,
        http::Method::DELETE => Method::Delete,
        _ => Method::Get,
    }
}

impl<C: ConsumerStore> FromRequestParts<VerifierState<C>> for SignedConsumer {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &VerifierState<C>,
    ) -> Result<Self, Self::Rejection> {
        let mut request = SignableRequest::new(method_of(&parts.method), parts.uri.path())
            .with_query_string(parts.uri.query().unwrap_or_default());
        for name in [HEADER_SIGNATURE, HEADER_KEY] {
            if let Some(value) = parts.headers.get(name).and_then(|v| v.to_str().ok()) {
                request.set_header(name, value);
            }
        }

        let Some(key) = request.header(HEADER_KEY).map(str::to_string) else {
            return Err(unauthorized());
        };

        let Some(secret) = state.consumers.secret_for(&key).await else {
            warn!(key = %key, "Rejected request from unknown consumer");
            return Err(unauthorized());
        };

        if !state.signer.is_valid(&request, &key, &secret) {
            warn!(key = %key, "Rejected request with invalid signature");
            return Err(unauthorized());
        }

        Ok(SignedConsumer(key))
    }
}
