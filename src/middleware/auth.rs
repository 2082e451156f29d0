//! Per-route bearer-token authentication.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;

use crate::auth::{Authenticator, Identity};
use crate::errs::ApiError;
use crate::web::{self, Handler, Log, Middleware};

/// Verifies `Authorization: Bearer <token>` and stores the [`Identity`] in
/// the request extensions. Missing or rejected tokens fail with
/// [`ApiError::Unauthenticated`] before the handler runs.
pub fn authenticate(auth: Arc<dyn Authenticator>, log: Log) -> Middleware {
    web::from_fn(move |mut req: Request, next: Handler| {
        let auth = Arc::clone(&auth);
        let log = log.clone();
        async move {
            let token = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| {
                    ApiError::unauthenticated("expected authorization header format: Bearer <token>")
                })?;

            let identity = auth
                .verify(&token)
                .await
                .map_err(|e| ApiError::unauthenticated(e.to_string()))?;

            log.emit(|| tracing::debug!(subject = %identity.subject, "authenticated"));
            req.extensions_mut().insert(identity);
            next(req).await
        }
    })
}

/// The identity placed by [`authenticate`].
pub fn identity(req: &Request) -> Result<Identity, ApiError> {
    req.extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| ApiError::unauthenticated("request is not authenticated"))
}
