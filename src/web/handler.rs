//! Handler and middleware value types.
//!
//! Every stage of the pipeline has the same shape: an async function from a
//! [`Request`] to a [`HandlerResult`]. Stages are stored behind `Arc<dyn Fn>`
//! so handlers of different concrete types can sit in one route table and be
//! wrapped by the same middleware values.
//!
//! ```text
//! async fn get_home(req: Request) -> Result<Json<Home>, ApiError>   ← user code
//!        ↓ web::handler(get_home)
//! Handler = Arc<dyn Fn(Request) -> BoxFuture<HandlerResult>>        ← erased
//!        ↓ wrap_middleware(&[logger, errors, metrics, panics], h)
//! logger(errors(metrics(panics(h))))                                ← composed
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};

use crate::errs::ApiError;

/// A heap-allocated, type-erased future that can move between worker threads.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What every stage returns: a finished response, or a failure for the
/// error-normalization stage to translate.
pub type HandlerResult = Result<Response, ApiError>;

/// A type-erased request handler shared across concurrent requests.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<HandlerResult> + Send + Sync + 'static>;

/// Takes the next handler and returns a handler wrapping it.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync + 'static>;

/// Erases an async function into a [`Handler`].
///
/// Any `Ok` value implementing [`IntoResponse`] is accepted, so handlers can
/// return `Json<T>`, `(StatusCode, Json<T>)`, `StatusCode`, or a full
/// [`Response`].
pub fn handler<F, Fut, R>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ApiError>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Arc::new(move |req: Request| -> BoxFuture<HandlerResult> {
        let fut = f(req);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    })
}

/// Builds a [`Middleware`] from an async function receiving the request and
/// the next handler, in the spirit of `axum::middleware::from_fn`.
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Handler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: Handler| -> Handler {
        let f = Arc::clone(&f);
        Arc::new(move |req: Request| -> BoxFuture<HandlerResult> {
            Box::pin(f(req, Arc::clone(&next)))
        })
    })
}

/// Wraps `handler` so that `mw[0]` is outermost and the last element sits
/// directly around `handler`.
#[must_use]
pub fn wrap_middleware(mw: &[Middleware], handler: Handler) -> Handler {
    mw.iter().rev().fold(handler, |inner, m| m(inner))
}
