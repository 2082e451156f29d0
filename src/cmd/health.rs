//! `webmux health`: probe the liveness route of a running instance.
//!
//! Sends `GET /v1/liveness` to the given URL and prints the response as
//! formatted text or raw JSON.

use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::api::checkapi::LivenessResponse;
use crate::cli::HealthArgs;
use crate::error::ServiceError;

pub async fn execute(args: HealthArgs) -> Result<(), ServiceError> {
    let url = format!("{}/v1/liveness", args.url.trim_end_matches('/'));
    let uri: hyper::Uri = url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| ServiceError::UriParse {
            source: Box::new(e),
        })?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(http_body_util::Full::new(bytes::Bytes::new()))
        .map_err(|e| ServiceError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(std::time::Duration::from_secs(10), client.request(req))
        .await
        .map_err(|_| ServiceError::HttpRequest {
            source: "health check timed out after 10s".into(),
        })?
        .map_err(|e| ServiceError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ServiceError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(ServiceError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<LivenessResponse>(&body) {
        Ok(live) => {
            println!("\u{2713} webmux is {} ({})", live.status, args.url);
            println!("  build:   {}", live.build);
            println!("  version: {}", live.version);
            println!("  host:    {}", live.host);
        }
        Err(e) => {
            eprintln!("Failed to parse liveness response: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}
