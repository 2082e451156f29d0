//! Home routes. Every route requires a bearer token; a caller only sees and
//! deletes its own homes unless it holds the admin role.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request};
use axum::http::{Method, StatusCode};
use axum::{Json, RequestExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Identity, ROLE_ADMIN};
use crate::domain::home::{Address, Home, HomeCore, HomeKind, NewHome};
use crate::errs::{ApiError, FieldError};
use crate::middleware;
use crate::mux::{Config, HOME};
use crate::web::{handler, App, Log, RouteError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHomeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: NewAddressRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddressRequest {
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl NewHomeRequest {
    fn into_new_home(self, owner: String) -> Result<NewHome, ApiError> {
        let mut fields = Vec::new();

        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "single" => Some(HomeKind::Single),
            "condo" => Some(HomeKind::Condo),
            _ => {
                fields.push(FieldError::new("type", "must be one of: single, condo"));
                None
            }
        };

        let a = self.address;
        for (field, value, max) in [
            ("address.address1", &a.address1, 70),
            ("address.zipCode", &a.zip_code, 10),
            ("address.city", &a.city, 50),
            ("address.state", &a.state, 50),
        ] {
            let len = value.trim().chars().count();
            if len == 0 {
                fields.push(FieldError::new(field, "is required"));
            } else if len > max {
                fields.push(FieldError::new(field, format!("must be at most {max} characters")));
            }
        }
        if a.country.len() != 2 || !a.country.chars().all(|c| c.is_ascii_alphabetic()) {
            fields.push(FieldError::new(
                "address.country",
                "must be a two-letter country code",
            ));
        }

        match kind {
            Some(kind) if fields.is_empty() => Ok(NewHome {
                owner,
                kind,
                address: Address {
                    address1: a.address1,
                    address2: a.address2,
                    zip_code: a.zip_code,
                    city: a.city,
                    state: a.state,
                    country: a.country.to_ascii_uppercase(),
                },
            }),
            _ => Err(ApiError::validation("data validation error", fields)),
        }
    }
}

pub fn routes(app: &mut App, cfg: &Config) -> Result<(), RouteError> {
    let core: Arc<HomeCore> = cfg
        .bus
        .get(HOME)
        .ok_or_else(|| RouteError::MissingCore(HOME.to_string()))?;
    let authen = middleware::authenticate(Arc::clone(&cfg.auth), cfg.log.clone());

    let c = Arc::clone(&core);
    app.handle(
        Method::GET,
        "/v1/homes",
        handler(move |req| query(Arc::clone(&c), req)),
        &[Arc::clone(&authen)],
    )?;

    let c = Arc::clone(&core);
    app.handle(
        Method::GET,
        "/v1/homes/{home_id}",
        handler(move |req| query_by_id(Arc::clone(&c), req)),
        &[Arc::clone(&authen)],
    )?;

    let c = Arc::clone(&core);
    let log = cfg.log.clone();
    app.handle(
        Method::POST,
        "/v1/homes",
        handler(move |req| create(Arc::clone(&c), log.clone(), req)),
        &[Arc::clone(&authen)],
    )?;

    let c = Arc::clone(&core);
    app.handle(
        Method::DELETE,
        "/v1/homes/{home_id}",
        handler(move |req| delete(Arc::clone(&c), req)),
        &[authen],
    )?;

    Ok(())
}

async fn query(core: Arc<HomeCore>, req: Request) -> Result<Json<Vec<Home>>, ApiError> {
    let caller = middleware::identity(&req)?;
    Ok(Json(core.query_by_owner(&caller.subject).await))
}

async fn query_by_id(core: Arc<HomeCore>, mut req: Request) -> Result<Json<Home>, ApiError> {
    let caller = middleware::identity(&req)?;
    let id = home_id(&mut req).await?;
    let home = owned_home(&core, &caller, id).await?;
    Ok(Json(home))
}

async fn create(
    core: Arc<HomeCore>,
    log: Log,
    req: Request,
) -> Result<(StatusCode, Json<Home>), ApiError> {
    let caller = middleware::identity(&req)?;
    let Json(body) = req
        .extract::<Json<NewHomeRequest>, _>()
        .await
        .map_err(|rej: JsonRejection| ApiError::validation(rej.body_text(), Vec::new()))?;

    let home = core.create(body.into_new_home(caller.subject)?).await;
    log.emit(|| tracing::info!(home_id = %home.id, owner = %home.owner, "home created"));
    Ok((StatusCode::CREATED, Json(home)))
}

async fn delete(core: Arc<HomeCore>, mut req: Request) -> Result<StatusCode, ApiError> {
    let caller = middleware::identity(&req)?;
    let id = home_id(&mut req).await?;
    owned_home(&core, &caller, id).await?;
    core.delete(id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn home_id(req: &mut Request) -> Result<Uuid, ApiError> {
    let Path(raw) = req
        .extract_parts::<Path<String>>()
        .await
        .map_err(|e| ApiError::internal(e.body_text()))?;
    Uuid::parse_str(&raw).map_err(|_| {
        ApiError::validation(
            "data validation error",
            vec![FieldError::new("home_id", "must be a valid uuid")],
        )
    })
}

async fn owned_home(core: &HomeCore, caller: &Identity, id: Uuid) -> Result<Home, ApiError> {
    let home = core
        .query_by_id(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("home {id} not found")))?;
    if home.owner != caller.subject && !caller.has_role(ROLE_ADMIN) {
        return Err(ApiError::forbidden("home belongs to another user"));
    }
    Ok(home)
}
