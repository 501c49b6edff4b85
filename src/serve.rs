//! Purpose: Provide the HTTP/JSON server for jsonsieve.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum-based server exposing the dataset behind `GET /api/data`.
//! Invariants: Each request loads the dataset fresh; no state is shared between requests.
//! Invariants: Error kinds map to HTTP status codes here and nowhere else.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query as UrlQuery, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jsonsieve::api::{Error, ErrorKind, Query, Source, apply};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub source: Source,
    pub cors_origins: Vec<String>,
}

struct AppState {
    source: Source,
}

#[derive(Debug, Deserialize)]
struct DataParams {
    filter: Option<String>,
    sort: Option<String>,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    let cors = cors_layer(&config.cors_origins)?;

    init_tracing();

    let state = Arc::new(AppState {
        source: config.source.clone(),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/data", get(get_data))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;

    tracing::info!(bind = %config.bind, source = %config.source.describe(), "serving data");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("server failed")
                .with_source(err)
        })
}

fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, Error> {
    if origins.is_empty() {
        return Ok(None);
    }
    let mut parsed = Vec::with_capacity(origins.len());
    for origin in origins {
        let value = HeaderValue::from_str(origin).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid CORS origin: {origin}"))
                .with_hint("Use a full origin like https://app.example.com.")
                .with_source(err)
        })?;
        parsed.push(value);
    }
    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any),
    ))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn get_data(
    State(state): State<Arc<AppState>>,
    params: Result<UrlQuery<DataParams>, QueryRejection>,
) -> Response {
    let UrlQuery(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": [rejection.body_text()] })),
            )
                .into_response();
        }
    };

    let source = state.source.clone();
    let loaded = tokio::task::spawn_blocking(move || source.load()).await;
    let records = match loaded {
        Ok(Ok(records)) => records,
        Ok(Err(err)) => return error_response(err),
        Err(err) => {
            return error_response(
                Error::new(ErrorKind::Internal)
                    .with_message("data load task failed")
                    .with_source(err),
            );
        }
    };

    let query = Query {
        filter: params.filter,
        sort: params.sort,
    };
    match apply(records, &query) {
        Ok(records) if records.is_empty() && !query.is_empty() => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No data found for the given filter." })),
        )
            .into_response(),
        Ok(records) => Json(Value::Array(records)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: Error) -> Response {
    let status = status_for(&err);
    tracing::error!(kind = ?err.kind(), status = %status, "request failed: {err}");
    let message = err.message().unwrap_or("request failed").to_string();
    (status, Json(json!({ "error": message }))).into_response()
}

fn status_for(err: &Error) -> StatusCode {
    match err.kind() {
        ErrorKind::Usage | ErrorKind::InvalidSortFormat | ErrorKind::InvalidSortOrder => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::DataUnavailable if err.url().is_some() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::{StatusCode, cors_layer, status_for};
    use jsonsieve::api::{Error, ErrorKind};

    #[test]
    fn status_mapping_follows_error_kind() {
        let cases = [
            (ErrorKind::InvalidSortFormat, StatusCode::BAD_REQUEST),
            (ErrorKind::InvalidSortOrder, StatusCode::BAD_REQUEST),
            (ErrorKind::Usage, StatusCode::BAD_REQUEST),
            (ErrorKind::InvalidFilterFormat, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorKind::MissingFilterKey, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorKind::MissingSortKey, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(status_for(&Error::new(kind)), status);
        }
    }

    #[test]
    fn data_unavailable_maps_by_source_origin() {
        let file_err = Error::new(ErrorKind::DataUnavailable).with_path("data/records.json");
        assert_eq!(status_for(&file_err), StatusCode::INTERNAL_SERVER_ERROR);

        let remote_err =
            Error::new(ErrorKind::DataUnavailable).with_url("http://upstream.test/data");
        assert_eq!(status_for(&remote_err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn cors_layer_is_absent_without_origins() {
        assert!(cors_layer(&[]).expect("cors").is_none());
    }

    #[test]
    fn cors_layer_accepts_valid_origins() {
        let origins = vec!["https://app.example.com".to_string()];
        assert!(cors_layer(&origins).expect("cors").is_some());
    }

    #[test]
    fn cors_layer_rejects_invalid_origins() {
        let origins = vec!["https://bad\norigin".to_string()];
        let err = cors_layer(&origins).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
