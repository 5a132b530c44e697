mod search;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use storefind_core::AppConfig;
use storefind_nominatim::NominatimClient;

use crate::events::EventBus;
use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub geocoder: Arc<NominatimClient>,
    pub config: Arc<AppConfig>,
    pub events: EventBus,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &sqlx::Error) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let finder_routes = Router::new()
        .route("/merchant-finder/search", post(search::search))
        .route("/merchant-finder/suggest", post(search::suggest))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .merge(public_routes)
        .merge(finder_routes)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match storefind_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use storefind_core::Environment;

    pub(crate) fn test_config(nominatim_url: &str) -> AppConfig {
        AppConfig {
            database_url: "postgres://unused".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            log_level: "debug".to_string(),
            allowed_country_codes: vec!["de".to_string()],
            nominatim_url: nominatim_url.to_string(),
            geocoder_timeout_secs: 5,
            default_radius_km: 30.0,
            default_page_size: 500,
            db_max_connections: 5,
            db_min_connections: 1,
            db_acquire_timeout_secs: 5,
            filter_radius_enabled: true,
            filter_country_enabled: true,
            filter_manufacturer_enabled: true,
            filter_tags_enabled: true,
        }
    }

    pub(crate) fn test_state(pool: PgPool, config: AppConfig) -> AppState {
        let geocoder = NominatimClient::with_base_url(
            config.geocoder_timeout_secs,
            &config.nominatim_url,
        )
        .expect("geocoder client");
        AppState {
            pool,
            geocoder: Arc::new(geocoder),
            config: Arc::new(config),
            events: EventBus::default(),
        }
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("not_found", StatusCode::NOT_FOUND),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), expected, "code {code}");
        }
    }

    // -------------------------------------------------------------------------
    // Route integration tests (with DB; geocoder mocked where needed)
    // -------------------------------------------------------------------------

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;
    use wiremock::matchers::method as http_method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Insert an active merchant and return its id.
    async fn seed_merchant(
        pool: &PgPool,
        company: &str,
        lat: f64,
        lon: f64,
        priority: i32,
    ) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO merchant \
               (active, company, country_code, location_lat, location_lon, priority) \
             VALUES (TRUE, $1, 'de', $2, $3, $4) RETURNING id",
        )
        .bind(company)
        .bind(lat)
        .bind(lon)
        .bind(priority)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("seed_merchant failed for '{company}': {e}"))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).expect("json parse");
        (status, json)
    }

    fn app_with_geocoder(pool: PgPool, nominatim_url: &str) -> Router {
        build_app(
            test_state(pool, test_config(nominatim_url)),
            default_rate_limit_state(),
        )
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_without_location_ranks_by_attributes(pool: PgPool) {
        seed_merchant(&pool, "Zeta Laden", 52.52, 13.40, 0).await;
        seed_merchant(&pool, "Alpha Laden", 52.52, 13.40, 0).await;
        seed_merchant(&pool, "Wichtig GmbH", 52.52, 13.40, 10).await;

        // No location fields at all: the geocoder must never be contacted,
        // so a dead endpoint is fine here.
        let app = app_with_geocoder(pool, "http://127.0.0.1:1/search");
        let (status, json) = post_json(app, "/merchant-finder/search", serde_json::json!({})).await;

        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["company"], "Wichtig GmbH");
        assert_eq!(data[1]["company"], "Alpha Laden");
        assert_eq!(data[2]["company"], "Zeta Laden");
        assert!(
            data[0].get("distance").is_none(),
            "attribute ranking must not attach a distance"
        );
        assert_eq!(json["total"].as_u64(), Some(3));
        assert!(json["loc"].as_array().expect("loc array").is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_with_explicit_location_sorts_by_distance(pool: PgPool) {
        seed_merchant(&pool, "Potsdam Store", 52.391, 13.065, 99).await;
        seed_merchant(&pool, "Berlin Store", 52.520, 13.405, 0).await;
        seed_merchant(&pool, "Munich Store", 48.137, 11.575, 0).await;

        let app = app_with_geocoder(pool, "http://127.0.0.1:1/search");
        let body = serde_json::json!({
            "location": { "lat": 52.52, "lon": 13.405 },
            "distance": 50.0
        });
        let (status, json) = post_json(app, "/merchant-finder/search", body).await;

        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 2, "Munich is outside the 50 km radius");
        assert_eq!(data[0]["company"], "Berlin Store");
        assert_eq!(data[1]["company"], "Potsdam Store");

        let near = data[0]["distance"].as_f64().expect("distance");
        let far = data[1]["distance"].as_f64().expect("distance");
        assert!(near < far, "results must be ordered by ascending distance");
        assert!(far > 20.0 && far < 35.0, "Potsdam is roughly 27 km away");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_geocodes_term_and_caches_the_result(pool: PgPool) {
        seed_merchant(&pool, "Berlin Store", 52.520, 13.405, 0).await;

        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "place_id": 5501,
                    "licence": "Data © OpenStreetMap contributors",
                    "lat": "52.5200",
                    "lon": "13.4050",
                    "address": {
                        "postcode": "10115",
                        "city": "Berlin",
                        "country": "Deutschland",
                        "country_code": "de"
                    }
                }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/search", mock_server.uri());
        let app = app_with_geocoder(pool.clone(), &url);
        let body = serde_json::json!({ "zipcode": "10115" });
        let (status, json) = post_json(app, "/merchant-finder/search", body).await;

        assert_eq!(status, StatusCode::OK);
        let loc = json["loc"].as_array().expect("loc array");
        assert_eq!(loc.len(), 1);
        assert_eq!(loc[0]["city"], "Berlin");
        assert_eq!(loc[0]["countryCode"], "de");

        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert!(
            data[0]["distance"].as_f64().expect("distance") < 1.0,
            "store sits at the resolved point"
        );

        let cached: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM geo_cache WHERE id = 5501")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(cached, 1, "the provider result must be cached");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_second_lookup_hits_cache_not_provider(pool: PgPool) {
        sqlx::query(
            "INSERT INTO geo_cache (id, zipcode, city, country_code, lon, lat) \
             VALUES (7001, '10115', 'Berlin', 'de', 13.405, 52.52)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let url = format!("{}/search", mock_server.uri());
        let app = app_with_geocoder(pool, &url);
        let (status, json) =
            post_json(app, "/merchant-finder/search", serde_json::json!({ "term": "Berlin" }))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["loc"].as_array().expect("loc").len(), 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_survives_geocoder_outage(pool: PgPool) {
        seed_merchant(&pool, "Resilient Store", 52.52, 13.405, 3).await;

        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/search", mock_server.uri());
        let app = app_with_geocoder(pool, &url);
        let (status, json) =
            post_json(app, "/merchant-finder/search", serde_json::json!({ "zipcode": "10115" }))
                .await;

        assert_eq!(status, StatusCode::OK, "geocoder failures must not fail the request");
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert!(
            data[0].get("distance").is_none(),
            "ranking degrades to attribute mode"
        );
        assert!(json["loc"].as_array().expect("loc").is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn pick_requires_a_merchant_id(pool: PgPool) {
        let app = app_with_geocoder(pool, "http://127.0.0.1:1/search");
        let (status, json) =
            post_json(app, "/merchant-finder/search", serde_json::json!({ "action": "pick" }))
                .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn pick_of_unknown_merchant_is_rejected(pool: PgPool) {
        let app = app_with_geocoder(pool, "http://127.0.0.1:1/search");
        let body = serde_json::json!({ "action": "pick", "merchant": Uuid::new_v4() });
        let (status, json) = post_json(app, "/merchant-finder/search", body).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn pick_with_customer_persists_and_reloads(pool: PgPool) {
        let merchant_id = seed_merchant(&pool, "Picked Store", 52.52, 13.405, 0).await;
        let customer_id = Uuid::new_v4();

        let app = app_with_geocoder(pool.clone(), "http://127.0.0.1:1/search");
        let body = serde_json::json!({
            "action": "pick",
            "merchant": merchant_id,
            "customerId": customer_id
        });
        let (status, json) = post_json(app, "/merchant-finder/search", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reload"].as_bool(), Some(true));

        let stored: Uuid =
            sqlx::query_scalar("SELECT merchant_id FROM merchant_pick WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_one(&pool)
                .await
                .expect("pick row");
        assert_eq!(stored, merchant_id);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn suggest_returns_empty_data(pool: PgPool) {
        let app = app_with_geocoder(pool, "http://127.0.0.1:1/search");
        let (status, json) =
            post_json(app, "/merchant-finder/suggest", serde_json::json!({ "term": "Ber" })).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["data"].as_array().expect("data").is_empty());
    }
}
