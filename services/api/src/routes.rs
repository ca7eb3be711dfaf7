use crate::infra::{AppState, EMPLOYEE_HEADER};
use async_graphql::http::GraphiQLSource;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Json, Router};
use rcd_permits::graphql::Viewer;
use serde_json::json;
use tracing::debug;

pub(crate) fn with_portal_routes() -> Router {
    Router::new()
        .route(
            "/graphql",
            axum::routing::get(graphiql).post(graphql_endpoint),
        )
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

/// Execute a GraphQL request as the employee named in the proxy header.
pub(crate) async fn graphql_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = match serde_json::from_str::<async_graphql::Request>(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "malformed GraphQL request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errors": [{ "message": format!("invalid GraphQL request: {err}") }]
                })),
            )
                .into_response();
        }
    };

    let employee = headers
        .get(EMPLOYEE_HEADER)
        .and_then(|value| value.to_str().ok());
    let viewer = Viewer::resolve(&state.employees, employee);
    let response = state.schema.execute(request.data(viewer)).await;
    Json(response).into_response()
}

pub(crate) async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::TracingNotifier;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rcd_permits::graphql::build_schema;
    use rcd_permits::storage::SqliteStore;
    use rcd_permits::workflows::applications::FeeSchedule;
    use rcd_permits::workflows::employees::{
        EmployeeInput, EmployeeRepository, EmployeeService, Role,
    };
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        admin_id: i64,
    }

    fn app(ready: bool) -> TestApp {
        let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
        let admin = store
            .insert_employee(EmployeeInput {
                email: "admin@rcd.example".to_string(),
                first_name: "Ari".to_string(),
                last_name: "Chen".to_string(),
                role: Role::Admin,
            })
            .expect("admin inserted");
        let schema = build_schema(
            store.clone(),
            Arc::new(TracingNotifier),
            FeeSchedule::default(),
        );
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            schema,
            employees: Arc::new(EmployeeService::new(store)),
        };
        TestApp {
            router: with_portal_routes().layer(Extension(state)),
            admin_id: admin.id.0,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn graphql(query: &str, employee: Option<i64>) -> Request<Body> {
        let mut builder = Request::post("/graphql").header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = employee {
            builder = builder.header(EMPLOYEE_HEADER, id.to_string());
        }
        builder
            .body(Body::from(json!({ "query": query }).to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(true)
            .router
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = app(false)
            .router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn employee_header_identifies_viewer() {
        let test = app(true);
        let response = test
            .router
            .oneshot(graphql(
                "{ viewer { authenticated employee { email role } } }",
                Some(test.admin_id),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["viewer"]["authenticated"], true);
        assert_eq!(body["data"]["viewer"]["employee"]["role"], "ADMIN");
    }

    #[tokio::test]
    async fn unknown_employee_is_anonymous() {
        let response = app(true)
            .router
            .oneshot(graphql("{ employees { totalCount } }", Some(999)))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let request = Request::post("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .expect("request builds");
        let response = app(true)
            .router
            .oneshot(request)
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn graphiql_is_served_on_get() {
        let response = app(true)
            .router
            .oneshot(Request::get("/graphql").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        assert!(String::from_utf8_lossy(&bytes).contains("graphiql"));
    }
}
