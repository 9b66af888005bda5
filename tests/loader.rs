use axum::{Router, http::StatusCode, routing::get};
use reputation_dashboard::{DashboardSource, HttpSource, LoadError, RetryPolicy};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const COMPANIES: &str = include_str!("../assets/data/companies.json");
const ACME: &str = include_str!("../assets/data/company_1.json");
const NO_TIMELINE: &str = r#"{
    "stats": {"TOTAL": 0, "AVG_SCORE": 0, "POSITIVE": 0, "NEUTRAL": 0, "NEGATIVE": 0},
    "mentions": []
}"#;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn source(addr: SocketAddr, prefix: &str, retry: RetryPolicy) -> HttpSource {
    HttpSource::new(format!("http://{addr}/{prefix}/"), Duration::from_millis(300), retry).unwrap()
}

#[tokio::test]
async fn loads_companies_and_dashboards_over_http() {
    let app = Router::new()
        .route("/data/companies.json", get(|| async { COMPANIES }))
        .route("/data/company_1.json", get(|| async { ACME }))
        .route("/data/dashboard_data.json", get(|| async { ACME }));
    let addr = serve(app).await;
    let source = source(addr, "data", RetryPolicy::default());

    let companies = source.load_companies().await.unwrap();
    assert_eq!(companies.len(), 3);
    assert_eq!(companies[0].name, "Acme Corp");

    let payload = source.load_dashboard(Some(1)).await.unwrap();
    assert_eq!(payload.stats.total, 10);
    assert_eq!(payload.mentions.len(), 10);
    assert_eq!(source.load_dashboard(None).await.unwrap(), payload);

    let missing = source.load_dashboard(Some(2)).await.unwrap_err();
    assert_eq!(missing.status(), Some(404));
}

#[tokio::test]
async fn server_error_is_a_fetch_error_with_status() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/data/company_1.json",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }),
    );
    let addr = serve(app).await;

    let err = source(addr, "data", RetryPolicy::default())
        .load_dashboard(Some(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LoadError::Fetch {
            resource: "company_1.json".into(),
            status: 500
        }
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let retrying = RetryPolicy {
        max_retries: 2,
        backoff: Duration::from_millis(5),
    };
    assert!(source(addr, "data", retrying).load_dashboard(Some(1)).await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn malformed_payload_is_a_validation_error() {
    let app = Router::new()
        .route("/data/company_1.json", get(|| async { NO_TIMELINE }))
        .route("/data/company_2.json", get(|| async { "<html>not json</html>" }));
    let addr = serve(app).await;
    let source = source(addr, "data", RetryPolicy::default());

    let err = source.load_dashboard(Some(1)).await.unwrap_err();
    assert_eq!(err, LoadError::validation("company_1.json", "missing field `timeline`"));

    let err = source.load_dashboard(Some(2)).await.unwrap_err();
    assert!(matches!(err, LoadError::Validation { .. }), "{err:?}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let app = Router::new().route(
        "/data/companies.json",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            COMPANIES
        }),
    );
    let addr = serve(app).await;

    let err = source(addr, "data", RetryPolicy::default())
        .load_companies()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LoadError::Timeout {
            resource: "companies.json".into()
        }
    );
}
