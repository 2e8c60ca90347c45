//! Router-level tests for the gateway handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, body::Body, http::Request, http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::cache::{MockRankCache, RANKBOARD_SOURCE_HEADER, WarmState};
use crate::gateway::create_router_with_state;
use crate::gateway::error::GatewayError;
use crate::gateway::handler::parse_param;
use crate::gateway::state::HandlerState;
use crate::gateway::RANKBOARD_STATUS_HEADER;
use crate::pipeline::{PipelineConfig, UpdatePipeline};
use crate::store::MockScoreStore;
use crate::sync::CacheSynchronizer;

const USERS: &[(&str, i32)] = &[("A", 1000), ("B", 1000), ("C", 900)];

struct TestApp {
    router: Router,
    state: HandlerState<MockScoreStore, MockRankCache>,
    store: MockScoreStore,
    cache: MockRankCache,
}

fn build_app(
    store: MockScoreStore,
    cache: Option<MockRankCache>,
    warm: WarmState,
    pipeline: PipelineConfig,
) -> HandlerState<MockScoreStore, MockRankCache> {
    let pipeline = Arc::new(
        UpdatePipeline::start(pipeline, store.clone(), cache.clone()).expect("pipeline"),
    );
    let synchronizer = Arc::new(CacheSynchronizer::new(
        store.clone(),
        cache.clone(),
        warm.clone(),
    ));
    HandlerState::new(store, cache, warm, pipeline, synchronizer)
}

/// Store and cache seeded with the same users; cache already warm.
fn setup_test_app() -> TestApp {
    let store = MockScoreStore::with_users(USERS);
    let cache = MockRankCache::with_members(USERS);
    let state = build_app(
        store.clone(),
        Some(cache.clone()),
        WarmState::warm(),
        PipelineConfig::default(),
    );
    TestApp {
        router: create_router_with_state(state.clone()),
        state,
        store,
        cache,
    }
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

mod parse_param_tests {
    use super::*;

    #[test]
    fn test_absent_or_blank_uses_default() {
        assert_eq!(parse_param("page", None, 1u32).unwrap(), 1);
        assert_eq!(parse_param("page", Some("  "), 1u32).unwrap(), 1);
        assert_eq!(parse_param("page", Some("7"), 1u32).unwrap(), 7);
    }

    #[test]
    fn test_non_numeric_is_invalid_request() {
        let err = parse_param("limit", Some("ten"), 50u32).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert!(err.to_string().contains("limit"));

        assert!(parse_param("page", Some("-1"), 1u32).is_err());
    }
}

mod leaderboard_tests {
    use super::*;

    #[tokio::test]
    async fn test_leaderboard_from_cache() {
        let app = setup_test_app();
        let response = send(&app.router, "GET", "/api/v1/leaderboard", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(RANKBOARD_SOURCE_HEADER).unwrap(),
            "cache"
        );

        let json = body_json(response).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["limit"], 50);
        assert_eq!(json["total"], 3);
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[1]["rank"], 1);
        assert_eq!(entries[2]["rank"], 3);
        assert_eq!(entries[2]["username"], "C");
        assert!(json.get("source").is_none());
    }

    #[tokio::test]
    async fn test_leaderboard_falls_back_to_store() {
        let app = setup_test_app();
        app.cache.set_failing(true);

        let response = send(&app.router, "GET", "/api/v1/leaderboard?page=1&limit=2", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(RANKBOARD_SOURCE_HEADER).unwrap(),
            "store"
        );

        let json = body_json(response).await;
        assert_eq!(json["limit"], 2);
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
        assert_eq!(json["total"], 3);
    }

    #[tokio::test]
    async fn test_leaderboard_invalid_params() {
        let app = setup_test_app();

        for uri in [
            "/api/v1/leaderboard?page=0",
            "/api/v1/leaderboard?limit=0",
            "/api/v1/leaderboard?limit=101",
            "/api/v1/leaderboard?page=abc",
        ] {
            let response = send(&app.router, "GET", uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(
                response.headers().get(RANKBOARD_STATUS_HEADER).unwrap(),
                "invalid_request"
            );
            let json = body_json(response).await;
            assert_eq!(json["code"], 400);
            assert!(json["error"].as_str().unwrap().contains("invalid"));
        }
    }

    #[tokio::test]
    async fn test_leaderboard_store_failure_is_500() {
        let app = setup_test_app();
        app.cache.set_failing(true);
        app.store.set_failing(true);

        let response = send(&app.router, "GET", "/api/v1/leaderboard", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], 500);
    }
}

mod user_tests {
    use super::*;

    #[tokio::test]
    async fn test_search() {
        let app = setup_test_app();
        let response = send(&app.router, "GET", "/api/v1/users/search?q=c", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["users"][0]["username"], "C");
        assert_eq!(json["users"][0]["rank"], 3);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = setup_test_app();

        let response = send(&app.router, "GET", "/api/v1/users/search", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app.router, "GET", "/api/v1/users/search?q=", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_rank() {
        let app = setup_test_app();
        let response = send(&app.router, "GET", "/api/v1/users/B/rank", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["username"], "B");
        assert_eq!(json["score"], 1000);
        assert_eq!(json["rank"], 1);
        assert_eq!(json["shared_with"], 1);
    }

    #[tokio::test]
    async fn test_user_rank_not_found() {
        let app = setup_test_app();
        let response = send(&app.router, "GET", "/api/v1/users/nobody/rank", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(RANKBOARD_STATUS_HEADER).unwrap(),
            "not_found"
        );
        let json = body_json(response).await;
        assert_eq!(json["code"], 404);
        assert!(json["error"].as_str().unwrap().contains("nobody"));
    }
}

mod update_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_score_accepted_and_applied() {
        let app = setup_test_app();
        let response = send(
            &app.router,
            "POST",
            "/api/v1/users/A/score",
            Some(serde_json::json!({"score": 900})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["username"], "A");
        assert_eq!(json["score"], 900);

        app.state.pipeline.shutdown().await;
        assert_eq!(app.store.score_of("A"), Some(900));
        assert_eq!(app.cache.score_of("A"), Some(900));

        let response = send(&app.router, "GET", "/api/v1/users/A/rank", None).await;
        let json = body_json(response).await;
        assert_eq!(json["rank"], 2);
    }

    #[tokio::test]
    async fn test_update_score_out_of_range() {
        let app = setup_test_app();
        for score in [99, 5001] {
            let response = send(
                &app.router,
                "POST",
                "/api/v1/users/A/score",
                Some(serde_json::json!({ "score": score })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_update_score_bad_body() {
        let app = setup_test_app();
        let response = send(
            &app.router,
            "POST",
            "/api/v1/users/A/score",
            Some(serde_json::json!({"rating": "high"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_score_unknown_user() {
        let app = setup_test_app();
        let response = send(
            &app.router,
            "POST",
            "/api/v1/users/ghost/score",
            Some(serde_json::json!({"score": 1000})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_score_queue_full_is_503() {
        let store = MockScoreStore::with_users(USERS);
        store.hold_writes();
        let state = build_app(store.clone(), None, WarmState::new(), PipelineConfig::new(1, 1));
        let router = create_router_with_state(state.clone());

        let body = || Some(serde_json::json!({"score": 1500}));
        let first = send(&router, "POST", "/api/v1/users/A/score", body()).await;
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        for _ in 0..500 {
            if store.waiting_writes() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let second = send(&router, "POST", "/api/v1/users/B/score", body()).await;
        assert_eq!(second.status(), StatusCode::ACCEPTED);

        let third = send(&router, "POST", "/api/v1/users/C/score", body()).await;
        assert_eq!(third.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            third.headers().get(RANKBOARD_STATUS_HEADER).unwrap(),
            "queue_full"
        );

        store.release_writes();
        state.pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_simulate_updates() {
        let app = setup_test_app();
        let response = send(
            &app.router,
            "POST",
            "/api/v1/admin/simulate-updates?count=2",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["requested"], 2);
        assert_eq!(json["queued"], 2);

        app.state.pipeline.shutdown().await;
        assert_eq!(app.store.completed_writes(), 2);
    }

    #[tokio::test]
    async fn test_simulate_updates_count_bounds() {
        let app = setup_test_app();
        for uri in [
            "/api/v1/admin/simulate-updates?count=0",
            "/api/v1/admin/simulate-updates?count=101",
            "/api/v1/admin/simulate-updates?count=x",
        ] {
            let response = send(&app.router, "POST", uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }
}

mod admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_rebuilds_cache() {
        let store = MockScoreStore::with_users(USERS);
        let cache = MockRankCache::new();
        let warm = WarmState::new();
        let state = build_app(
            store,
            Some(cache.clone()),
            warm.clone(),
            PipelineConfig::default(),
        );
        let router = create_router_with_state(state);

        let response = send(&router, "POST", "/api/v1/admin/sync", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 3);
        assert_eq!(cache.len(), 3);
        assert!(warm.is_warm());
    }

    #[tokio::test]
    async fn test_sync_without_cache_is_503() {
        let store = MockScoreStore::with_users(USERS);
        let state = build_app(store, None, WarmState::new(), PipelineConfig::default());
        let router = create_router_with_state(state);

        let response = send(&router, "POST", "/api/v1/admin/sync", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(RANKBOARD_STATUS_HEADER).unwrap(),
            "cache_disabled"
        );
    }

    #[tokio::test]
    async fn test_sync_store_failure_is_500() {
        let app = setup_test_app();
        app.store.set_failing(true);

        let response = send(&app.router, "POST", "/api/v1/admin/sync", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.cache.len(), 3);
    }

    #[tokio::test]
    async fn test_sync_redis_route_alias() {
        let app = setup_test_app();
        app.cache.seed(&[]);

        let response = send(&app.router, "POST", "/api/v1/admin/sync-redis", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["count"], 3);
        assert_eq!(app.cache.len(), 3);
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_all_connected() {
        let app = setup_test_app();
        let response = send(&app.router, "GET", "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "connected");
        assert_eq!(json["cache"], "connected");
    }

    #[tokio::test]
    async fn test_health_cache_down_is_still_healthy() {
        let app = setup_test_app();
        app.cache.set_failing(true);

        let response = send(&app.router, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["cache"], "disconnected");
    }

    #[tokio::test]
    async fn test_health_database_down() {
        let app = setup_test_app();
        app.store.set_failing(true);

        let response = send(&app.router, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["database"], "disconnected");
    }

    #[tokio::test]
    async fn test_health_cache_disabled() {
        let state = build_app(
            MockScoreStore::with_users(USERS),
            None,
            WarmState::new(),
            PipelineConfig::default(),
        );
        let router = create_router_with_state(state);

        let json = body_json(send(&router, "GET", "/health", None).await).await;
        assert_eq!(json["cache"], "disabled");
    }

    #[tokio::test]
    async fn test_ready_waits_for_warm_cache() {
        let store = MockScoreStore::with_users(USERS);
        let cache = MockRankCache::new();
        let warm = WarmState::new();
        let state = build_app(store, Some(cache), warm.clone(), PipelineConfig::default());
        let router = create_router_with_state(state);

        let response = send(&router, "GET", "/ready", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "warming");

        warm.mark_warm();
        let response = send(&router, "GET", "/ready", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_without_cache() {
        let state = build_app(
            MockScoreStore::with_users(USERS),
            None,
            WarmState::new(),
            PipelineConfig::default(),
        );
        let router = create_router_with_state(state);

        let response = send(&router, "GET", "/ready", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn serve_on_ephemeral_port(router: Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        port
    }

    #[tokio::test]
    async fn test_check_health_against_listener() {
        let app = setup_test_app();
        let port = serve_on_ephemeral_port(app.router.clone()).await;

        assert!(crate::gateway::check_health(port).await);

        app.store.set_failing(true);
        assert!(!crate::gateway::check_health(port).await);
    }

    #[tokio::test]
    async fn test_check_health_nothing_listening() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind");
            listener.local_addr().expect("addr").port()
        };

        assert!(!crate::gateway::check_health(port).await);
    }
}

mod error_tests {
    use super::*;
    use crate::leaderboard::QueryError;
    use crate::pipeline::PipelineError;
    use crate::store::StoreError;
    use crate::sync::SyncError;

    #[test]
    fn test_error_status_mapping() {
        let cases: Vec<(GatewayError, StatusCode)> = vec![
            (
                QueryError::Validation("bad".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                QueryError::NotFound {
                    username: "x".into(),
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                QueryError::Store(StoreError::Unavailable).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PipelineError::QueueFull { capacity: 100 }.into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                PipelineError::InvalidScore { score: 1 }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (PipelineError::Closed.into(), StatusCode::SERVICE_UNAVAILABLE),
            (SyncError::CacheDisabled.into(), StatusCode::SERVICE_UNAVAILABLE),
            (
                SyncError::Store(StoreError::Unavailable).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
