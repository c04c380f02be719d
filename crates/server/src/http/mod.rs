pub mod auth;

use axum::{Router, middleware::from_fn_with_state};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, routes};

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::records::router(&state))
        .merge(routes::uploads::router())
        .merge(routes::visits::router(&state))
        .merge(routes::admissions::router())
        .merge(routes::tasks::router())
        .merge(routes::reports::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::public_router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use db::DbService;
    use db::models::user::{CreateUser, User};
    use db::models::record::Record;
    use db::types::Role;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use services::services::auth::{self, AuthService};
    use tower::ServiceExt;

    use super::*;

    async fn test_state() -> AppState {
        let db = DbService::connect("sqlite::memory:").await.unwrap();
        AppState::new(db, AuthService::new("test-secret"))
    }

    async fn seed_user(state: &AppState, username: &str, password: &str, role: &str) -> User {
        User::create(
            &state.db.conn,
            &CreateUser {
                name: username.to_uppercase(),
                username: username.to_string(),
                password_hash: auth::hash_password(password).unwrap(),
                role: Role::from(role.to_string()),
            },
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_router(test_state().await);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = create_router(test_state().await);
        let response = app
            .oneshot(Request::get("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_issues_a_working_token() {
        let state = test_state().await;
        seed_user(&state, "boss", "secret", "admin").await;
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"username": "boss", "password": "secret"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["user"]["username"], "boss");

        let response = app
            .oneshot(
                Request::get("/api/users")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let state = test_state().await;
        seed_user(&state, "boss", "secret", "admin").await;
        let app = create_router(state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"username": "boss", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn callers_cannot_reach_admin_routes() {
        let state = test_state().await;
        let caller = seed_user(&state, "caller", "pw", "caller").await;
        let token = state.auth.issue_token(caller.id).unwrap();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::get("/api/admin/visit-stats")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn confirming_a_visit_over_http_logs_the_admission() {
        let state = test_state().await;
        let admin = seed_user(&state, "boss", "pw", "admin").await;
        let caller = seed_user(&state, "caller", "pw", "caller").await;
        let record = Record::create(&state.db.conn, Some(caller.id), "5550001", Some("Ana"))
            .await
            .unwrap();
        let token = state.auth.issue_token(admin.id).unwrap();
        let app = create_router(state.clone());

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/visit/{}", record.id),
                Some(&token),
                json!({"status": "confirmed"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["visit"], "confirmed");

        let certified =
            db::models::certified_admission::CertifiedAdmission::find_all_desc(&state.db.conn)
                .await
                .unwrap();
        assert_eq!(certified.len(), 1);
        assert_eq!(certified[0].caller_name, "CALLER");
    }

    #[tokio::test]
    async fn missing_record_gives_404_from_the_loader() {
        let state = test_state().await;
        let admin = seed_user(&state, "boss", "pw", "admin").await;
        let token = state.auth.issue_token(admin.id).unwrap();
        let app = create_router(state);

        let response = app
            .oneshot(json_request(
                "PATCH",
                "/api/visit/999",
                Some(&token),
                json!({"status": "visited"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
