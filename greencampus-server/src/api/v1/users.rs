use greencampus_core::badges::{check_badge_eligibility, Badge, BADGES};
use greencampus_core::error::GreenCampusResult;
use greencampus_core::progression::LevelProgress;
use greencampus_core::session::{login as login_user, signup as signup_user};
use greencampus_core::state::GreenCampusState;
use greencampus_dependencies::axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use greencampus_models::{Action, NewUser, User};

use crate::api::{ApiJson, UserSession};

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
}

#[derive(serde::Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub user: User,
}

#[derive(serde::Deserialize)]
pub struct ActionsQuery {
    pub limit: Option<u32>,
}

#[derive(serde::Serialize)]
pub struct BadgeCheckResponse {
    pub new_badges: Vec<String>,
}

pub async fn signup(
    State(state): State<GreenCampusState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> GreenCampusResult<(StatusCode, Json<User>)> {
    let user = signup_user(state.client(), new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<GreenCampusState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> GreenCampusResult<Json<LoginResponse>> {
    let session = login_user(state.client(), &req.user_id).await?;
    let user = session.user(state.client()).await?;
    Ok(Json(LoginResponse {
        user_id: session.user_id().to_string(),
        user,
    }))
}

pub async fn me(
    State(state): State<GreenCampusState>,
    UserSession(session): UserSession,
) -> GreenCampusResult<Json<User>> {
    Ok(Json(session.user(state.client()).await?))
}

pub async fn actions(
    State(state): State<GreenCampusState>,
    UserSession(session): UserSession,
    Query(query): Query<ActionsQuery>,
) -> GreenCampusResult<Json<Vec<Action>>> {
    let limit = query.limit.unwrap_or(20);
    Ok(Json(session.recent_actions(state.client(), Some(limit)).await?))
}

pub async fn progress(
    State(state): State<GreenCampusState>,
    UserSession(session): UserSession,
) -> GreenCampusResult<Json<LevelProgress>> {
    let user = session.user(state.client()).await?;
    Ok(Json(LevelProgress::from_xp(user.xp)))
}

pub async fn check_badges(
    State(state): State<GreenCampusState>,
    UserSession(session): UserSession,
) -> GreenCampusResult<Json<BadgeCheckResponse>> {
    let new_badges = check_badge_eligibility(state.client(), session.user_id()).await?;
    Ok(Json(BadgeCheckResponse { new_badges }))
}

pub async fn badges() -> Json<&'static [Badge]> {
    Json(BADGES)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use greencampus_dependencies::axum::http::StatusCode;
    use greencampus_validator::MockValidator;
    use serde_json::json;

    use crate::api::test::{app, call};

    #[tokio::test]
    async fn test_signup_login_and_profile() {
        let app = app(Arc::new(MockValidator::accepting(None))).await;
        let (status, user) = call(
            &app,
            "POST",
            "/api/v1/users",
            None,
            Some(json!({"firstname": "Nina", "lastname": "BottleFree", "campus": "Campus Ouest"})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!(0, user["xp"]);
        assert_eq!(1, user["level"]);
        let id = user["id"].as_str().unwrap().to_string();

        let (status, login) = call(&app, "POST", "/api/v1/session", None, Some(json!({"user_id": id}))).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(id, login["user_id"]);

        let (status, me) = call(&app, "GET", "/api/v1/me", Some(&id), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Nina", me["firstname"]);

        let (status, progress) = call(&app, "GET", "/api/v1/me/progress", Some(&id), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(2, progress["next_level"]);

        let (status, actions) = call(&app, "GET", "/api/v1/me/actions?limit=5", Some(&id), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!([]), actions);
    }

    #[tokio::test]
    async fn test_session_errors() {
        let app = app(Arc::new(MockValidator::accepting(None))).await;
        let (status, _) = call(&app, "GET", "/api/v1/me", None, None).await;
        assert_eq!(StatusCode::UNAUTHORIZED, status);

        let (status, body) = call(&app, "GET", "/api/v1/me", Some("nobody"), None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert!(body["error"].as_str().unwrap().contains("nobody"));

        let (status, _) = call(&app, "POST", "/api/v1/session", None, Some(json!({"user_id": "nobody"}))).await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        let (status, body) = call(&app, "POST", "/api/v1/session", None, Some(json!({"id": "u1"}))).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert!(body["error"].is_string());

        let (status, body) = call(&app, "POST", "/api/v1/users", None, None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_badge_check_on_demo_user() {
        let app = app(Arc::new(MockValidator::accepting(None))).await;
        let (status, body) = call(&app, "POST", "/api/v1/me/badges/check", Some("u1"), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!({"new_badges": ["eco_hero"]}), body);

        let (_, body) = call(&app, "POST", "/api/v1/me/badges/check", Some("u1"), None).await;
        assert_eq!(json!({"new_badges": []}), body);

        let (_, badges) = call(&app, "GET", "/api/v1/badges", None, None).await;
        assert_eq!(6, badges.as_array().unwrap().len());
    }
}
