use greencampus_core::state::GreenCampusState;
use greencampus_dependencies::axum::{
    routing::{get, post},
    Router,
};

pub mod leaderboard;
pub mod missions;
pub mod users;

pub fn setup_api_v1(r: Router<GreenCampusState>) -> Router<GreenCampusState> {
    r.route("/api/v1/users", post(users::signup))
        .route("/api/v1/session", post(users::login))
        .route("/api/v1/me", get(users::me))
        .route("/api/v1/me/actions", get(users::actions))
        .route("/api/v1/me/progress", get(users::progress))
        .route("/api/v1/me/badges/check", post(users::check_badges))
        .route("/api/v1/badges", get(users::badges))
        .route("/api/v1/missions", get(missions::list))
        .route("/api/v1/missions/status", get(missions::status))
        .route("/api/v1/missions/:id/attempts", post(missions::attempt))
        .route("/api/v1/leaderboard", get(leaderboard::users))
        .route("/api/v1/leaderboard/campuses", get(leaderboard::campuses))
}

#[cfg(test)]
mod test {
    #[test]
    pub fn test_verify_routes_build() {
        let router = greencampus_dependencies::axum::Router::new();

        super::setup_api_v1(router);
    }
}
