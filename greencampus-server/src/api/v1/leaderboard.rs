use greencampus_core::error::GreenCampusResult;
use greencampus_core::leaderboard::{campus_leaderboard, leaderboard, CampusEntry, LeaderboardEntry};
use greencampus_core::state::GreenCampusState;
use greencampus_dependencies::axum::{
    extract::{Query, State},
    Json,
};

#[derive(serde::Deserialize)]
pub struct LeaderboardQuery {
    pub campus: Option<String>,
}

pub async fn users(
    State(state): State<GreenCampusState>,
    Query(query): Query<LeaderboardQuery>,
) -> GreenCampusResult<Json<Vec<LeaderboardEntry>>> {
    let campus = query.campus.as_deref().filter(|c| !c.is_empty());
    Ok(Json(leaderboard(state.client(), campus).await?))
}

pub async fn campuses(
    State(state): State<GreenCampusState>,
) -> GreenCampusResult<Json<Vec<CampusEntry>>> {
    Ok(Json(campus_leaderboard(state.client()).await?))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use greencampus_dependencies::axum::http::StatusCode;
    use greencampus_validator::MockValidator;

    use crate::api::test::{app, call};

    #[tokio::test]
    async fn test_leaderboards() {
        let app = app(Arc::new(MockValidator::accepting(None))).await;
        let (status, board) = call(&app, "GET", "/api/v1/leaderboard", None, None).await;
        assert_eq!(StatusCode::OK, status);
        let board = board.as_array().unwrap();
        assert_eq!(12, board.len());
        assert_eq!(1, board[0]["rank"]);
        for pair in board.windows(2) {
            assert!(pair[0]["xp"].as_i64() >= pair[1]["xp"].as_i64());
        }

        let (_, nord) = call(&app, "GET", "/api/v1/leaderboard?campus=Campus%20Nord", None, None).await;
        let nord = nord.as_array().unwrap();
        assert_eq!(3, nord.len());
        assert_eq!("u9", nord[0]["user_id"]);

        let (_, campuses) = call(&app, "GET", "/api/v1/leaderboard/campuses", None, None).await;
        assert_eq!("Lyon Campus", campuses[0]["campus"]);
        assert_eq!(1025, campuses[0]["xp"]);
        assert_eq!(4, campuses.as_array().unwrap().len());
    }
}
