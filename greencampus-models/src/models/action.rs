use chrono::NaiveDateTime;
use sqlx::{query_as, query_scalar};

use crate::{DbConn, ModelError};

/// Ledger entry written when an attempt is validated. Never updated or deleted.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Action {
    pub id: i64,
    pub user_id: String,
    pub action_type: String,
    pub points: i64,
    pub timestamp: NaiveDateTime,
}

impl Action {
    pub async fn new(
        conn: &mut DbConn,
        user_id: &str,
        action_type: &str,
        points: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Action, ModelError> {
        let points = points.max(0);
        let id: i64 = query_scalar(
            "INSERT INTO actions (user_id, action_type, points, timestamp) VALUES (?1, ?2, ?3, ?4)
             RETURNING id",
        )
        .bind(user_id)
        .bind(action_type)
        .bind(points)
        .bind(timestamp)
        .fetch_one(conn)
        .await?;
        Ok(Action {
            id,
            user_id: user_id.to_string(),
            action_type: action_type.to_string(),
            points,
            timestamp,
        })
    }

    /// The user's ledger, newest first. `limit` of `None` returns everything.
    pub async fn for_user(
        conn: &mut DbConn,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Action>, ModelError> {
        let limit: i64 = limit.map(i64::from).unwrap_or(-1);
        Ok(query_as::<_, Action>(
            "SELECT id, user_id, action_type, points, timestamp FROM actions
             WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(conn)
        .await?)
    }
}
