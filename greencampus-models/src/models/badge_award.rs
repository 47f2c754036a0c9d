use chrono::NaiveDateTime;
use sqlx::{query, query_as};

use crate::{DbConn, ModelError};

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct BadgeAward {
    pub user_id: String,
    pub badge_id: String,
    pub awarded_on: NaiveDateTime,
}

impl BadgeAward {
    /// Records the award unless the user already holds the badge.
    /// Returns true if the badge was newly granted.
    pub async fn grant(
        conn: &mut DbConn,
        user_id: &str,
        badge_id: &str,
        awarded_on: NaiveDateTime,
    ) -> Result<bool, ModelError> {
        let res = query(
            "INSERT INTO badge_awards (user_id, badge_id, awarded_on) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, badge_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(awarded_on)
        .execute(conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn for_user(conn: &mut DbConn, user_id: &str) -> Result<Vec<BadgeAward>, ModelError> {
        Ok(query_as::<_, BadgeAward>(
            "SELECT user_id, badge_id, awarded_on FROM badge_awards
             WHERE user_id = ?1 ORDER BY awarded_on ASC, rowid ASC",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?)
    }

    pub async fn get_all(conn: &mut DbConn) -> Result<Vec<BadgeAward>, ModelError> {
        Ok(query_as::<_, BadgeAward>(
            "SELECT user_id, badge_id, awarded_on FROM badge_awards ORDER BY awarded_on ASC, rowid ASC",
        )
        .fetch_all(conn)
        .await?)
    }
}
