use sqlx::query;
use sqlx::query_as;
use tracing::trace;

use crate::{DbConn, ModelError};

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Action type recorded in the ledger when the mission is validated.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub points: i64,
    pub requires_photo: bool,
    /// Minimum hours between two validated attempts, 0 means unlimited.
    pub cooldown_hours: i64,
    pub streak_enabled: Option<bool>,
}

impl Mission {
    pub async fn get_id(conn: &mut DbConn, id: &str) -> Result<Option<Mission>, ModelError> {
        trace!("loading mission {}", id);
        Ok(query_as::<_, Mission>(
            "SELECT id, title, description, category, type, points, requires_photo,
                cooldown_hours, streak_enabled
             FROM missions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?)
    }

    pub async fn get_all(conn: &mut DbConn) -> Result<Vec<Mission>, ModelError> {
        trace!("loading mission catalog");
        Ok(query_as::<_, Mission>(
            "SELECT id, title, description, category, type, points, requires_photo,
                cooldown_hours, streak_enabled
             FROM missions ORDER BY position ASC, id ASC",
        )
        .fetch_all(conn)
        .await?)
    }

    pub(crate) async fn clear(conn: &mut DbConn) -> Result<u64, ModelError> {
        Ok(query("DELETE FROM missions")
            .execute(conn)
            .await?
            .rows_affected())
    }

    pub(crate) async fn insert(&self, conn: &mut DbConn, position: i64) -> Result<(), ModelError> {
        query(
            "INSERT INTO missions
                (id, title, description, category, type, points, requires_photo,
                 cooldown_hours, streak_enabled, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.category)
        .bind(&self.kind)
        .bind(self.points)
        .bind(self.requires_photo)
        .bind(self.cooldown_hours)
        .bind(self.streak_enabled)
        .bind(position)
        .execute(conn)
        .await?;
        Ok(())
    }
}
