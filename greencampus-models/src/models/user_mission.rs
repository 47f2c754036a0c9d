use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{query, query_as, Row};
use tracing::trace;

use crate::{DbConn, ModelError};

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Pending,
    Validated,
    Rejected,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Validated => "validated",
            AttemptStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => Self::Pending,
            "validated" => Self::Validated,
            "rejected" => Self::Rejected,
            v => return Err(ModelError::InvalidStatus(v.to_string())),
        })
    }
}

/// One try of a user at a mission. Created pending, resolved at most once.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct UserMission {
    pub id: i64,
    pub user_id: String,
    pub mission_id: String,
    pub status: AttemptStatus,
    /// Reference to the submitted proof: a photo digest, a QR token or a placeholder.
    pub proof: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for UserMission {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            mission_id: row.try_get("mission_id")?,
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?,
            proof: row.try_get("proof")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl UserMission {
    pub async fn new_pending(
        conn: &mut DbConn,
        user_id: &str,
        mission_id: &str,
        proof: Option<String>,
        timestamp: NaiveDateTime,
    ) -> Result<UserMission, ModelError> {
        trace!("opening attempt of user {} at mission {}", user_id, mission_id);
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO user_missions (user_id, mission_id, status, proof, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
        )
        .bind(user_id)
        .bind(mission_id)
        .bind(AttemptStatus::Pending.as_str())
        .bind(&proof)
        .bind(timestamp)
        .fetch_one(conn)
        .await?;
        Ok(UserMission {
            id,
            user_id: user_id.to_string(),
            mission_id: mission_id.to_string(),
            status: AttemptStatus::Pending,
            proof,
            timestamp,
        })
    }

    /// Moves a pending attempt to its final status. Returns false if the attempt
    /// does not exist or was already resolved, in which case nothing changes.
    pub async fn resolve(
        conn: &mut DbConn,
        id: i64,
        status: AttemptStatus,
    ) -> Result<bool, ModelError> {
        if status == AttemptStatus::Pending {
            return Ok(false);
        }
        trace!("resolving attempt {} as {}", id, status);
        let res = query("UPDATE user_missions SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(status.as_str())
            .bind(AttemptStatus::Pending.as_str())
            .execute(conn)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn get_id(conn: &mut DbConn, id: i64) -> Result<Option<UserMission>, ModelError> {
        Ok(query_as::<_, UserMission>(
            "SELECT id, user_id, mission_id, status, proof, timestamp FROM user_missions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?)
    }

    /// Attempts of the user at or after `from`, oldest first.
    pub async fn since(
        conn: &mut DbConn,
        user_id: &str,
        from: NaiveDateTime,
    ) -> Result<Vec<UserMission>, ModelError> {
        Ok(query_as::<_, UserMission>(
            "SELECT id, user_id, mission_id, status, proof, timestamp FROM user_missions
             WHERE user_id = ?1 AND timestamp >= ?2 ORDER BY timestamp ASC, id ASC",
        )
        .bind(user_id)
        .bind(from)
        .fetch_all(conn)
        .await?)
    }

    pub async fn last_with_status(
        conn: &mut DbConn,
        user_id: &str,
        mission_id: &str,
        status: AttemptStatus,
    ) -> Result<Option<UserMission>, ModelError> {
        Ok(query_as::<_, UserMission>(
            "SELECT id, user_id, mission_id, status, proof, timestamp FROM user_missions
             WHERE user_id = ?1 AND mission_id = ?2 AND status = ?3
             ORDER BY timestamp DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(mission_id)
        .bind(status.as_str())
        .fetch_optional(conn)
        .await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Client, NewUser, User};
    use chrono::Utc;

    async fn new_student(conn: &mut DbConn) -> Result<User, ModelError> {
        User::new(
            conn,
            NewUser {
                firstname: "Nina".to_string(),
                lastname: "BottleFree".to_string(),
                campus: "Campus Ouest".to_string(),
                avatar: String::new(),
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_attempt_resolves_exactly_once() -> Result<(), ModelError> {
        let client = Client::in_memory().await?;
        let mut conn = client.db().await?;
        let user = new_student(&mut conn).await?;
        let attempt = UserMission::new_pending(
            &mut conn,
            &user.id,
            "m1",
            Some("photo:abc".to_string()),
            Utc::now().naive_utc(),
        )
        .await?;

        assert!(UserMission::resolve(&mut conn, attempt.id, AttemptStatus::Rejected).await?);
        assert!(!UserMission::resolve(&mut conn, attempt.id, AttemptStatus::Validated).await?);

        let stored = UserMission::get_id(&mut conn, attempt.id).await?.expect("attempt exists");
        assert_eq!(AttemptStatus::Rejected, stored.status);
        assert_eq!(Some("photo:abc".to_string()), stored.proof);
        Ok(())
    }

    #[test]
    pub fn test_status_names() {
        for status in [
            AttemptStatus::Pending,
            AttemptStatus::Validated,
            AttemptStatus::Rejected,
        ] {
            assert_eq!(status, status.as_str().parse::<AttemptStatus>().unwrap());
        }
        assert!("done".parse::<AttemptStatus>().is_err());
    }
}
