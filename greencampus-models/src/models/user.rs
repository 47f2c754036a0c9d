use std::collections::HashMap;

use chrono::NaiveDateTime;
use greencampus_dependencies::chrono::Utc;
use greencampus_dependencies::uuid::Uuid;
use sqlx::{query, query_as};
use tracing::trace;

use crate::{BadgeAward, DbConn, ModelError};

/// XP needed to climb one level.
pub const XP_PER_LEVEL: i64 = 100;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub campus: String,
    pub avatar: String,
    pub level: i64,
    pub xp: i64,
    /// Earned badge ids, oldest award first.
    #[sqlx(skip)]
    pub badges: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Profile fields a student fills in at signup.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub campus: String,
    #[serde(default)]
    pub avatar: String,
}

pub fn level_for_xp(xp: i64) -> i64 {
    xp.max(0) / XP_PER_LEVEL + 1
}

impl User {
    pub fn displayname(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub async fn new(conn: &mut DbConn, new_user: NewUser) -> Result<User, ModelError> {
        let now = Utc::now().naive_utc();
        let user = User {
            id: Uuid::new_v4().to_string(),
            firstname: new_user.firstname,
            lastname: new_user.lastname,
            campus: new_user.campus,
            avatar: new_user.avatar,
            level: 1,
            xp: 0,
            badges: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        trace!("creating user {} on campus {}", user.id, user.campus);
        query(
            "INSERT INTO users (id, firstname, lastname, campus, avatar, level, xp, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&user.id)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.campus)
        .bind(&user.avatar)
        .bind(user.level)
        .bind(user.xp)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(conn)
        .await?;
        Ok(user)
    }

    /// Inserts the user or overwrites the profile and progression of an existing one.
    /// Badges listed on the user are granted, existing awards are kept.
    pub async fn upsert(&self, conn: &mut DbConn) -> Result<(), ModelError> {
        query(
            "INSERT INTO users (id, firstname, lastname, campus, avatar, level, xp, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
                firstname = excluded.firstname,
                lastname = excluded.lastname,
                campus = excluded.campus,
                avatar = excluded.avatar,
                level = excluded.level,
                xp = excluded.xp,
                updated_at = excluded.updated_at",
        )
        .bind(&self.id)
        .bind(&self.firstname)
        .bind(&self.lastname)
        .bind(&self.campus)
        .bind(&self.avatar)
        .bind(level_for_xp(self.xp))
        .bind(self.xp)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        for badge in &self.badges {
            BadgeAward::grant(&mut *conn, &self.id, badge, self.updated_at).await?;
        }
        Ok(())
    }

    pub async fn get_id(conn: &mut DbConn, id: &str) -> Result<Option<User>, ModelError> {
        trace!("loading user {}", id);
        let user = query_as::<_, User>(
            "SELECT id, firstname, lastname, campus, avatar, level, xp, created_at, updated_at
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        match user {
            Some(mut user) => {
                user.badges = BadgeAward::for_user(&mut *conn, id)
                    .await?
                    .into_iter()
                    .map(|award| award.badge_id)
                    .collect();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// All users in signup order, optionally restricted to one campus.
    pub async fn get_all(
        conn: &mut DbConn,
        campus: Option<&str>,
    ) -> Result<Vec<User>, ModelError> {
        trace!("loading all users, campus filter {:?}", campus);
        let mut users = query_as::<_, User>(
            "SELECT id, firstname, lastname, campus, avatar, level, xp, created_at, updated_at
             FROM users WHERE ?1 IS NULL OR campus = ?1 ORDER BY rowid ASC",
        )
        .bind(campus)
        .fetch_all(&mut *conn)
        .await?;
        let mut awards: HashMap<String, Vec<String>> = HashMap::new();
        for award in BadgeAward::get_all(&mut *conn).await? {
            awards.entry(award.user_id).or_default().push(award.badge_id);
        }
        for user in users.iter_mut() {
            user.badges = awards.remove(&user.id).unwrap_or_default();
        }
        Ok(users)
    }

    /// Adds `points` to the user's XP and recomputes the level in the same statement,
    /// so no reader can see one without the other. Returns the new `(xp, level)` or
    /// `None` if the user does not exist.
    pub async fn add_xp(
        conn: &mut DbConn,
        id: &str,
        points: i64,
    ) -> Result<Option<(i64, i64)>, ModelError> {
        let points = points.max(0);
        trace!("adding {} xp to user {}", points, id);
        let row: Option<(i64, i64)> = query_as(
            "UPDATE users
             SET xp = xp + ?2,
                 level = (xp + ?2) / ?3 + 1,
                 updated_at = ?4
             WHERE id = ?1
             RETURNING xp, level",
        )
        .bind(id)
        .bind(points)
        .bind(XP_PER_LEVEL)
        .bind(Utc::now().naive_utc())
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Client;

    #[test]
    pub fn test_level_formula() {
        assert_eq!(1, level_for_xp(0));
        assert_eq!(1, level_for_xp(99));
        assert_eq!(2, level_for_xp(100));
        assert_eq!(3, level_for_xp(250));
    }

    #[tokio::test]
    async fn test_signup_defaults() -> Result<(), ModelError> {
        let client = Client::in_memory().await?;
        let mut conn = client.db().await?;
        let user = User::new(
            &mut conn,
            NewUser {
                firstname: "Alice".to_string(),
                lastname: "Green".to_string(),
                campus: "Eugenia Paris".to_string(),
                avatar: String::new(),
            },
        )
        .await?;
        let stored = User::get_id(&mut conn, &user.id).await?.expect("user was created");
        assert_eq!(0, stored.xp);
        assert_eq!(1, stored.level);
        assert!(stored.badges.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_xp_keeps_level_in_step() -> Result<(), ModelError> {
        let client = Client::in_memory().await?;
        let mut conn = client.db().await?;
        let user = User::new(
            &mut conn,
            NewUser {
                firstname: "Lucas".to_string(),
                lastname: "Recyc".to_string(),
                campus: "Campus Nord".to_string(),
                avatar: String::new(),
            },
        )
        .await?;

        assert_eq!(Some((90, 1)), User::add_xp(&mut conn, &user.id, 90).await?);
        assert_eq!(Some((120, 2)), User::add_xp(&mut conn, &user.id, 30).await?);
        assert_eq!(Some((120, 2)), User::add_xp(&mut conn, &user.id, -40).await?);
        assert_eq!(None, User::add_xp(&mut conn, "nobody", 10).await?);
        Ok(())
    }
}
