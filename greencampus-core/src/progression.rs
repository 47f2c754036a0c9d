use greencampus_models::{level_for_xp, DbConn, User, XP_PER_LEVEL};

use crate::error::{GreenCampusError, GreenCampusResult};

/// Result of crediting XP to a user.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub user_id: String,
    pub points: i64,
    pub xp: i64,
    pub level: i64,
    pub previous_level: i64,
    pub leveled_up: bool,
}

/// Credits `points` to the user. Zero or negative points change nothing.
///
/// XP and level are written by one statement, so callers inside a transaction get
/// the update together with their other writes.
#[instrument(skip(conn))]
pub async fn apply_reward(
    conn: &mut DbConn,
    user_id: &str,
    points: i64,
) -> GreenCampusResult<Progress> {
    if points <= 0 {
        let user = User::get_id(&mut *conn, user_id)
            .await?
            .ok_or_else(|| GreenCampusError::UserNotFound(user_id.to_string()))?;
        return Ok(Progress {
            user_id: user.id,
            points: 0,
            xp: user.xp,
            level: user.level,
            previous_level: user.level,
            leveled_up: false,
        });
    }
    let (xp, level) = User::add_xp(&mut *conn, user_id, points)
        .await?
        .ok_or_else(|| GreenCampusError::UserNotFound(user_id.to_string()))?;
    let previous_level = level_for_xp(xp - points);
    if level > previous_level {
        info!("user {} reached level {}", user_id, level);
    }
    Ok(Progress {
        user_id: user_id.to_string(),
        points,
        xp,
        level,
        previous_level,
        leveled_up: level > previous_level,
    })
}

/// Where a user stands inside the current level.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: i64,
    pub xp: i64,
    pub xp_into_level: i64,
    pub xp_for_level: i64,
    pub next_level: i64,
    /// 0 to 100.
    pub percent: i64,
}

impl LevelProgress {
    pub fn from_xp(xp: i64) -> Self {
        let xp = xp.max(0);
        let level = level_for_xp(xp);
        let xp_into_level = xp % XP_PER_LEVEL;
        Self {
            level,
            xp,
            xp_into_level,
            xp_for_level: XP_PER_LEVEL,
            next_level: level + 1,
            percent: xp_into_level * 100 / XP_PER_LEVEL,
        }
    }
}
