//! Rankings computed on every read from the user table.

use std::collections::HashMap;

use greencampus_models::{Client, User};
use itertools::Itertools;

use crate::error::GreenCampusResult;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub displayname: String,
    pub campus: String,
    pub avatar: String,
    pub xp: i64,
    pub level: i64,
    pub badges: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CampusEntry {
    pub rank: usize,
    pub campus: String,
    pub xp: i64,
    pub members: usize,
}

/// Orders users by XP, highest first. Equal XP keeps the input order.
pub fn rank_users(users: &[User]) -> Vec<LeaderboardEntry> {
    users
        .iter()
        .sorted_by(|a, b| b.xp.cmp(&a.xp))
        .enumerate()
        .map(|(i, user)| LeaderboardEntry {
            rank: i + 1,
            user_id: user.id.clone(),
            displayname: user.displayname(),
            campus: user.campus.clone(),
            avatar: user.avatar.clone(),
            xp: user.xp,
            level: user.level,
            badges: user.badges.clone(),
        })
        .collect()
}

/// Sums XP per campus, highest first. Equal totals keep the order in which the
/// campuses first appear in `users`.
pub fn rank_campuses(users: &[User]) -> Vec<CampusEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<CampusEntry> = Vec::new();
    for user in users {
        let slot = *index.entry(user.campus.as_str()).or_insert_with(|| {
            totals.push(CampusEntry {
                rank: 0,
                campus: user.campus.clone(),
                xp: 0,
                members: 0,
            });
            totals.len() - 1
        });
        totals[slot].xp += user.xp;
        totals[slot].members += 1;
    }
    totals
        .into_iter()
        .sorted_by(|a, b| b.xp.cmp(&a.xp))
        .enumerate()
        .map(|(i, entry)| CampusEntry { rank: i + 1, ..entry })
        .collect()
}

#[instrument(skip(client))]
pub async fn leaderboard(
    client: &Client,
    campus: Option<&str>,
) -> GreenCampusResult<Vec<LeaderboardEntry>> {
    let mut conn = client.db().await?;
    let users = User::get_all(&mut conn, campus).await?;
    Ok(rank_users(&users))
}

#[instrument(skip(client))]
pub async fn campus_leaderboard(client: &Client) -> GreenCampusResult<Vec<CampusEntry>> {
    let mut conn = client.db().await?;
    let users = User::get_all(&mut conn, None).await?;
    Ok(rank_campuses(&users))
}
