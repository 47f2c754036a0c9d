//! Badge catalog and eligibility evaluation over the action ledger.

use std::collections::{BTreeMap, HashSet};

use greencampus_dependencies::chrono::Utc;
use greencampus_models::{Action, BadgeAward, Client, User};

use crate::error::{GreenCampusError, GreenCampusResult};
use crate::leaderboard::rank_users;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    /// At least `min` validated actions of any type.
    Actions { min: usize },
    /// At least `min` validated actions of one type.
    ActionsOfType { action_type: &'static str, min: usize },
    /// Actions of one type on at least `days` distinct calendar days.
    DistinctDays { action_type: &'static str, days: usize },
    MinLevel(i64),
    /// First place on the user's own campus. Needs at least one action.
    CampusChampion,
}

#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub rule: BadgeRule,
}

pub const BADGES: &[Badge] = &[
    Badge {
        id: "ecostarter",
        name: "Eco Starter",
        description: "Complete your first mission.",
        rule: BadgeRule::Actions { min: 1 },
    },
    Badge {
        id: "tri_master",
        name: "Sorting Master",
        description: "Sort waste correctly 10 times.",
        rule: BadgeRule::ActionsOfType { action_type: "trash", min: 10 },
    },
    Badge {
        id: "cleanmaster",
        name: "Clean Master",
        description: "Scan 5 CleanSpots.",
        rule: BadgeRule::ActionsOfType { action_type: "qr", min: 5 },
    },
    Badge {
        id: "eco_hero",
        name: "Eco Hero",
        description: "Reach level 3.",
        rule: BadgeRule::MinLevel(3),
    },
    Badge {
        id: "no_plastic",
        name: "No Plastic",
        description: "Take part in the No Plastic Week on 7 different days.",
        rule: BadgeRule::DistinctDays { action_type: "weekly_event", days: 7 },
    },
    Badge {
        id: "campus_legend",
        name: "Campus Legend",
        description: "Be number one on your campus.",
        rule: BadgeRule::CampusChampion,
    },
];

pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

/// What a badge rule may look at.
pub struct BadgeContext<'a> {
    pub actions: &'a [Action],
    pub level: i64,
    /// 1-based rank within the user's campus.
    pub campus_rank: Option<usize>,
}

impl BadgeRule {
    pub fn is_satisfied(&self, ctx: &BadgeContext<'_>) -> bool {
        match *self {
            BadgeRule::Actions { min } => ctx.actions.len() >= min,
            BadgeRule::ActionsOfType { action_type, min } => {
                ctx.actions.iter().filter(|a| a.action_type == action_type).count() >= min
            }
            BadgeRule::DistinctDays { action_type, days } => {
                ctx.actions
                    .iter()
                    .filter(|a| a.action_type == action_type)
                    .map(|a| a.timestamp.date())
                    .collect::<HashSet<_>>()
                    .len()
                    >= days
            }
            BadgeRule::MinLevel(level) => ctx.level >= level,
            BadgeRule::CampusChampion => !ctx.actions.is_empty() && ctx.campus_rank == Some(1),
        }
    }
}

/// Grants every badge the user newly qualifies for and returns their ids.
/// Badges already held are skipped, so repeating the call without new actions grants nothing.
#[instrument(skip(client))]
pub async fn check_badge_eligibility(client: &Client, user_id: &str) -> GreenCampusResult<Vec<String>> {
    let mut tx = client.begin().await?;
    let user = User::get_id(&mut tx, user_id)
        .await?
        .ok_or_else(|| GreenCampusError::UserNotFound(user_id.to_string()))?;
    let actions = Action::for_user(&mut tx, user_id, None).await?;
    let campus = User::get_all(&mut tx, Some(user.campus.as_str())).await?;
    let campus_rank = rank_users(&campus)
        .into_iter()
        .find(|e| e.user_id == user.id)
        .map(|e| e.rank);
    let ctx = BadgeContext {
        actions: &actions,
        level: user.level,
        campus_rank,
    };

    let now = Utc::now().naive_utc();
    let mut granted = Vec::new();
    for badge in BADGES {
        if user.badges.iter().any(|held| held == badge.id) || !badge.rule.is_satisfied(&ctx) {
            continue;
        }
        if BadgeAward::grant(&mut tx, user_id, badge.id, now).await? {
            info!("user {} earned badge {}", user_id, badge.id);
            granted.push(badge.id.to_string());
        }
    }
    tx.commit().await?;
    Ok(granted)
}

/// Re-evaluates the badges of every user. Returns newly granted badge ids per user.
#[instrument(skip(client))]
pub async fn refresh_all(client: &Client) -> GreenCampusResult<BTreeMap<String, Vec<String>>> {
    let users = {
        let mut conn = client.db().await?;
        User::get_all(&mut conn, None).await?
    };
    let mut granted = BTreeMap::new();
    for user in users {
        let new_badges = check_badge_eligibility(client, &user.id).await?;
        if !new_badges.is_empty() {
            granted.insert(user.id, new_badges);
        }
    }
    Ok(granted)
}
