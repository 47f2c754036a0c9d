//! Mission attempts: open, validate, apply the verdict.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use greencampus_models::{Action, AttemptStatus, Client, Mission, User, UserMission};
use greencampus_validator::{validate_proof, MissionIntent, Proof, Verdict};

use crate::badges::check_badge_eligibility;
use crate::error::{GreenCampusError, GreenCampusResult};
use crate::progression::apply_reward;
use crate::session::Session;
use crate::state::GreenCampusState;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MissionOutcome {
    Validated {
        attempt_id: i64,
        mission_id: String,
        points: i64,
        xp: i64,
        level: i64,
        leveled_up: bool,
        new_badges: Vec<String>,
        label: String,
        message: String,
    },
    Rejected {
        attempt_id: i64,
        mission_id: String,
        label: String,
        message: String,
    },
    /// The validator could not decide. The attempt stays pending and may be retried.
    Unresolved {
        attempt_id: i64,
        mission_id: String,
        reason: String,
    },
}

impl MissionOutcome {
    pub fn attempt_id(&self) -> i64 {
        match self {
            MissionOutcome::Validated { attempt_id, .. }
            | MissionOutcome::Rejected { attempt_id, .. }
            | MissionOutcome::Unresolved { attempt_id, .. } => *attempt_id,
        }
    }
}

fn intent(mission: &Mission) -> MissionIntent {
    MissionIntent {
        mission_id: mission.id.clone(),
        title: mission.title.clone(),
        description: mission.description.clone(),
        category: mission.category.clone(),
        kind: mission.kind.clone(),
        points: u32::try_from(mission.points.max(0)).unwrap_or(u32::MAX),
        requires_photo: mission.requires_photo,
    }
}

pub async fn catalog(client: &Client) -> GreenCampusResult<Vec<Mission>> {
    let mut conn = client.db().await?;
    Ok(Mission::get_all(&mut conn).await?)
}

/// Submits `proof` for a mission on behalf of the session's user.
///
/// The attempt is recorded before the validator is asked and no connection is held
/// while waiting for it. Validator failures and timeouts leave the attempt pending.
#[instrument(skip(state, session, proof), fields(user = %session.user_id()))]
pub async fn start_mission(
    state: &GreenCampusState,
    session: &Session,
    mission_id: &str,
    proof: Proof,
) -> GreenCampusResult<MissionOutcome> {
    let client = state.client();
    let mission = client
        .mission(mission_id)
        .await?
        .ok_or_else(|| GreenCampusError::MissionNotFound(mission_id.to_string()))?;
    let user_id = session.user_id();

    let attempt = {
        let mut conn = client.db().await?;
        if User::get_id(&mut conn, user_id).await?.is_none() {
            warn!("attempt by unknown user {}", user_id);
            return Err(GreenCampusError::UserNotFound(user_id.to_string()));
        }
        let now = Utc::now();
        if state.config().enforce_cooldown && mission.cooldown_hours > 0 {
            let last = UserMission::last_with_status(
                &mut conn,
                user_id,
                &mission.id,
                AttemptStatus::Validated,
            )
            .await?;
            if let Some(last) = last {
                let retry_at = Utc.from_utc_datetime(&last.timestamp)
                    + Duration::hours(mission.cooldown_hours);
                if retry_at > now {
                    debug!("mission {} cooling down until {}", mission.id, retry_at);
                    return Err(GreenCampusError::CooldownActive {
                        mission_id: mission.id.clone(),
                        retry_at,
                    });
                }
            }
        }
        UserMission::new_pending(
            &mut conn,
            user_id,
            &mission.id,
            Some(proof.reference()),
            now.naive_utc(),
        )
        .await?
    };

    let validation = tokio::time::timeout(
        state.config().validator_timeout(),
        validate_proof(state.validator.as_ref(), &intent(&mission), &proof),
    )
    .await;
    let verdict = match validation {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => {
            warn!("attempt {} left pending: {}", attempt.id, e);
            return Ok(MissionOutcome::Unresolved {
                attempt_id: attempt.id,
                mission_id: mission.id,
                reason: e.to_string(),
            });
        }
        Err(_) => {
            warn!(
                "attempt {} left pending: validator timed out after {:?}",
                attempt.id,
                state.config().validator_timeout()
            );
            return Ok(MissionOutcome::Unresolved {
                attempt_id: attempt.id,
                mission_id: mission.id,
                reason: "Proof validator timed out".to_string(),
            });
        }
    };

    if verdict.accepted {
        accept(client, user_id, &mission, attempt.id, verdict).await
    } else {
        let mut conn = client.db().await?;
        if !UserMission::resolve(&mut conn, attempt.id, AttemptStatus::Rejected).await? {
            warn!("attempt {} was resolved concurrently", attempt.id);
        }
        info!("attempt {} at {} rejected: {}", attempt.id, mission.id, verdict.message);
        Ok(MissionOutcome::Rejected {
            attempt_id: attempt.id,
            mission_id: mission.id,
            label: verdict.label,
            message: verdict.message,
        })
    }
}

async fn accept(
    client: &Client,
    user_id: &str,
    mission: &Mission,
    attempt_id: i64,
    verdict: Verdict,
) -> GreenCampusResult<MissionOutcome> {
    let points = verdict.points.map(i64::from).unwrap_or(mission.points);
    let progress = {
        let mut tx = client.begin().await?;
        if !UserMission::resolve(&mut tx, attempt_id, AttemptStatus::Validated).await? {
            tx.rollback().await?;
            warn!("attempt {} was resolved concurrently", attempt_id);
            return Ok(MissionOutcome::Unresolved {
                attempt_id,
                mission_id: mission.id.clone(),
                reason: "Attempt was already resolved".to_string(),
            });
        }
        Action::new(&mut tx, user_id, &mission.kind, points, Utc::now().naive_utc()).await?;
        let progress = apply_reward(&mut tx, user_id, points).await?;
        tx.commit().await?;
        progress
    };
    info!("attempt {} at {} validated for {} XP", attempt_id, mission.id, points);
    // the reward is committed; badges can be caught up by refresh-badges
    let new_badges = match check_badge_eligibility(client, user_id).await {
        Ok(new_badges) => new_badges,
        Err(e) => {
            warn!("badge evaluation for {} failed after attempt {}: {}", user_id, attempt_id, e);
            Vec::new()
        }
    };
    Ok(MissionOutcome::Validated {
        attempt_id,
        mission_id: mission.id.clone(),
        points,
        xp: progress.xp,
        level: progress.level,
        leveled_up: progress.leveled_up,
        new_badges,
        label: verdict.label,
        message: verdict.message,
    })
}

/// Today's attempts of a user.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct MissionsStatus {
    pub completed_count: usize,
    pub pending_count: usize,
    /// Latest status of every mission attempted today.
    pub mission_states: BTreeMap<String, AttemptStatus>,
}

pub async fn missions_status(client: &Client, session: &Session) -> GreenCampusResult<MissionsStatus> {
    missions_status_at(client, session, Local::now()).await
}

/// Status over attempts stamped on the local calendar day of `now`.
pub async fn missions_status_at<Tz: TimeZone>(
    client: &Client,
    session: &Session,
    now: DateTime<Tz>,
) -> GreenCampusResult<MissionsStatus> {
    let (start, end) = day_bounds(&now);
    let mut conn = client.db().await?;
    let attempts = UserMission::since(&mut conn, session.user_id(), start).await?;
    let mut status = MissionsStatus::default();
    for attempt in attempts.into_iter().filter(|a| a.timestamp < end) {
        match attempt.status {
            AttemptStatus::Validated => status.completed_count += 1,
            AttemptStatus::Pending => status.pending_count += 1,
            AttemptStatus::Rejected => {}
        }
        status.mission_states.insert(attempt.mission_id, attempt.status);
    }
    Ok(status)
}

/// UTC bounds of the calendar day `now` falls on, in `now`'s time zone.
fn day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (NaiveDateTime, NaiveDateTime) {
    let local = now.naive_local();
    let midnight = local.date().and_hms_opt(0, 0, 0).unwrap_or(local);
    let start = match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start.naive_utc(),
        // midnight skipped by a DST change
        None => now.naive_utc() - (local - midnight),
    };
    (start, start + Duration::days(1))
}
