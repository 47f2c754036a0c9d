use greencampus_core::error::{GreenCampusError, GreenCampusResult};
use greencampus_core::mission::{catalog, missions_status, start_mission, MissionOutcome, MissionsStatus};
use greencampus_core::state::GreenCampusState;
use greencampus_dependencies::axum::{
    extract::{Path, State},
    Json,
};
use greencampus_models::Mission;
use greencampus_validator::Proof;

use crate::api::{ApiJson, UserSession};

#[derive(serde::Deserialize, Default)]
pub struct AttemptRequest {
    /// Base64 JPEG, with or without a data URL header.
    #[serde(default)]
    pub photo: Option<String>,
    /// Text read from a CleanSpot QR code.
    #[serde(default)]
    pub qr: Option<String>,
}

impl AttemptRequest {
    fn into_proof(self) -> GreenCampusResult<Proof> {
        match (self.qr, self.photo) {
            (Some(_), Some(_)) => Err(GreenCampusError::InvalidInput(
                "send either a photo or a QR code, not both".to_string(),
            )),
            (Some(qr), None) => Ok(Proof::QrCode(qr)),
            (None, Some(photo)) => Ok(Proof::Photo(photo)),
            (None, None) => Ok(Proof::None),
        }
    }
}

pub async fn list(State(state): State<GreenCampusState>) -> GreenCampusResult<Json<Vec<Mission>>> {
    Ok(Json(catalog(state.client()).await?))
}

pub async fn status(
    State(state): State<GreenCampusState>,
    UserSession(session): UserSession,
) -> GreenCampusResult<Json<MissionsStatus>> {
    Ok(Json(missions_status(state.client(), &session).await?))
}

pub async fn attempt(
    State(state): State<GreenCampusState>,
    UserSession(session): UserSession,
    Path(mission_id): Path<String>,
    ApiJson(req): ApiJson<AttemptRequest>,
) -> GreenCampusResult<Json<MissionOutcome>> {
    let outcome = start_mission(&state, &session, &mission_id, req.into_proof()?).await?;
    Ok(Json(outcome))
}
