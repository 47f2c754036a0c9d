use greencampus_core::error::GreenCampusError;
use greencampus_core::session::Session;
use greencampus_core::state::GreenCampusState;
use greencampus_dependencies::axum::{
    async_trait,
    body::Body,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts},
    http::{request::Parts, Request},
    Json, Router,
};
use serde::de::DeserializeOwned;

pub mod v1;

/// Header carrying the id of the acting user.
pub const SESSION_HEADER: &str = "x-greencampus-user";

/// Photos arrive base64 encoded inside JSON bodies.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

pub fn router(state: GreenCampusState) -> Router {
    let router = Router::new();
    let router = v1::setup_api_v1(router);
    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Stub session taken from [`SESSION_HEADER`]. Whether the user exists is checked by
/// the operation that uses it.
pub struct UserSession(pub Session);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserSession {
    type Rejection = GreenCampusError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
        {
            Some(user_id) if !user_id.is_empty() => Ok(UserSession(Session::new(user_id))),
            _ => Err(GreenCampusError::NoSession),
        }
    }
}

/// JSON request body whose rejections are reported like every other API error.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S, Body> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GreenCampusError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(GreenCampusError::InvalidInput(rejection.body_text())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use greencampus_core::config::Configuration;
    use greencampus_core::state::GreenCampusState;
    use greencampus_dependencies::axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use greencampus_dependencies::tower::ServiceExt;
    use greencampus_models::{seed, Client};
    use greencampus_validator::ProofValidator;
    use serde_json::Value;

    pub(crate) async fn app(validator: Arc<dyn ProofValidator>) -> Router {
        let client = Client::in_memory().await.unwrap();
        seed::seed_missions(&client).await.unwrap();
        seed::seed_users(&client).await.unwrap();
        super::router(GreenCampusState::with_parts(Configuration::for_tests(), client, validator))
    }

    pub(crate) async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header(super::SESSION_HEADER, user);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
