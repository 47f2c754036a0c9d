#[macro_use]
extern crate tracing;

use greencampus_dependencies::reqwest::{self, header::HeaderMap, header::HeaderValue, Proxy};

use crate::config::Configuration;
use crate::error::GreenCampusResult;

pub mod badges;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod mission;
pub mod progression;
pub mod session;
pub mod state;

/// Outbound HTTP client shared by all remote calls. The request timeout is the
/// validator timeout, the orchestrator applies its own bound on top.
pub fn http_client(config: &Configuration) -> GreenCampusResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(5))
        .timeout(config.validator_timeout())
        .redirect(reqwest::redirect::Policy::none());
    let client = if let Some(proxy) = &config.proxy {
        client.proxy(Proxy::all(proxy.clone())?)
    } else {
        client
    };
    Ok(client.default_headers(common_headers()).build()?)
}

fn common_headers() -> HeaderMap {
    let mut hm = HeaderMap::new();
    let user_agent = format!("Mozilla/5.0 ({} v{})", package_name(), package_version());
    trace!("new user agent with value {}", user_agent);
    if let Ok(value) = HeaderValue::from_str(&user_agent) {
        hm.append(reqwest::header::USER_AGENT, value);
    }
    hm
}

pub fn package_full() -> String {
    format!("{} v{}", package_name(), package_version())
}

pub const fn package_name() -> &'static str {
    const NAME: &str = env!("CARGO_PKG_NAME");
    NAME
}

pub const fn package_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    VERSION
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use greencampus_models::{seed, Client, NewUser, User};
    use greencampus_validator::ProofValidator;

    use crate::config::Configuration;
    use crate::error::GreenCampusResult;
    use crate::session::Session;
    use crate::state::GreenCampusState;

    /// Fresh in-memory state with the mission catalog loaded.
    pub(crate) async fn state_with(
        config: Configuration,
        validator: Arc<dyn ProofValidator>,
    ) -> GreenCampusResult<GreenCampusState> {
        let client = Client::in_memory().await?;
        seed::seed_missions(&client).await?;
        Ok(GreenCampusState::with_parts(config, client, validator))
    }

    pub(crate) async fn student(client: &Client, campus: &str) -> GreenCampusResult<Session> {
        let user = crate::session::signup(
            client,
            NewUser {
                firstname: "Alice".to_string(),
                lastname: "Green".to_string(),
                campus: campus.to_string(),
                avatar: String::new(),
            },
        )
        .await?;
        Ok(Session::new(user.id))
    }

    pub(crate) async fn user(client: &Client, session: &Session) -> GreenCampusResult<User> {
        session.user(client).await
    }

    #[test]
    pub fn test_package_full() {
        assert_eq!("greencampus-core v0.1.0", crate::package_full());
    }
}
