//! Accounts and the stub session. There is no authentication: knowing a user id is
//! enough to act as that user.

use greencampus_models::{Action, Client, NewUser, User};

use crate::error::{GreenCampusError, GreenCampusResult};

/// The user an operation acts for. Passed explicitly to every user-scoped call.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Loads the session's user including earned badges.
    pub async fn user(&self, client: &Client) -> GreenCampusResult<User> {
        let mut conn = client.db().await?;
        User::get_id(&mut conn, &self.user_id)
            .await?
            .ok_or_else(|| GreenCampusError::UserNotFound(self.user_id.clone()))
    }

    /// Most recent ledger entries first.
    pub async fn recent_actions(
        &self,
        client: &Client,
        limit: Option<u32>,
    ) -> GreenCampusResult<Vec<Action>> {
        let mut conn = client.db().await?;
        Ok(Action::for_user(&mut conn, &self.user_id, limit).await?)
    }

    /// Nothing is kept server side, dropping the session is all there is to it.
    pub fn logout(self) {
        debug!("user {} logged out", self.user_id);
    }
}

#[instrument(skip(client, new_user), fields(campus = %new_user.campus))]
pub async fn signup(client: &Client, new_user: NewUser) -> GreenCampusResult<User> {
    let new_user = NewUser {
        firstname: new_user.firstname.trim().to_string(),
        lastname: new_user.lastname.trim().to_string(),
        campus: new_user.campus.trim().to_string(),
        avatar: new_user.avatar,
    };
    if new_user.firstname.is_empty() {
        return Err(GreenCampusError::InvalidInput("first name is required".to_string()));
    }
    if new_user.campus.is_empty() {
        return Err(GreenCampusError::InvalidInput("campus is required".to_string()));
    }
    let mut conn = client.db().await?;
    let user = User::new(&mut conn, new_user).await?;
    info!("new user {} ({})", user.id, user.displayname());
    Ok(user)
}

/// Succeeds for any existing user.
pub async fn login(client: &Client, user_id: &str) -> GreenCampusResult<Session> {
    let mut conn = client.db().await?;
    match User::get_id(&mut conn, user_id).await? {
        Some(user) => {
            debug!("user {} logged in", user.id);
            Ok(Session::new(user.id))
        }
        None => Err(GreenCampusError::UserNotFound(user_id.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_signup_and_login() -> GreenCampusResult<()> {
        let client = Client::in_memory().await?;
        let user = signup(
            &client,
            NewUser {
                firstname: " Lucas ".to_string(),
                lastname: "Recyc".to_string(),
                campus: "Eugenia Paris".to_string(),
                avatar: String::new(),
            },
        )
        .await?;
        assert_eq!("Lucas", user.firstname);
        assert_eq!((0, 1), (user.xp, user.level));
        assert!(user.badges.is_empty());

        let session = login(&client, &user.id).await?;
        assert_eq!(user.id, session.user_id());
        let loaded = session.user(&client).await?;
        assert_eq!((user.id.clone(), "Eugenia Paris".to_string()), (loaded.id, loaded.campus));
        assert!(session.recent_actions(&client, Some(5)).await?.is_empty());
        session.logout();

        assert!(matches!(
            login(&client, "nobody").await,
            Err(GreenCampusError::UserNotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_signup_requires_campus() -> GreenCampusResult<()> {
        let client = Client::in_memory().await?;
        let res = signup(
            &client,
            NewUser {
                firstname: "Tom".to_string(),
                lastname: String::new(),
                campus: "  ".to_string(),
                avatar: String::new(),
            },
        )
        .await;
        assert!(matches!(res, Err(GreenCampusError::InvalidInput(_))));
        Ok(())
    }
}
