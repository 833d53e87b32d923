use taskboard_core::User;

/// Who is signed in, and the progress of the last login or registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    LoginStarted,
    LoginSucceeded { user: User, token: String },
    LoginFailed(String),
    RegisterStarted,
    /// Registration does not sign the user in.
    RegisterSucceeded(User),
    RegisterFailed(String),
    Logout,
}

pub fn reduce_auth(mut state: AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::LoginStarted | AuthAction::RegisterStarted => {
            state.loading = true;
            state.error = None;
        }
        AuthAction::LoginSucceeded { user, token } => {
            state.loading = false;
            state.user = Some(user);
            state.token = Some(token);
        }
        AuthAction::RegisterSucceeded(_) => {
            state.loading = false;
        }
        AuthAction::LoginFailed(message) | AuthAction::RegisterFailed(message) => {
            state.loading = false;
            state.error = Some(message);
        }
        AuthAction::Logout => {
            state = AuthState::default();
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn user() -> User {
        User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn login_stores_user_and_token() {
        let state = reduce_auth(AuthState::default(), AuthAction::LoginStarted);
        assert!(state.loading);

        let state = reduce_auth(
            state,
            AuthAction::LoginSucceeded {
                user: user(),
                token: "token".to_string(),
            },
        );

        assert!(!state.loading);
        assert!(state.is_authenticated());
        assert_eq!(state.user, Some(user()));
        assert_eq!(state.token.as_deref(), Some("token"));
    }

    #[test]
    fn failure_is_cleared_by_next_attempt() {
        let state = reduce_auth(
            AuthState::default(),
            AuthAction::LoginFailed("Invalid email or password".to_string()),
        );
        assert_eq!(state.error.as_deref(), Some("Invalid email or password"));
        assert!(!state.is_authenticated());

        let state = reduce_auth(state, AuthAction::RegisterStarted);
        assert_eq!(state.error, None);
        assert!(state.loading);
    }

    #[test]
    fn registration_does_not_sign_in() {
        let state = reduce_auth(AuthState::default(), AuthAction::RegisterStarted);

        let state = reduce_auth(state, AuthAction::RegisterSucceeded(user()));

        assert!(!state.loading);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn logout_forgets_everything() {
        let state = reduce_auth(
            AuthState::default(),
            AuthAction::LoginSucceeded {
                user: user(),
                token: "token".to_string(),
            },
        );

        assert_eq!(reduce_auth(state, AuthAction::Logout), AuthState::default());
    }
}
