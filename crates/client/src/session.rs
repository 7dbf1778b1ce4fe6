//! Login and guest access

use cellar_core::{CoreError, Envelope, Permission, Result, User};
use std::sync::Arc;

use crate::transport::Transport;

/// Result of a login attempt
///
/// `code()` gives the caller-facing number: the permission level on
/// success (0 = no such account), negative for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Server answered with an actor, possibly `Permission::Unknown`
    Success(User),
    InvalidEmail,
    MissingFields,
    ServerUnreachable,
    UnexpectedResponse,
}

impl LoginOutcome {
    pub fn code(&self) -> i32 {
        match self {
            LoginOutcome::Success(user) => user.level(),
            LoginOutcome::InvalidEmail => -1,
            LoginOutcome::MissingFields => -2,
            LoginOutcome::ServerUnreachable => -3,
            LoginOutcome::UnexpectedResponse => -4,
        }
    }

    /// The resolved actor, if the server answered
    pub fn user(&self) -> Option<&User> {
        match self {
            LoginOutcome::Success(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            LoginOutcome::Success(user) => Some(user),
            _ => None,
        }
    }

    fn from_error(err: &CoreError) -> Self {
        if err.is_transport() {
            LoginOutcome::ServerUnreachable
        } else {
            LoginOutcome::UnexpectedResponse
        }
    }
}

/// Session component: turns credentials into an actor
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// See [`cellar_core::is_mail`]
    pub fn is_mail(&self, candidate: &str) -> bool {
        cellar_core::is_mail(candidate)
    }

    /// Log in with email and password
    ///
    /// Empty fields are checked before the email format, and both before
    /// any connection is made.
    pub async fn login(&self, mail: &str, pass: &str) -> LoginOutcome {
        if mail.is_empty() || pass.is_empty() {
            return LoginOutcome::MissingFields;
        }
        if !self.is_mail(mail) {
            return LoginOutcome::InvalidEmail;
        }

        let response = self.transport.send(Envelope::login(mail, pass)).await;
        match response.and_then(|r| r.into_actor()) {
            Ok(user) => {
                tracing::info!("Login for {} resolved to {}", mail, user.permission());
                LoginOutcome::Success(user)
            }
            Err(e) => {
                tracing::warn!("Login for {} failed: {}", mail, e);
                LoginOutcome::from_error(&e)
            }
        }
    }

    /// Obtain the guest actor
    ///
    /// Errors are returned as-is; an unreachable server shows up as
    /// `CoreError::ConnectionRefused` for the caller to display.
    pub async fn guest_login(&self) -> Result<User> {
        let user = self.transport.send(Envelope::guest()).await?.into_actor()?;
        if user.level() != 0 {
            return Err(CoreError::UnexpectedResponse {
                expected: "guest actor",
                got: "privileged actor",
            });
        }
        if user.permission() != Permission::Guest {
            tracing::debug!("Guest request answered with {} actor", user.permission());
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use cellar_core::Response;

    fn session(mock: &Arc<MockTransport>) -> Session {
        Session::new(mock.clone())
    }

    #[tokio::test]
    async fn test_missing_fields_never_touch_transport() {
        let mock = Arc::new(MockTransport::new());
        let session = session(&mock);

        for (mail, pass) in [("", "asd"), ("asd@asd.com", ""), ("", ""), ("not-a-mail", "")] {
            let outcome = session.login(mail, pass).await;
            assert_eq!(outcome, LoginOutcome::MissingFields, "{mail:?}/{pass:?}");
            assert_eq!(outcome.code(), -2);
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_email_never_touches_transport() {
        let mock = Arc::new(MockTransport::new());
        let session = session(&mock);

        for mail in ["asd", "user@user", "@user.com", "user.user.com"] {
            let outcome = session.login(mail, "pwd").await;
            assert_eq!(outcome, LoginOutcome::InvalidEmail);
            assert_eq!(outcome.code(), -1);
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_code_is_permission_level() {
        let admin = User::new("Ada", "Root", "admin@admin.com", "", Permission::Admin);
        let mock = Arc::new(MockTransport::new().respond(Response::Actor(admin.clone())));

        let outcome = session(&mock).login("admin@admin.com", "pwd").await;
        assert_eq!(outcome.code(), 3);
        assert_eq!(outcome.user(), Some(&admin));

        let sent = mock.sent();
        assert_eq!(sent[0].command, "login");
        assert_eq!(sent[0].args, vec!["admin@admin.com", "pwd"]);
    }

    #[tokio::test]
    async fn test_unknown_account_is_success_with_zero() {
        let mock = Arc::new(MockTransport::new().respond(Response::Actor(User::unknown("who@x.com"))));
        let outcome = session(&mock).login("who@x.com", "pwd").await;
        assert!(matches!(outcome, LoginOutcome::Success(_)));
        assert_eq!(outcome.code(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_and_unexpected() {
        let mock = Arc::new(
            MockTransport::new()
                .fail(CoreError::ConnectionRefused("127.0.0.1:4316".into()))
                .respond(Response::Flag(true))
                .fail(CoreError::Timeout(100)),
        );
        let session = session(&mock);

        assert_eq!(session.login("a@b.c", "x").await.code(), -3);
        assert_eq!(session.login("a@b.c", "x").await.code(), -4);
        assert_eq!(session.login("a@b.c", "x").await.code(), -3);
    }

    #[tokio::test]
    async fn test_guest_login() {
        let mock = Arc::new(MockTransport::new().respond(Response::Actor(User::guest())));
        let guest = session(&mock).guest_login().await.unwrap();
        assert!(guest.is_guest());
        assert_eq!(guest.level(), 0);
        assert_eq!(mock.sent()[0].args.len(), 0);
    }

    #[tokio::test]
    async fn test_guest_login_unreachable_is_error() {
        let mock = Arc::new(MockTransport::new().fail(CoreError::ConnectionRefused("down".into())));
        let err = session(&mock).guest_login().await.unwrap_err();
        assert!(matches!(err, CoreError::ConnectionRefused(_)));
    }

    #[tokio::test]
    async fn test_guest_login_rejects_privileged_actor() {
        let boss = User::new("", "", "boss@x.com", "", Permission::Admin);
        let mock = Arc::new(MockTransport::new().respond(Response::Actor(boss)));
        let err = session(&mock).guest_login().await.unwrap_err();
        assert!(err.is_protocol());
    }
}
