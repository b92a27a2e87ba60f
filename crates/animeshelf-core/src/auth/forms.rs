//! Headless login and registration forms.
//!
//! Holds field values and the local validation error, validates before any
//! network call, and keeps store errors from lingering: mounting,
//! unmounting and editing a field all clear them.

use thiserror::Error;

use crate::api::Transport;
use crate::models::{Credentials, Registration, User};
use crate::routes::Navigation;

use super::actions::AuthActions;
use super::store::{AuthState, AuthStore};
use super::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Client-side form validation failures. Never sent to the server.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Username,
    Email,
    Password,
    ConfirmPassword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl FormFields {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Username => &mut self.username,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn credentials(&self) -> Result<Credentials, ValidationError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }

    /// Checks run in order: required fields, confirmation, length.
    pub fn registration(&self) -> Result<Registration, ValidationError> {
        let required = [
            &self.name,
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if required.iter().any(|value| value.is_empty()) {
            return Err(ValidationError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(Registration {
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Authenticated(User),
    Registered,
}

impl FormOutcome {
    /// Login lands on the catalog, registration on the login page.
    pub fn navigation(&self) -> Navigation {
        match self {
            FormOutcome::Authenticated(_) => Navigation::home(),
            FormOutcome::Registered => Navigation::login(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    mode: FormMode,
    fields: FormFields,
    form_error: Option<ValidationError>,
}

impl AuthForm {
    pub fn new(mode: FormMode) -> Self {
        Self {
            mode,
            fields: FormFields::default(),
            form_error: None,
        }
    }

    pub fn login() -> Self {
        Self::new(FormMode::Login)
    }

    pub fn register() -> Self {
        Self::new(FormMode::Register)
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Clear stale store errors. Returns the navigation home when the
    /// session is already authenticated; the form should not be shown then.
    pub fn mount(&self, store: &AuthStore) -> Option<Navigation> {
        store.clear_error();
        Self::redirect_if_authenticated(&store.snapshot())
    }

    /// Signed-in users have no use for the login or register form.
    pub fn redirect_if_authenticated(state: &AuthState) -> Option<Navigation> {
        state.is_authenticated().then(Navigation::home)
    }

    pub fn unmount(self, store: &AuthStore) {
        store.clear_error();
    }

    pub fn edit(&mut self, field: Field, value: impl Into<String>, store: &AuthStore) {
        *self.fields.slot(field) = value.into();
        self.form_error = None;
        store.clear_error();
    }

    /// Validate, then log in or register. Validation failures stay local to
    /// the form and issue no request.
    pub async fn submit<T: Transport>(
        &mut self,
        actions: &AuthActions<T>,
    ) -> Result<FormOutcome, AuthError> {
        self.form_error = None;
        match self.mode {
            FormMode::Login => {
                let credentials = self.validated(FormFields::credentials)?;
                let user = actions.login(&credentials).await?;
                Ok(FormOutcome::Authenticated(user))
            }
            FormMode::Register => {
                let registration = self.validated(FormFields::registration)?;
                actions.register(&registration).await?;
                Ok(FormOutcome::Registered)
            }
        }
    }

    fn validated<P>(
        &mut self,
        check: impl FnOnce(&FormFields) -> Result<P, ValidationError>,
    ) -> Result<P, ValidationError> {
        check(&self.fields).inspect_err(|e| self.form_error = Some(*e))
    }

    /// The message to show: the local validation error wins over the store's.
    pub fn displayed_error(&self, state: &AuthState) -> Option<String> {
        self.form_error
            .map(|e| e.to_string())
            .or_else(|| state.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::client::{LOGIN_PATH, REGISTER_PATH};
    use crate::api::mock::MockBackend;
    use crate::api::{RefreshMode, SessionClient};
    use crate::auth::AuthStatus;

    fn setup() -> (Arc<MockBackend>, AuthActions<Arc<MockBackend>>) {
        let backend = Arc::new(MockBackend::new());
        let client = Arc::new(SessionClient::new(backend.clone(), RefreshMode::Coalesced));
        (backend, AuthActions::new(client, AuthStore::new()))
    }

    fn filled_register(store: &AuthStore, password: &str, confirm: &str) -> AuthForm {
        let mut form = AuthForm::register();
        form.edit(Field::Name, "Ann", store);
        form.edit(Field::Username, "ann", store);
        form.edit(Field::Email, "ann@example.test", store);
        form.edit(Field::Password, password, store);
        form.edit(Field::ConfirmPassword, confirm, store);
        form
    }

    #[test]
    fn test_registration_rules_in_order() {
        let mut fields = FormFields::default();
        assert_eq!(fields.registration(), Err(ValidationError::MissingFields));

        fields.name = "Ann".to_string();
        fields.username = "ann".to_string();
        fields.email = "ann@example.test".to_string();
        fields.password = "abc".to_string();
        fields.confirm_password = "abd".to_string();
        assert_eq!(fields.registration(), Err(ValidationError::PasswordMismatch));

        fields.confirm_password = "abc".to_string();
        assert_eq!(fields.registration(), Err(ValidationError::PasswordTooShort));

        fields.password = "abcdefgh".to_string();
        fields.confirm_password = "abcdefgh".to_string();
        assert!(fields.registration().is_ok());
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 8 characters long"
        );
        assert_eq!(ValidationError::PasswordMismatch.to_string(), "Passwords do not match");
    }

    #[tokio::test]
    async fn test_short_password_fails_before_network() {
        let (backend, actions) = setup();
        let mut form = filled_register(actions.store(), "abcdefg", "abcdefg");

        let err = form.submit(&actions).await.unwrap_err();
        assert_eq!(err, AuthError::Validation(ValidationError::PasswordTooShort));
        assert_eq!(backend.total_calls(), 0);
        assert_eq!(
            form.displayed_error(&actions.store().snapshot()).as_deref(),
            Some("Password must be at least 8 characters long")
        );
    }

    #[tokio::test]
    async fn test_mismatched_password_fails_before_network() {
        let (backend, actions) = setup();
        let mut form = filled_register(actions.store(), "abcdefgh", "abcdefgX");

        let err = form.submit(&actions).await.unwrap_err();
        assert_eq!(err, AuthError::Validation(ValidationError::PasswordMismatch));
        assert_eq!(backend.total_calls(), 0);
        assert_eq!(
            form.displayed_error(&actions.store().snapshot()).as_deref(),
            Some("Passwords do not match")
        );
    }

    #[tokio::test]
    async fn test_empty_login_fails_before_network() {
        let (backend, actions) = setup();
        let mut form = AuthForm::login();
        form.edit(Field::Username, "ann", actions.store());

        let err = form.submit(&actions).await.unwrap_err();
        assert_eq!(err, AuthError::Validation(ValidationError::MissingFields));
        assert_eq!(backend.count(LOGIN_PATH), 0);
    }

    #[tokio::test]
    async fn test_register_submit_navigates_to_login() {
        let (backend, actions) = setup();
        let mut form = filled_register(actions.store(), "abcdefgh", "abcdefgh");

        let outcome = form.submit(&actions).await.expect("registers");
        assert_eq!(outcome, FormOutcome::Registered);
        assert_eq!(outcome.navigation(), Navigation::login());
        assert_eq!(backend.count(REGISTER_PATH), 1);
        assert_eq!(actions.store().snapshot().status, AuthStatus::Unauthenticated);

        let sent = &backend.calls_to(REGISTER_PATH)[0];
        let body = sent.body.as_ref().expect("json body");
        assert!(body.get("confirmPassword").is_none());
        assert!(body.get("confirm_password").is_none());
    }

    #[tokio::test]
    async fn test_login_submit_navigates_home() {
        let (_backend, actions) = setup();
        let mut form = AuthForm::login();
        form.edit(Field::Username, "ann", actions.store());
        form.edit(Field::Password, MockBackend::PASSWORD, actions.store());

        let outcome = form.submit(&actions).await.expect("logs in");
        assert!(matches!(outcome, FormOutcome::Authenticated(ref user) if user.username == "ann"));
        assert_eq!(outcome.navigation(), Navigation::home());
    }

    #[tokio::test]
    async fn test_server_error_shown_then_cleared_on_edit() {
        let (_backend, actions) = setup();
        let mut form = AuthForm::login();
        assert!(form.mount(actions.store()).is_none());
        form.edit(Field::Username, "ann", actions.store());
        form.edit(Field::Password, "wrong", actions.store());

        assert!(form.submit(&actions).await.is_err());
        assert_eq!(
            form.displayed_error(&actions.store().snapshot()).as_deref(),
            Some("Invalid username or password")
        );

        form.edit(Field::Password, "wrong again", actions.store());
        assert!(form.displayed_error(&actions.store().snapshot()).is_none());
    }

    #[test]
    fn test_mount_and_unmount_clear_store_error() {
        let store = AuthStore::new();
        store.fail(crate::auth::AuthOperation::Login, "stale");

        let form = AuthForm::login();
        assert_eq!(form.mount(&store), None);
        assert!(store.snapshot().error.is_none());

        store.fail(crate::auth::AuthOperation::Login, "stale again");
        form.unmount(&store);
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_authenticated_user_is_sent_home_from_forms() {
        let (_backend, actions) = setup();
        actions
            .login(&Credentials {
                username: "ann".to_string(),
                password: MockBackend::PASSWORD.to_string(),
            })
            .await
            .expect("login succeeds");

        assert_eq!(AuthForm::login().mount(actions.store()), Some(Navigation::home()));
        assert_eq!(AuthForm::register().mount(actions.store()), Some(Navigation::home()));

        actions.logout().await;
        assert_eq!(
            AuthForm::redirect_if_authenticated(&actions.store().snapshot()),
            None
        );
    }
}
