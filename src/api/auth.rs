//! Login, registration and logout.

use std::collections::BTreeMap;

use tracing::warn;

use super::{ApiClient, ApiError};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::session::CredentialStore;
use crate::validate;

impl<S: CredentialStore> ApiClient<S> {
    /// Exchange credentials for a token and adopt it in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("/api/auth/login", &request).await?;
        self.adopt(&response).await;
        Ok(response)
    }

    /// Create an account and sign straight in with it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, ApiError> {
        check_registration(request)?;

        let response: LoginResponse = self.post("/api/auth/register", request).await?;
        self.adopt(&response).await;
        Ok(response)
    }

    /// Local sign-out; the backend keeps no session state.
    pub async fn logout(&self) -> anyhow::Result<()> {
        self.session().sign_out().await
    }

    async fn adopt(&self, response: &LoginResponse) {
        if let Err(e) = self.session().sign_in(response).await {
            warn!(error = %e, "Signed in for this run only; credentials were not saved");
        }
    }
}

/// Client-side checks run before a registration is sent.
pub fn check_registration(request: &RegisterRequest) -> Result<(), ApiError> {
    let mut fields = BTreeMap::new();

    if !validate::is_valid_username(&request.username) {
        fields.insert(
            "username".to_string(),
            "Username must be 3-50 letters, digits or underscores".to_string(),
        );
    }
    if !validate::is_valid_email(&request.email) {
        fields.insert("email".to_string(), "Email address is not valid".to_string());
    }
    if !validate::is_valid_password(&request.password) {
        fields.insert(
            "password".to_string(),
            "Password needs 8+ characters with upper, lower case and a digit".to_string(),
        );
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: None,
        }
    }

    #[test]
    fn test_registration_checks() {
        assert!(check_registration(&request("desk_01", "desk@example.com", "Abc12345")).is_ok());

        let err = check_registration(&request("x", "desk@example", "abc12345")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status, 0);

        let fields = err.field_errors();
        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "password", "username"]
        );
    }
}
