use serde::{Deserialize, Serialize};

use crate::users::repo_types::{User, UserType};

/// Request body for signup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub user_type: UserType,
    pub phone: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

/// Request body for the authenticated password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

/// Response returned whenever a session token is issued. The user's
/// serializer strips credential fields.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub token: String,
    pub data: UserEnvelope,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub status: &'static str,
    pub reset_token: String,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_uses_camel_case_wire_names() {
        let body = serde_json::json!({
            "name": "Ann",
            "email": "a@x.com",
            "password": "12345678",
            "passwordConfirm": "12345678",
            "userType": "customer",
            "phone": "1234567890"
        });
        let request: SignupRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.user_type, UserType::Customer);
        assert_eq!(request.password_confirm, "12345678");
    }

    #[test]
    fn signup_request_rejects_unknown_user_type() {
        let body = serde_json::json!({
            "name": "Ann",
            "email": "a@x.com",
            "password": "12345678",
            "passwordConfirm": "12345678",
            "userType": "plumber"
        });
        assert!(serde_json::from_value::<SignupRequest>(body).is_err());
    }

    #[test]
    fn verify_otp_response_exposes_reset_token_camel_cased() {
        let response = VerifyOtpResponse {
            status: "success",
            reset_token: "abc".into(),
            message: "ok",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("resetToken"));
    }
}
