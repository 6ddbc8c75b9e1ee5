use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Reset/password fields never leave the
/// process in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub user_type: Option<UserType>,
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub twitter_id: Option<String>,
    pub is_email_verified: bool,
    #[serde(skip_serializing, default)]
    pub password_changed_at: Option<OffsetDateTime>,
    #[serde(skip_serializing, default)]
    pub password_reset_token_hash: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_reset_expires_at: Option<OffsetDateTime>,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Whether the password was changed at or after the given token
    /// issue time (unix seconds). Unset means never changed.
    pub fn changed_password_after(&self, iat: usize) -> bool {
        match self.password_changed_at {
            Some(changed) => changed.unix_timestamp() as usize >= iat,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
pub enum UserType {
    Maid,
    Customer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Maid => "maid",
            UserType::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// OAuth identity namespaces. Each maps to its own unique column on the
/// user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
    Twitter,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
            Provider::Twitter => "twitter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Provider::Google),
            "facebook" => Some(Provider::Facebook),
            "twitter" => Some(Provider::Twitter),
            _ => None,
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            Provider::Google => "google_id",
            Provider::Facebook => "facebook_id",
            Provider::Twitter => "twitter_id",
        }
    }
}

/// Insert payload for the store. Built by signup (password path) or the
/// OAuth resolver (provider path); validated before the write.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub user_type: Option<UserType>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub twitter_id: Option<String>,
    pub is_email_verified: bool,
}

impl NewUser {
    pub fn has_provider_id(&self) -> bool {
        self.google_id.is_some() || self.facebook_id.is_some() || self.twitter_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user_with_changed_at(changed: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "a@x.com".into(),
            photo: "default.jpg".into(),
            user_type: Some(UserType::Customer),
            phone: None,
            password_hash: Some("hash".into()),
            google_id: None,
            facebook_id: None,
            twitter_id: None,
            is_email_verified: false,
            password_changed_at: changed,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            role: Role::User,
            active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn never_changed_password_never_invalidates() {
        let user = user_with_changed_at(None);
        assert!(!user.changed_password_after(0));
    }

    #[test]
    fn token_issued_before_change_is_stale() {
        let changed = OffsetDateTime::now_utc();
        let user = user_with_changed_at(Some(changed));
        let iat = (changed - Duration::hours(1)).unix_timestamp() as usize;
        assert!(user.changed_password_after(iat));
    }

    #[test]
    fn token_issued_at_change_instant_is_stale() {
        let changed = OffsetDateTime::now_utc();
        let user = user_with_changed_at(Some(changed));
        assert!(user.changed_password_after(changed.unix_timestamp() as usize));
    }

    #[test]
    fn token_issued_after_change_is_fresh() {
        let changed = OffsetDateTime::now_utc();
        let user = user_with_changed_at(Some(changed));
        let iat = (changed + Duration::seconds(2)).unix_timestamp() as usize;
        assert!(!user.changed_password_after(iat));
    }

    #[test]
    fn serialized_user_hides_credentials() {
        let mut user = user_with_changed_at(Some(OffsetDateTime::now_utc()));
        user.password_reset_token_hash = Some("deadbeef".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("a@x.com"));
    }
}
