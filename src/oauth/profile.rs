use crate::error::ApiError;
use crate::users::repo_types::Provider;

/// Common profile bundle every provider response is normalized into
/// before identity resolution.
#[derive(Debug, Clone, Default)]
pub struct ProviderProfile {
    pub provider_user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProviderProfile {
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Derive the (name, email) pair for a record created from an external
/// profile. Twitter regularly withholds both display name and email, so
/// both fall back to the username; with neither email nor username there
/// is nothing deterministic to create.
pub fn synthesized_identity(
    provider: Provider,
    profile: &ProviderProfile,
) -> Result<(String, String), ApiError> {
    let name = non_empty(profile.display_name.as_deref())
        .or_else(|| non_empty(profile.username.as_deref()))
        .ok_or(ApiError::IncompleteProfile)?
        .to_string();

    let email = match profile.normalized_email() {
        Some(email) => email,
        None => {
            let username =
                non_empty(profile.username.as_deref()).ok_or(ApiError::IncompleteProfile)?;
            format!("{}@{}.com", username.to_lowercase(), provider.as_str())
        }
    };

    Ok((name, email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_profile_keeps_its_own_identity() {
        let profile = ProviderProfile {
            provider_user_id: "g-1".into(),
            display_name: Some("Ann Example".into()),
            email: Some("Ann@X.com ".into()),
            username: None,
            avatar_url: None,
        };
        let (name, email) = synthesized_identity(Provider::Google, &profile).unwrap();
        assert_eq!(name, "Ann Example");
        assert_eq!(email, "ann@x.com");
    }

    #[test]
    fn missing_display_name_falls_back_to_username() {
        let profile = ProviderProfile {
            provider_user_id: "t-1".into(),
            display_name: None,
            email: None,
            username: Some("annieplumbs".into()),
            avatar_url: None,
        };
        let (name, email) = synthesized_identity(Provider::Twitter, &profile).unwrap();
        assert_eq!(name, "annieplumbs");
        assert_eq!(email, "annieplumbs@twitter.com");
    }

    #[test]
    fn placeholder_email_carries_the_provider_namespace() {
        let profile = ProviderProfile {
            provider_user_id: "f-1".into(),
            display_name: Some("Bo".into()),
            email: None,
            username: Some("BoBuilder".into()),
            avatar_url: None,
        };
        let (_, email) = synthesized_identity(Provider::Facebook, &profile).unwrap();
        assert_eq!(email, "bobuilder@facebook.com");
    }

    #[test]
    fn no_email_and_no_username_is_unresolvable() {
        let profile = ProviderProfile {
            provider_user_id: "x-1".into(),
            display_name: Some("Ghost".into()),
            email: None,
            username: None,
            avatar_url: None,
        };
        let err = synthesized_identity(Provider::Twitter, &profile).unwrap_err();
        assert!(matches!(err, ApiError::IncompleteProfile));
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let profile = ProviderProfile {
            provider_user_id: "x-2".into(),
            display_name: Some("   ".into()),
            email: Some("".into()),
            username: None,
            avatar_url: None,
        };
        assert!(synthesized_identity(Provider::Google, &profile).is_err());
    }
}
