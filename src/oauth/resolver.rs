use sqlx::PgPool;
use tracing::info;

use crate::error::ApiError;
use crate::oauth::profile::{synthesized_identity, ProviderProfile};
use crate::users::repo_types::{NewUser, Provider, User};

fn new_user_from_profile(
    provider: Provider,
    profile: &ProviderProfile,
) -> Result<NewUser, ApiError> {
    let (name, email) = synthesized_identity(provider, profile)?;
    let mut new_user = NewUser {
        name,
        email,
        photo: profile.avatar_url.clone(),
        is_email_verified: true,
        ..Default::default()
    };
    match provider {
        Provider::Google => new_user.google_id = Some(profile.provider_user_id.clone()),
        Provider::Facebook => new_user.facebook_id = Some(profile.provider_user_id.clone()),
        Provider::Twitter => new_user.twitter_id = Some(profile.provider_user_id.clone()),
    }
    Ok(new_user)
}

/// Resolve an external profile to exactly one user record, in priority
/// order: already-linked provider id, then email merge, then creation.
/// A duplicate-rejecting insert (concurrent callback for the same new
/// identity) is retried once as a lookup-and-link.
pub async fn resolve(
    db: &PgPool,
    provider: Provider,
    profile: &ProviderProfile,
) -> Result<User, ApiError> {
    if let Some(user) = User::find_by_provider_id(db, provider, &profile.provider_user_id).await? {
        return Ok(user);
    }

    if let Some(email) = profile.normalized_email() {
        if let Some(user) = User::find_by_email(db, &email).await? {
            let user =
                User::link_provider(db, user.id, provider, &profile.provider_user_id).await?;
            info!(user_id = %user.id, provider = provider.as_str(), "linked provider to existing account");
            return Ok(user);
        }
    }

    let new_user = new_user_from_profile(provider, profile)?;
    match User::create(db, &new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, provider = provider.as_str(), "created account from provider profile");
            Ok(user)
        }
        Err(ApiError::Conflict(_)) => {
            // lost the race: someone persisted this identity between our
            // lookups and the insert
            if let Some(user) =
                User::find_by_provider_id(db, provider, &profile.provider_user_id).await?
            {
                return Ok(user);
            }
            if let Some(user) = User::find_by_email(db, &new_user.email).await? {
                let user =
                    User::link_provider(db, user.id, provider, &profile.provider_user_id).await?;
                return Ok(user);
            }
            Err(ApiError::Conflict("Email already in use".into()))
        }
        Err(e) => Err(e),
    }
}
