use std::collections::HashMap;

use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl,
    Scope, TokenResponse, TokenUrl,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::config::{AppConfig, OAuthClientConfig};
use crate::error::ApiError;
use crate::oauth::profile::ProviderProfile;
use crate::users::repo_types::Provider;

fn endpoints(provider: Provider) -> (&'static str, &'static str) {
    match provider {
        Provider::Google => (
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        ),
        Provider::Facebook => (
            "https://www.facebook.com/v18.0/dialog/oauth",
            "https://graph.facebook.com/v18.0/oauth/access_token",
        ),
        Provider::Twitter => (
            "https://twitter.com/i/oauth2/authorize",
            "https://api.twitter.com/2/oauth2/token",
        ),
    }
}

fn scopes(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Google => &["profile", "email"],
        Provider::Facebook => &["email"],
        Provider::Twitter => &["users.read", "tweet.read"],
    }
}

/// All configured providers, built once at startup. Providers without
/// credentials in the environment are absent from the map and their
/// endpoints answer 404.
pub struct OAuthProviders {
    clients: HashMap<Provider, BasicClient>,
    http: HttpClient,
}

impl OAuthProviders {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let mut clients = HashMap::new();
        let entries = [
            (Provider::Google, &config.google),
            (Provider::Facebook, &config.facebook),
            (Provider::Twitter, &config.twitter),
        ];
        for (provider, credentials) in entries {
            if let Some(credentials) = credentials {
                clients.insert(
                    provider,
                    build_client(provider, credentials, &config.backend_url)?,
                );
            }
        }
        Ok(Self {
            clients,
            http: HttpClient::new(),
        })
    }

    pub fn configured(&self, provider: Provider) -> bool {
        self.clients.contains_key(&provider)
    }

    fn client_for(&self, provider: Provider) -> Result<&BasicClient, ApiError> {
        self.clients.get(&provider).ok_or_else(|| {
            ApiError::NotFound(format!("{} login is not configured", provider.as_str()))
        })
    }

    /// Consent-screen URL with the provider's scopes.
    pub fn authorize_url(&self, provider: Provider) -> Result<(String, CsrfToken), ApiError> {
        let client = self.client_for(provider)?;
        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in scopes(provider) {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }
        let (url, csrf_token) = request.url();
        Ok((url.to_string(), csrf_token))
    }

    /// Exchange the callback code for an access token and fetch the
    /// provider profile, normalized into the common bundle.
    pub async fn exchange(
        &self,
        provider: Provider,
        code: &str,
    ) -> Result<ProviderProfile, ApiError> {
        let client = self.client_for(provider)?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| ApiError::Dependency(format!("Token exchange failed: {e}")))?;

        let access_token = token.access_token().secret();

        match provider {
            Provider::Google => self.fetch_google_profile(access_token).await,
            Provider::Facebook => self.fetch_facebook_profile(access_token).await,
            Provider::Twitter => self.fetch_twitter_profile(access_token).await,
        }
    }

    async fn fetch_google_profile(&self, access_token: &str) -> Result<ProviderProfile, ApiError> {
        #[derive(Deserialize)]
        struct GoogleUser {
            id: String,
            email: Option<String>,
            name: Option<String>,
            picture: Option<String>,
        }

        let user: GoogleUser = self
            .get_json("https://www.googleapis.com/oauth2/v2/userinfo", access_token)
            .await?;

        Ok(ProviderProfile {
            provider_user_id: user.id,
            display_name: user.name,
            email: user.email,
            username: None,
            avatar_url: user.picture,
        })
    }

    async fn fetch_facebook_profile(
        &self,
        access_token: &str,
    ) -> Result<ProviderProfile, ApiError> {
        #[derive(Deserialize)]
        struct FacebookPictureData {
            url: Option<String>,
        }
        #[derive(Deserialize)]
        struct FacebookPicture {
            data: Option<FacebookPictureData>,
        }
        #[derive(Deserialize)]
        struct FacebookUser {
            id: String,
            name: Option<String>,
            email: Option<String>,
            picture: Option<FacebookPicture>,
        }

        let user: FacebookUser = self
            .get_json(
                "https://graph.facebook.com/me?fields=id,name,email,picture",
                access_token,
            )
            .await?;

        Ok(ProviderProfile {
            provider_user_id: user.id,
            display_name: user.name,
            email: user.email,
            username: None,
            avatar_url: user.picture.and_then(|p| p.data).and_then(|d| d.url),
        })
    }

    async fn fetch_twitter_profile(&self, access_token: &str) -> Result<ProviderProfile, ApiError> {
        #[derive(Deserialize)]
        struct TwitterUser {
            id: String,
            name: Option<String>,
            username: Option<String>,
            profile_image_url: Option<String>,
        }
        #[derive(Deserialize)]
        struct TwitterResponse {
            data: TwitterUser,
        }

        let response: TwitterResponse = self
            .get_json(
                "https://api.twitter.com/2/users/me?user.fields=profile_image_url",
                access_token,
            )
            .await?;

        // Twitter's v2 API does not expose email
        Ok(ProviderProfile {
            provider_user_id: response.data.id,
            display_name: response.data.name,
            email: None,
            username: response.data.username,
            avatar_url: response.data.profile_image_url,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("Profile fetch failed: {e}")))?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Dependency(format!("Profile parse failed: {e}")))
    }
}

fn build_client(
    provider: Provider,
    credentials: &OAuthClientConfig,
    backend_url: &str,
) -> anyhow::Result<BasicClient> {
    let (auth_url, token_url) = endpoints(provider);
    let redirect_url = format!("{backend_url}/api/v1/auth/{}/callback", provider.as_str());
    Ok(BasicClient::new(
        ClientId::new(credentials.client_id.clone()),
        Some(ClientSecret::new(credentials.client_secret.clone())),
        AuthUrl::new(auth_url.to_string())?,
        Some(TokenUrl::new(token_url.to_string())?),
    )
    .set_redirect_uri(RedirectUrl::new(redirect_url)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn config_with_google() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            smtp: None,
            google: Some(OAuthClientConfig {
                client_id: "google-client-id".into(),
                client_secret: "google-secret".into(),
            }),
            facebook: None,
            twitter: None,
            backend_url: "http://localhost:8080".into(),
            frontend_url: "http://localhost:3000".into(),
            production: false,
        }
    }

    #[test]
    fn unconfigured_provider_is_absent() {
        let providers = OAuthProviders::from_config(&config_with_google()).unwrap();
        assert!(providers.configured(Provider::Google));
        assert!(!providers.configured(Provider::Facebook));
        assert!(providers.authorize_url(Provider::Twitter).is_err());
    }

    #[test]
    fn authorize_url_carries_client_and_scopes() {
        let providers = OAuthProviders::from_config(&config_with_google()).unwrap();
        let (url, _csrf) = providers.authorize_url(Provider::Google).unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
        assert!(url.contains("client_id=google-client-id"));
        assert!(url.contains("scope=profile+email"));
        assert!(url.contains("callback"));
    }
}
