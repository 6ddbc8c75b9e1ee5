use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Client credentials for one OAuth provider. A provider with no
/// credentials in the environment is simply not offered.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub smtp: Option<SmtpConfig>,
    pub google: Option<OAuthClientConfig>,
    pub facebook: Option<OAuthClientConfig>,
    pub twitter: Option<OAuthClientConfig>,
    pub backend_url: String,
    pub frontend_url: String,
    pub production: bool,
}

fn oauth_client_from_env(id_var: &str, secret_var: &str) -> Option<OAuthClientConfig> {
    Some(OAuthClientConfig {
        client_id: std::env::var(id_var).ok()?,
        client_secret: std::env::var(secret_var).ok()?,
    })
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "homeserve".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "homeserve-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let smtp = std::env::var("SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USER").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "HomeService Pro <no-reply@homeserve.local>".into()),
        });
        Ok(Self {
            database_url,
            jwt,
            smtp,
            google: oauth_client_from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            facebook: oauth_client_from_env("FACEBOOK_APP_ID", "FACEBOOK_APP_SECRET"),
            twitter: oauth_client_from_env("TWITTER_CLIENT_ID", "TWITTER_CLIENT_SECRET"),
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            production: std::env::var("APP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        })
    }
}
