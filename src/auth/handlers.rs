use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse,
            ResetPasswordRequest, SignupRequest, UpdatePasswordRequest, UserEnvelope,
            VerifyOtpRequest, VerifyOtpResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        reset::{generate_otp, generate_reset_ticket, hash_token, reset_expiry},
    },
    email::{otp_body, password_changed_body, welcome_body},
    error::ApiError,
    state::AppState,
    users::repo_types::{NewUser, User},
    users::validate::validate_password_pair,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(signup))
        .route("/users/login", post(login))
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/verify-otp", post(verify_otp))
        .route("/users/reset-password/:token", patch(reset_password))
        .route("/users/update-password", patch(update_password))
}

/// Sign a session token and hand it back both in the body and as an
/// httpOnly cookie. Secure flag only outside local development.
fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
    status: StatusCode,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id)?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.production)
        .max_age(time::Duration::minutes(state.config.jwt.ttl_minutes))
        .build();

    Ok((
        status,
        jar.add(cookie),
        Json(AuthResponse {
            status: "success",
            token,
            data: UserEnvelope { user },
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    validate_password_pair(&payload.password, &payload.password_confirm)?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already in use".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        &NewUser {
            name: payload.name,
            email: payload.email,
            user_type: Some(payload.user_type),
            phone: payload.phone,
            password_hash: Some(hash),
            ..Default::default()
        },
    )
    .await?;

    // Welcome email never blocks registration
    if let Err(e) = state
        .mailer
        .send(
            &user.email,
            "Welcome to HomeService Pro!",
            &welcome_body(
                &user.name,
                user.user_type.map(|t| t.as_str()).unwrap_or("customer"),
            ),
        )
        .await
    {
        warn!(error = %e, user_id = %user.id, "welcome email failed");
    }

    info!(user_id = %user.id, email = %user.email, "user signed up");
    issue_session(&state, jar, user, StatusCode::CREATED)
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide email and password!".into(),
        ));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthenticated("Incorrect email or password".into())
        })?;

    // OAuth-only accounts have no hash and cannot password-login
    let hash = user.password_hash.as_deref().ok_or_else(|| {
        ApiError::Unauthenticated("Incorrect email or password".into())
    })?;

    if !verify_password(&payload.password, hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated(
            "Incorrect email or password".into(),
        ));
    }

    info!(user_id = %user.id, "user logged in");
    issue_session(&state, jar, user, StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("There is no user with that email address.".into())
        })?;

    let otp = generate_otp();
    User::set_reset_token(&state.db, user.id, &hash_token(&otp), reset_expiry()).await?;

    // The OTP has no other delivery channel, so a send failure aborts the
    // flow and disarms the slot.
    if let Err(e) = state
        .mailer
        .send(
            &user.email,
            "Your password reset OTP (valid for 10 minutes)",
            &otp_body(&user.name, &otp),
        )
        .await
    {
        warn!(error = %e, user_id = %user.id, "otp email failed, rolling back reset slot");
        User::clear_reset_token(&state.db, user.id).await?;
        return Err(ApiError::Dependency(
            "There was an error sending the email. Try again later!".into(),
        ));
    }

    info!(user_id = %user.id, "reset otp issued");
    Ok(Json(MessageResponse {
        status: "success",
        message: "OTP sent to email!",
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    if email.is_empty() || payload.otp.is_empty() {
        return Err(ApiError::Validation("Please provide email and OTP".into()));
    }

    let user = User::find_by_email_and_reset_hash(&state.db, &email, &hash_token(&payload.otp))
        .await?
        .ok_or_else(|| ApiError::InvalidOrExpired("OTP is invalid or has expired".into()))?;

    // Rotate the slot: the OTP is spent, the ticket takes its place with
    // a fresh window.
    let ticket = generate_reset_ticket();
    User::set_reset_token(&state.db, user.id, &hash_token(&ticket), reset_expiry()).await?;

    info!(user_id = %user.id, "otp verified, reset ticket issued");
    Ok(Json(VerifyOtpResponse {
        status: "success",
        reset_token: ticket,
        message: "OTP verified. You can now reset your password.",
    }))
}

#[instrument(skip(state, jar, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    validate_password_pair(&payload.password, &payload.password_confirm)?;

    let user = User::find_by_reset_hash(&state.db, &hash_token(&token))
        .await?
        .ok_or_else(|| ApiError::InvalidOrExpired("Token is invalid or has expired".into()))?;

    let hash = hash_password(&payload.password)?;
    let user = User::set_password(&state.db, user.id, &hash).await?;

    if let Err(e) = state
        .mailer
        .send(
            &user.email,
            "Password Changed Successfully",
            &password_changed_body(&user.name),
        )
        .await
    {
        warn!(error = %e, user_id = %user.id, "password-changed email failed");
    }

    info!(user_id = %user.id, "password reset completed");
    issue_session(&state, jar, user, StatusCode::OK)
}

#[instrument(skip(state, jar, current, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    jar: CookieJar,
    current: CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let CurrentUser(user) = current;

    let hash = user.password_hash.as_deref().ok_or_else(|| {
        ApiError::Unauthenticated("Your current password is wrong.".into())
    })?;

    if !verify_password(&payload.password_current, hash)? {
        return Err(ApiError::Unauthenticated(
            "Your current password is wrong.".into(),
        ));
    }

    validate_password_pair(&payload.password, &payload.password_confirm)?;

    let new_hash = hash_password(&payload.password)?;
    let user = User::set_password(&state.db, user.id, &new_hash).await?;

    info!(user_id = %user.id, "password updated");
    issue_session(&state, jar, user, StatusCode::OK)
}
