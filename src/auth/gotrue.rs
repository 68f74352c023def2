//! HTTP adapter for the GoTrue auth API (`<auth_url>/auth/v1`). Every request
//! carries the project's public key; user-scoped calls add the session's
//! bearer token instead. Error payloads are classified here, once, into
//! [`AuthErrorKind`] so nothing above this module inspects message text.

use super::{
    pkce, AuthApi, AuthError, AuthErrorKind, OAuthProvider, OtpType, SignUpRequest,
    SignUpResponse, VerifyOtpRequest,
};
use crate::session::{Identity, Session};
use crate::APP_USER_AGENT;
use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};
use std::time::Duration as StdDuration;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

/// Request timeout applied to every auth call.
const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Lifetime assumed when the service omits both `expires_at` and `expires_in`.
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Clone)]
pub struct GoTrueApi {
    client: Client,
    base: Url,
    anon_key: SecretString,
}

impl std::fmt::Debug for GoTrueApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueApi")
            .field("base", &self.base.as_str())
            .field("anon_key", &"***")
            .finish()
    }
}

impl GoTrueApi {
    /// # Errors
    /// Returns an error if `auth_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(auth_url: &str, anon_key: SecretString) -> anyhow::Result<Self> {
        let mut base = Url::parse(auth_url).with_context(|| format!("invalid auth URL: {auth_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to build the auth HTTP client")?;

        Ok(Self {
            client,
            base,
            anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base
            .join(&format!("auth/v1/{path}"))
            .map_err(|err| AuthError::unexpected(format!("invalid auth endpoint {path}: {err}")))
    }

    /// Request authorized with the project key.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.anon_key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Request authorized with a user's access token.
    fn user_request(&self, method: Method, url: Url, access_token: &SecretString) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AuthError> {
        let response = ensure_success(request.send().await?).await?;
        response.json::<T>().await.map_err(|err| {
            AuthError::unexpected(format!("unexpected auth response: {err}"))
        })
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), AuthError> {
        ensure_success(request.send().await?).await?;
        Ok(())
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let wire: SessionWire = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        wire.into_session(Utc::now())
    }
}

impl AuthApi for GoTrueApi {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, AuthError> {
        let mut url = self.endpoint("signup")?;
        if let Some(redirect_to) = &request.redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }

        let body = json!({
            "email": request.email,
            "password": request.password.expose_secret(),
            "data": { "full_name": request.full_name },
        });

        let wire: SignUpWire = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;

        match wire {
            SignUpWire::Session(session) => {
                let session = session.into_session(Utc::now())?;
                Ok(SignUpResponse {
                    identity: session.identity.clone(),
                    session: Some(session),
                })
            }
            SignUpWire::User(user) => Ok(SignUpResponse {
                identity: user.into_identity()?,
                session: None,
            }),
        }
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        self.token_grant(
            "password",
            json!({ "email": email, "password": password.expose_secret() }),
        )
        .await
    }

    #[instrument(skip_all, fields(email = %request.email, otp_type = request.otp_type.as_str()))]
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<Session, AuthError> {
        let url = self.endpoint("verify")?;
        let body = json!({
            "type": request.otp_type.as_str(),
            "email": request.email,
            "token": request.token,
        });
        let wire: SessionWire = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        wire.into_session(Utc::now())
    }

    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &SecretString,
    ) -> Result<Session, AuthError> {
        self.token_grant(
            "pkce",
            json!({
                "auth_code": auth_code,
                "code_verifier": code_verifier.expose_secret(),
            }),
        )
        .await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &SecretString) -> Result<Session, AuthError> {
        self.token_grant(
            "refresh_token",
            json!({ "refresh_token": refresh_token.expose_secret() }),
        )
        .await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), AuthError> {
        let url = self.endpoint("logout")?;
        match self
            .send_empty(self.user_request(Method::POST, url, access_token))
            .await
        {
            // The session is already gone server-side; nothing left to revoke.
            Err(err) if matches!(err.status, Some(401 | 403 | 404)) => {
                debug!("logout ignored status {:?}", err.status);
                Ok(())
            }
            other => other,
        }
    }

    #[instrument(skip_all, fields(email = %email, otp_type = otp_type.as_str()))]
    async fn resend(&self, email: &str, otp_type: OtpType) -> Result<(), AuthError> {
        let url = self.endpoint("resend")?;
        let body = json!({ "type": otp_type.as_str(), "email": email });
        self.send_empty(self.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn recover(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let mut url = self.endpoint("recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        self.send_empty(self.request(Method::POST, url).json(&json!({ "email": email })))
            .await
    }

    #[instrument(skip_all)]
    async fn update_password(
        &self,
        access_token: &SecretString,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let url = self.endpoint("user")?;
        let body = json!({ "password": password.expose_secret() });
        let wire: UserWire = self
            .send_json(self.user_request(Method::PUT, url, access_token).json(&body))
            .await?;
        wire.into_identity()
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, AuthError> {
        let mut url = self.endpoint("authorize")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("provider", provider.as_str())
                .append_pair("redirect_to", redirect_to)
                .append_pair("code_challenge", code_challenge)
                .append_pair("code_challenge_method", pkce::CHALLENGE_METHOD);
            if provider == OAuthProvider::Google {
                // Ask for a refresh token and always show the consent screen.
                query
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
        }
        Ok(url)
    }
}

async fn ensure_success(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status, &body))
}

#[derive(Debug, Default, Deserialize)]
struct ErrorWire {
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ErrorWire {
    fn text(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

/// Turns a failed response into a structured error.
pub(crate) fn classify(status: StatusCode, body: &str) -> AuthError {
    let wire: ErrorWire = serde_json::from_str(body).unwrap_or_default();
    let message = wire
        .text()
        .map(str::to_string)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"));

    let kind = wire
        .error_code
        .as_deref()
        .and_then(kind_from_code)
        .or_else(|| kind_from_message(&message))
        .unwrap_or_else(|| kind_from_status(status));

    AuthError::new(kind, message).with_status(status.as_u16())
}

fn kind_from_code(code: &str) -> Option<AuthErrorKind> {
    let kind = match code {
        "user_already_exists" | "email_exists" => AuthErrorKind::EmailExists,
        "weak_password" => AuthErrorKind::WeakPassword,
        "email_address_invalid" | "email_address_not_authorized" => AuthErrorKind::InvalidEmail,
        "signup_disabled" | "email_provider_disabled" => AuthErrorKind::SignupDisabled,
        "otp_expired" => AuthErrorKind::OtpExpired,
        "invalid_credentials" => AuthErrorKind::InvalidCredentials,
        "email_not_confirmed" => AuthErrorKind::EmailNotConfirmed,
        "over_email_send_rate_limit" | "over_request_rate_limit" | "over_sms_send_rate_limit" => {
            AuthErrorKind::RateLimited
        }
        "session_expired" | "session_not_found" | "refresh_token_not_found"
        | "refresh_token_already_used" | "bad_jwt" | "no_authorization" => {
            AuthErrorKind::SessionExpired
        }
        "bad_code_verifier" | "flow_state_not_found" | "flow_state_expired"
        | "provider_disabled" | "oauth_provider_not_supported" | "bad_oauth_callback"
        | "bad_oauth_state" => AuthErrorKind::Provider,
        _ => return None,
    };
    Some(kind)
}

/// Older servers only send text; these are the phrasings they use.
fn kind_from_message(message: &str) -> Option<AuthErrorKind> {
    const PHRASES: &[(&str, AuthErrorKind)] = &[
        ("email not confirmed", AuthErrorKind::EmailNotConfirmed),
        ("invalid login credentials", AuthErrorKind::InvalidCredentials),
        ("token has expired", AuthErrorKind::OtpExpired),
        ("token not found", AuthErrorKind::OtpInvalid),
        ("otp has expired", AuthErrorKind::OtpExpired),
        ("invalid otp", AuthErrorKind::OtpInvalid),
        ("otp is invalid", AuthErrorKind::OtpInvalid),
        ("user already registered", AuthErrorKind::EmailExists),
        ("password should be", AuthErrorKind::WeakPassword),
        ("signups not allowed", AuthErrorKind::SignupDisabled),
        ("unable to validate email", AuthErrorKind::InvalidEmail),
        ("invalid email", AuthErrorKind::InvalidEmail),
        ("rate limit", AuthErrorKind::RateLimited),
        ("refresh token", AuthErrorKind::SessionExpired),
    ];

    let lowered = message.to_lowercase();
    PHRASES
        .iter()
        .find(|(phrase, _)| lowered.contains(phrase))
        .map(|(_, kind)| *kind)
}

fn kind_from_status(status: StatusCode) -> AuthErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AuthErrorKind::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthErrorKind::SessionExpired,
        status if status.is_server_error() => AuthErrorKind::Network,
        _ => AuthErrorKind::Unexpected,
    }
}

#[derive(Debug, Deserialize)]
struct UserWire {
    id: Uuid,
    email: Option<String>,
    email_confirmed_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

impl UserWire {
    fn into_identity(self) -> Result<Identity, AuthError> {
        let email = self
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::unexpected("auth user has no email address"))?;

        Ok(Identity {
            id: self.id,
            email,
            email_confirmed_at: self.email_confirmed_at.or(self.confirmed_at),
            full_name: self
                .user_metadata
                .get("full_name")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SessionWire {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserWire,
}

impl SessionWire {
    fn into_session(self, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let expires_at = match self.expires_at {
            Some(at) => Utc
                .timestamp_opt(at, 0)
                .single()
                .ok_or_else(|| AuthError::unexpected(format!("invalid expires_at: {at}")))?,
            None => now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)),
        };

        Ok(Session::new(
            self.user.into_identity()?,
            now,
            expires_at,
            SecretString::from(self.access_token),
            SecretString::from(self.refresh_token),
        ))
    }
}

/// Sign-up answers with a full session when emails are auto-confirmed and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpWire {
    Session(SessionWire),
    User(UserWire),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER_ID: &str = "8f5b1c2e-3d4a-4b6c-9e8f-0a1b2c3d4e5f";

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn api(server: &MockServer) -> GoTrueApi {
        GoTrueApi::new(&server.uri(), SecretString::from("anon-key".to_string())).unwrap()
    }

    fn user_json(confirmed: bool) -> Value {
        json!({
            "id": USER_ID,
            "email": "ana@example.com",
            "email_confirmed_at": if confirmed { json!("2025-01-01T09:00:00Z") } else { Value::Null },
            "user_metadata": { "full_name": "Ana Lima" },
        })
    }

    fn session_json(confirmed: bool) -> Value {
        json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_735_726_800,
            "refresh_token": "refresh-1",
            "user": user_json(confirmed),
        })
    }

    #[test]
    fn classify_prefers_error_code() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"code":400,"error_code":"otp_expired","msg":"Token has expired or is invalid"}"#,
        );
        assert_eq!(err.kind, AuthErrorKind::OtpExpired);
        assert_eq!(err.message, "Token has expired or is invalid");
        assert_eq!(err.status, Some(400));
    }

    #[test]
    fn legacy_otp_phrases_do_not_match_unrelated_words() {
        assert_eq!(
            kind_from_message("Invalid OTP provided"),
            Some(AuthErrorKind::OtpInvalid)
        );
        assert_eq!(
            kind_from_message("Otp has expired or is invalid"),
            Some(AuthErrorKind::OtpExpired)
        );
        assert_eq!(kind_from_message("Hotplug device not ready"), None);
        assert_eq!(kind_from_message("Footprint quota exceeded"), None);
    }

    #[test]
    fn classify_falls_back_to_legacy_messages() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        );
        assert_eq!(err.kind, AuthErrorKind::EmailNotConfirmed);

        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.kind, AuthErrorKind::InvalidCredentials);

        let err = classify(StatusCode::FORBIDDEN, r#"{"msg":"Token not found"}"#);
        assert_eq!(err.kind, AuthErrorKind::OtpInvalid);
    }

    #[test]
    fn classify_uses_status_when_body_is_opaque() {
        let err = classify(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.kind, AuthErrorKind::RateLimited);

        let err = classify(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.kind, AuthErrorKind::Network);
        assert_eq!(err.message, "Bad Gateway");

        let err = classify(StatusCode::IM_A_TEAPOT, "{}");
        assert_eq!(err.kind, AuthErrorKind::Unexpected);
    }

    #[test]
    fn authorize_url_carries_pkce_and_google_params() {
        let api = GoTrueApi::new(
            "https://project.supabase.co",
            SecretString::from("anon".to_string()),
        )
        .unwrap();
        let url = api
            .authorize_url(
                OAuthProvider::Google,
                "http://localhost:5173/pages/dashboard",
                "challenge",
            )
            .unwrap();

        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        for expected in [
            ("provider", "google"),
            ("redirect_to", "http://localhost:5173/pages/dashboard"),
            ("code_challenge", "challenge"),
            ("code_challenge_method", "s256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ] {
            assert!(
                pairs.contains(&(expected.0.to_string(), expected.1.to_string())),
                "missing {expected:?} in {url}"
            );
        }
    }

    #[test]
    fn base_path_is_preserved() {
        let api = GoTrueApi::new(
            "http://localhost:54321/gateway",
            SecretString::from("anon".to_string()),
        )
        .unwrap();
        let url = api.endpoint("signup").unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/gateway/auth/v1/signup");
    }

    #[tokio::test]
    async fn sign_up_without_confirmation_returns_pending_identity() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(header("apikey", "anon-key"))
            .and(query_param("redirect_to", "http://localhost:5173/pages/dashboard"))
            .and(body_json(json!({
                "email": "ana@example.com",
                "password": "secret-pass",
                "data": { "full_name": "Ana Lima" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(false)))
            .mount(&server)
            .await;

        let response = api(&server)
            .sign_up(&SignUpRequest {
                email: "ana@example.com".to_string(),
                password: SecretString::from("secret-pass".to_string()),
                full_name: "Ana Lima".to_string(),
                redirect_to: Some("http://localhost:5173/pages/dashboard".to_string()),
            })
            .await?;

        assert!(response.session.is_none());
        assert!(!response.identity.is_verified());
        assert_eq!(response.identity.full_name.as_deref(), Some("Ana Lima"));
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_returns_verified_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/verify"))
            .and(body_json(json!({
                "type": "signup",
                "email": "ana@example.com",
                "token": "123456",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json(true)))
            .mount(&server)
            .await;

        let session = api(&server)
            .verify_otp(&VerifyOtpRequest {
                email: "ana@example.com".to_string(),
                token: "123456".to_string(),
                otp_type: OtpType::Signup,
            })
            .await?;

        assert!(session.is_verified());
        assert_eq!(session.raw_token().expose_secret(), "access-1");
        assert_eq!(session.expires_at.timestamp(), 1_735_726_800);
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_maps_unconfirmed_email() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "error_code": "email_not_confirmed",
                "msg": "Email not confirmed",
            })))
            .mount(&server)
            .await;

        let result = api(&server)
            .sign_in_with_password("ana@example.com", &SecretString::from("pw".to_string()))
            .await;

        let err = result.err().unwrap();
        assert_eq!(err.kind, AuthErrorKind::EmailNotConfirmed);
        Ok(())
    }

    #[tokio::test]
    async fn sign_out_tolerates_missing_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error_code": "session_not_found",
                "msg": "Session not found",
            })))
            .mount(&server)
            .await;

        api(&server)
            .sign_out(&SecretString::from("access-1".to_string()))
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn update_password_uses_user_token() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer access-1"))
            .and(body_json(json!({ "password": "new-password" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
            .mount(&server)
            .await;

        let identity = api(&server)
            .update_password(
                &SecretString::from("access-1".to_string()),
                &SecretString::from("new-password".to_string()),
            )
            .await?;
        assert!(identity.is_verified());
        Ok(())
    }
}
