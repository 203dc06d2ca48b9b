//! OAuth login flow
//!
//! Password and refresh-token grants against `POST /oauth/token`. The
//! password grant authenticates the OAuth client with HTTP Basic; the
//! refresh grant does not. Token requests never carry a bearer token.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use njuns_domain::constants::{DEFAULT_CLIENT_ID, DEFAULT_CLIENT_SECRET};
use njuns_domain::{ClientConfig, UserInfo};
use tracing::{info, instrument, warn};

use super::engine::{RequestEngine, RequestOptions};
use super::errors::{HttpFailure, RequestError};
use super::route::{ParamValue, Route};
use super::session::{TokenResponse, TokenState};

const TOKEN_PATH: &str = "/oauth/token";
const USER_INFO_PATH: &str = "/userInfo";

/// OAuth grant type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    Password,
    RefreshToken,
}

impl GrantType {
    /// Value of the `grant_type` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth client id and secret sent as HTTP Basic on password grants
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

impl Default for ClientCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_ID, DEFAULT_CLIENT_SECRET)
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ClientCredentials {
    /// Client id and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), client_secret: client_secret.into() }
    }

    /// Client registration from the configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.client_id.clone(), config.client_secret.clone())
    }

    /// OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `Authorization` header value.
    pub fn basic_header(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        format!("Basic {encoded}")
    }
}

/// Username and password of an NJUNS account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Trimmed, non-blank credentials.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when either value is blank.
    pub fn new(username: &str, password: &str) -> Result<Self, RequestError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() {
            return Err(RequestError::InvalidArgument("username must not be blank".to_string()));
        }
        if password.is_empty() {
            return Err(RequestError::InvalidArgument("password must not be blank".to_string()));
        }
        Ok(Self { username: username.to_string(), password: password.to_string() })
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password; never log it.
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Parameters of one `/oauth/token` call
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    grant_type: GrantType,
    username: Option<String>,
    password: Option<String>,
    refresh_token: Option<String>,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenRequest {
    /// Arbitrary combination, checked before it is accepted.
    ///
    /// # Errors
    /// See [`TokenRequest::validate`].
    pub fn new(
        grant_type: GrantType,
        username: Option<String>,
        password: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Self, RequestError> {
        let request = Self { grant_type, username, password, refresh_token };
        request.validate()?;
        Ok(request)
    }

    /// Password grant for `credentials`.
    pub fn password(credentials: &Credentials) -> Self {
        Self {
            grant_type: GrantType::Password,
            username: Some(credentials.username.clone()),
            password: Some(credentials.password.clone()),
            refresh_token: None,
        }
    }

    /// Refresh grant for `refresh_token`.
    pub fn refresh(refresh_token: impl Into<String>) -> Self {
        Self {
            grant_type: GrantType::RefreshToken,
            username: None,
            password: None,
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Grant this request performs.
    pub fn grant_type(&self) -> GrantType {
        self.grant_type
    }

    /// Reject inconsistent grant parameters.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when a refresh token comes with a non-refresh
    /// grant or alongside username and password, or when the grant's required
    /// values are missing.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.refresh_token.is_some() && self.grant_type != GrantType::RefreshToken {
            return Err(RequestError::InvalidArgument(
                "refresh_token provided with a non-refresh grant_type".to_string(),
            ));
        }
        if self.refresh_token.is_some() && self.username.is_some() && self.password.is_some() {
            return Err(RequestError::InvalidArgument(
                "cannot provide both refresh_token and username and password".to_string(),
            ));
        }

        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        match self.grant_type {
            GrantType::Password if !(present(&self.username) && present(&self.password)) => Err(
                RequestError::InvalidArgument("password grant requires username and password".to_string()),
            ),
            GrantType::RefreshToken if !present(&self.refresh_token) => Err(
                RequestError::InvalidArgument("refresh grant requires a refresh_token".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// HTTP Basic client authentication is only sent without a refresh token.
    pub fn uses_basic_auth(&self) -> bool {
        self.refresh_token.is_none()
    }

    /// `POST /oauth/token?grant_type=..[&username=..][&password=..][&refresh_token=..]`
    pub fn route(&self) -> Route {
        let mut template = String::from(TOKEN_PATH);
        template.push_str("?grant_type={grant_type}");
        let mut route_params = vec![("grant_type", ParamValue::raw(self.grant_type))];

        for (name, value) in [
            ("username", &self.username),
            ("password", &self.password),
            ("refresh_token", &self.refresh_token),
        ] {
            if let Some(value) = value {
                template.push_str(&format!("&{name}={{{name}}}"));
                route_params.push((name, ParamValue::text(value.as_str())));
            }
        }

        route_params
            .into_iter()
            .fold(Route::post(template), |route, (name, value)| route.param(name, value))
            .sensitive()
    }
}

impl RequestEngine {
    /// Log in with the password grant, then load the user profile.
    ///
    /// Reopens a closed session. If loading the profile fails the tokens are
    /// discarded and the error is returned.
    ///
    /// # Errors
    /// `Authentication` for rejected credentials, otherwise whatever the token
    /// or profile request returned.
    #[instrument(skip(self, credentials), fields(username = credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserInfo, RequestError> {
        self.session.reopen();
        let tokens = self.request_token(&TokenRequest::password(credentials)).await?;
        self.session.replace(tokens).await;

        match self.execute_json::<UserInfo>(&Route::get(USER_INFO_PATH), RequestOptions::default()).await {
            Ok(user) => {
                info!(login = user.login.as_deref().unwrap_or_default(), "logged in");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "failed to load user profile, discarding tokens");
                self.session.clear().await;
                Err(err)
            }
        }
    }

    /// Exchange the stored refresh token for new tokens now.
    ///
    /// # Errors
    /// `Authentication` when no refresh token is stored or the server rejects
    /// it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), RequestError> {
        self.ensure_open()?;
        let _guard = self.session.lock_refresh().await;
        let state = self.session.snapshot().await;
        self.refresh_with(&state).await
    }

    /// Refresh using the tokens in `state`; the caller holds the refresh lock.
    pub(crate) async fn refresh_with(&self, state: &TokenState) -> Result<(), RequestError> {
        let Some(refresh_token) = state.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
            let route = self.resolve(&Route::post(TOKEN_PATH)).await;
            return Err(RequestError::Authentication(HttpFailure::local(
                route,
                "Access token expired and no refresh token is available",
            )));
        };

        let mut tokens = self.request_token(&TokenRequest::refresh(refresh_token)).await?;
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = state.refresh_token.clone();
        }
        self.session.replace(tokens).await;
        info!("access token refreshed");
        Ok(())
    }

    /// Run one token request and return the resulting state without storing it.
    ///
    /// # Errors
    /// `InvalidArgument` before any I/O for inconsistent parameters;
    /// `Authentication` for 400/401 responses.
    pub async fn request_token(&self, request: &TokenRequest) -> Result<TokenState, RequestError> {
        request.validate()?;
        self.ensure_open()?;

        let resolved = self.resolve(&request.route()).await;
        let mut options = RequestOptions::default();
        if request.uses_basic_auth() {
            options = options.header("Authorization", self.client.basic_header());
        }

        let body = self.dispatch(&resolved, &options, None).await.map_err(reclassify)?;
        let response: TokenResponse = body.decode().map_err(|err| RequestError::Decode {
            route: resolved.clone(),
            message: err.to_string(),
        })?;
        response
            .into_state(Utc::now())
            .map_err(|message| RequestError::Decode { route: resolved, message })
    }
}

/// Token endpoint statuses that mean rejected credentials.
fn reclassify(err: RequestError) -> RequestError {
    match err {
        RequestError::Http(failure) if failure.status == Some(400) => {
            RequestError::Authentication(HttpFailure {
                message: "Authentication failed, invalid username or password".to_string(),
                ..failure
            })
        }
        RequestError::Http(failure) if failure.status == Some(401) => {
            RequestError::Authentication(HttpFailure {
                message: "Basic authentication failed".to_string(),
                ..failure
            })
        }
        other => other,
    }
}
