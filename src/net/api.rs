//! REST client for the `MedCare` backend.
//!
//! DESIGN
//! ======
//! [`AuthApi`] is the seam the session store depends on; [`HttpApi`] is the
//! reqwest implementation. Like a browser HTTP client with a default
//! `Authorization` header, the bearer token is held by the client itself:
//! once set it is attached to every request, and clearing it removes the
//! header entirely. Status/body handling is pure (`parse_response`) so it
//! can be tested without a server.

use std::sync::RwLock;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::types::{
    ApiError, DoctorProfile, DoctorProfileUpdate, GoogleProfileRequest, PatientProfile, PatientProfileUpdate,
    Profile, RegisterRequest, TokenResponse, User, VerifyEmailResponse, extract_detail,
};
use crate::config::{ClientConfig, RequestTimeouts, normalize_base_url};

/// Backend operations the client depends on.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Install (or with `None`, remove) the bearer token sent on every request.
    fn set_auth_token(&self, token: Option<&str>);

    /// `POST /token` with form-encoded `username`/`password`.
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// `GET /users/me` using the current bearer token.
    async fn current_user(&self) -> Result<User, ApiError>;

    /// `POST /register`.
    async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError>;

    /// `POST /auth/google` exchanging an authorization code for a token.
    async fn exchange_google_code(&self, code: &str) -> Result<TokenResponse, ApiError>;

    /// `POST /users/me/google-profile`.
    async fn complete_google_profile(&self, request: &GoogleProfileRequest) -> Result<serde_json::Value, ApiError>;

    /// `GET /verify-email?token=...`.
    async fn verify_email(&self, token: &str) -> Result<VerifyEmailResponse, ApiError>;

    /// `GET /users/me/profile`.
    async fn my_profile(&self) -> Result<Profile, ApiError>;

    /// `POST /patients/profiles`.
    async fn save_patient_profile(&self, update: &PatientProfileUpdate) -> Result<PatientProfile, ApiError>;

    /// `POST /doctors/profiles`.
    async fn save_doctor_profile(&self, update: &DoctorProfileUpdate) -> Result<DoctorProfile, ApiError>;

    /// `GET /doctors/{user_id}/profile`.
    async fn doctor_profile(&self, user_id: i64) -> Result<DoctorProfile, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<String>>,
}

impl HttpApi {
    /// Build a client for `base_url` with request and connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(base_url: &str, timeouts: RequestTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: normalize_base_url(base_url), bearer: RwLock::new(None) })
    }

    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_auth_token(&self) -> bool {
        self.bearer.read().map(|b| b.is_some()).unwrap_or(false)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        let bearer = self.bearer.read().ok().and_then(|b| b.clone());
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        parse_response(status, &body)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    fn set_auth_token(&self, token: Option<&str>) {
        if let Ok(mut bearer) = self.bearer.write() {
            *bearer = token.map(str::to_owned);
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let form = [("username", email), ("password", password)];
        self.send(self.request(reqwest::Method::POST, "/token").form(&form)).await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.send(self.request(reqwest::Method::GET, "/users/me")).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.send(self.request(reqwest::Method::POST, "/register").json(request)).await
    }

    async fn exchange_google_code(&self, code: &str) -> Result<TokenResponse, ApiError> {
        let body = serde_json::json!({ "code": code });
        self.send(self.request(reqwest::Method::POST, "/auth/google").json(&body)).await
    }

    async fn complete_google_profile(&self, request: &GoogleProfileRequest) -> Result<serde_json::Value, ApiError> {
        self.send(self.request(reqwest::Method::POST, "/users/me/google-profile").json(request)).await
    }

    async fn verify_email(&self, token: &str) -> Result<VerifyEmailResponse, ApiError> {
        let query = [("token", token)];
        self.send(self.request(reqwest::Method::GET, "/verify-email").query(&query)).await
    }

    async fn my_profile(&self) -> Result<Profile, ApiError> {
        self.send(self.request(reqwest::Method::GET, "/users/me/profile")).await
    }

    async fn save_patient_profile(&self, update: &PatientProfileUpdate) -> Result<PatientProfile, ApiError> {
        self.send(self.request(reqwest::Method::POST, "/patients/profiles").json(update)).await
    }

    async fn save_doctor_profile(&self, update: &DoctorProfileUpdate) -> Result<DoctorProfile, ApiError> {
        self.send(self.request(reqwest::Method::POST, "/doctors/profiles").json(update)).await
    }

    async fn doctor_profile(&self, user_id: i64) -> Result<DoctorProfile, ApiError> {
        let path = format!("/doctors/{user_id}/profile");
        self.send(self.request(reqwest::Method::GET, &path)).await
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else if error.is_decode() {
        ApiError::Parse(error.to_string())
    } else {
        ApiError::Request(error.to_string())
    }
}

fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, detail: extract_detail(body) });
    }
    // 204 responses have no body; decode them as JSON null.
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
