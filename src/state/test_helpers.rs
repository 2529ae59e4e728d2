//! Shared fixtures for unit tests: users, sessions, and an in-memory backend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::net::api::AuthApi;
use crate::net::types::{
    ApiError, DoctorProfile, DoctorProfileUpdate, GoogleProfileRequest, PatientProfile, PatientProfileUpdate,
    Profile, RegisterRequest, Role, TokenResponse, User, VerifyEmailResponse,
};
use crate::state::session::{AuthPhase, Session};

#[must_use]
pub fn user(id: i64, role: Option<Role>, is_active: bool) -> User {
    User { id, email: format!("user{id}@medcare.test"), role, is_active }
}

/// A verified session for `user`.
#[must_use]
pub fn signed_in(user: User) -> Session {
    let mut session = Session::default();
    session.authenticate(format!("token-{}", user.id), user, AuthPhase::Verified);
    session
}

/// Unique scratch path for file-backed storage tests.
#[must_use]
pub fn temp_path(name: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir()
        .join(format!("medcare-test-{}-{name}-{n}", std::process::id()))
        .join("session.json")
}

fn status(status: u16, detail: &str) -> ApiError {
    ApiError::Status { status, detail: Some(detail.to_owned()) }
}

struct Account {
    password: String,
    token: String,
}

/// In-memory stand-in for the REST backend.
///
/// Google codes are single use, exactly like the real provider: a second
/// exchange of the same code fails.
#[derive(Default)]
pub struct MockApi {
    bearer: Mutex<Option<String>>,
    accounts: Mutex<HashMap<String, Account>>,
    users_by_token: Mutex<HashMap<String, User>>,
    google_codes: Mutex<HashMap<String, String>>,
    profiles: Mutex<HashMap<i64, Profile>>,
    calls: Mutex<Vec<&'static str>>,
    identity_gate: Mutex<Option<Arc<Notify>>>,
    hang_identity: AtomicBool,
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a password account whose login yields `token`.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, token: &str, user: User) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_owned(), Account { password: password.to_owned(), token: token.to_owned() });
        self.with_token(token, user)
    }

    /// Make `token` resolve to `user` on `/users/me`.
    #[must_use]
    pub fn with_token(self, token: &str, user: User) -> Self {
        self.users_by_token.lock().unwrap().insert(token.to_owned(), user);
        self
    }

    #[must_use]
    pub fn with_google_code(self, code: &str, token: &str, user: User) -> Self {
        self.google_codes.lock().unwrap().insert(code.to_owned(), token.to_owned());
        self.with_token(token, user)
    }

    #[must_use]
    pub fn with_profile(self, user_id: i64, profile: Profile) -> Self {
        self.profiles.lock().unwrap().insert(user_id, profile);
        self
    }

    /// Make `/users/me` wait until the returned handle is notified.
    pub fn gate_identity(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.identity_gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    /// Make `/users/me` never answer.
    pub fn hang_identity(&self) {
        self.hang_identity.store(true, Ordering::SeqCst);
    }

    pub fn revoke(&self, token: &str) {
        self.users_by_token.lock().unwrap().remove(token);
    }

    #[must_use]
    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.bearer.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn bearer_user(&self) -> Result<User, ApiError> {
        let bearer = self.bearer().ok_or_else(|| status(401, "Not authenticated"))?;
        self.users_by_token
            .lock()
            .unwrap()
            .get(&bearer)
            .cloned()
            .ok_or_else(|| status(401, "Could not validate credentials"))
    }
}

#[async_trait::async_trait]
impl AuthApi for MockApi {
    fn set_auth_token(&self, token: Option<&str>) {
        *self.bearer.lock().unwrap() = token.map(str::to_owned);
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        self.record("login");
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some(account) if account.password == password => {
                Ok(TokenResponse { access_token: account.token.clone(), token_type: Some("bearer".into()) })
            }
            _ => Err(status(401, "Incorrect email or password")),
        }
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.record("current_user");
        // The bearer is bound when the request is built, as with a real client.
        let identity = self.bearer_user();
        let gate = self.identity_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.hang_identity.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        identity
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.record("register");
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&request.email) {
            return Err(status(400, "Email already registered"));
        }
        let id = i64::try_from(accounts.len()).unwrap_or(0) + 100;
        accounts.insert(
            request.email.clone(),
            Account { password: request.password.clone(), token: format!("token-{id}") },
        );
        Ok(User { id, email: request.email.clone(), role: Some(request.role), is_active: false })
    }

    async fn exchange_google_code(&self, code: &str) -> Result<TokenResponse, ApiError> {
        self.record("exchange_google_code");
        self.google_codes
            .lock()
            .unwrap()
            .remove(code)
            .map(|token| TokenResponse { access_token: token, token_type: None })
            .ok_or_else(|| status(400, "Invalid or already used authorization code"))
    }

    async fn complete_google_profile(&self, request: &GoogleProfileRequest) -> Result<serde_json::Value, ApiError> {
        self.record("complete_google_profile");
        let bearer = self.bearer().ok_or_else(|| status(401, "Not authenticated"))?;
        let mut users = self.users_by_token.lock().unwrap();
        let user = users.get_mut(&bearer).ok_or_else(|| status(401, "Could not validate credentials"))?;
        user.role = Some(request.role);
        user.is_active = true;
        Ok(serde_json::json!({ "id": user.id, "role": request.role }))
    }

    async fn verify_email(&self, token: &str) -> Result<VerifyEmailResponse, ApiError> {
        self.record("verify_email");
        match token {
            "good" => Ok(VerifyEmailResponse { message: Some("Email successfully verified. You can now log in.".into()) }),
            "quiet" => Ok(VerifyEmailResponse { message: None }),
            "old" => Err(status(400, "Verification token expired")),
            "boom" => Err(ApiError::Status { status: 500, detail: None }),
            _ => Err(status(400, "Invalid verification token")),
        }
    }

    async fn my_profile(&self) -> Result<Profile, ApiError> {
        self.record("my_profile");
        let user = self.bearer_user()?;
        self.profiles
            .lock()
            .unwrap()
            .get(&user.id)
            .cloned()
            .ok_or_else(|| status(404, "Patient profile not found"))
    }

    async fn save_patient_profile(&self, update: &PatientProfileUpdate) -> Result<PatientProfile, ApiError> {
        self.record("save_patient_profile");
        let user = self.bearer_user()?;
        let saved = PatientProfile {
            id: 1,
            user_id: user.id,
            full_name: update.full_name.clone(),
            contact_phone: update.contact_phone.clone(),
            contact_address: update.contact_address.clone(),
        };
        self.profiles.lock().unwrap().insert(user.id, Profile::Patient(saved.clone()));
        Ok(saved)
    }

    async fn save_doctor_profile(&self, update: &DoctorProfileUpdate) -> Result<DoctorProfile, ApiError> {
        self.record("save_doctor_profile");
        let user = self.bearer_user()?;
        let saved = DoctorProfile {
            id: 1,
            user_id: user.id,
            full_name: update.full_name.clone(),
            specialization: update.specialization.clone(),
            experience: update.experience.clone(),
            education: update.education.clone(),
            cost_per_consultation: update.cost_per_consultation,
            practice_areas: update.practice_areas.clone(),
            is_verified: false,
        };
        self.profiles.lock().unwrap().insert(user.id, Profile::Doctor(saved.clone()));
        Ok(saved)
    }

    async fn doctor_profile(&self, user_id: i64) -> Result<DoctorProfile, ApiError> {
        self.record("doctor_profile");
        match self.profiles.lock().unwrap().get(&user_id) {
            Some(Profile::Doctor(profile)) => Ok(profile.clone()),
            _ => Err(status(404, "Doctor profile not found for this user")),
        }
    }
}
