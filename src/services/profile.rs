//! Profile settings for the signed-in user and public doctor profiles.
//!
//! The profile endpoint depends on the role: patients save to
//! `/patients/profiles`, doctors to `/doctors/profiles`. Admins and users
//! without a role have no profile record.

use crate::net::types::{ApiError, DoctorProfile, Profile, ProfileUpdate, Role};
use crate::state::store::SessionStore;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("this account has no profile to edit")]
    NoProfileForRole,
    #[error("a {submitted} profile cannot be saved for a {role} account")]
    RoleMismatch { role: Role, submitted: Role },
    #[error("{}", .0.user_message("Could not load or save the profile."))]
    Api(#[from] ApiError),
}

fn profile_role(store: &SessionStore) -> Result<Role, ProfileError> {
    let session = store.session();
    if !session.is_authenticated() {
        return Err(ProfileError::NotAuthenticated);
    }
    session.role().filter(|r| r.has_profile()).ok_or(ProfileError::NoProfileForRole)
}

/// The signed-in user's profile, or `None` when it has not been created yet.
///
/// # Errors
///
/// Fails when signed out, for roles without a profile, or on backend errors
/// other than 404.
pub async fn fetch_my_profile(store: &SessionStore) -> Result<Option<Profile>, ProfileError> {
    profile_role(store)?;
    match store.call(store.api().my_profile()).await {
        Ok(profile) => Ok(Some(profile)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("profile not created yet");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Create or update the signed-in user's profile.
///
/// # Errors
///
/// Fails when signed out, when the role has no profile, when `update` is for
/// the other role, or when the backend rejects it.
pub async fn save_my_profile(store: &SessionStore, update: &ProfileUpdate) -> Result<Profile, ProfileError> {
    let role = profile_role(store)?;
    if update.role() != role {
        return Err(ProfileError::RoleMismatch { role, submitted: update.role() });
    }

    let saved = match update {
        ProfileUpdate::Patient(patient) => Profile::Patient(store.call(store.api().save_patient_profile(patient)).await?),
        ProfileUpdate::Doctor(doctor) => Profile::Doctor(store.call(store.api().save_doctor_profile(doctor)).await?),
    };
    tracing::info!(role = %role, "profile saved");
    Ok(saved)
}

/// Public profile of a doctor by user id; `None` when there is none.
///
/// # Errors
///
/// Returns [`ProfileError::Api`] for failures other than 404.
pub async fn fetch_doctor_profile(store: &SessionStore, user_id: i64) -> Result<Option<DoctorProfile>, ProfileError> {
    match store.call(store.api().doctor_profile(user_id)).await {
        Ok(profile) => Ok(Some(profile)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
