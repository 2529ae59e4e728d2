//! Local form validation, run before any network call.
//!
//! Each form turns raw user input into the request payload the backend
//! expects. Limits mirror the backend schema so most mistakes are caught
//! without a round trip.

use crate::net::types::{DoctorProfileUpdate, GoogleProfileRequest, PatientProfileUpdate, RegisterRequest, Role};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 50;
pub const MAX_ADDRESS_LEN: usize = 255;
pub const MAX_SPECIALIZATION_LEN: usize = 255;
pub const MAX_EXPERIENCE_LEN: usize = 255;
pub const MAX_EDUCATION_LEN: usize = 1000;
pub const MAX_PRACTICE_AREAS_LEN: usize = 511;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please fill in both email and password.")]
    MissingCredentials,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Accounts can only be created as patient or doctor, not {0}.")]
    RoleNotSelectable(Role),
    #[error("{field} is required.")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters.")]
    TooLong { field: &'static str, max: usize },
    #[error("Please enter a valid consultation cost (a number greater than 0).")]
    InvalidCost,
}

// =============================================================================
// HELPERS
// =============================================================================

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
        && !email.chars().any(char::is_whitespace)
}

/// Trimmed value, or `None` when blank.
fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), FormError> {
    match value {
        Some(v) if v.chars().count() > max => Err(FormError::TooLong { field, max }),
        _ => Ok(()),
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, FormError> {
    let value = optional(value).ok_or(FormError::Required { field })?;
    check_len(field, Some(&value), max)?;
    Ok(value)
}

fn selectable_role(role: Role) -> Result<Role, FormError> {
    if role.has_profile() { Ok(role) } else { Err(FormError::RoleNotSelectable(role)) }
}

// =============================================================================
// AUTH FORMS
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns [`FormError::MissingCredentials`] when either field is blank.
    pub fn validate(&self) -> Result<(&str, &str), FormError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        Ok((email, &self.password))
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub full_name: String,
    pub contact_phone: String,
}

impl RegistrationForm {
    /// Check the form and build the `/register` payload.
    ///
    /// # Errors
    ///
    /// Returns the first [`FormError`] found.
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        let email = self.email.trim();
        if !looks_like_email(email) {
            return Err(FormError::InvalidEmail);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }
        let role = selectable_role(self.role)?;

        let full_name = optional(&self.full_name);
        let contact_phone = optional(&self.contact_phone);
        check_len("Full name", full_name.as_deref(), MAX_NAME_LEN)?;
        check_len("Phone", contact_phone.as_deref(), MAX_PHONE_LEN)?;

        Ok(RegisterRequest { email: email.to_owned(), password: self.password.clone(), role, full_name, contact_phone })
    }
}

/// Role choice for a first-time Google user.
#[derive(Debug, Clone)]
pub struct GoogleProfileForm {
    pub role: Role,
    pub full_name: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub district: String,
}

impl GoogleProfileForm {
    /// # Errors
    ///
    /// Returns the first [`FormError`] found.
    pub fn validate(&self) -> Result<GoogleProfileRequest, FormError> {
        let role = selectable_role(self.role)?;
        let full_name = required("Full name", &self.full_name, MAX_NAME_LEN)?;
        let contact_phone = self.contact_phone.trim().to_owned();
        let contact_address = self.contact_address.trim().to_owned();
        check_len("Phone", Some(&contact_phone), MAX_PHONE_LEN)?;
        check_len("Address", Some(&contact_address), MAX_ADDRESS_LEN)?;
        Ok(GoogleProfileRequest {
            role,
            full_name,
            contact_phone,
            contact_address,
            district: self.district.trim().to_owned(),
        })
    }
}

// =============================================================================
// PROFILE FORMS
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct PatientProfileForm {
    pub full_name: String,
    pub contact_phone: String,
    pub contact_address: String,
}

impl PatientProfileForm {
    /// Every field is optional; blank fields are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::TooLong`] for oversized fields.
    pub fn validate(&self) -> Result<PatientProfileUpdate, FormError> {
        let update = PatientProfileUpdate {
            full_name: optional(&self.full_name),
            contact_phone: optional(&self.contact_phone),
            contact_address: optional(&self.contact_address),
        };
        check_len("Full name", update.full_name.as_deref(), MAX_NAME_LEN)?;
        check_len("Phone", update.contact_phone.as_deref(), MAX_PHONE_LEN)?;
        check_len("Address", update.contact_address.as_deref(), MAX_ADDRESS_LEN)?;
        Ok(update)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorProfileForm {
    pub full_name: String,
    pub specialization: String,
    pub experience: String,
    pub education: String,
    /// Raw input; must parse as a whole number above zero.
    pub cost_per_consultation: String,
    pub practice_areas: String,
}

impl DoctorProfileForm {
    /// # Errors
    ///
    /// Returns the first [`FormError`] found.
    pub fn validate(&self) -> Result<DoctorProfileUpdate, FormError> {
        let specialization = required("Specialization", &self.specialization, MAX_SPECIALIZATION_LEN)?;
        let cost_per_consultation = match self.cost_per_consultation.trim().parse::<i64>() {
            Ok(cost) if cost > 0 => cost,
            _ => return Err(FormError::InvalidCost),
        };

        let update = DoctorProfileUpdate {
            full_name: optional(&self.full_name),
            specialization,
            experience: optional(&self.experience),
            education: optional(&self.education),
            cost_per_consultation,
            practice_areas: optional(&self.practice_areas),
        };
        check_len("Full name", update.full_name.as_deref(), MAX_NAME_LEN)?;
        check_len("Experience", update.experience.as_deref(), MAX_EXPERIENCE_LEN)?;
        check_len("Education", update.education.as_deref(), MAX_EDUCATION_LEN)?;
        check_len("Practice areas", update.practice_areas.as_deref(), MAX_PRACTICE_AREAS_LEN)?;
        Ok(update)
    }
}

#[cfg(test)]
#[path = "forms_test.rs"]
mod tests;
