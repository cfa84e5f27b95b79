//! Input validation utilities
//!
//! Registration only insists that every required field is present; usernames,
//! emails and passwords carry no format or length policy of their own.

use crate::models::NewUser;

/// Validate that a required field is present and not blank
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    Ok(())
}

/// Validate the text fields of a registration form
pub fn validate_registration(
    full_name: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), String> {
    validate_required("Full name", full_name)?;
    validate_required("Username", username)?;
    validate_required("Email", email)?;
    validate_required("Password", password)
}

/// Validate a normalized registration payload and its raw password
pub fn validate_new_user(new_user: &NewUser, password: &str) -> Result<(), String> {
    validate_registration(
        &new_user.full_name,
        &new_user.username,
        &new_user.email,
        password,
    )?;
    validate_required("Avatar", &new_user.avatar)
}
