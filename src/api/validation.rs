use super::ApiError;

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation(
            "Invalid page: 0. Pages are numbered from 1",
        ));
    }
    Ok(page)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    let well_formed = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if trimmed.is_empty() || trimmed.len() > 254 || !well_formed {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }
    Ok(password)
}

pub fn validate_full_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if !(2..=100).contains(&trimmed.len()) {
        return Err(ApiError::validation(
            "Full name must be 2-100 characters",
        ));
    }
    Ok(trimmed)
}

pub fn validate_phone(phone: &str) -> Result<&str, ApiError> {
    let trimmed = phone.trim();
    if !(8..=20).contains(&trimmed.len()) {
        return Err(ApiError::validation(
            "Phone number must be 8-20 characters",
        ));
    }
    Ok(trimmed)
}
