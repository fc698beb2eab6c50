//! Input validation for account fields and free text sent to the generator.

/// Account field validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccountFieldError {
    #[error("Email address looks invalid")]
    InvalidEmail,

    #[error("Name is too short (minimum 2 characters)")]
    NameTooShort,

    #[error("Name is too long (maximum {max} characters)")]
    NameTooLong { max: usize },

    #[error("Name contains control characters")]
    ControlCharacters,

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long")]
    PasswordTooLong,
}

pub const MAX_NAME_CHARS: usize = 30;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
/// Cap on oracle prompts, mission reports and tavern chat.
pub const MAX_FREE_TEXT_CHARS: usize = 500;

/// Normalize and check an email address. Returns the trimmed, lowercased form.
pub fn validate_email(email: &str) -> Result<String, AccountFieldError> {
    let trimmed = email.trim().to_ascii_lowercase();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(AccountFieldError::InvalidEmail);
    };
    if local.is_empty()
        || domain.len() < 3
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || trimmed.chars().any(|c| c.is_whitespace() || c.is_control())
        || domain.contains('@')
    {
        return Err(AccountFieldError::InvalidEmail);
    }
    Ok(trimmed)
}

/// Check a display name. Unicode (emoji included) is fine; control characters are not.
pub fn validate_display_name(name: &str) -> Result<String, AccountFieldError> {
    let trimmed = name.trim();
    let count = trimmed.chars().count();
    if count < 2 {
        return Err(AccountFieldError::NameTooShort);
    }
    if count > MAX_NAME_CHARS {
        return Err(AccountFieldError::NameTooLong { max: MAX_NAME_CHARS });
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(AccountFieldError::ControlCharacters);
    }
    Ok(trimmed.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AccountFieldError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AccountFieldError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AccountFieldError::PasswordTooLong);
    }
    Ok(())
}

/// Trim free text, drop control characters except newlines, and cap its length.
/// Returns `None` when nothing meaningful is left.
pub fn sanitize_free_text(text: &str) -> Option<String> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .take(MAX_FREE_TEXT_CHARS)
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
