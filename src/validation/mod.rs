use std::fmt;

use crate::domain::MAX_MESSAGE_LEN;
use crate::domain::review::{MAX_COMMENT_LEN, MAX_RATING, MIN_RATING};

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const CATEGORY_MAX_LEN: usize = 100;
pub const MIN_PRICE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Trims and lowercases an email the way it is stored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "Por favor completa todos los campos"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("El campo {} no puede superar {} caracteres", field, max_len),
        ));
    }

    Ok(())
}

/// Whole-string `\S+@\S+\.\S+`.
pub fn validate_email(email: &str) -> ValidationResult {
    let invalid = || ValidationError::new("email", "Por favor ingresa un email válido");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() {
        return Err(invalid());
    }
    // The dot must have at least one character on each side within the domain.
    let has_dot = domain
        .char_indices()
        .any(|(i, ch)| ch == '.' && i > 0 && i + 1 < domain.len());
    if !has_dot {
        return Err(invalid());
    }
    validate_max_len("email", email, EMAIL_MAX_LEN)
}

pub fn validate_password(password: &str) -> ValidationResult {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::new(
            "password",
            format!("La contraseña debe tener al menos {} caracteres", PASSWORD_MIN_LEN),
        ));
    }

    Ok(())
}

pub fn validate_price(price: i64) -> ValidationResult {
    if price < MIN_PRICE {
        return Err(ValidationError::new("trueqqPrice", "El precio debe ser mayor a 0"));
    }

    Ok(())
}

pub fn validate_rating(rating: i32) -> ValidationResult {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::new(
            "rating",
            format!("La calificación debe ser entre {} y {}", MIN_RATING, MAX_RATING),
        ));
    }

    Ok(())
}

pub fn validate_comment(comment: &str) -> ValidationResult {
    validate_max_len("comment", comment, MAX_COMMENT_LEN)
}

/// Chat content: non-empty after trimming, at most 1000 characters.
pub fn validate_message_content(content: &str) -> ValidationResult {
    if content.trim().is_empty() {
        return Err(ValidationError::new("content", "El mensaje no puede estar vacío"));
    }
    validate_max_len("content", content, MAX_MESSAGE_LEN)
}
