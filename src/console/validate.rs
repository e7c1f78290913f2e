//! Input checks applied by the console before anything reaches the core.
//!
//! These are stricter than the entity rules: a project name also needs a
//! minimum length and must be usable in a file name, since reports are
//! named after their project.

use crate::error::{Error, Result};
use crate::models::{MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};

pub const MIN_NAME_LENGTH: usize = 2;
pub const FORBIDDEN_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Trimmed project name, or why it is unacceptable.
pub fn project_name(input: &str) -> Result<String> {
    let name = input.trim();
    let length = name.chars().count();

    if name.is_empty() {
        return Err(Error::Validation("Name is required".into()));
    }
    if length < MIN_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "Name must be at least {} characters",
            MIN_NAME_LENGTH
        )));
    }
    if length > MAX_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "Name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(Error::Validation(format!("Name must not contain '{}'", c)));
    }

    Ok(name.to_string())
}

pub fn description(input: &str) -> Result<String> {
    let text = input.trim();
    if text.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::Validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(text.to_string())
}

/// A positive integer id.
pub fn id(input: &str) -> Result<i64> {
    let text = input.trim();
    if text.is_empty() {
        return Err(Error::Validation("No id entered".into()));
    }
    match text.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(Error::Validation("Id must be a positive number".into())),
        Err(_) => Err(Error::Validation(format!("'{}' is not a valid number", text))),
    }
}

/// Interpret a yes/no answer. Empty input means `default`.
pub fn confirmation(input: &str, default: bool) -> bool {
    match input.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" | "j" | "ja" => true,
        _ => false,
    }
}
