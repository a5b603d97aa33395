//! Label name rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{LABEL_DISPLAY_NAME_MAX_LEN, LABEL_NAME_MAX_LEN};
use crate::error::{Error, Result};
use crate::models::CreateLabelRequest;

static LABEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("static regex"));

/// Validate a label machine name (`^[A-Z][A-Z0-9_]*$`).
pub fn validate_label_name(name: &str) -> Result<()> {
    if name.len() > LABEL_NAME_MAX_LEN || !LABEL_NAME_RE.is_match(name) {
        return Err(Error::InvalidLabelName(name.to_string()));
    }
    Ok(())
}

/// Validate every user-supplied field of a custom label request.
pub fn validate_create_request(req: &CreateLabelRequest) -> Result<()> {
    validate_label_name(&req.name)?;

    let display = req.display_name.trim();
    if display.is_empty() {
        return Err(Error::InvalidInput("Display name cannot be empty".into()));
    }
    if display.chars().count() > LABEL_DISPLAY_NAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "Display name must be {} characters or less",
            LABEL_DISPLAY_NAME_MAX_LEN
        )));
    }
    if let Some(days) = req.retention_days {
        if days <= 0 {
            return Err(Error::InvalidInput(
                "Retention days must be a positive number".into(),
            ));
        }
    }
    Ok(())
}

/// Best-effort conversion of free text into a machine name ("Sales call" → "SALES_CALL").
///
/// Used on oracle output, which is asked for uppercase snake-case but not
/// guaranteed to comply.
pub fn normalize_label_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_underscore = true;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
