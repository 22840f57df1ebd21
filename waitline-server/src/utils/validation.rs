//! Input validation helpers
//!
//! Centralized text limits and field validation for the check-in surfaces.
//! Helpers return plain `Result<_, String>` with a field-level message; the
//! queue manager and handlers wrap them into their own error types.

// ── Limits ──────────────────────────────────────────────────────────

/// Customer names
pub const MAX_NAME_LEN: usize = 200;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Party size upper bound; a larger group is almost certainly a typo
pub const MAX_PARTY_SIZE: u32 = 100;

/// E.164: country code + subscriber number, 15 digits max
const E164_MAX_DIGITS: usize = 15;
const E164_MIN_DIGITS: usize = 7;

// ── Helpers ─────────────────────────────────────────────────────────

/// Normalize a phone number to E.164 form (`+` followed by 7-15 digits).
///
/// Accepts common formatting noise (spaces, dashes, dots, parentheses) and a
/// leading `00` international prefix. A number without any international
/// prefix is rejected rather than guessed at.
pub fn normalize_phone(raw: &str) -> Result<String, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let digits = if let Some(rest) = cleaned.strip_prefix('+') {
        rest.to_string()
    } else if let Some(rest) = cleaned.strip_prefix("00") {
        rest.to_string()
    } else {
        return Err("phone must include an international prefix (+NN...)".to_string());
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("phone contains invalid characters".to_string());
    }
    if digits.len() < E164_MIN_DIGITS || digits.len() > E164_MAX_DIGITS {
        return Err(format!(
            "phone must have {E164_MIN_DIGITS}-{E164_MAX_DIGITS} digits, got {}",
            digits.len()
        ));
    }
    if digits.starts_with('0') {
        return Err("phone country code must not start with 0".to_string());
    }

    Ok(format!("+{digits}"))
}

/// Validate a customer name (non-empty, within limit).
pub fn validate_name(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    if value.len() > MAX_NAME_LEN {
        return Err(format!(
            "name is too long ({} chars, max {MAX_NAME_LEN})",
            value.len()
        ));
    }
    Ok(())
}

/// Minimal shape check for email addresses.
pub fn validate_email(value: &str) -> Result<(), String> {
    if value.len() > MAX_EMAIL_LEN {
        return Err(format!(
            "email is too long ({} chars, max {MAX_EMAIL_LEN})",
            value.len()
        ));
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err("email must contain @".to_string());
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("email format is invalid".to_string());
    }
    Ok(())
}

/// Validate a party size (1 up to [`MAX_PARTY_SIZE`]).
pub fn validate_party_size(value: u32) -> Result<(), String> {
    if value == 0 {
        return Err("party_size must be at least 1".to_string());
    }
    if value > MAX_PARTY_SIZE {
        return Err(format!("party_size must be at most {MAX_PARTY_SIZE}"));
    }
    Ok(())
}
