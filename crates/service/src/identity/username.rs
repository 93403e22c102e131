//! Display-name and username derivation for first-login provisioning.

/// Last-resort name when neither the profile nor the email yields one.
pub const FALLBACK_NAME: &str = "user";

/// Longest base kept, leaving room for a numeric suffix in the 64-char column.
pub const MAX_BASE_LEN: usize = 48;

/// Trim and lower-case an email; `None` when absent or blank.
pub fn normalize_email(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|e| !e.is_empty()).map(str::to_lowercase)
}

/// Everything before the first `@`.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}

/// Provided display name, else the email local part, else [`FALLBACK_NAME`].
pub fn display_name(provided: Option<&str>, email: &str) -> String {
    if let Some(name) = provided.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let local = email_local_part(email);
    if local.is_empty() { FALLBACK_NAME.to_string() } else { local.to_string() }
}

/// Strip everything but ASCII letters and digits from the display name and
/// lower-case it. Falls back to the email local part, then [`FALLBACK_NAME`].
/// The result is cut to [`MAX_BASE_LEN`] characters.
pub fn base_username(display_name: &str, email: &str) -> String {
    let stripped: String = display_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_BASE_LEN)
        .collect();
    if !stripped.is_empty() {
        return stripped;
    }
    let local: String = email_local_part(email).to_lowercase().chars().take(MAX_BASE_LEN).collect();
    if local.is_empty() { FALLBACK_NAME.to_string() } else { local }
}

/// `suffix == 0` is the bare base; otherwise the integer is appended.
pub fn candidate(base: &str, suffix: u32) -> String {
    if suffix == 0 { base.to_string() } else { format!("{base}{suffix}") }
}
