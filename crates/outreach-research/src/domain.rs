//! Domain-input normalization.

use crate::error::ResearchError;

/// Convert raw user input to canonical domain form.
///
/// Examples:
/// - `https://www.stripe.com/pricing` -> `stripe.com`
/// - `APPLE.COM` -> `apple.com`
///
/// Empty or dot-less input is rejected with
/// [`ResearchError::InvalidDomain`].
pub fn normalize_domain(input: &str) -> Result<String, ResearchError> {
    let mut cleaned = input.trim().to_lowercase();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = cleaned.strip_prefix(scheme) {
            cleaned = rest.to_string();
            break;
        }
    }
    let host = cleaned.split('/').next().unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.is_empty() || !host.contains('.') {
        return Err(ResearchError::InvalidDomain {
            input: input.to_string(),
        });
    }
    Ok(host.to_string())
}
