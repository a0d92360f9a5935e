//! Outbound seller contact links

use url::Url;

const DEFAULT_COUNTRY_CODE: &str = "+91";

/// WhatsApp chat link pre-filled with an enquiry about `listing_title`
///
/// Returns `None` when the seller has no usable phone number.
pub fn whatsapp_link(phone_number: Option<&str>, listing_title: &str) -> Option<Url> {
    let compact: String = phone_number?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }

    let international = if compact.starts_with('+') {
        compact
    } else {
        format!("{}{}", DEFAULT_COUNTRY_CODE, compact)
    };
    let digits = &international[1..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let message = format!(
        "Hello, I'm interested in your listing: {} on IIIT RKV Campus Market.",
        listing_title
    );

    Url::parse_with_params(&format!("https://wa.me/{}", digits), &[("text", message)]).ok()
}
