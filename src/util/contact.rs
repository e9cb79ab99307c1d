//! WhatsApp contact links for drivers and passengers.

#[cfg(test)]
#[path = "contact_test.rs"]
mod contact_test;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const WHATSAPP_BASE: &str = "https://wa.me/";
const INDIA_CODE: &str = "91";

/// Characters a URI component keeps unescaped, as browsers' `encodeURIComponent` does.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Who the message is addressed to; picks the default greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactKind {
    Driver,
    Passenger,
    #[default]
    User,
}

/// Digits only, with the Indian country code added to bare 10-digit numbers.
/// Other lengths are returned cleaned but otherwise untouched.
#[must_use]
pub fn format_phone_for_whatsapp(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        return format!("{INDIA_CODE}{digits}");
    }
    digits
}

/// `https://wa.me/<number>`, with `?text=` when `message` is non-empty.
#[must_use]
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let number = format_phone_for_whatsapp(phone);
    if message.is_empty() {
        return format!("{WHATSAPP_BASE}{number}");
    }
    format!("{WHATSAPP_BASE}{number}?text={}", utf8_percent_encode(message, URI_COMPONENT))
}

/// Human-readable form: `+91 98765 43210` for Indian numbers, digits otherwise.
#[must_use]
pub fn display_phone(phone: &str) -> String {
    let number = format_phone_for_whatsapp(phone);
    match number.strip_prefix(INDIA_CODE) {
        Some(local) if number.len() == 12 => format!("+{INDIA_CODE} {} {}", &local[..5], &local[5..]),
        _ => number,
    }
}

/// Greeting pre-filled into the chat.
#[must_use]
pub fn default_message(kind: ContactKind, name: Option<&str>) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("there");
    let base = format!("Hi {name}, I found you through CarpoolConnect app.");
    match kind {
        ContactKind::Driver => format!("{base} I would like to discuss about the ride."),
        ContactKind::Passenger => format!("{base} I would like to discuss about the ride booking."),
        ContactKind::User => base,
    }
}
