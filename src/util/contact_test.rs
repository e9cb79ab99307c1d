use super::*;

#[test]
fn ten_digit_numbers_gain_country_code() {
    assert_eq!(format_phone_for_whatsapp("98765 43210"), "919876543210");
    assert_eq!(format_phone_for_whatsapp("(987) 654-3210"), "919876543210");
}

#[test]
fn numbers_with_country_code_are_kept() {
    assert_eq!(format_phone_for_whatsapp("+91 98765 43210"), "919876543210");
    assert_eq!(format_phone_for_whatsapp("919876543210"), "919876543210");
}

#[test]
fn other_lengths_are_only_cleaned() {
    assert_eq!(format_phone_for_whatsapp("+44 20 7946 0958"), "442079460958");
    assert_eq!(format_phone_for_whatsapp("12345"), "12345");
    assert_eq!(format_phone_for_whatsapp(""), "");
}

#[test]
fn link_without_message() {
    assert_eq!(whatsapp_link("9876543210", ""), "https://wa.me/919876543210");
}

#[test]
fn link_encodes_message() {
    assert_eq!(
        whatsapp_link("9876543210", "Hi Ravi, 2 seats & 1+1?"),
        "https://wa.me/919876543210?text=Hi%20Ravi%2C%202%20seats%20%26%201%2B1%3F"
    );
}

#[test]
fn whatsapp_link_keeps_uri_component_marks() {
    assert_eq!(
        whatsapp_link("9876543210", "Thanks! (see you ~8:30) it's *great*"),
        "https://wa.me/919876543210?text=Thanks!%20(see%20you%20~8%3A30)%20it's%20*great*"
    );
    assert_eq!(
        whatsapp_link("9876543210", "नमस्ते"),
        "https://wa.me/919876543210?text=%E0%A4%A8%E0%A4%AE%E0%A4%B8%E0%A5%8D%E0%A4%A4%E0%A5%87"
    );
}

#[test]
fn display_phone_groups_indian_numbers() {
    assert_eq!(display_phone("9876543210"), "+91 98765 43210");
    assert_eq!(display_phone("+91-98765-43210"), "+91 98765 43210");
    assert_eq!(display_phone("12345"), "12345");
}

#[test]
fn default_messages_per_kind() {
    assert_eq!(
        default_message(ContactKind::Driver, Some("Ravi")),
        "Hi Ravi, I found you through CarpoolConnect app. I would like to discuss about the ride."
    );
    assert_eq!(
        default_message(ContactKind::Passenger, Some("Asha")),
        "Hi Asha, I found you through CarpoolConnect app. I would like to discuss about the ride booking."
    );
    assert_eq!(default_message(ContactKind::User, None), "Hi there, I found you through CarpoolConnect app.");
    assert_eq!(default_message(ContactKind::User, Some("  ")), "Hi there, I found you through CarpoolConnect app.");
}
