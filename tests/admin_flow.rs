//! Админ-инварианты: разбор callback-команд, допустимые переходы
//! статусов и деградация карточек при удалённых записях.

use chrono::Utc;

use photobot::actions::{Action, EditField};
use photobot::admin::{booking_detail_text, is_skip, is_valid_page_url};
use photobot::keyboards;
use photobot::models::{parse_price, Booking, BookingStatus, ProductKind};
use teloxide::types::InlineKeyboardButtonKind;

fn booking_with_status(status: &str) -> Booking {
    Booking {
        id: 11,
        user_id: 500,
        username: Some("guest".to_string()),
        first_name: "Ольга".to_string(),
        last_name: String::new(),
        phone: "+79990000000".to_string(),
        service_id: Some(3),
        hours: 1,
        people_count: 2,
        studio: "Дом".to_string(),
        wishes: "Дата: в субботу\nБез пожеланий".to_string(),
        status: status.to_string(),
        created_at: Utc::now(),
    }
}

fn payloads(markup: &teloxide::types::InlineKeyboardMarkup) -> Vec<String> {
    markup
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn transition_rules_match_offered_actions() {
    // То, что нельзя сделать переходом, не предлагается кнопкой
    for (status, raw) in [
        (BookingStatus::New, "new"),
        (BookingStatus::Confirmed, "confirmed"),
        (BookingStatus::Completed, "completed"),
        (BookingStatus::Cancelled, "cancelled"),
    ] {
        let booking = booking_with_status(raw);
        let offered = payloads(&keyboards::admin_booking_view(booking.id, booking.status()));
        let confirm_offered = offered.iter().any(|p| p.starts_with("admin_b_confirm"));
        let complete_offered = offered.iter().any(|p| p.starts_with("admin_b_complete"));
        let cancel_offered = offered.iter().any(|p| p.starts_with("admin_b_cancel"));

        assert_eq!(confirm_offered, status.can_transition(BookingStatus::Confirmed));
        assert_eq!(complete_offered, status.can_transition(BookingStatus::Completed));
        assert_eq!(cancel_offered, status.can_transition(BookingStatus::Cancelled));
    }
}

#[test]
fn terminal_status_rejects_direct_transition() {
    let completed = booking_with_status("completed");
    for target in [
        BookingStatus::New,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ] {
        assert!(!completed.status().can_transition(target));
    }
}

#[test]
fn booking_card_survives_deleted_service() {
    let booking = booking_with_status("new");
    let text = booking_detail_text(&booking, None);
    assert!(text.contains("Услуга недоступна"));
    assert!(text.contains("Ольга"));

    let with_service = booking_detail_text(&booking, Some("Свадебная съёмка"));
    assert!(with_service.contains("Свадебная съёмка"));
}

#[test]
fn price_input_validation_round() {
    assert_eq!(parse_price("1 500,50"), Some(1500.50));
    assert_eq!(parse_price("1500.50"), Some(1500.50));
    assert_eq!(parse_price("abc"), None);
}

#[test]
fn product_kind_step_accepts_synonyms_only() {
    assert_eq!(ProductKind::parse_keyword("/digital"), Some(ProductKind::Digital));
    assert_eq!(ProductKind::parse_keyword("Бумажный коллаж"), Some(ProductKind::Paper));
    assert_eq!(ProductKind::parse_keyword("пластиковый"), None);
}

#[test]
fn photo_step_skip_words() {
    for word in ["пропустить", "Skip", "-"] {
        assert!(is_skip(word));
    }
    assert!(!is_skip("photo.jpg"));
}

#[test]
fn page_link_validation() {
    assert!(is_valid_page_url("https://telegra.ph/usluga-01-01"));
    assert!(!is_valid_page_url("telegra.ph/usluga"));
}

#[test]
fn stale_callback_payloads_parse_into_typed_actions() {
    // Полный путь кнопки: собрали payload — разобрали обратно
    let actions = [
        Action::AdminBookingConfirm(11),
        Action::AdminBookingComplete(11),
        Action::AdminBookingCancel(11),
        Action::AdminServiceField(4, EditField::Price),
        Action::AdminProductField(9, EditField::Kind),
        Action::AdminBookings(2),
    ];
    for action in actions {
        assert_eq!(Action::parse(&action.encode()), Some(action));
    }
    // Мусор с границы транспорта не превращается в действие
    for junk in ["admin_b_confirm:", "admin_b_confirm:x", "admin_se_field:1", "drop table"] {
        assert_eq!(Action::parse(junk), None);
    }
}
