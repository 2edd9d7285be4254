//! Сценарии записи на съёмку поверх чистого ядра переходов и хранилища
//! черновиков — без транспорта и базы.

use photobot::booking::{
    advance, into_new_booking, parse_count, split_name, Advance, BookingDraft, BookingInput,
    BookingStep,
};
use photobot::session::{Conversation, SessionStore};

fn answer(draft: &mut BookingDraft, text: &str) -> Advance {
    advance(draft, BookingInput::Text(text))
}

fn complete_flow(service: (i32, &str, f64), name: &str, phone: &str) -> BookingDraft {
    let mut draft = BookingDraft::for_service(service.0, service.1, service.2);
    answer(&mut draft, name);
    answer(&mut draft, phone);
    advance(&mut draft, BookingInput::Hours("3"));
    advance(&mut draft, BookingInput::People("2"));
    answer(&mut draft, "Студия у парка");
    answer(&mut draft, "12 января, 11:00");
    answer(&mut draft, "Нет");
    draft
}

#[test]
fn happy_path_collects_every_answer() {
    let draft = complete_flow((5, "Семейная съёмка", 5_000.0), "Пётр Сидоров", "+79990001122");
    assert_eq!(draft.step, BookingStep::Confirming);

    let record = into_new_booking(&draft, 1001, Some("petr".to_string()));
    assert_eq!(record.user_id, 1001);
    assert_eq!(record.service_id, Some(5));
    assert_eq!(record.first_name, "Пётр");
    assert_eq!(record.last_name, "Сидоров");
    assert_eq!(record.phone, "+79990001122");
    assert_eq!(record.hours, 3);
    assert_eq!(record.people_count, 2);
    assert_eq!(record.studio, "Студия у парка");
    assert!(record.wishes.starts_with("Дата: 12 января, 11:00"));
}

#[test]
fn unbounded_sentinel_persists_as_six() {
    let mut draft = BookingDraft::for_service(1, "Съёмка", 1_000.0);
    answer(&mut draft, "Анна");
    answer(&mut draft, "+79991234567");
    advance(&mut draft, BookingInput::Hours("6+"));
    advance(&mut draft, BookingInput::People("6+"));
    answer(&mut draft, "Студия");
    answer(&mut draft, "завтра");
    answer(&mut draft, "Нет");

    let record = into_new_booking(&draft, 7, None);
    assert_eq!(record.hours, 6);
    assert_eq!(record.people_count, 6);
    // В черновике до фиксации остаётся исходный выбор
    assert_eq!(draft.hours.as_deref(), Some("6+"));
}

#[test]
fn rejected_phone_keeps_state_and_data_intact() {
    let mut draft = BookingDraft::for_service(1, "Съёмка", 1_000.0);
    answer(&mut draft, "Анна Иванова");

    assert_eq!(answer(&mut draft, "12-34"), Advance::RetryPhone);
    assert_eq!(draft.step, BookingStep::EnteringPhone);
    assert_eq!(draft.first_name, "Анна");
    assert!(draft.phone.is_empty());

    // После корректного ввода цепочка продолжается как ни в чём не бывало
    assert_eq!(answer(&mut draft, "+7 999 123-45-67"), Advance::AskHours);
}

#[test]
fn malformed_selection_does_not_crash_or_advance() {
    let mut draft = BookingDraft::for_service(1, "Съёмка", 1_000.0);
    answer(&mut draft, "Анна");
    answer(&mut draft, "+79991234567");

    for junk in ["0", "100", "6++", "", "abc"] {
        assert_eq!(advance(&mut draft, BookingInput::Hours(junk)), Advance::Ignored);
        assert_eq!(draft.step, BookingStep::ChoosingHours);
    }
}

#[tokio::test]
async fn abandoned_flow_leaves_no_trace_second_flow_wins() {
    let store = SessionStore::new();
    let user = 42;

    // Первый заход: дошли до телефона и отменили
    let mut first = BookingDraft::for_service(1, "Свадебная", 15_000.0);
    answer(&mut first, "Анна Иванова");
    store.set_conversation(user, Conversation::Booking(first)).await;
    store.clear_conversation(user).await;
    assert!(matches!(store.conversation(user).await, Conversation::Idle));

    // Второй заход доводим до конца
    let second = complete_flow((2, "Семейная", 5_000.0), "Мария Петрова", "+79995554433");
    store.set_conversation(user, Conversation::Booking(second)).await;

    match store.conversation(user).await {
        Conversation::Booking(draft) => {
            let record = into_new_booking(&draft, user as i64, None);
            assert_eq!(record.service_id, Some(2));
            assert_eq!(record.first_name, "Мария");
            assert_eq!(record.phone, "+79995554433");
        }
        other => panic!("unexpected conversation: {:?}", other),
    }
}

#[test]
fn name_splitting_handles_single_word() {
    assert_eq!(split_name("Анна"), ("Анна".to_string(), String::new()));
    assert_eq!(parse_count("5"), 5);
    assert_eq!(parse_count("6+"), 6);
}

#[test]
fn text_during_button_steps_is_ignored() {
    let mut draft = BookingDraft::for_service(1, "Съёмка", 1_000.0);
    answer(&mut draft, "Анна");
    answer(&mut draft, "+79991234567");

    // Свободный текст на шаге с кнопками не двигает автомат
    assert_eq!(answer(&mut draft, "три часа"), Advance::Ignored);
    assert_eq!(draft.step, BookingStep::ChoosingHours);

    // И выбор «часов» на шаге «человек» тоже
    advance(&mut draft, BookingInput::Hours("2"));
    assert_eq!(advance(&mut draft, BookingInput::Hours("3")), Advance::Ignored);
    assert_eq!(draft.step, BookingStep::ChoosingPeople);
}
