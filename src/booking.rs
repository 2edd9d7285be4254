//! Запись на съёмку: линейная цепочка шагов, накапливающая черновик
//! заявки. Ядро переходов — чистая функция [`advance`] без транспорта и
//! базы; обработчики ниже только рисуют подсказки и сохраняют итог.

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, ReplyMarkup, UserId};

use crate::db::{self, NewBooking};
use crate::keyboards;
use crate::models::format_price;
use crate::session::{Conversation, NavCursor};
use crate::App;

/// Минимальная длина телефона, введённого текстом.
pub const MIN_PHONE_LEN: usize = 10;

/// Варианты на шагах «часы» и «человек»; «6+» — открытый верх.
pub const COUNT_CHOICES: [&str; 6] = ["1", "2", "3", "4", "5", "6+"];

/// Кнопка отмены на reply-клавиатуре шага с телефоном.
pub const CANCEL_LABEL: &str = "❌ Отмена";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    ChoosingService,
    EnteringName,
    EnteringPhone,
    ChoosingHours,
    ChoosingPeople,
    EnteringStudio,
    EnteringDateTime,
    EnteringWishes,
    Confirming,
}

#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub step: BookingStep,
    pub service_id: Option<i32>,
    pub service_name: Option<String>,
    pub service_price: Option<f64>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub hours: Option<String>,
    pub people: Option<String>,
    pub studio: String,
    pub date_time: String,
    pub wishes: String,
}

impl Default for BookingDraft {
    fn default() -> Self {
        BookingDraft {
            step: BookingStep::ChoosingService,
            service_id: None,
            service_name: None,
            service_price: None,
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            hours: None,
            people: None,
            studio: String::new(),
            date_time: String::new(),
            wishes: String::new(),
        }
    }
}

impl BookingDraft {
    pub fn new() -> Self {
        BookingDraft::default()
    }

    /// Черновик с уже выбранной услугой — вход по кнопке «записаться»
    /// или по deep link.
    pub fn for_service(id: i32, name: &str, price: f64) -> Self {
        BookingDraft {
            step: BookingStep::EnteringName,
            service_id: Some(id),
            service_name: Some(name.to_string()),
            service_price: Some(price),
            ..BookingDraft::default()
        }
    }
}

/// Входной сигнал для чистого ядра переходов.
#[derive(Debug)]
pub enum BookingInput<'a> {
    Text(&'a str),
    Contact(&'a str),
    Hours(&'a str),
    People(&'a str),
}

/// Что показать пользователю после перехода.
#[derive(Debug, PartialEq, Eq)]
pub enum Advance {
    AskPhone,
    RetryPhone,
    AskHours,
    AskPeople,
    AskStudio,
    AskDateTime,
    AskWishes,
    Summary(String),
    /// Сигнал не к месту: состояние не меняется.
    Ignored,
}

/// Общий переход. Невалидный ввод либо переспрашивает тот же шаг
/// (`RetryPhone`), либо молча игнорируется — но никогда не двигает
/// состояние и не падает.
pub fn advance(draft: &mut BookingDraft, input: BookingInput) -> Advance {
    match (draft.step, input) {
        (BookingStep::EnteringName, BookingInput::Text(text)) => {
            let (first, last) = split_name(text);
            draft.first_name = first;
            draft.last_name = last;
            draft.step = BookingStep::EnteringPhone;
            Advance::AskPhone
        }
        (BookingStep::EnteringPhone, BookingInput::Contact(phone)) => {
            draft.phone = phone.to_string();
            draft.step = BookingStep::ChoosingHours;
            Advance::AskHours
        }
        (BookingStep::EnteringPhone, BookingInput::Text(text)) => {
            let phone = text.trim();
            if phone.chars().count() < MIN_PHONE_LEN {
                return Advance::RetryPhone;
            }
            draft.phone = phone.to_string();
            draft.step = BookingStep::ChoosingHours;
            Advance::AskHours
        }
        (BookingStep::ChoosingHours, BookingInput::Hours(choice)) => {
            if !COUNT_CHOICES.contains(&choice) {
                return Advance::Ignored;
            }
            draft.hours = Some(choice.to_string());
            draft.step = BookingStep::ChoosingPeople;
            Advance::AskPeople
        }
        (BookingStep::ChoosingPeople, BookingInput::People(choice)) => {
            if !COUNT_CHOICES.contains(&choice) {
                return Advance::Ignored;
            }
            draft.people = Some(choice.to_string());
            draft.step = BookingStep::EnteringStudio;
            Advance::AskStudio
        }
        (BookingStep::EnteringStudio, BookingInput::Text(text)) => {
            draft.studio = text.trim().to_string();
            draft.step = BookingStep::EnteringDateTime;
            Advance::AskDateTime
        }
        (BookingStep::EnteringDateTime, BookingInput::Text(text)) => {
            draft.date_time = text.trim().to_string();
            draft.step = BookingStep::EnteringWishes;
            Advance::AskWishes
        }
        (BookingStep::EnteringWishes, BookingInput::Text(text)) => {
            draft.wishes = text.trim().to_string();
            draft.step = BookingStep::Confirming;
            Advance::Summary(summary(draft))
        }
        _ => Advance::Ignored,
    }
}

/// Имя и фамилия из одной строки: делим по первому пробелу.
pub fn split_name(text: &str) -> (String, String) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// «6+» хранится в базе как 6: маркер открытого верха срезается.
/// Поведение исходной системы сохранено намеренно.
pub fn parse_count(raw: &str) -> i32 {
    raw.trim().trim_end_matches('+').parse().unwrap_or(1)
}

pub fn summary(draft: &BookingDraft) -> String {
    format!(
        "📋 <b>Проверьте данные заявки:</b>\n\n\
         📸 <b>Услуга:</b> {}\n\
         💰 <b>Стоимость:</b> {} руб.\n\n\
         👤 <b>Имя:</b> {} {}\n\
         📱 <b>Телефон:</b> {}\n\n\
         ⏱ <b>Часов:</b> {}\n\
         👥 <b>Человек:</b> {}\n\
         🏠 <b>Студия:</b> {}\n\
         📅 <b>Дата/время:</b> {}\n\n\
         💭 <b>Пожелания:</b>\n{}",
        draft.service_name.as_deref().unwrap_or("Не выбрана"),
        format_price(draft.service_price.unwrap_or(0.0)),
        draft.first_name,
        draft.last_name,
        draft.phone,
        draft.hours.as_deref().unwrap_or(""),
        draft.people.as_deref().unwrap_or(""),
        draft.studio,
        draft.date_time,
        if draft.wishes.is_empty() { "Нет" } else { &draft.wishes },
    )
}

/// Черновик → запись для вставки. Дата/время и пожелания склеиваются в
/// одно текстовое поле, как в исходной схеме.
pub fn into_new_booking(draft: &BookingDraft, user_id: i64, username: Option<String>) -> NewBooking {
    NewBooking {
        user_id,
        username,
        first_name: draft.first_name.clone(),
        last_name: draft.last_name.clone(),
        phone: draft.phone.clone(),
        service_id: draft.service_id,
        hours: parse_count(draft.hours.as_deref().unwrap_or("1")),
        people_count: parse_count(draft.people.as_deref().unwrap_or("1")),
        studio: draft.studio.clone(),
        wishes: format!("Дата: {}\n{}", draft.date_time, draft.wishes),
    }
}

fn admin_alert(draft: &BookingDraft, username: Option<&str>, booking_id: i32) -> String {
    format!(
        "🆕 <b>Новая заявка #{}</b>\n\n\
         👤 {} {}\n\
         📱 {}\n\
         👤 @{}\n\n\
         📸 <b>Услуга:</b> {}\n\
         ⏱ <b>Часов:</b> {}\n\
         👥 <b>Человек:</b> {}\n\
         🏠 <b>Студия:</b> {}\n\
         📅 <b>Дата:</b> {}\n\n\
         💭 <b>Пожелания:</b>\n{}",
        booking_id,
        draft.first_name,
        draft.last_name,
        draft.phone,
        username.unwrap_or("нет username"),
        draft.service_name.as_deref().unwrap_or("Не выбрана"),
        draft.hours.as_deref().unwrap_or(""),
        draft.people.as_deref().unwrap_or(""),
        draft.studio,
        draft.date_time,
        if draft.wishes.is_empty() { "Нет" } else { &draft.wishes },
    )
}

// ============ Обработчики ============

/// Вход в запись без выбранной услуги: листаем активные услуги.
pub async fn start(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let services = db::list_services(&app.pool, true).await?;
    if services.is_empty() {
        let text = "😔 К сожалению, сейчас нет доступных услуг.\nСвяжитесь с фотографом напрямую.";
        match edit {
            Some(msg_id) => {
                bot.edit_message_text(chat_id, msg_id, text)
                    .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                    .await?;
            }
            None => {
                bot.send_message(chat_id, text)
                    .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                    .await?;
            }
        }
        return Ok(());
    }

    app.sessions
        .set_conversation(user_id.0, Conversation::Booking(BookingDraft::new()))
        .await;
    app.sessions
        .set_nav(user_id.0, NavCursor::Services { index: 0 })
        .await;
    crate::catalog::show_service_at(bot, app, chat_id, edit, &services, 0).await?;
    Ok(())
}

/// Услуга выбрана (кнопкой или deep link). `false` — запись не нашлась.
pub async fn choose_service(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    service_id: i32,
) -> anyhow::Result<bool> {
    let Some(service) = db::get_service(&app.pool, service_id).await? else {
        return Ok(false);
    };

    let draft = BookingDraft::for_service(service.id, &service.name, service.price);
    app.sessions
        .set_conversation(user_id.0, Conversation::Booking(draft))
        .await;

    bot.send_message(
        chat_id,
        format!(
            "✅ Вы выбрали: <b>{}</b>\n\nТеперь введите ваши <b>Имя и Фамилию</b>:",
            service.name
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(true)
}

/// Текст или контакт в активном черновике записи.
pub async fn handle_message(
    bot: &Bot,
    app: &App,
    msg: &Message,
    mut draft: BookingDraft,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let user_id = msg
        .from
        .as_ref()
        .map(|user| user.id.0)
        .unwrap_or(chat_id.0 as u64);

    if msg.text() == Some(CANCEL_LABEL) {
        return cancel(bot, app, chat_id, teloxide::types::UserId(user_id), None).await;
    }

    let reply = if let Some(contact) = msg.contact() {
        advance(&mut draft, BookingInput::Contact(&contact.phone_number))
    } else if let Some(text) = msg.text() {
        advance(&mut draft, BookingInput::Text(text))
    } else {
        Advance::Ignored
    };

    send_reply(bot, chat_id, &reply).await?;
    app.sessions
        .set_conversation(user_id, Conversation::Booking(draft))
        .await;
    Ok(())
}

/// Выбор на шагах «часы»/«человек» (callback-кнопки).
pub async fn handle_choice(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    msg_id: Option<MessageId>,
    mut draft: BookingDraft,
    input: BookingInput<'_>,
) -> anyhow::Result<()> {
    let reply = advance(&mut draft, input);
    match &reply {
        Advance::AskPeople => {
            let text = "👥 Сколько <b>человек</b> будет на съёмке?";
            match msg_id {
                Some(msg_id) => {
                    bot.edit_message_text(chat_id, msg_id, text)
                        .parse_mode(ParseMode::Html)
                        .reply_markup(keyboards::booking_people())
                        .await?;
                }
                None => {
                    bot.send_message(chat_id, text)
                        .parse_mode(ParseMode::Html)
                        .reply_markup(keyboards::booking_people())
                        .await?;
                }
            }
        }
        Advance::AskStudio => {
            let text = "🏠 Введите <b>название студии</b> или место съёмки:\n\n\
                        (Если не определились - напишите 'На выбор фотографа')";
            match msg_id {
                Some(msg_id) => {
                    bot.edit_message_text(chat_id, msg_id, text)
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
                None => {
                    bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await?;
                }
            }
        }
        _ => {}
    }
    app.sessions
        .set_conversation(user_id.0, Conversation::Booking(draft))
        .await;
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Advance) -> anyhow::Result<()> {
    match reply {
        Advance::AskPhone => {
            bot.send_message(
                chat_id,
                "📱 Отправьте ваш <b>номер телефона</b>.\n\n\
                 Можете нажать кнопку ниже или ввести вручную:",
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(ReplyMarkup::Keyboard(keyboards::share_phone()))
            .await?;
        }
        Advance::RetryPhone => {
            bot.send_message(chat_id, "❌ Введите корректный номер телефона:")
                .await?;
        }
        Advance::AskHours => {
            bot.send_message(chat_id, "⏱ Выберите <b>количество часов</b> съёмки:")
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::booking_hours())
                .await?;
        }
        Advance::AskPeople => {
            bot.send_message(chat_id, "👥 Сколько <b>человек</b> будет на съёмке?")
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::booking_people())
                .await?;
        }
        Advance::AskStudio => {
            bot.send_message(
                chat_id,
                "🏠 Введите <b>название студии</b> или место съёмки:\n\n\
                 (Если не определились - напишите 'На выбор фотографа')",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Advance::AskDateTime => {
            bot.send_message(
                chat_id,
                "📅 Введите <b>желаемую дату и время</b> съёмки:\n\n\
                 Например: 25 декабря, 14:00\nИли: Любой выходной в январе",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Advance::AskWishes => {
            bot.send_message(
                chat_id,
                "💭 Есть ли у вас <b>пожелания</b> к съёмке?\n\n\
                 (Тематика, образы, особые моменты...)\nЕсли нет - напишите 'Нет'",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Advance::Summary(summary) => {
            bot.send_message(chat_id, summary.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::booking_confirm())
                .await?;
        }
        Advance::Ignored => {}
    }
    Ok(())
}

/// Подтверждение: единственная точка, где заявка попадает в базу.
/// Уведомляются клиент и все админы; каждая отправка независима.
pub async fn confirm(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    username: Option<String>,
    msg_id: Option<MessageId>,
    draft: BookingDraft,
) -> anyhow::Result<()> {
    let record = into_new_booking(&draft, user_id.0 as i64, username.clone());
    let booking_id = db::insert_booking(&app.pool, &record).await?;
    log::info!("booking #{} created by user {}", booking_id, user_id);

    let ack = format!(
        "✅ <b>Заявка успешно отправлена!</b>\n\n\
         Номер заявки: #{}\n\n\
         Фотограф свяжется с вами в ближайшее время для подтверждения деталей.\n\n\
         Спасибо, что выбрали меня! 📸",
        booking_id
    );
    match msg_id {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, ack)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                .await?;
        }
        None => {
            bot.send_message(chat_id, ack)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                .await?;
        }
    }

    let alert = admin_alert(&draft, username.as_deref(), booking_id);
    app.notifier.broadcast(&app.cfg.admin_ids, &alert).await;

    app.sessions.clear_conversation(user_id.0).await;
    Ok(())
}

/// Отмена доступна с любого шага: черновик выбрасывается целиком,
/// в базе следов нет.
pub async fn cancel(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    msg_id: Option<MessageId>,
) -> anyhow::Result<()> {
    app.sessions.clear_conversation(user_id.0).await;
    let text = "❌ Запись отменена.\n\nВы можете начать заново в любое время!";
    match msg_id {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_to_confirming() -> BookingDraft {
        let mut draft = BookingDraft::for_service(1, "Свадебная съёмка", 15_000.0);
        assert_eq!(advance(&mut draft, BookingInput::Text("Анна Иванова")), Advance::AskPhone);
        assert_eq!(
            advance(&mut draft, BookingInput::Text("+79991234567")),
            Advance::AskHours
        );
        assert_eq!(advance(&mut draft, BookingInput::Hours("2")), Advance::AskPeople);
        assert_eq!(advance(&mut draft, BookingInput::People("6+")), Advance::AskStudio);
        assert_eq!(
            advance(&mut draft, BookingInput::Text("Студия «Свет»")),
            Advance::AskDateTime
        );
        assert_eq!(
            advance(&mut draft, BookingInput::Text("25 декабря, 14:00")),
            Advance::AskWishes
        );
        match advance(&mut draft, BookingInput::Text("Хочу огни гирлянды")) {
            Advance::Summary(_) => {}
            other => panic!("expected summary, got {:?}", other),
        }
        draft
    }

    #[test]
    fn full_walk_reaches_confirming() {
        let draft = walk_to_confirming();
        assert_eq!(draft.step, BookingStep::Confirming);
        assert_eq!(draft.first_name, "Анна");
        assert_eq!(draft.last_name, "Иванова");
        assert_eq!(draft.phone, "+79991234567");
        assert_eq!(draft.hours.as_deref(), Some("2"));
        assert_eq!(draft.people.as_deref(), Some("6+"));
    }

    #[test]
    fn short_phone_reprompts_without_advancing() {
        let mut draft = BookingDraft::for_service(1, "Съёмка", 1000.0);
        advance(&mut draft, BookingInput::Text("Анна"));
        assert_eq!(advance(&mut draft, BookingInput::Text("12345")), Advance::RetryPhone);
        assert_eq!(draft.step, BookingStep::EnteringPhone);
        assert!(draft.phone.is_empty());
    }

    #[test]
    fn contact_share_skips_length_check() {
        let mut draft = BookingDraft::for_service(1, "Съёмка", 1000.0);
        advance(&mut draft, BookingInput::Text("Анна"));
        assert_eq!(advance(&mut draft, BookingInput::Contact("+7999")), Advance::AskHours);
        assert_eq!(draft.phone, "+7999");
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let mut draft = BookingDraft::for_service(1, "Съёмка", 1000.0);
        advance(&mut draft, BookingInput::Text("Анна"));
        advance(&mut draft, BookingInput::Text("+79991234567"));
        assert_eq!(advance(&mut draft, BookingInput::Hours("99")), Advance::Ignored);
        assert_eq!(draft.step, BookingStep::ChoosingHours);
        // Текст на шаге выбора кнопкой тоже игнорируется
        assert_eq!(advance(&mut draft, BookingInput::Text("три часа")), Advance::Ignored);
    }

    #[test]
    fn name_splitting() {
        assert_eq!(split_name("Анна Иванова"), ("Анна".into(), "Иванова".into()));
        assert_eq!(split_name("Анна"), ("Анна".into(), String::new()));
        assert_eq!(
            split_name("  Анна  Петровна Иванова "),
            ("Анна".into(), "Петровна Иванова".into())
        );
    }

    #[test]
    fn unbounded_sentinel_truncates_to_six() {
        assert_eq!(parse_count("6+"), 6);
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count("мусор"), 1);

        let draft = walk_to_confirming();
        let record = into_new_booking(&draft, 42, Some("anna".into()));
        assert_eq!(record.hours, 2);
        assert_eq!(record.people_count, 6);
    }

    #[test]
    fn wishes_field_combines_date_and_wishes() {
        let draft = walk_to_confirming();
        let record = into_new_booking(&draft, 42, None);
        assert_eq!(record.wishes, "Дата: 25 декабря, 14:00\nХочу огни гирлянды");
        assert_eq!(record.service_id, Some(1));
    }

    #[test]
    fn summary_mentions_every_captured_field() {
        let draft = walk_to_confirming();
        let text = summary(&draft);
        for needle in [
            "Свадебная съёмка",
            "15 000",
            "Анна",
            "Иванова",
            "+79991234567",
            "6+",
            "Студия «Свет»",
            "25 декабря, 14:00",
            "Хочу огни гирлянды",
        ] {
            assert!(text.contains(needle), "summary is missing {:?}", needle);
        }
    }
}
