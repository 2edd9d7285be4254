//! Админ-панель: управление каталогом, заявками и переписка с клиентом.
//! Каждая точка входа проверяет, что инициатор входит в список админов;
//! всем остальным — краткий отказ без смены состояния.

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, UserId};

use crate::actions::EditField;
use crate::db::{self, NewProduct, NewService};
use crate::keyboards;
use crate::models::{format_price, parse_price, Booking, BookingStatus, ProductKind};
use crate::session::Conversation;
use crate::App;

/// Страница списка заявок.
pub const BOOKINGS_PAGE_SIZE: i64 = 10;

const SKIP_KEYWORDS: [&str; 3] = ["пропустить", "skip", "-"];

pub fn is_skip(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    SKIP_KEYWORDS.contains(&text.as_str())
}

/// Ссылка на внешнюю страницу принимается как есть, но только с
/// протоколом http/https.
pub fn is_valid_page_url(text: &str) -> bool {
    text.starts_with("http")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddServiceStep {
    Name,
    Description,
    Price,
    Duration,
    Photo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddProductStep {
    Name,
    Kind,
    Description,
    Price,
    Photo,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub kind: Option<ProductKind>,
    pub description: String,
    pub price: f64,
}

/// Текущая админ-операция, хранится в общем черновике диалога.
#[derive(Debug, Clone)]
pub enum AdminState {
    AddingService { draft: ServiceDraft, step: AddServiceStep },
    AddingProduct { draft: ProductDraft, step: AddProductStep },
    EditingServiceField { service_id: i32, field: EditField },
    EditingProductField { product_id: i32, field: EditField },
    MessagingGuest { booking_id: i32 },
}

// ============ Панель и списки ============

pub async fn show_panel(
    bot: &Bot,
    chat_id: ChatId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let text = "⚙️ <b>Админ-панель</b>\n\nВыберите раздел для управления:";
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::admin_panel())
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::admin_panel())
                .await?;
        }
    }
    Ok(())
}

pub async fn show_services_list(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let services = db::list_services(&app.pool, false).await?;
    let text = "📸 <b>Управление услугами</b>\n\nНажмите на услугу для редактирования:";
    let markup = keyboards::admin_services(&services);
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(())
}

pub async fn show_products_list(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let products = db::list_products(&app.pool, false, None).await?;
    let text = "🎨 <b>Управление товарами</b>\n\nНажмите на товар для редактирования:";
    let markup = keyboards::admin_products(&products);
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(())
}

// ============ Добавление ============

pub async fn start_add_service(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    app.sessions
        .set_conversation(
            user_id.0,
            Conversation::Admin(AdminState::AddingService {
                draft: ServiceDraft::default(),
                step: AddServiceStep::Name,
            }),
        )
        .await;
    let text = "➕ <b>Добавление новой услуги</b>\n\nВведите <b>название</b> услуги:";
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await?;
        }
    }
    Ok(())
}

pub async fn start_add_product(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    app.sessions
        .set_conversation(
            user_id.0,
            Conversation::Admin(AdminState::AddingProduct {
                draft: ProductDraft::default(),
                step: AddProductStep::Name,
            }),
        )
        .await;
    let text = "➕ <b>Добавление нового товара</b>\n\nВведите <b>название</b> товара:";
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await?;
        }
    }
    Ok(())
}

// ============ Редакторы записей ============

pub async fn show_service_editor(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    service_id: i32,
) -> anyhow::Result<bool> {
    let Some(service) = db::get_service(&app.pool, service_id).await? else {
        show_services_list(bot, app, chat_id, edit).await?;
        return Ok(false);
    };
    let text = format!(
        "✏️ <b>Редактирование услуги</b>\n\n\
         📸 <b>Название:</b> {}\n\
         📝 <b>Описание:</b> {}\n\
         💰 <b>Цена:</b> {} руб.\n\
         ⏱ <b>Длительность:</b> {}\n\
         🔗 <b>Ссылка:</b> {}\n\
         📊 <b>Статус:</b> {}",
        service.name,
        service.description.as_deref().unwrap_or("Нет"),
        format_price(service.price),
        service.duration.as_deref().unwrap_or("Не указана"),
        service.page_url.as_deref().unwrap_or("Нет"),
        if service.is_active { "Активна ✅" } else { "Неактивна ❌" },
    );
    let markup =
        keyboards::admin_service_edit(service.id, service.is_active, service.page_url.is_some());
    match edit {
        Some(msg_id) => {
            if bot
                .edit_message_text(chat_id, msg_id, text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(markup.clone())
                .await
                .is_err()
            {
                bot.send_message(chat_id, text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup)
                    .await?;
            }
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(true)
}

pub async fn show_product_editor(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    product_id: i32,
) -> anyhow::Result<bool> {
    let Some(product) = db::get_product(&app.pool, product_id).await? else {
        show_products_list(bot, app, chat_id, edit).await?;
        return Ok(false);
    };
    let kind = ProductKind::parse(&product.kind);
    let text = format!(
        "✏️ <b>Редактирование товара</b>\n\n\
         🎨 <b>Название:</b> {}\n\
         📝 <b>Описание:</b> {}\n\
         💰 <b>Цена:</b> {} руб.\n\
         📦 <b>Тип:</b> {}\n\
         🔗 <b>Ссылка:</b> {}\n\
         📊 <b>Статус:</b> {}",
        product.name,
        product.description.as_deref().unwrap_or("Нет"),
        format_price(product.price),
        kind.map(|k| k.label()).unwrap_or("Не указан"),
        product.page_url.as_deref().unwrap_or("Нет"),
        if product.is_active { "Активен ✅" } else { "Неактивен ❌" },
    );
    let markup =
        keyboards::admin_product_edit(product.id, product.is_active, product.page_url.is_some());
    match edit {
        Some(msg_id) => {
            if bot
                .edit_message_text(chat_id, msg_id, text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(markup.clone())
                .await
                .is_err()
            {
                bot.send_message(chat_id, text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup)
                    .await?;
            }
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(true)
}

/// Переход в состояние правки одного поля.
pub async fn start_edit_service_field(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    service_id: i32,
    field: EditField,
) -> anyhow::Result<bool> {
    if db::get_service(&app.pool, service_id).await?.is_none() {
        return Ok(false);
    }
    app.sessions
        .set_conversation(
            user_id.0,
            Conversation::Admin(AdminState::EditingServiceField { service_id, field }),
        )
        .await;
    bot.send_message(chat_id, field_prompt(field))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(true)
}

pub async fn start_edit_product_field(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    product_id: i32,
    field: EditField,
) -> anyhow::Result<bool> {
    if db::get_product(&app.pool, product_id).await?.is_none() {
        return Ok(false);
    }
    app.sessions
        .set_conversation(
            user_id.0,
            Conversation::Admin(AdminState::EditingProductField { product_id, field }),
        )
        .await;
    bot.send_message(chat_id, field_prompt(field))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(true)
}

fn field_prompt(field: EditField) -> &'static str {
    match field {
        EditField::Name => "Введите новое <b>название</b>:",
        EditField::Description => "Введите новое <b>описание</b>:",
        EditField::Price => "Введите новую <b>цену</b> в рублях (только число):",
        EditField::Duration => "Введите <b>длительность</b> (например: '1-2 часа'):",
        EditField::Kind => {
            "Выберите <b>тип</b> товара:\n\n/digital - Цифровой коллаж\n/paper - Бумажный коллаж"
        }
        EditField::Photo => "Отправьте новое <b>фото</b> или напишите 'пропустить', чтобы убрать:",
        EditField::PageLink => {
            "Пришлите <b>ссылку</b> на страницу с подробным описанием (начинается с http):"
        }
    }
}

// ============ Немедленные действия над записями ============

pub async fn toggle_service(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    service_id: i32,
) -> anyhow::Result<&'static str> {
    match db::toggle_service_active(&app.pool, service_id).await? {
        Some(true) => {
            show_service_editor(bot, app, chat_id, edit, service_id).await?;
            Ok("Услуга активирована ✅")
        }
        Some(false) => {
            show_service_editor(bot, app, chat_id, edit, service_id).await?;
            Ok("Услуга деактивирована ❌")
        }
        None => {
            show_services_list(bot, app, chat_id, edit).await?;
            Ok("Услуга не найдена")
        }
    }
}

pub async fn delete_service(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    service_id: i32,
) -> anyhow::Result<&'static str> {
    db::delete_service(&app.pool, service_id).await?;
    show_services_list(bot, app, chat_id, edit).await?;
    Ok("Услуга удалена! 🗑")
}

pub async fn unlink_service(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    service_id: i32,
) -> anyhow::Result<&'static str> {
    db::set_service_page_url(&app.pool, service_id, None).await?;
    show_service_editor(bot, app, chat_id, edit, service_id).await?;
    Ok("Ссылка убрана")
}

pub async fn toggle_product(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    product_id: i32,
) -> anyhow::Result<&'static str> {
    match db::toggle_product_active(&app.pool, product_id).await? {
        Some(true) => {
            show_product_editor(bot, app, chat_id, edit, product_id).await?;
            Ok("Товар активирован ✅")
        }
        Some(false) => {
            show_product_editor(bot, app, chat_id, edit, product_id).await?;
            Ok("Товар деактивирован ❌")
        }
        None => {
            show_products_list(bot, app, chat_id, edit).await?;
            Ok("Товар не найден")
        }
    }
}

pub async fn delete_product(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    product_id: i32,
) -> anyhow::Result<&'static str> {
    db::delete_product(&app.pool, product_id).await?;
    show_products_list(bot, app, chat_id, edit).await?;
    Ok("Товар удалён! 🗑")
}

pub async fn unlink_product(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    product_id: i32,
) -> anyhow::Result<&'static str> {
    db::set_product_page_url(&app.pool, product_id, None).await?;
    show_product_editor(bot, app, chat_id, edit, product_id).await?;
    Ok("Ссылка убрана")
}

// ============ Заявки ============

pub async fn show_bookings(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    page: i64,
) -> anyhow::Result<()> {
    let page = page.max(0);
    let mut bookings =
        db::recent_bookings(&app.pool, BOOKINGS_PAGE_SIZE + 1, page * BOOKINGS_PAGE_SIZE).await?;
    let has_more = bookings.len() as i64 > BOOKINGS_PAGE_SIZE;
    bookings.truncate(BOOKINGS_PAGE_SIZE as usize);

    let text = if bookings.is_empty() && page == 0 {
        "📋 <b>Заявки</b>\n\nПока нет заявок.".to_string()
    } else {
        "📋 <b>Заявки на съёмку</b>\n\n\
         🆕 - новая, ✅ - подтверждена, ✨ - завершена, ❌ - отменена"
            .to_string()
    };
    let markup = keyboards::admin_bookings(&bookings, page, has_more);
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(())
}

/// Текст карточки заявки. `service_name = None` — услуга не указана или
/// уже удалена: карточка обязана рендериться всё равно.
pub fn booking_detail_text(booking: &Booking, service_name: Option<&str>) -> String {
    format!(
        "📋 <b>Заявка #{}</b>\n\n\
         📊 <b>Статус:</b> {}\n\
         📅 <b>Дата создания:</b> {}\n\n\
         👤 <b>Клиент:</b> {} {}\n\
         📱 <b>Телефон:</b> {}\n\
         👤 <b>Username:</b> @{}\n\
         🆔 <b>User ID:</b> <code>{}</code>\n\n\
         📸 <b>Услуга:</b> {}\n\
         ⏱ <b>Часов:</b> {}\n\
         👥 <b>Человек:</b> {}\n\
         🏠 <b>Студия:</b> {}\n\n\
         💭 <b>Пожелания:</b>\n{}",
        booking.id,
        booking.status().label(),
        booking.created_at.format("%d.%m.%Y %H:%M"),
        booking.first_name,
        booking.last_name,
        booking.phone,
        booking.username.as_deref().unwrap_or("нет"),
        booking.user_id,
        service_name.unwrap_or("Услуга недоступна"),
        booking.hours,
        booking.people_count,
        booking.studio,
        if booking.wishes.is_empty() { "Нет" } else { &booking.wishes },
    )
}

pub async fn show_booking(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    booking_id: i32,
) -> anyhow::Result<bool> {
    let Some(booking) = db::get_booking(&app.pool, booking_id).await? else {
        show_bookings(bot, app, chat_id, edit, 0).await?;
        return Ok(false);
    };
    let service_name = match booking.service_id {
        Some(service_id) => db::get_service(&app.pool, service_id)
            .await?
            .map(|service| service.name),
        None => None,
    };
    let text = booking_detail_text(&booking, service_name.as_deref());
    let markup = keyboards::admin_booking_view(booking.id, booking.status());
    match edit {
        Some(msg_id) => {
            if bot
                .edit_message_text(chat_id, msg_id, text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(markup.clone())
                .await
                .is_err()
            {
                bot.send_message(chat_id, text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup)
                    .await?;
            }
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(true)
}

/// Смена статуса заявки. Недопустимый переход (в т.ч. прямой вызов на
/// терминальной заявке по устаревшей кнопке) оставляет запись как есть.
pub async fn transition_booking(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    booking_id: i32,
    to: BookingStatus,
) -> anyhow::Result<&'static str> {
    let Some(booking) = db::get_booking(&app.pool, booking_id).await? else {
        show_bookings(bot, app, chat_id, edit, 0).await?;
        return Ok("Заявка не найдена");
    };
    if !booking.status().can_transition(to) {
        show_booking(bot, app, chat_id, edit, booking_id).await?;
        return Ok("Действие недоступно для текущего статуса");
    }

    db::set_booking_status(&app.pool, booking_id, to.as_str()).await?;
    log::info!(
        "booking #{} {} -> {}",
        booking_id,
        booking.status().as_str(),
        to.as_str()
    );

    // Статусные уведомления клиенту отправляются по возможности: смена
    // статуса состоялась независимо от доставки.
    let notice = match to {
        BookingStatus::Confirmed => Some(format!(
            "✅ <b>Ваша заявка #{} подтверждена!</b>\n\n\
             Фотограф скоро свяжется с вами для уточнения деталей.",
            booking_id
        )),
        BookingStatus::Cancelled => Some(format!(
            "❌ <b>Ваша заявка #{} отменена.</b>\n\n\
             Если у вас есть вопросы, свяжитесь с фотографом.",
            booking_id
        )),
        _ => None,
    };
    if let Some(notice) = notice {
        if let Err(err) = app.notifier.send(booking.user_id, &notice).await {
            log::warn!("status notice for booking #{} not delivered: {}", booking_id, err);
        }
    }

    show_booking(bot, app, chat_id, edit, booking_id).await?;
    Ok(match to {
        BookingStatus::Confirmed => "Заявка подтверждена!",
        BookingStatus::Completed => "Заявка завершена!",
        BookingStatus::Cancelled => "Заявка отменена",
        BookingStatus::New => "",
    })
}

pub async fn start_message_guest(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    booking_id: i32,
) -> anyhow::Result<bool> {
    if db::get_booking(&app.pool, booking_id).await?.is_none() {
        return Ok(false);
    }
    app.sessions
        .set_conversation(
            user_id.0,
            Conversation::Admin(AdminState::MessagingGuest { booking_id }),
        )
        .await;
    bot.send_message(
        chat_id,
        "💬 <b>Написать клиенту</b>\n\nВведите сообщение, которое будет отправлено клиенту:",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(true)
}

// ============ Статистика и ссылки ============

pub async fn show_stats(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let stats = db::collect_stats(&app.pool).await?;
    let text = format!(
        "📊 <b>Статистика</b>\n\n\
         📋 <b>Заявки:</b>\n\
         • Всего: {}\n\
         • 🆕 Новых: {}\n\
         • ✅ Подтверждённых: {}\n\
         • ✨ Завершённых: {}\n\
         • ❌ Отменённых: {}\n\n\
         📸 <b>Активных услуг:</b> {}\n\
         🎨 <b>Активных товаров:</b> {}",
        stats.total_bookings,
        stats.new_bookings,
        stats.confirmed_bookings,
        stats.completed_bookings,
        stats.cancelled_bookings,
        stats.active_services,
        stats.active_products,
    );
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_admin_panel())
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_admin_panel())
                .await?;
        }
    }
    Ok(())
}

pub async fn show_links(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let mut text = format!(
        "🔗 <b>Готовые ссылки</b>\n\n\
         📝 <b>Запись на съёмку:</b>\n<code>{}</code>\n\n\
         📸 <b>Посмотреть услуги:</b>\n<code>{}</code>\n\n\
         🎨 <b>Посмотреть товары:</b>\n<code>{}</code>\n",
        app.cfg.deep_link("booking"),
        app.cfg.deep_link("services"),
        app.cfg.deep_link("products"),
    );

    let services = db::list_services(&app.pool, true).await?;
    if !services.is_empty() {
        text.push_str("\n📸 <b>Ссылки на услуги:</b>\n");
        for service in &services {
            text.push_str(&format!(
                "<b>{}:</b>\n<code>{}</code>\n",
                service.name,
                app.cfg.deep_link(&format!("book_{}", service.id))
            ));
        }
    }
    let products = db::list_products(&app.pool, true, None).await?;
    if !products.is_empty() {
        text.push_str("\n🎨 <b>Ссылки на товары:</b>\n");
        for product in &products {
            text.push_str(&format!(
                "<b>{}:</b>\n<code>{}</code>\n",
                product.name,
                app.cfg.deep_link(&format!("order_{}", product.id))
            ));
        }
    }
    text.push_str("\n💡 Нажмите на ссылку чтобы скопировать!");

    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::admin_links())
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::admin_links())
                .await?;
        }
    }
    Ok(())
}

// ============ Сообщения внутри админ-сценариев ============

/// Текст/фото от админа в активном админ-состоянии.
pub async fn handle_message(
    bot: &Bot,
    app: &App,
    msg: &Message,
    state: AdminState,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let user_id = msg
        .from
        .as_ref()
        .map(|user| user.id.0)
        .unwrap_or(chat_id.0 as u64);
    let text = msg.text().unwrap_or("").trim().to_string();
    let photo_id = msg
        .photo()
        .and_then(|photos| photos.last())
        .map(|photo| photo.file.id.0.clone());

    match state {
        AdminState::AddingService { mut draft, step } => match step {
            AddServiceStep::Name => {
                if text.is_empty() {
                    bot.send_message(chat_id, "Введите название текстом:").await?;
                    return Ok(());
                }
                draft.name = text;
                bot.send_message(chat_id, "Введите <b>описание</b> услуги:")
                    .parse_mode(ParseMode::Html)
                    .await?;
                next_service_step(app, user_id, draft, AddServiceStep::Description).await;
            }
            AddServiceStep::Description => {
                draft.description = text;
                bot.send_message(chat_id, "Введите <b>цену</b> в рублях (только число):")
                    .parse_mode(ParseMode::Html)
                    .await?;
                next_service_step(app, user_id, draft, AddServiceStep::Price).await;
            }
            AddServiceStep::Price => match parse_price(&text) {
                Some(price) => {
                    draft.price = price;
                    bot.send_message(chat_id, "Введите <b>длительность</b> (например: '1-2 часа'):")
                        .parse_mode(ParseMode::Html)
                        .await?;
                    next_service_step(app, user_id, draft, AddServiceStep::Duration).await;
                }
                None => {
                    bot.send_message(chat_id, "❌ Введите корректное число:").await?;
                }
            },
            AddServiceStep::Duration => {
                draft.duration = text;
                bot.send_message(
                    chat_id,
                    "Отправьте <b>фото</b> для услуги или напишите 'пропустить':",
                )
                .parse_mode(ParseMode::Html)
                .await?;
                next_service_step(app, user_id, draft, AddServiceStep::Photo).await;
            }
            AddServiceStep::Photo => {
                let photo = if let Some(photo_id) = photo_id {
                    Some(photo_id)
                } else if is_skip(&text) {
                    None
                } else {
                    bot.send_message(chat_id, "Отправьте фото или напишите 'пропустить'")
                        .await?;
                    return Ok(());
                };
                let record = NewService {
                    name: draft.name.clone(),
                    description: none_if_empty(&draft.description),
                    price: draft.price,
                    duration: none_if_empty(&draft.duration),
                    photo_id: photo,
                };
                let service_id = db::insert_service(&app.pool, &record).await?;
                log::info!("service #{} '{}' created", service_id, draft.name);
                app.sessions.clear_conversation(user_id).await;
                bot.send_message(
                    chat_id,
                    format!("✅ Услуга '<b>{}</b>' добавлена!", draft.name),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::admin_panel())
                .await?;
            }
        },

        AdminState::AddingProduct { mut draft, step } => match step {
            AddProductStep::Name => {
                if text.is_empty() {
                    bot.send_message(chat_id, "Введите название текстом:").await?;
                    return Ok(());
                }
                draft.name = text;
                bot.send_message(chat_id, field_prompt(EditField::Kind))
                    .parse_mode(ParseMode::Html)
                    .await?;
                next_product_step(app, user_id, draft, AddProductStep::Kind).await;
            }
            AddProductStep::Kind => match ProductKind::parse_keyword(&text) {
                Some(kind) => {
                    draft.kind = Some(kind);
                    bot.send_message(chat_id, "Введите <b>описание</b> товара:")
                        .parse_mode(ParseMode::Html)
                        .await?;
                    next_product_step(app, user_id, draft, AddProductStep::Description).await;
                }
                None => {
                    bot.send_message(chat_id, "Выберите: /digital или /paper").await?;
                }
            },
            AddProductStep::Description => {
                draft.description = text;
                bot.send_message(chat_id, "Введите <b>цену</b> в рублях:")
                    .parse_mode(ParseMode::Html)
                    .await?;
                next_product_step(app, user_id, draft, AddProductStep::Price).await;
            }
            AddProductStep::Price => match parse_price(&text) {
                Some(price) => {
                    draft.price = price;
                    bot.send_message(chat_id, "Отправьте <b>фото</b> товара или 'пропустить':")
                        .parse_mode(ParseMode::Html)
                        .await?;
                    next_product_step(app, user_id, draft, AddProductStep::Photo).await;
                }
                None => {
                    bot.send_message(chat_id, "❌ Введите корректное число:").await?;
                }
            },
            AddProductStep::Photo => {
                let photo = if let Some(photo_id) = photo_id {
                    Some(photo_id)
                } else if is_skip(&text) {
                    None
                } else {
                    bot.send_message(chat_id, "Отправьте фото или напишите 'пропустить'")
                        .await?;
                    return Ok(());
                };
                let record = NewProduct {
                    name: draft.name.clone(),
                    description: none_if_empty(&draft.description),
                    price: draft.price,
                    kind: draft.kind.unwrap_or(ProductKind::Digital).as_str().to_string(),
                    photo_id: photo,
                };
                let product_id = db::insert_product(&app.pool, &record).await?;
                log::info!("product #{} '{}' created", product_id, draft.name);
                app.sessions.clear_conversation(user_id).await;
                bot.send_message(
                    chat_id,
                    format!("✅ Товар '<b>{}</b>' добавлен!", draft.name),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::admin_panel())
                .await?;
            }
        },

        AdminState::EditingServiceField { service_id, field } => {
            if db::get_service(&app.pool, service_id).await?.is_none() {
                app.sessions.clear_conversation(user_id).await;
                bot.send_message(chat_id, "❌ Услуга не найдена").await?;
                show_services_list(bot, app, chat_id, None).await?;
                return Ok(());
            }
            let applied = match field {
                EditField::Name if !text.is_empty() => {
                    db::set_service_name(&app.pool, service_id, &text).await?;
                    true
                }
                EditField::Description if !text.is_empty() => {
                    db::set_service_description(&app.pool, service_id, &text).await?;
                    true
                }
                EditField::Price => match parse_price(&text) {
                    Some(price) => {
                        db::set_service_price(&app.pool, service_id, price).await?;
                        true
                    }
                    None => {
                        bot.send_message(chat_id, "❌ Введите корректное число:").await?;
                        return Ok(());
                    }
                },
                EditField::Duration if !text.is_empty() => {
                    db::set_service_duration(&app.pool, service_id, &text).await?;
                    true
                }
                EditField::Photo => {
                    if let Some(photo_id) = photo_id {
                        db::set_service_photo(&app.pool, service_id, Some(&photo_id)).await?;
                        true
                    } else if is_skip(&text) {
                        db::set_service_photo(&app.pool, service_id, None).await?;
                        true
                    } else {
                        bot.send_message(chat_id, "Отправьте фото или напишите 'пропустить'")
                            .await?;
                        return Ok(());
                    }
                }
                EditField::PageLink => {
                    if is_valid_page_url(&text) {
                        db::set_service_page_url(&app.pool, service_id, Some(&text)).await?;
                        true
                    } else {
                        bot.send_message(chat_id, "❌ Ссылка должна начинаться с http:").await?;
                        return Ok(());
                    }
                }
                _ => {
                    bot.send_message(chat_id, "Введите значение текстом:").await?;
                    return Ok(());
                }
            };
            if applied {
                app.sessions.clear_conversation(user_id).await;
                bot.send_message(chat_id, "✅ Сохранено").await?;
                show_service_editor(bot, app, chat_id, None, service_id).await?;
            }
        }

        AdminState::EditingProductField { product_id, field } => {
            if db::get_product(&app.pool, product_id).await?.is_none() {
                app.sessions.clear_conversation(user_id).await;
                bot.send_message(chat_id, "❌ Товар не найден").await?;
                show_products_list(bot, app, chat_id, None).await?;
                return Ok(());
            }
            let applied = match field {
                EditField::Name if !text.is_empty() => {
                    db::set_product_name(&app.pool, product_id, &text).await?;
                    true
                }
                EditField::Description if !text.is_empty() => {
                    db::set_product_description(&app.pool, product_id, &text).await?;
                    true
                }
                EditField::Price => match parse_price(&text) {
                    Some(price) => {
                        db::set_product_price(&app.pool, product_id, price).await?;
                        true
                    }
                    None => {
                        bot.send_message(chat_id, "❌ Введите корректное число:").await?;
                        return Ok(());
                    }
                },
                EditField::Kind => match ProductKind::parse_keyword(&text) {
                    Some(kind) => {
                        db::set_product_kind(&app.pool, product_id, kind.as_str()).await?;
                        true
                    }
                    None => {
                        bot.send_message(chat_id, "Выберите: /digital или /paper").await?;
                        return Ok(());
                    }
                },
                EditField::Photo => {
                    if let Some(photo_id) = photo_id {
                        db::set_product_photo(&app.pool, product_id, Some(&photo_id)).await?;
                        true
                    } else if is_skip(&text) {
                        db::set_product_photo(&app.pool, product_id, None).await?;
                        true
                    } else {
                        bot.send_message(chat_id, "Отправьте фото или напишите 'пропустить'")
                            .await?;
                        return Ok(());
                    }
                }
                EditField::PageLink => {
                    if is_valid_page_url(&text) {
                        db::set_product_page_url(&app.pool, product_id, Some(&text)).await?;
                        true
                    } else {
                        bot.send_message(chat_id, "❌ Ссылка должна начинаться с http:").await?;
                        return Ok(());
                    }
                }
                _ => {
                    bot.send_message(chat_id, "Введите значение текстом:").await?;
                    return Ok(());
                }
            };
            if applied {
                app.sessions.clear_conversation(user_id).await;
                bot.send_message(chat_id, "✅ Сохранено").await?;
                show_product_editor(bot, app, chat_id, None, product_id).await?;
            }
        }

        AdminState::MessagingGuest { booking_id } => {
            app.sessions.clear_conversation(user_id).await;
            let Some(booking) = db::get_booking(&app.pool, booking_id).await? else {
                bot.send_message(chat_id, "❌ Заявка не найдена").await?;
                return Ok(());
            };
            if text.is_empty() {
                bot.send_message(chat_id, "❌ Отправьте текстовое сообщение").await?;
                return Ok(());
            }
            let relay = format!("💬 <b>Сообщение от фотографа:</b>\n\n{}", text);
            // Ручная отправка — единственный случай, когда отказ доставки
            // показывается админу.
            match app.notifier.send(booking.user_id, &relay).await {
                Ok(()) => {
                    bot.send_message(
                        chat_id,
                        format!("✅ Сообщение отправлено клиенту {}!", booking.first_name),
                    )
                    .reply_markup(keyboards::back_to_booking(booking_id))
                    .await?;
                }
                Err(err) => {
                    log::warn!("manual message to {} failed: {}", booking.user_id, err);
                    bot.send_message(
                        chat_id,
                        "❌ Не удалось отправить сообщение.\nВозможно клиент заблокировал бота.",
                    )
                    .reply_markup(keyboards::back_to_booking(booking_id))
                    .await?;
                }
            }
        }
    }
    Ok(())
}

async fn next_service_step(app: &App, user_id: u64, draft: ServiceDraft, step: AddServiceStep) {
    app.sessions
        .set_conversation(user_id, Conversation::Admin(AdminState::AddingService { draft, step }))
        .await;
}

async fn next_product_step(app: &App, user_id: u64, draft: ProductDraft, step: AddProductStep) {
    app.sessions
        .set_conversation(user_id, Conversation::Admin(AdminState::AddingProduct { draft, step }))
        .await;
}

fn none_if_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn skip_keywords_are_case_insensitive() {
        assert!(is_skip("Пропустить"));
        assert!(is_skip("SKIP"));
        assert!(is_skip("-"));
        assert!(!is_skip("фото"));
    }

    #[test]
    fn page_url_requires_http_prefix() {
        assert!(is_valid_page_url("https://example.com/page"));
        assert!(is_valid_page_url("http://example.com"));
        assert!(!is_valid_page_url("example.com"));
        assert!(!is_valid_page_url("ftp://example.com"));
    }

    #[test]
    fn booking_detail_degrades_without_service() {
        let booking = Booking {
            id: 3,
            user_id: 100,
            username: None,
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            phone: "+79991234567".to_string(),
            service_id: Some(8),
            hours: 2,
            people_count: 6,
            studio: "Свет".to_string(),
            wishes: String::new(),
            status: "new".to_string(),
            created_at: Utc::now(),
        };
        let text = booking_detail_text(&booking, None);
        assert!(text.contains("Услуга недоступна"));
        assert!(text.contains("Заявка #3"));
        assert!(text.contains("🆕 Новая"));
        assert!(text.contains("Нет"));
    }

    #[test]
    fn none_if_empty_trims() {
        assert_eq!(none_if_empty("  "), None);
        assert_eq!(none_if_empty(" текст "), Some("текст".to_string()));
    }
}
