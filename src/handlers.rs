//! Диспетчеризация входящих событий: команды и deep links, маршрутизация
//! по активному сценарию, разбор callback-кнопок.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatAction, InputFile, ParseMode};

use crate::actions::{Action, StartParam};
use crate::admin;
use crate::assistant;
use crate::booking::{self, BookingInput, BookingStep};
use crate::catalog;
use crate::db;
use crate::inline;
use crate::keyboards;
use crate::models::BookingStatus;
use crate::price_image;
use crate::session::Conversation;
use crate::App;

pub async fn handle_message(bot: Bot, msg: Message, app: Arc<App>) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let user_id = user.id;

    if let Some(text) = msg.text() {
        let text = text.trim();

        // /start сбрасывает любой начатый сценарий, как и в исходной
        // системе; параметр — deep link
        if text == "/start" || text.starts_with("/start ") {
            app.sessions.clear_conversation(user_id.0).await;
            let param = text.strip_prefix("/start").unwrap_or("").trim();
            if !param.is_empty() {
                match StartParam::parse(param) {
                    Some(StartParam::Booking) => {
                        return booking::start(&bot, &app, chat_id, user_id, None).await;
                    }
                    Some(StartParam::BookService(service_id)) => {
                        if booking::choose_service(&bot, &app, chat_id, user_id, service_id).await? {
                            return Ok(());
                        }
                        bot.send_message(chat_id, "Услуга не найдена 😔").await?;
                        return booking::start(&bot, &app, chat_id, user_id, None).await;
                    }
                    Some(StartParam::Services) => {
                        return catalog::show_services(&bot, &app, chat_id, user_id, None).await;
                    }
                    Some(StartParam::Products) => {
                        return catalog::show_products_filter(&bot, chat_id, None).await;
                    }
                    Some(StartParam::OrderProduct(product_id)) => {
                        return catalog::order_product_deep_link(
                            &bot, &app, chat_id, user_id, product_id,
                        )
                        .await;
                    }
                    None => {}
                }
            }
            bot.send_message(chat_id, catalog::welcome_text(&app.cfg.bot_username))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                .await?;
            return Ok(());
        }

        match text {
            "/help" => {
                bot.send_message(chat_id, catalog::help_text(&app.cfg.bot_username))
                    .parse_mode(ParseMode::Html)
                    .await?;
                return Ok(());
            }
            "/services" => {
                return catalog::show_services(&bot, &app, chat_id, user_id, None).await;
            }
            "/products" => {
                return catalog::show_products_filter(&bot, chat_id, None).await;
            }
            "/booking" => {
                return booking::start(&bot, &app, chat_id, user_id, None).await;
            }
            "/contacts" => {
                bot.send_message(chat_id, catalog::CONTACTS_TEXT)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                    .await?;
                return Ok(());
            }
            "/price" => {
                return send_price_sheet(&bot, &app, chat_id).await;
            }
            _ => {}
        }
    }

    match app.sessions.conversation(user_id.0).await {
        Conversation::Booking(draft) => booking::handle_message(&bot, &app, &msg, draft).await,
        Conversation::Admin(state) => {
            if app.cfg.is_admin(user_id) {
                admin::handle_message(&bot, &app, &msg, state).await
            } else {
                // Состояние осталось от пользователя, выпавшего из списка
                // админов: тихо сбрасываем
                app.sessions.clear_conversation(user_id.0).await;
                Ok(())
            }
        }
        Conversation::Idle => {
            if let Some(text) = msg.text() {
                if !text.starts_with('/') {
                    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
                    let reply = assistant::answer(&app, text).await;
                    // Ответ модели не размечен, шлём без parse_mode
                    bot.send_message(chat_id, format!("🤖 {}", reply))
                        .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
                        .await?;
                }
            }
            Ok(())
        }
    }
}

async fn send_price_sheet(bot: &Bot, app: &App, chat_id: ChatId) -> anyhow::Result<()> {
    let services = db::list_services(&app.pool, true).await?;
    if services.is_empty() {
        bot.send_message(chat_id, "😔 Пока нет доступных услуг.").await?;
        return Ok(());
    }
    let contact = format!("@{}", app.cfg.bot_username);
    match price_image::render_price_sheet(&services, &contact) {
        Ok(png) => {
            bot.send_photo(chat_id, InputFile::memory(png).file_name("price.png"))
                .await?;
        }
        Err(err) => {
            log::warn!("price sheet rendering failed, sending text: {}", err);
            bot.send_message(chat_id, inline::price_summary(&services, &app.cfg.bot_username))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

fn requires_admin(action: &Action) -> bool {
    matches!(
        action,
        Action::AdminPanel
            | Action::AdminServices
            | Action::AdminServiceAdd
            | Action::AdminServiceEdit(_)
            | Action::AdminServiceField(_, _)
            | Action::AdminServiceToggle(_)
            | Action::AdminServiceDelete(_)
            | Action::AdminServiceUnlink(_)
            | Action::AdminProducts
            | Action::AdminProductAdd
            | Action::AdminProductEdit(_)
            | Action::AdminProductField(_, _)
            | Action::AdminProductToggle(_)
            | Action::AdminProductDelete(_)
            | Action::AdminProductUnlink(_)
            | Action::AdminBookings(_)
            | Action::AdminBookingView(_)
            | Action::AdminBookingConfirm(_)
            | Action::AdminBookingComplete(_)
            | Action::AdminBookingCancel(_)
            | Action::AdminBookingMessage(_)
            | Action::AdminStats
            | Action::AdminLinks
    )
}

pub async fn handle_callback_query(bot: Bot, q: CallbackQuery, app: Arc<App>) -> anyhow::Result<()> {
    let user_id = q.from.id;
    let username = q.from.username.clone();
    let data = q.data.clone().unwrap_or_default();

    let (chat_id, msg_id) = match &q.message {
        Some(message) => (Some(message.chat().id), Some(message.id())),
        None => (None, None),
    };

    let mut notice: Option<&'static str> = None;
    let mut show_alert = false;

    if let (Some(action), Some(chat_id)) = (Action::parse(&data), chat_id) {
        if requires_admin(&action) && !app.cfg.is_admin(user_id) {
            notice = Some("⛔ Нет доступа");
            show_alert = true;
        } else {
            match action {
                Action::MainMenu => {
                    app.sessions.clear_conversation(user_id.0).await;
                    let text = "🏠 <b>Главное меню</b>\n\nВыберите действие:";
                    let markup = keyboards::main_menu(app.cfg.is_admin(user_id));
                    let edited = match msg_id {
                        Some(msg_id) => bot
                            .edit_message_text(chat_id, msg_id, text)
                            .parse_mode(ParseMode::Html)
                            .reply_markup(markup.clone())
                            .await
                            .is_ok(),
                        None => false,
                    };
                    if !edited {
                        bot.send_message(chat_id, text)
                            .parse_mode(ParseMode::Html)
                            .reply_markup(markup)
                            .await?;
                    }
                }
                Action::Services => {
                    catalog::show_services(&bot, &app, chat_id, user_id, msg_id).await?;
                }
                Action::ServiceNav(index) => {
                    catalog::service_nav(&bot, &app, chat_id, user_id, msg_id, index).await?;
                }
                Action::BookService(service_id) => {
                    if !booking::choose_service(&bot, &app, chat_id, user_id, service_id).await? {
                        notice = Some("Услуга не найдена");
                        show_alert = true;
                    }
                }
                Action::Products => {
                    catalog::show_products_filter(&bot, chat_id, msg_id).await?;
                }
                Action::ProductsFilter(filter) => {
                    catalog::show_products(&bot, &app, chat_id, user_id, filter, msg_id).await?;
                }
                Action::ProductNav(index, filter) => {
                    catalog::product_nav(&bot, &app, chat_id, user_id, msg_id, index, filter)
                        .await?;
                }
                Action::OrderProduct(product_id) => {
                    if !catalog::order_product(
                        &bot,
                        &app,
                        chat_id,
                        user_id,
                        username.as_deref(),
                        msg_id,
                        product_id,
                    )
                    .await?
                    {
                        notice = Some("Товар не найден");
                        show_alert = true;
                    }
                }
                Action::BookingStart => {
                    booking::start(&bot, &app, chat_id, user_id, msg_id).await?;
                }
                Action::BookingHours(choice) => {
                    if let Conversation::Booking(draft) =
                        app.sessions.conversation(user_id.0).await
                    {
                        booking::handle_choice(
                            &bot,
                            &app,
                            chat_id,
                            user_id,
                            msg_id,
                            draft,
                            BookingInput::Hours(&choice),
                        )
                        .await?;
                    }
                }
                Action::BookingPeople(choice) => {
                    if let Conversation::Booking(draft) =
                        app.sessions.conversation(user_id.0).await
                    {
                        booking::handle_choice(
                            &bot,
                            &app,
                            chat_id,
                            user_id,
                            msg_id,
                            draft,
                            BookingInput::People(&choice),
                        )
                        .await?;
                    }
                }
                Action::BookingConfirm => {
                    if let Conversation::Booking(draft) =
                        app.sessions.conversation(user_id.0).await
                    {
                        if draft.step == BookingStep::Confirming {
                            booking::confirm(
                                &bot, &app, chat_id, user_id, username.clone(), msg_id, draft,
                            )
                            .await?;
                            notice = Some("Заявка отправлена! ✅");
                        }
                    }
                }
                Action::BookingCancel => {
                    booking::cancel(&bot, &app, chat_id, user_id, msg_id).await?;
                }
                Action::Contacts => {
                    show_info_screen(&bot, &app, chat_id, msg_id, user_id, catalog::CONTACTS_TEXT)
                        .await?;
                }
                Action::Faq => {
                    show_info_screen(&bot, &app, chat_id, msg_id, user_id, catalog::FAQ_TEXT)
                        .await?;
                }
                Action::Ignore => {}

                Action::AdminPanel => {
                    admin::show_panel(&bot, chat_id, msg_id).await?;
                }
                Action::AdminServices => {
                    admin::show_services_list(&bot, &app, chat_id, msg_id).await?;
                }
                Action::AdminServiceAdd => {
                    admin::start_add_service(&bot, &app, chat_id, user_id, msg_id).await?;
                }
                Action::AdminServiceEdit(service_id) => {
                    if !admin::show_service_editor(&bot, &app, chat_id, msg_id, service_id).await? {
                        notice = Some("Услуга не найдена");
                        show_alert = true;
                    }
                }
                Action::AdminServiceField(service_id, field) => {
                    if !admin::start_edit_service_field(
                        &bot, &app, chat_id, user_id, service_id, field,
                    )
                    .await?
                    {
                        notice = Some("Услуга не найдена");
                        show_alert = true;
                    }
                }
                Action::AdminServiceToggle(service_id) => {
                    notice =
                        Some(admin::toggle_service(&bot, &app, chat_id, msg_id, service_id).await?);
                }
                Action::AdminServiceDelete(service_id) => {
                    notice =
                        Some(admin::delete_service(&bot, &app, chat_id, msg_id, service_id).await?);
                }
                Action::AdminServiceUnlink(service_id) => {
                    notice =
                        Some(admin::unlink_service(&bot, &app, chat_id, msg_id, service_id).await?);
                }
                Action::AdminProducts => {
                    admin::show_products_list(&bot, &app, chat_id, msg_id).await?;
                }
                Action::AdminProductAdd => {
                    admin::start_add_product(&bot, &app, chat_id, user_id, msg_id).await?;
                }
                Action::AdminProductEdit(product_id) => {
                    if !admin::show_product_editor(&bot, &app, chat_id, msg_id, product_id).await? {
                        notice = Some("Товар не найден");
                        show_alert = true;
                    }
                }
                Action::AdminProductField(product_id, field) => {
                    if !admin::start_edit_product_field(
                        &bot, &app, chat_id, user_id, product_id, field,
                    )
                    .await?
                    {
                        notice = Some("Товар не найден");
                        show_alert = true;
                    }
                }
                Action::AdminProductToggle(product_id) => {
                    notice =
                        Some(admin::toggle_product(&bot, &app, chat_id, msg_id, product_id).await?);
                }
                Action::AdminProductDelete(product_id) => {
                    notice =
                        Some(admin::delete_product(&bot, &app, chat_id, msg_id, product_id).await?);
                }
                Action::AdminProductUnlink(product_id) => {
                    notice =
                        Some(admin::unlink_product(&bot, &app, chat_id, msg_id, product_id).await?);
                }
                Action::AdminBookings(page) => {
                    admin::show_bookings(&bot, &app, chat_id, msg_id, page).await?;
                }
                Action::AdminBookingView(booking_id) => {
                    if !admin::show_booking(&bot, &app, chat_id, msg_id, booking_id).await? {
                        notice = Some("Заявка не найдена");
                        show_alert = true;
                    }
                }
                Action::AdminBookingConfirm(booking_id) => {
                    notice = Some(
                        admin::transition_booking(
                            &bot,
                            &app,
                            chat_id,
                            msg_id,
                            booking_id,
                            BookingStatus::Confirmed,
                        )
                        .await?,
                    );
                }
                Action::AdminBookingComplete(booking_id) => {
                    notice = Some(
                        admin::transition_booking(
                            &bot,
                            &app,
                            chat_id,
                            msg_id,
                            booking_id,
                            BookingStatus::Completed,
                        )
                        .await?,
                    );
                }
                Action::AdminBookingCancel(booking_id) => {
                    notice = Some(
                        admin::transition_booking(
                            &bot,
                            &app,
                            chat_id,
                            msg_id,
                            booking_id,
                            BookingStatus::Cancelled,
                        )
                        .await?,
                    );
                }
                Action::AdminBookingMessage(booking_id) => {
                    if !admin::start_message_guest(&bot, &app, chat_id, user_id, booking_id).await?
                    {
                        notice = Some("Заявка не найдена");
                        show_alert = true;
                    }
                }
                Action::AdminStats => {
                    admin::show_stats(&bot, &app, chat_id, msg_id).await?;
                }
                Action::AdminLinks => {
                    admin::show_links(&bot, &app, chat_id, msg_id).await?;
                }
            }
        }
    }

    let mut answer = bot.answer_callback_query(q.id);
    if let Some(notice) = notice {
        answer = answer.text(notice);
    }
    if show_alert {
        answer = answer.show_alert(true);
    }
    answer.await?;
    Ok(())
}

async fn show_info_screen(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    msg_id: Option<teloxide::types::MessageId>,
    user_id: teloxide::types::UserId,
    text: &str,
) -> anyhow::Result<()> {
    let markup = keyboards::main_menu(app.cfg.is_admin(user_id));
    let edited = match msg_id {
        Some(msg_id) => bot
            .edit_message_text(chat_id, msg_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup.clone())
            .await
            .is_ok(),
        None => false,
    };
    if !edited {
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup)
            .await?;
    }
    Ok(())
}
