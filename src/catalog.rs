//! Гостевой каталог: листание услуг и товаров по одной карточке,
//! заказ товара, справочные экраны.

use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageId, ParseMode, UserId};

use crate::db;
use crate::keyboards;
use crate::models::{format_price, Product, ProductKind, Service};
use crate::session::NavCursor;
use crate::App;

pub fn service_card_text(service: &Service) -> String {
    format!(
        "📸 <b>{}</b>\n\n{}\n\n💰 <b>Стоимость:</b> {} руб.\n⏱ <b>Длительность:</b> {}",
        service.name,
        service.description.as_deref().unwrap_or("Описание скоро появится..."),
        format_price(service.price),
        service.duration.as_deref().unwrap_or("По договорённости"),
    )
}

pub fn product_card_text(product: &Product) -> String {
    let kind = ProductKind::parse(&product.kind);
    format!(
        "{} <b>{}</b>\n\n{}\n\n💰 <b>Стоимость:</b> {} руб.\n📦 <b>Тип:</b> {}",
        kind.map(|k| k.emoji()).unwrap_or("🎨"),
        product.name,
        product.description.as_deref().unwrap_or("Описание скоро появится..."),
        format_price(product.price),
        kind.map(|k| k.label()).unwrap_or("Не указан"),
    )
}

/// Карточка: фото с подписью, если оно есть, иначе текст. Правка «на
/// месте» возможна только для текста — сообщение с фото пересоздаётся.
async fn show_card(
    bot: &Bot,
    chat_id: ChatId,
    edit: Option<MessageId>,
    text: String,
    photo_id: Option<&str>,
    markup: teloxide::types::InlineKeyboardMarkup,
) -> anyhow::Result<()> {
    if let Some(photo_id) = photo_id {
        if let Some(msg_id) = edit {
            // Смена текста на фото правкой невозможна, шлём заново
            let _ = bot.delete_message(chat_id, msg_id).await;
        }
        let sent = bot
            .send_photo(chat_id, InputFile::file_id(FileId(photo_id.to_string())))
            .caption(text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(markup.clone())
            .await;
        match sent {
            Ok(_) => return Ok(()),
            Err(err) => log::warn!("send_photo failed, falling back to text: {}", err),
        }
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup)
            .await?;
        return Ok(());
    }

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
    Ok(())
}

// ============ Услуги ============

pub async fn show_services(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let services = db::list_services(&app.pool, true).await?;
    if services.is_empty() {
        let text = "😔 Пока нет доступных услуг.";
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
        .set_nav(user_id.0, NavCursor::Services { index: 0 })
        .await;
    show_service_at(bot, app, chat_id, edit, &services, 0).await
}

pub async fn service_nav(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    edit: Option<MessageId>,
    index: usize,
) -> anyhow::Result<()> {
    let services = db::list_services(&app.pool, true).await?;
    if services.is_empty() {
        return Ok(());
    }
    let index = index.min(services.len() - 1);
    app.sessions
        .set_nav(user_id.0, NavCursor::Services { index })
        .await;
    show_service_at(bot, app, chat_id, edit, &services, index).await
}

pub async fn show_service_at(
    bot: &Bot,
    _app: &App,
    chat_id: ChatId,
    edit: Option<MessageId>,
    services: &[Service],
    index: usize,
) -> anyhow::Result<()> {
    let Some(service) = services.get(index) else {
        return Ok(());
    };
    let markup = keyboards::service_nav(
        index,
        services.len(),
        service.id,
        service.page_url.as_deref(),
    );
    show_card(
        bot,
        chat_id,
        edit,
        service_card_text(service),
        service.photo_id.as_deref(),
        markup,
    )
    .await
}

// ============ Товары ============

pub async fn show_products_filter(
    bot: &Bot,
    chat_id: ChatId,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let text = "🎨 <b>Товары</b>\n\nВыберите категорию:\n\n\
                📱 <b>Цифровые коллажи</b> - получите файл для печати\n\
                📄 <b>Бумажные коллажи</b> - готовый напечатанный коллаж";
    match edit {
        Some(msg_id) => {
            bot.edit_message_text(chat_id, msg_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::products_filter())
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::products_filter())
                .await?;
        }
    }
    Ok(())
}

pub async fn show_products(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    filter: Option<ProductKind>,
    edit: Option<MessageId>,
) -> anyhow::Result<()> {
    let products = db::list_products(&app.pool, true, filter.map(|kind| kind.as_str())).await?;
    if products.is_empty() {
        let text = "😔 В этой категории пока нет товаров.";
        match edit {
            Some(msg_id) => {
                bot.edit_message_text(chat_id, msg_id, text)
                    .reply_markup(keyboards::products_filter())
                    .await?;
            }
            None => {
                bot.send_message(chat_id, text)
                    .reply_markup(keyboards::products_filter())
                    .await?;
            }
        }
        return Ok(());
    }
    app.sessions
        .set_nav(user_id.0, NavCursor::Products { filter, index: 0 })
        .await;
    show_product_at(bot, chat_id, edit, &products, 0, filter).await
}

pub async fn product_nav(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    edit: Option<MessageId>,
    index: usize,
    filter: Option<ProductKind>,
) -> anyhow::Result<()> {
    let products = db::list_products(&app.pool, true, filter.map(|kind| kind.as_str())).await?;
    if products.is_empty() {
        return Ok(());
    }
    // Курсор с другим фильтром отбрасывается, листаем заново
    let index = match app.sessions.nav(user_id.0).await {
        Some(NavCursor::Products { filter: current, .. }) if current == filter => {
            index.min(products.len() - 1)
        }
        _ => 0,
    };
    app.sessions
        .set_nav(user_id.0, NavCursor::Products { filter, index })
        .await;
    show_product_at(bot, chat_id, edit, &products, index, filter).await
}

async fn show_product_at(
    bot: &Bot,
    chat_id: ChatId,
    edit: Option<MessageId>,
    products: &[Product],
    index: usize,
    filter: Option<ProductKind>,
) -> anyhow::Result<()> {
    let Some(product) = products.get(index) else {
        return Ok(());
    };
    let markup = keyboards::product_nav(
        index,
        products.len(),
        product.id,
        filter,
        product.page_url.as_deref(),
    );
    show_card(
        bot,
        chat_id,
        edit,
        product_card_text(product),
        product.photo_id.as_deref(),
        markup,
    )
    .await
}

/// Интерес к товару по кнопке: уведомляем админов, подтверждаем гостю.
pub async fn order_product(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    username: Option<&str>,
    edit: Option<MessageId>,
    product_id: i32,
) -> anyhow::Result<bool> {
    let Some(product) = db::get_product(&app.pool, product_id).await? else {
        return Ok(false);
    };

    let alert = format!(
        "🛒 <b>Интерес к товару!</b>\n\n\
         Товар: {}\nЦена: {} руб.\n\n\
         Пользователь: @{}\nID: {}",
        product.name,
        format_price(product.price),
        username.unwrap_or("нет"),
        user_id,
    );
    app.notifier.broadcast(&app.cfg.admin_ids, &alert).await;

    let ack = format!(
        "✅ Заявка на товар '<b>{}</b>' отправлена!\n\nФотограф свяжется с вами в ближайшее время.",
        product.name
    );
    match edit {
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
    Ok(true)
}

/// Заказ товара по deep link: показываем карточку с контактом.
pub async fn order_product_deep_link(
    bot: &Bot,
    app: &App,
    chat_id: ChatId,
    user_id: UserId,
    product_id: i32,
) -> anyhow::Result<()> {
    let Some(product) = db::get_product(&app.pool, product_id).await? else {
        bot.send_message(chat_id, "Товар не найден 😔")
            .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
            .await?;
        return Ok(());
    };
    let kind = ProductKind::parse(&product.kind).map(|k| k.emoji()).unwrap_or("🎨");
    let text = format!(
        "✅ Вы хотите заказать:\n\n{} <b>{}</b>\n💰 <b>Цена:</b> {} руб.\n\n\
         Напишите прямо сюда, и мы свяжемся с вами!",
        kind,
        product.name,
        format_price(product.price),
    );
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::main_menu(app.cfg.is_admin(user_id)))
        .await?;
    Ok(())
}

// ============ Справочные экраны ============

pub fn welcome_text(bot_username: &str) -> String {
    format!(
        "👋 <b>Добро пожаловать!</b>\n\n\
         📸 Я бот фотографа\n\n\
         Здесь вы можете:\n\
         • Посмотреть услуги и цены\n\
         • Выбрать товары (коллажи)\n\
         • Записаться на фотосессию\n\n\
         💡 <b>Подсказка:</b> Вы можете использовать меня в любом чате!\n\
         Просто введите <code>@{bot_username} прайс</code> или <code>@{bot_username} товары</code>\n\n\
         Выберите действие:"
    )
}

pub fn help_text(bot_username: &str) -> String {
    format!(
        "📖 <b>Помощь</b>\n\n\
         <b>Основные команды:</b>\n\
         /start - Главное меню\n\
         /services - Услуги и цены\n\
         /products - Товары\n\
         /booking - Записаться на съёмку\n\
         /price - Прайс одной картинкой\n\
         /contacts - Контакты\n\n\
         <b>Inline режим:</b>\n\
         Введите в любом чате:\n\
         • <code>@{bot_username} прайс</code> - показать услуги\n\
         • <code>@{bot_username} товары</code> - показать товары\n\
         • <code>@{bot_username} запись</code> - ссылка на запись\n\n\
         <b>Вопросы?</b>\n\
         Просто напишите их сюда - отвечу с учётом актуального прайса."
    )
}

pub const CONTACTS_TEXT: &str = "📞 <b>Контакты</b>\n\n\
    👩‍🎨 <b>Фотограф</b>\n\n\
    📱 <b>Telegram:</b> @marina_photo\n\
    📧 <b>Email:</b> marina@photo.ru\n\n\
    🕐 <b>Время работы:</b>\n\
    Пн-Пт: 10:00 - 20:00\n\
    Сб-Вс: по договорённости";

pub const FAQ_TEXT: &str = "❓ <b>Часто задаваемые вопросы</b>\n\n\
    <b>Q: Как записаться на съёмку?</b>\n\
    A: Нажмите \"Записаться на съёмку\" в главном меню и заполните форму.\n\n\
    <b>Q: Можно ли отменить запись?</b>\n\
    A: Да, свяжитесь с фотографом минимум за 24 часа.\n\n\
    <b>Q: Когда будут готовы фото?</b>\n\
    A: Обычно 7-14 дней в зависимости от объёма.\n\n\
    <b>Q: Как получить цифровые коллажи?</b>\n\
    A: После оплаты вы получите ссылку для скачивания.\n\n\
    <b>Q: Можно ли взять несколько образов?</b>\n\
    A: Да, количество образов обсуждается индивидуально.";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service(name: &str, price: f64) -> Service {
        Service {
            id: 1,
            name: name.to_string(),
            description: None,
            price,
            duration: None,
            photo_id: None,
            page_url: None,
            is_active: true,
            sort_order: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn service_card_fills_defaults() {
        let text = service_card_text(&service("Свадебная", 15_000.0));
        assert!(text.contains("Свадебная"));
        assert!(text.contains("15 000"));
        assert!(text.contains("Описание скоро появится"));
        assert!(text.contains("По договорённости"));
    }

    #[test]
    fn product_card_shows_kind() {
        let product = Product {
            id: 2,
            name: "Коллаж".to_string(),
            description: Some("Описание".to_string()),
            price: 900.0,
            kind: "digital".to_string(),
            photo_id: None,
            page_url: None,
            is_active: true,
            sort_order: 1,
            created_at: Utc::now(),
        };
        let text = product_card_text(&product);
        assert!(text.contains("📱"));
        assert!(text.contains("Цифровой"));
        assert!(text.contains("900"));
    }

    #[test]
    fn welcome_embeds_username() {
        assert!(welcome_text("TestBot").contains("@TestBot прайс"));
    }
}
