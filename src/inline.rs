//! Inline-режим: прайс, каталог и карточка записи в любом чате.
//! Запрос без совпадений отдаёт меню-подсказку, а не пустоту.

use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQuery, InlineQueryResult,
    InlineQueryResultArticle, InputMessageContent, InputMessageContentText, ParseMode,
};
use url::Url;

use crate::config::Config;
use crate::db;
use crate::models::{format_price, Product, ProductKind, Service};
use crate::App;

const MAX_RESULTS: usize = 50;

const PRICE_KEYWORDS: [&str; 4] = ["прайс", "price", "услуги", "цены"];
const PRODUCT_KEYWORDS: [&str; 5] = ["товары", "товар", "коллаж", "коллажи", "products"];
const BOOKING_KEYWORDS: [&str; 4] = ["запись", "записаться", "book", "booking"];

pub async fn handle_inline_query(bot: Bot, q: InlineQuery, app: std::sync::Arc<App>) -> anyhow::Result<()> {
    let query = q.query.trim().to_lowercase();

    let mut results: Vec<InlineQueryResult> = Vec::new();
    if query.is_empty() || PRICE_KEYWORDS.contains(&query.as_str()) {
        results.extend(services_results(&app).await?);
        if query.is_empty() {
            results.extend(products_results(&app).await?);
        }
    } else if PRODUCT_KEYWORDS.contains(&query.as_str()) {
        results.extend(products_results(&app).await?);
    } else if BOOKING_KEYWORDS.contains(&query.as_str()) {
        results.push(booking_card(&app.cfg));
    } else {
        results.extend(search_results(&app, &query).await?);
    }

    if results.is_empty() {
        results = default_menu(&app.cfg);
    }
    results.truncate(MAX_RESULTS);

    bot.answer_inline_query(q.id, results).await?;
    Ok(())
}

fn article(
    id: String,
    title: String,
    description: String,
    text: String,
    markup: Option<InlineKeyboardMarkup>,
) -> InlineQueryResult {
    let content =
        InputMessageContent::Text(InputMessageContentText::new(text).parse_mode(ParseMode::Html));
    let mut result = InlineQueryResultArticle::new(id, title, content).description(description);
    if let Some(markup) = markup {
        result = result.reply_markup(markup);
    }
    InlineQueryResult::Article(result)
}

fn link_button(label: &str, link: &str) -> Option<InlineKeyboardButton> {
    Url::parse(link)
        .ok()
        .map(|url| InlineKeyboardButton::url(label.to_string(), url))
}

fn deep_link_markup(rows: Vec<(&str, String)>) -> Option<InlineKeyboardMarkup> {
    let buttons: Vec<Vec<InlineKeyboardButton>> = rows
        .into_iter()
        .filter_map(|(label, link)| link_button(label, &link).map(|button| vec![button]))
        .collect();
    if buttons.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(buttons))
    }
}

/// Сводный текстовый прайс для inline-карточки и запасного пути /price.
pub fn price_summary(services: &[Service], bot_username: &str) -> String {
    let mut text = String::from("📸 <b>ПРАЙС НА УСЛУГИ</b>\n━━━━━━━━━━━━━━━━━━━━\n\n");
    for service in services {
        text.push_str(&format!("✨ <b>{}</b>\n    💰 {} ₽", service.name, format_price(service.price)));
        if let Some(duration) = &service.duration {
            text.push_str(&format!("  •  ⏱ {}", duration));
        }
        text.push_str("\n\n");
    }
    text.push_str(&format!("━━━━━━━━━━━━━━━━━━━━\n📱 @{bot_username}"));
    text
}

pub fn catalog_summary(products: &[Product]) -> String {
    let mut text = String::from("🎨 <b>КАТАЛОГ ТОВАРОВ</b>\n━━━━━━━━━━━━━━━━━━━━\n\n");
    for product in products {
        let emoji = ProductKind::parse(&product.kind).map(|k| k.emoji()).unwrap_or("🎨");
        text.push_str(&format!(
            "{} <b>{}</b>\n    💰 {} ₽\n\n",
            emoji,
            product.name,
            format_price(product.price)
        ));
    }
    text.push_str("━━━━━━━━━━━━━━━━━━━━");
    text
}

fn service_article(service: &Service, cfg: &Config) -> InlineQueryResult {
    let mut description = format!("💰 {} ₽", format_price(service.price));
    if let Some(duration) = &service.duration {
        description.push_str(&format!(" • ⏱ {}", duration));
    }
    let text = format!(
        "📸 <b>{}</b>\n\n{}\n\n💰 <b>Стоимость:</b> {} ₽\n⏱ <b>Длительность:</b> {}",
        service.name,
        service.description.as_deref().unwrap_or(""),
        format_price(service.price),
        service.duration.as_deref().unwrap_or("По договорённости"),
    );
    let markup = deep_link_markup(vec![
        ("📝 Записаться", cfg.deep_link(&format!("book_{}", service.id))),
        ("📸 Все услуги", cfg.deep_link("services")),
    ]);
    article(
        format!("service_{}", service.id),
        format!("📸 {}", service.name),
        description,
        text,
        markup,
    )
}

fn product_article(product: &Product, cfg: &Config) -> InlineQueryResult {
    let kind = ProductKind::parse(&product.kind);
    let emoji = kind.map(|k| k.emoji()).unwrap_or("🎨");
    let text = format!(
        "{} <b>{}</b>\n\n{}\n\n💰 <b>Стоимость:</b> {} ₽\n📦 <b>Тип:</b> {}",
        emoji,
        product.name,
        product.description.as_deref().unwrap_or(""),
        format_price(product.price),
        kind.map(|k| k.label()).unwrap_or("Не указан"),
    );
    let markup = deep_link_markup(vec![
        ("💬 Заказать", cfg.deep_link(&format!("order_{}", product.id))),
        ("🎨 Все товары", cfg.deep_link("products")),
    ]);
    article(
        format!("product_{}", product.id),
        format!("{} {}", emoji, product.name),
        format!("💰 {} ₽", format_price(product.price)),
        text,
        markup,
    )
}

async fn services_results(app: &App) -> anyhow::Result<Vec<InlineQueryResult>> {
    let services = db::list_services(&app.pool, true).await?;
    if services.is_empty() {
        return Ok(Vec::new());
    }
    let mut results = vec![article(
        "full_price".to_string(),
        "📋 Отправить прайс".to_string(),
        "Прайс со всеми услугами".to_string(),
        price_summary(&services, &app.cfg.bot_username),
        deep_link_markup(vec![
            ("📝 Записаться на съёмку", app.cfg.deep_link("booking")),
            ("📸 Подробнее об услугах", app.cfg.deep_link("services")),
        ]),
    )];
    results.extend(services.iter().map(|service| service_article(service, &app.cfg)));
    Ok(results)
}

async fn products_results(app: &App) -> anyhow::Result<Vec<InlineQueryResult>> {
    let products = db::list_products(&app.pool, true, None).await?;
    if products.is_empty() {
        return Ok(Vec::new());
    }
    let mut results = vec![article(
        "full_catalog".to_string(),
        "🎨 Отправить каталог товаров".to_string(),
        "Коллажи и фотопродукция".to_string(),
        catalog_summary(&products),
        deep_link_markup(vec![("🎨 Посмотреть каталог", app.cfg.deep_link("products"))]),
    )];
    results.extend(products.iter().map(|product| product_article(product, &app.cfg)));
    Ok(results)
}

async fn search_results(app: &App, query: &str) -> anyhow::Result<Vec<InlineQueryResult>> {
    let mut results = Vec::new();
    for service in db::search_services(&app.pool, query).await? {
        results.push(service_article(&service, &app.cfg));
    }
    for product in db::search_products(&app.pool, query).await? {
        results.push(product_article(&product, &app.cfg));
    }
    Ok(results)
}

fn booking_card(cfg: &Config) -> InlineQueryResult {
    article(
        "booking".to_string(),
        "📝 Записаться на съёмку".to_string(),
        "Открыть форму записи".to_string(),
        "📸 <b>Запись на фотосессию</b>\n\n✨ Хотите записаться?\nНажмите кнопку ниже! 👇"
            .to_string(),
        deep_link_markup(vec![("📝 Записаться на съёмку", cfg.deep_link("booking"))]),
    )
}

fn default_menu(cfg: &Config) -> Vec<InlineQueryResult> {
    vec![
        article(
            "menu_price".to_string(),
            "📋 Прайс".to_string(),
            "Посмотреть услуги и цены".to_string(),
            "Введите <b>@бот прайс</b> для просмотра услуг".to_string(),
            None,
        ),
        article(
            "menu_products".to_string(),
            "🎨 Товары".to_string(),
            "Коллажи и фотопродукция".to_string(),
            "Введите <b>@бот товары</b> для просмотра каталога".to_string(),
            None,
        ),
        article(
            "menu_booking".to_string(),
            "📝 Записаться".to_string(),
            "Оставить заявку на съёмку".to_string(),
            format!("Для записи перейдите: {}", cfg.deep_link("booking")),
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cfg() -> Config {
        Config {
            bot_token: String::new(),
            bot_username: "TestBot".to_string(),
            database_url: String::new(),
            admin_ids: vec![],
            openrouter_api_key: None,
        }
    }

    fn service(id: i32, name: &str, price: f64) -> Service {
        Service {
            id,
            name: name.to_string(),
            description: None,
            price,
            duration: Some("1-2 часа".to_string()),
            photo_id: None,
            page_url: None,
            is_active: true,
            sort_order: id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn price_summary_lists_all_services() {
        let services = vec![service(1, "Свадебная", 15_000.0), service(2, "Семейная", 5_000.0)];
        let text = price_summary(&services, "TestBot");
        assert!(text.contains("Свадебная"));
        assert!(text.contains("Семейная"));
        assert!(text.contains("15 000 ₽"));
        assert!(text.contains("@TestBot"));
    }

    #[test]
    fn default_menu_is_never_empty() {
        assert_eq!(default_menu(&cfg()).len(), 3);
    }

    #[test]
    fn service_article_builds_with_deep_links() {
        // Сборка не должна паниковать и теряет кнопки только при битом username
        let result = service_article(&service(7, "Съёмка", 3000.0), &cfg());
        match result {
            InlineQueryResult::Article(a) => {
                assert!(a.reply_markup.is_some());
            }
            _ => panic!("expected article"),
        }
    }
}
