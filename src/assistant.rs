//! Вопрос-ответ через языковую модель. Промпт собирается из живого
//! каталога, так что ассистент называет актуальные цены. Любой отказ
//! внешнего сервиса превращается в фиксированный ответ-заглушку.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db;
use crate::models::{format_price, Product, ProductKind, Service};
use crate::App;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const MODEL: &str = "openai/gpt-oss-20b:free";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("OPENROUTER_API_KEY не настроен")]
    MissingKey,
    #[error("запрос к модели не удался: {0}")]
    Http(#[from] reqwest::Error),
    #[error("модель вернула пустой ответ")]
    EmptyResponse,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Системный промпт: каталог как данность плюс правила тона.
pub fn grounding_prompt(bot_username: &str, services: &[Service], products: &[Product]) -> String {
    let mut prompt = String::from("Ты - AI ассистент фотографа. Отвечай на русском.\n\n");

    if services.is_empty() {
        prompt.push_str("Услуги временно недоступны.\n");
    } else {
        prompt.push_str("АКТУАЛЬНЫЕ УСЛУГИ И ЦЕНЫ:\n\n");
        for service in services {
            prompt.push_str(&format!("📸 {} - {} руб.", service.name, format_price(service.price)));
            if let Some(duration) = &service.duration {
                prompt.push_str(&format!(" ({})", duration));
            }
            prompt.push('\n');
        }
    }

    if !products.is_empty() {
        prompt.push_str("\nТОВАРЫ:\n\n");
        for product in products {
            let emoji = ProductKind::parse(&product.kind).map(|k| k.emoji()).unwrap_or("🎨");
            prompt.push_str(&format!(
                "{} {} - {} руб.\n",
                emoji,
                product.name,
                format_price(product.price)
            ));
        }
    }

    prompt.push_str(&format!(
        "\nПравила:\n\
         - Отвечай кратко (2-3 предложения)\n\
         - Называй точные цены из данных выше\n\
         - Используй эмодзи\n\
         - Предлагай записаться: @{bot_username}\n\
         - Ссылка на запись: t.me/{bot_username}?start=booking"
    ));
    prompt
}

pub fn fallback_text(bot_username: &str) -> String {
    format!("😔 Извините, не могу ответить.\n\nСвяжитесь с фотографом: @{bot_username}")
}

async fn request_completion(app: &App, question: &str) -> Result<String, AssistantError> {
    let api_key = app
        .cfg
        .openrouter_api_key
        .as_deref()
        .ok_or(AssistantError::MissingKey)?;

    let services = db::list_services(&app.pool, true).await.unwrap_or_default();
    let products = db::list_products(&app.pool, true, None).await.unwrap_or_default();
    let system_prompt = grounding_prompt(&app.cfg.bot_username, &services, &products);

    let request = ChatRequest {
        model: MODEL,
        messages: vec![
            ChatMessage { role: "system", content: &system_prompt },
            ChatMessage { role: "user", content: question },
        ],
        max_tokens: 300,
        temperature: 0.7,
    };

    let response: ChatResponse = app
        .http
        .post(OPENROUTER_URL)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(AssistantError::EmptyResponse)
}

/// Ответ на свободный вопрос. Наружу всегда уходит текст: отказ модели
/// здесь не ошибка, а повод показать заглушку.
pub async fn answer(app: &App, question: &str) -> String {
    match request_completion(app, question).await {
        Ok(text) => text,
        Err(err) => {
            log::warn!("assistant failed: {}", err);
            fallback_text(&app.cfg.bot_username)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service(name: &str, price: f64, duration: Option<&str>) -> Service {
        Service {
            id: 1,
            name: name.to_string(),
            description: None,
            price,
            duration: duration.map(str::to_string),
            photo_id: None,
            page_url: None,
            is_active: true,
            sort_order: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_lists_catalog_with_prices() {
        let services = vec![
            service("Свадебная съёмка", 15_000.0, Some("3 часа")),
            service("Семейная съёмка", 5_000.0, None),
        ];
        let products = vec![Product {
            id: 1,
            name: "Коллаж".to_string(),
            description: None,
            price: 900.0,
            kind: "paper".to_string(),
            photo_id: None,
            page_url: None,
            is_active: true,
            sort_order: 1,
            created_at: Utc::now(),
        }];
        let prompt = grounding_prompt("TestBot", &services, &products);
        assert!(prompt.contains("Свадебная съёмка - 15 000 руб. (3 часа)"));
        assert!(prompt.contains("Семейная съёмка - 5 000 руб."));
        assert!(prompt.contains("📄 Коллаж - 900 руб."));
        assert!(prompt.contains("t.me/TestBot?start=booking"));
    }

    #[test]
    fn prompt_degrades_without_catalog() {
        let prompt = grounding_prompt("TestBot", &[], &[]);
        assert!(prompt.contains("Услуги временно недоступны"));
        assert!(!prompt.contains("ТОВАРЫ"));
    }

    #[test]
    fn fallback_points_to_photographer() {
        assert!(fallback_text("TestBot").contains("@TestBot"));
    }
}
