//! Уведомления вне текущего диалога: клиенту о судьбе заявки, админам о
//! новых событиях. Возвращает явный `Result` — решает, глотать ли отказ,
//! вызывающая сторона, а не этот модуль.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::RequestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Получатель недоступен: заблокировал бота, удалил аккаунт и т.п.
    #[error("не удалось доставить сообщение: {0}")]
    Send(#[from] RequestError),
}

#[derive(Clone)]
pub struct Notifier {
    bot: Bot,
}

impl Notifier {
    pub fn new(bot: Bot) -> Self {
        Notifier { bot }
    }

    pub async fn send(&self, user_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(user_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    /// Рассылка по списку получателей. Каждая отправка независима:
    /// отказ одного получателя не трогает остальных, он только попадает
    /// в лог.
    pub async fn broadcast(&self, user_ids: &[u64], text: &str) {
        for &user_id in user_ids {
            if let Err(err) = self.send(user_id as i64, text).await {
                log::warn!("notification to {} failed: {}", user_id, err);
            }
        }
    }
}
