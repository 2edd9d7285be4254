use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Услуга фотографа.
#[derive(Debug, Clone, FromRow)]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration: Option<String>,
    pub photo_id: Option<String>,
    pub page_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Товар (коллажи цифровые и бумажные).
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub kind: String,
    pub photo_id: Option<String>,
    pub page_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Заявка на съёмку. `service_id` — слабая ссылка: услуга могла быть
/// удалена после создания заявки.
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: i32,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub service_id: Option<i32>,
    pub hours: i32,
    pub people_count: i32,
    pub studio: String,
    pub wishes: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::parse(&self.status).unwrap_or(BookingStatus::New)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    New,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(BookingStatus::New),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::New => "new",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            BookingStatus::New => "🆕",
            BookingStatus::Confirmed => "✅",
            BookingStatus::Completed => "✨",
            BookingStatus::Cancelled => "❌",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::New => "🆕 Новая",
            BookingStatus::Confirmed => "✅ Подтверждена",
            BookingStatus::Completed => "✨ Завершена",
            BookingStatus::Cancelled => "❌ Отменена",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Допустимые переходы: new → confirmed, new/confirmed → completed
    /// или cancelled. Терминальные статусы неизменяемы.
    pub fn can_transition(&self, to: BookingStatus) -> bool {
        match to {
            BookingStatus::Confirmed => *self == BookingStatus::New,
            BookingStatus::Completed | BookingStatus::Cancelled => {
                matches!(self, BookingStatus::New | BookingStatus::Confirmed)
            }
            BookingStatus::New => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Digital,
    Paper,
}

impl ProductKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "digital" => Some(ProductKind::Digital),
            "paper" => Some(ProductKind::Paper),
            _ => None,
        }
    }

    /// Распознаёт ответ админа на шаге выбора типа товара.
    pub fn parse_keyword(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text.contains("digital") || text.contains("цифр") {
            Some(ProductKind::Digital)
        } else if text.contains("paper") || text.contains("бумаж") {
            Some(ProductKind::Paper)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Digital => "digital",
            ProductKind::Paper => "paper",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ProductKind::Digital => "📱",
            ProductKind::Paper => "📄",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Digital => "Цифровой",
            ProductKind::Paper => "Бумажный",
        }
    }
}

/// Цена из текста админа: пробелы-разделители тысяч убираются,
/// десятичная запятая приводится к точке.
pub fn parse_price(text: &str) -> Option<f64> {
    let normalized: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if normalized.is_empty() {
        return None;
    }
    let price: f64 = normalized.parse().ok()?;
    if price.is_finite() && price >= 0.0 {
        Some(price)
    } else {
        None
    }
}

/// "1500.5" → "1 501" — целые рубли с пробелом между разрядами.
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_accepts_space_and_comma() {
        assert_eq!(parse_price("1 500,50"), Some(1500.50));
        assert_eq!(parse_price("1500.50"), Some(1500.50));
        assert_eq!(parse_price("  3000 "), Some(3000.0));
        assert_eq!(parse_price("0"), Some(0.0));
    }

    #[test]
    fn price_rejects_garbage() {
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("-100"), None);
        assert_eq!(parse_price("1,5,0"), None);
    }

    #[test]
    fn price_formatting_groups_thousands() {
        assert_eq!(format_price(1500.50), "1 501");
        assert_eq!(format_price(1500.0), "1 500");
        assert_eq!(format_price(999.0), "999");
        assert_eq!(format_price(1234567.0), "1 234 567");
        assert_eq!(format_price(0.0), "0");
    }

    #[test]
    fn status_transitions_are_one_directional() {
        use BookingStatus::*;
        assert!(New.can_transition(Confirmed));
        assert!(New.can_transition(Completed));
        assert!(New.can_transition(Cancelled));
        assert!(Confirmed.can_transition(Completed));
        assert!(Confirmed.can_transition(Cancelled));

        assert!(!Confirmed.can_transition(Confirmed));
        assert!(!Completed.can_transition(Cancelled));
        assert!(!Completed.can_transition(Confirmed));
        assert!(!Cancelled.can_transition(Completed));
        assert!(!Confirmed.can_transition(New));
    }

    #[test]
    fn terminal_statuses() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::New.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            BookingStatus::New,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("nope"), None);
    }

    #[test]
    fn product_kind_keywords() {
        assert_eq!(ProductKind::parse_keyword("/digital"), Some(ProductKind::Digital));
        assert_eq!(ProductKind::parse_keyword("Цифровой"), Some(ProductKind::Digital));
        assert_eq!(ProductKind::parse_keyword("бумажный"), Some(ProductKind::Paper));
        assert_eq!(ProductKind::parse_keyword("paper"), Some(ProductKind::Paper));
        assert_eq!(ProductKind::parse_keyword("что-то ещё"), None);
    }
}
