//! Сборка инлайн-клавиатур. Все callback-данные кодируются через
//! [`Action`], чтобы ни одна строка payload не собиралась руками.

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};
use url::Url;

use crate::actions::{Action, EditField};
use crate::booking::COUNT_CHOICES;
use crate::models::{Booking, BookingStatus, Product, ProductKind, Service};

fn cb(text: &str, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), action.encode())
}

// ============ Главное меню ============

pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            cb("📸 Услуги и цены", Action::Services),
            cb("🎨 Товары", Action::Products),
        ],
        vec![cb("📝 Записаться на съёмку", Action::BookingStart)],
        vec![
            cb("📞 Контакты", Action::Contacts),
            cb("❓ FAQ", Action::Faq),
        ],
    ];
    if is_admin {
        rows.push(vec![cb("⚙️ Админ-панель", Action::AdminPanel)]);
    }
    InlineKeyboardMarkup::new(rows)
}

// ============ Навигация по каталогу ============

pub fn service_nav(
    index: usize,
    total: usize,
    service_id: i32,
    page_url: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = vec![nav_row(index, total, |i| Action::ServiceNav(i))];
    rows.push(vec![cb(
        "📝 Записаться на эту услугу",
        Action::BookService(service_id),
    )]);
    if let Some(link) = page_url.and_then(|raw| Url::parse(raw).ok()) {
        rows.push(vec![InlineKeyboardButton::url("ℹ️ Подробнее".to_string(), link)]);
    }
    rows.push(vec![cb("🏠 Главное меню", Action::MainMenu)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn products_filter() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            cb(
                "📱 Цифровые коллажи",
                Action::ProductsFilter(Some(ProductKind::Digital)),
            ),
            cb(
                "📄 Бумажные коллажи",
                Action::ProductsFilter(Some(ProductKind::Paper)),
            ),
        ],
        vec![cb("🔄 Все товары", Action::ProductsFilter(None))],
        vec![cb("🏠 Главное меню", Action::MainMenu)],
    ])
}

pub fn product_nav(
    index: usize,
    total: usize,
    product_id: i32,
    filter: Option<ProductKind>,
    page_url: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = vec![nav_row(index, total, |i| Action::ProductNav(i, filter))];
    rows.push(vec![cb("💬 Заказать", Action::OrderProduct(product_id))]);
    if let Some(link) = page_url.and_then(|raw| Url::parse(raw).ok()) {
        rows.push(vec![InlineKeyboardButton::url("ℹ️ Подробнее".to_string(), link)]);
    }
    rows.push(vec![
        cb("🔍 Фильтр", Action::Products),
        cb("🏠 Меню", Action::MainMenu),
    ]);
    InlineKeyboardMarkup::new(rows)
}

fn nav_row(
    index: usize,
    total: usize,
    to_action: impl Fn(usize) -> Action,
) -> Vec<InlineKeyboardButton> {
    let mut row = Vec::new();
    if index > 0 {
        row.push(cb("⬅️", to_action(index - 1)));
    }
    row.push(cb(&format!("{}/{}", index + 1, total), Action::Ignore));
    if index + 1 < total {
        row.push(cb("➡️", to_action(index + 1)));
    }
    row
}

// ============ Запись на съёмку ============

pub fn booking_hours() -> InlineKeyboardMarkup {
    choice_rows(|choice| Action::BookingHours(choice.to_string()))
}

pub fn booking_people() -> InlineKeyboardMarkup {
    choice_rows(|choice| Action::BookingPeople(choice.to_string()))
}

fn choice_rows(to_action: impl Fn(&str) -> Action) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = COUNT_CHOICES
        .chunks(3)
        .map(|chunk| chunk.iter().map(|choice| cb(choice, to_action(choice))).collect())
        .collect();
    rows.push(vec![cb("❌ Отмена", Action::BookingCancel)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn booking_confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("✅ Подтвердить", Action::BookingConfirm)],
        vec![cb("❌ Отмена", Action::BookingCancel)],
    ])
}

pub fn share_phone() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new("📱 Поделиться номером").request(ButtonRequest::Contact)],
        vec![KeyboardButton::new(crate::booking::CANCEL_LABEL)],
    ])
    .resize_keyboard()
    .one_time_keyboard()
}

// ============ Админ-панель ============

pub fn admin_panel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("📸 Управление услугами", Action::AdminServices)],
        vec![cb("🎨 Управление товарами", Action::AdminProducts)],
        vec![cb("📋 Заявки на съёмку", Action::AdminBookings(0))],
        vec![cb("📊 Статистика", Action::AdminStats)],
        vec![cb("🔗 Ссылки", Action::AdminLinks)],
        vec![cb("🏠 Главное меню", Action::MainMenu)],
    ])
}

pub fn admin_services(services: &[Service]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = services
        .iter()
        .map(|service| {
            let status = if service.is_active { "✅" } else { "❌" };
            vec![cb(
                &format!("{} {}", status, service.name),
                Action::AdminServiceEdit(service.id),
            )]
        })
        .collect();
    rows.push(vec![cb("➕ Добавить услугу", Action::AdminServiceAdd)]);
    rows.push(vec![cb("⬅️ Назад", Action::AdminPanel)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_service_edit(service_id: i32, is_active: bool, has_link: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            cb("✏️ Название", Action::AdminServiceField(service_id, EditField::Name)),
            cb("📝 Описание", Action::AdminServiceField(service_id, EditField::Description)),
        ],
        vec![
            cb("💰 Цена", Action::AdminServiceField(service_id, EditField::Price)),
            cb("⏱ Длительность", Action::AdminServiceField(service_id, EditField::Duration)),
        ],
        vec![
            cb("🖼 Фото", Action::AdminServiceField(service_id, EditField::Photo)),
            cb("🔗 Ссылка", Action::AdminServiceField(service_id, EditField::PageLink)),
        ],
    ];
    if has_link {
        rows.push(vec![cb("🚫 Убрать ссылку", Action::AdminServiceUnlink(service_id))]);
    }
    let toggle = if is_active { "🔴 Деактивировать" } else { "🟢 Активировать" };
    rows.push(vec![cb(toggle, Action::AdminServiceToggle(service_id))]);
    rows.push(vec![cb("🗑 Удалить", Action::AdminServiceDelete(service_id))]);
    rows.push(vec![cb("⬅️ Назад", Action::AdminServices)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_products(products: &[Product]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = products
        .iter()
        .map(|product| {
            let status = if product.is_active { "✅" } else { "❌" };
            let kind = ProductKind::parse(&product.kind)
                .map(|kind| kind.emoji())
                .unwrap_or("❓");
            vec![cb(
                &format!("{} {} {}", status, kind, product.name),
                Action::AdminProductEdit(product.id),
            )]
        })
        .collect();
    rows.push(vec![cb("➕ Добавить товар", Action::AdminProductAdd)]);
    rows.push(vec![cb("⬅️ Назад", Action::AdminPanel)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_product_edit(product_id: i32, is_active: bool, has_link: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            cb("✏️ Название", Action::AdminProductField(product_id, EditField::Name)),
            cb("📝 Описание", Action::AdminProductField(product_id, EditField::Description)),
        ],
        vec![
            cb("💰 Цена", Action::AdminProductField(product_id, EditField::Price)),
            cb("📦 Тип", Action::AdminProductField(product_id, EditField::Kind)),
        ],
        vec![
            cb("🖼 Фото", Action::AdminProductField(product_id, EditField::Photo)),
            cb("🔗 Ссылка", Action::AdminProductField(product_id, EditField::PageLink)),
        ],
    ];
    if has_link {
        rows.push(vec![cb("🚫 Убрать ссылку", Action::AdminProductUnlink(product_id))]);
    }
    let toggle = if is_active { "🔴 Деактивировать" } else { "🟢 Активировать" };
    rows.push(vec![cb(toggle, Action::AdminProductToggle(product_id))]);
    rows.push(vec![cb("🗑 Удалить", Action::AdminProductDelete(product_id))]);
    rows.push(vec![cb("⬅️ Назад", Action::AdminProducts)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_bookings(bookings: &[Booking], page: i64, has_more: bool) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = bookings
        .iter()
        .map(|booking| {
            vec![cb(
                &format!(
                    "{} {} - {}",
                    booking.status().glyph(),
                    booking.first_name,
                    booking.created_at.format("%d.%m")
                ),
                Action::AdminBookingView(booking.id),
            )]
        })
        .collect();
    let mut nav = Vec::new();
    if page > 0 {
        nav.push(cb("⬅️", Action::AdminBookings(page - 1)));
    }
    if has_more {
        nav.push(cb("➡️", Action::AdminBookings(page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(vec![cb("⬅️ Назад", Action::AdminPanel)]);
    InlineKeyboardMarkup::new(rows)
}

/// Кнопки переходов зависят от текущего статуса: терминальной заявке
/// переходы не предлагаются вовсе.
pub fn admin_booking_view(booking_id: i32, status: BookingStatus) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if status == BookingStatus::New {
        rows.push(vec![cb("✅ Подтвердить", Action::AdminBookingConfirm(booking_id))]);
    }
    if matches!(status, BookingStatus::New | BookingStatus::Confirmed) {
        rows.push(vec![
            cb("✨ Завершить", Action::AdminBookingComplete(booking_id)),
            cb("❌ Отменить", Action::AdminBookingCancel(booking_id)),
        ]);
    }
    rows.push(vec![cb("💬 Написать клиенту", Action::AdminBookingMessage(booking_id))]);
    rows.push(vec![cb("⬅️ Назад", Action::AdminBookings(0))]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_links() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("⬅️ Назад", Action::AdminPanel)]])
}

pub fn back_to_admin_panel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("⬅️ Админ-панель", Action::AdminPanel)]])
}

pub fn back_to_booking(booking_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("📋 К заявке", Action::AdminBookingView(booking_id))],
        vec![cb("⬅️ Все заявки", Action::AdminBookings(0))],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_payloads(markup: &InlineKeyboardMarkup) -> Vec<String> {
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
    fn booking_view_offers_confirm_only_for_new() {
        let payloads = callback_payloads(&admin_booking_view(5, BookingStatus::New));
        assert!(payloads.contains(&"admin_b_confirm:5".to_string()));
        assert!(payloads.contains(&"admin_b_complete:5".to_string()));
        assert!(payloads.contains(&"admin_b_cancel:5".to_string()));

        let payloads = callback_payloads(&admin_booking_view(5, BookingStatus::Confirmed));
        assert!(!payloads.contains(&"admin_b_confirm:5".to_string()));
        assert!(payloads.contains(&"admin_b_complete:5".to_string()));
    }

    #[test]
    fn booking_view_hides_transitions_for_terminal_statuses() {
        for status in [BookingStatus::Completed, BookingStatus::Cancelled] {
            let payloads = callback_payloads(&admin_booking_view(5, status));
            assert!(!payloads.iter().any(|payload| payload.starts_with("admin_b_confirm")
                || payload.starts_with("admin_b_complete")
                || payload.starts_with("admin_b_cancel")));
            // Написать клиенту можно всегда
            assert!(payloads.contains(&"admin_b_message:5".to_string()));
        }
    }

    #[test]
    fn hours_keyboard_offers_fixed_choices_and_cancel() {
        let payloads = callback_payloads(&booking_hours());
        for choice in COUNT_CHOICES {
            assert!(payloads.contains(&format!("booking_hours:{choice}")));
        }
        assert!(payloads.contains(&"booking_cancel".to_string()));
    }

    #[test]
    fn nav_row_hides_edges() {
        let first = callback_payloads(&service_nav(0, 3, 1, None));
        assert!(first.contains(&"service_nav:1".to_string()));
        assert!(!first.iter().any(|payload| payload == "service_nav:4294967295"));

        let last = callback_payloads(&service_nav(2, 3, 1, None));
        assert!(last.contains(&"service_nav:1".to_string()));
        assert!(!last.contains(&"service_nav:3".to_string()));
    }

    #[test]
    fn every_payload_roundtrips_through_action_parser() {
        use crate::actions::Action;
        let markups = [
            main_menu(true),
            products_filter(),
            booking_hours(),
            booking_people(),
            booking_confirm(),
            admin_panel(),
            admin_service_edit(3, true, true),
            admin_product_edit(4, false, false),
            admin_booking_view(9, BookingStatus::New),
            admin_links(),
            back_to_booking(2),
        ];
        for markup in &markups {
            for payload in callback_payloads(markup) {
                assert!(
                    Action::parse(&payload).is_some(),
                    "payload {:?} does not parse",
                    payload
                );
            }
        }
    }
}
