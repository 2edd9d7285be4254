//! Типизированный слой callback-данных. Строка вида
//! `имя_действия:арг1:арг2` разбирается один раз на границе транспорта,
//! дальше по коду ходит только закрытый `Action`.

use crate::models::ProductKind;

/// Поле записи, редактируемое из админ-меню.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Name,
    Description,
    Price,
    Duration,
    Kind,
    Photo,
    PageLink,
}

impl EditField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(EditField::Name),
            "desc" => Some(EditField::Description),
            "price" => Some(EditField::Price),
            "duration" => Some(EditField::Duration),
            "kind" => Some(EditField::Kind),
            "photo" => Some(EditField::Photo),
            "link" => Some(EditField::PageLink),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            EditField::Name => "name",
            EditField::Description => "desc",
            EditField::Price => "price",
            EditField::Duration => "duration",
            EditField::Kind => "kind",
            EditField::Photo => "photo",
            EditField::PageLink => "link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Гостевая часть
    MainMenu,
    Services,
    ServiceNav(usize),
    BookService(i32),
    Products,
    ProductsFilter(Option<ProductKind>),
    ProductNav(usize, Option<ProductKind>),
    OrderProduct(i32),
    BookingStart,
    BookingHours(String),
    BookingPeople(String),
    BookingConfirm,
    BookingCancel,
    Contacts,
    Faq,
    /// Кнопки-заглушки вроде счётчика страниц.
    Ignore,

    // Админ-панель
    AdminPanel,
    AdminServices,
    AdminServiceAdd,
    AdminServiceEdit(i32),
    AdminServiceField(i32, EditField),
    AdminServiceToggle(i32),
    AdminServiceDelete(i32),
    AdminServiceUnlink(i32),
    AdminProducts,
    AdminProductAdd,
    AdminProductEdit(i32),
    AdminProductField(i32, EditField),
    AdminProductToggle(i32),
    AdminProductDelete(i32),
    AdminProductUnlink(i32),
    AdminBookings(i64),
    AdminBookingView(i32),
    AdminBookingConfirm(i32),
    AdminBookingComplete(i32),
    AdminBookingCancel(i32),
    AdminBookingMessage(i32),
    AdminStats,
    AdminLinks,
}

fn filter_to_str(kind: Option<ProductKind>) -> &'static str {
    match kind {
        None => "all",
        Some(ProductKind::Digital) => "digital",
        Some(ProductKind::Paper) => "paper",
    }
}

fn filter_from_str(raw: &str) -> Option<Option<ProductKind>> {
    match raw {
        "all" => Some(None),
        other => ProductKind::parse(other).map(Some),
    }
}

impl Action {
    pub fn parse(data: &str) -> Option<Action> {
        let parts: Vec<&str> = data.split(':').collect();
        match parts.as_slice() {
            ["main_menu"] => Some(Action::MainMenu),
            ["services"] => Some(Action::Services),
            ["service_nav", index] => index.parse().ok().map(Action::ServiceNav),
            ["book_service", id] => id.parse().ok().map(Action::BookService),
            ["products"] => Some(Action::Products),
            ["products_filter", filter] => filter_from_str(filter).map(Action::ProductsFilter),
            ["product_nav", index, filter] => {
                let index = index.parse().ok()?;
                let filter = filter_from_str(filter)?;
                Some(Action::ProductNav(index, filter))
            }
            ["order_product", id] => id.parse().ok().map(Action::OrderProduct),
            ["booking_start"] => Some(Action::BookingStart),
            ["booking_hours", choice] => Some(Action::BookingHours(choice.to_string())),
            ["booking_people", choice] => Some(Action::BookingPeople(choice.to_string())),
            ["booking_confirm"] => Some(Action::BookingConfirm),
            ["booking_cancel"] => Some(Action::BookingCancel),
            ["contacts"] => Some(Action::Contacts),
            ["faq"] => Some(Action::Faq),
            ["ignore"] => Some(Action::Ignore),

            ["admin_panel"] => Some(Action::AdminPanel),
            ["admin_services"] => Some(Action::AdminServices),
            ["admin_service_add"] => Some(Action::AdminServiceAdd),
            ["admin_service_edit", id] => id.parse().ok().map(Action::AdminServiceEdit),
            ["admin_se_field", id, field] => {
                Some(Action::AdminServiceField(id.parse().ok()?, EditField::parse(field)?))
            }
            ["admin_se_toggle", id] => id.parse().ok().map(Action::AdminServiceToggle),
            ["admin_se_delete", id] => id.parse().ok().map(Action::AdminServiceDelete),
            ["admin_se_unlink", id] => id.parse().ok().map(Action::AdminServiceUnlink),
            ["admin_products"] => Some(Action::AdminProducts),
            ["admin_product_add"] => Some(Action::AdminProductAdd),
            ["admin_product_edit", id] => id.parse().ok().map(Action::AdminProductEdit),
            ["admin_pr_field", id, field] => {
                Some(Action::AdminProductField(id.parse().ok()?, EditField::parse(field)?))
            }
            ["admin_pr_toggle", id] => id.parse().ok().map(Action::AdminProductToggle),
            ["admin_pr_delete", id] => id.parse().ok().map(Action::AdminProductDelete),
            ["admin_pr_unlink", id] => id.parse().ok().map(Action::AdminProductUnlink),
            ["admin_bookings", page] => page.parse().ok().map(Action::AdminBookings),
            ["admin_booking_view", id] => id.parse().ok().map(Action::AdminBookingView),
            ["admin_b_confirm", id] => id.parse().ok().map(Action::AdminBookingConfirm),
            ["admin_b_complete", id] => id.parse().ok().map(Action::AdminBookingComplete),
            ["admin_b_cancel", id] => id.parse().ok().map(Action::AdminBookingCancel),
            ["admin_b_message", id] => id.parse().ok().map(Action::AdminBookingMessage),
            ["admin_stats"] => Some(Action::AdminStats),
            ["admin_links"] => Some(Action::AdminLinks),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Action::MainMenu => "main_menu".to_string(),
            Action::Services => "services".to_string(),
            Action::ServiceNav(index) => format!("service_nav:{index}"),
            Action::BookService(id) => format!("book_service:{id}"),
            Action::Products => "products".to_string(),
            Action::ProductsFilter(kind) => format!("products_filter:{}", filter_to_str(*kind)),
            Action::ProductNav(index, kind) => {
                format!("product_nav:{index}:{}", filter_to_str(*kind))
            }
            Action::OrderProduct(id) => format!("order_product:{id}"),
            Action::BookingStart => "booking_start".to_string(),
            Action::BookingHours(choice) => format!("booking_hours:{choice}"),
            Action::BookingPeople(choice) => format!("booking_people:{choice}"),
            Action::BookingConfirm => "booking_confirm".to_string(),
            Action::BookingCancel => "booking_cancel".to_string(),
            Action::Contacts => "contacts".to_string(),
            Action::Faq => "faq".to_string(),
            Action::Ignore => "ignore".to_string(),

            Action::AdminPanel => "admin_panel".to_string(),
            Action::AdminServices => "admin_services".to_string(),
            Action::AdminServiceAdd => "admin_service_add".to_string(),
            Action::AdminServiceEdit(id) => format!("admin_service_edit:{id}"),
            Action::AdminServiceField(id, field) => {
                format!("admin_se_field:{id}:{}", field.as_str())
            }
            Action::AdminServiceToggle(id) => format!("admin_se_toggle:{id}"),
            Action::AdminServiceDelete(id) => format!("admin_se_delete:{id}"),
            Action::AdminServiceUnlink(id) => format!("admin_se_unlink:{id}"),
            Action::AdminProducts => "admin_products".to_string(),
            Action::AdminProductAdd => "admin_product_add".to_string(),
            Action::AdminProductEdit(id) => format!("admin_product_edit:{id}"),
            Action::AdminProductField(id, field) => {
                format!("admin_pr_field:{id}:{}", field.as_str())
            }
            Action::AdminProductToggle(id) => format!("admin_pr_toggle:{id}"),
            Action::AdminProductDelete(id) => format!("admin_pr_delete:{id}"),
            Action::AdminProductUnlink(id) => format!("admin_pr_unlink:{id}"),
            Action::AdminBookings(page) => format!("admin_bookings:{page}"),
            Action::AdminBookingView(id) => format!("admin_booking_view:{id}"),
            Action::AdminBookingConfirm(id) => format!("admin_b_confirm:{id}"),
            Action::AdminBookingComplete(id) => format!("admin_b_complete:{id}"),
            Action::AdminBookingCancel(id) => format!("admin_b_cancel:{id}"),
            Action::AdminBookingMessage(id) => format!("admin_b_message:{id}"),
            Action::AdminStats => "admin_stats".to_string(),
            Action::AdminLinks => "admin_links".to_string(),
        }
    }
}

/// Параметр deep link: `/start <param>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartParam {
    Booking,
    BookService(i32),
    Services,
    Products,
    OrderProduct(i32),
}

impl StartParam {
    pub fn parse(param: &str) -> Option<StartParam> {
        if param == "booking" {
            return Some(StartParam::Booking);
        }
        if param == "services" {
            return Some(StartParam::Services);
        }
        if param == "products" {
            return Some(StartParam::Products);
        }
        if let Some(id) = param.strip_prefix("book_") {
            return id.parse().ok().map(StartParam::BookService);
        }
        if let Some(id) = param.strip_prefix("order_") {
            return id.parse().ok().map(StartParam::OrderProduct);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let actions = [
            Action::MainMenu,
            Action::ServiceNav(3),
            Action::BookService(17),
            Action::ProductsFilter(Some(ProductKind::Digital)),
            Action::ProductNav(2, None),
            Action::BookingHours("6+".to_string()),
            Action::AdminServiceField(5, EditField::PageLink),
            Action::AdminProductField(8, EditField::Kind),
            Action::AdminBookings(1),
            Action::AdminBookingCancel(44),
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.encode()), Some(action));
        }
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("nonsense"), None);
        assert_eq!(Action::parse("book_service:abc"), None);
        assert_eq!(Action::parse("product_nav:1"), None);
        assert_eq!(Action::parse("products_filter:plastic"), None);
        assert_eq!(Action::parse("admin_se_field:1:color"), None);
        assert_eq!(Action::parse("admin_bookings"), None);
    }

    #[test]
    fn parses_legacy_style_payload_strings() {
        assert_eq!(Action::parse("booking_hours:6+"), Some(Action::BookingHours("6+".into())));
        assert_eq!(Action::parse("service_nav:0"), Some(Action::ServiceNav(0)));
        assert_eq!(
            Action::parse("product_nav:4:paper"),
            Some(Action::ProductNav(4, Some(ProductKind::Paper)))
        );
    }

    #[test]
    fn start_params() {
        assert_eq!(StartParam::parse("booking"), Some(StartParam::Booking));
        assert_eq!(StartParam::parse("book_12"), Some(StartParam::BookService(12)));
        assert_eq!(StartParam::parse("order_7"), Some(StartParam::OrderProduct(7)));
        assert_eq!(StartParam::parse("services"), Some(StartParam::Services));
        assert_eq!(StartParam::parse("products"), Some(StartParam::Products));
        assert_eq!(StartParam::parse("book_"), None);
        assert_eq!(StartParam::parse("unknown"), None);
    }
}
