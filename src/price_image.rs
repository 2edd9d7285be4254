//! Прайс одной картинкой: кремовый лист со списком услуг и цен.
//! Утилита без состояния; при недоступности шрифта вызывающая сторона
//! откатывается на текстовый прайс.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use thiserror::Error;

use crate::models::{format_price, Service};

#[derive(Debug, Error)]
pub enum PriceImageError {
    #[error("не найден ни один системный шрифт")]
    FontUnavailable,
    #[error("не удалось закодировать изображение: {0}")]
    Encode(#[from] image::ImageError),
}

const WIDTH: u32 = 800;
const PADDING: i32 = 50;
const HEADER_HEIGHT: u32 = 150;
const ROW_HEIGHT: u32 = 75;
const FOOTER_HEIGHT: u32 = 120;

const BG: Rgb<u8> = Rgb([245, 240, 235]);
const TITLE: Rgb<u8> = Rgb([60, 60, 60]);
const TEXT: Rgb<u8> = Rgb([80, 80, 80]);
const PRICE: Rgb<u8> = Rgb([180, 130, 100]);
const LINE: Rgb<u8> = Rgb([220, 210, 200]);

const FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/system/fonts/Roboto-Regular.ttf",
];

fn load_font() -> Option<FontVec> {
    for path in FONT_PATHS {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }
    None
}

pub fn sheet_height(service_count: usize) -> u32 {
    HEADER_HEIGHT + ROW_HEIGHT * service_count as u32 + FOOTER_HEIGHT + 2 * PADDING as u32
}

/// Рисует прайс и возвращает PNG-байты.
pub fn render_price_sheet(services: &[Service], contact: &str) -> Result<Vec<u8>, PriceImageError> {
    let font = load_font().ok_or(PriceImageError::FontUnavailable)?;

    let height = sheet_height(services.len());
    let mut img = RgbImage::from_pixel(WIDTH, height, BG);

    draw_text_mut(
        &mut img,
        TITLE,
        PADDING,
        PADDING,
        PxScale::from(48.0),
        &font,
        "ПРАЙС НА УСЛУГИ",
    );
    draw_line_segment_mut(
        &mut img,
        (PADDING as f32, (HEADER_HEIGHT - 20) as f32),
        ((WIDTH - PADDING as u32) as f32, (HEADER_HEIGHT - 20) as f32),
        LINE,
    );

    let price_column = WIDTH as i32 - PADDING - 180;
    for (row, service) in services.iter().enumerate() {
        let y = HEADER_HEIGHT as i32 + PADDING + row as i32 * ROW_HEIGHT as i32;
        draw_text_mut(&mut img, TEXT, PADDING, y, PxScale::from(28.0), &font, &service.name);
        if let Some(duration) = &service.duration {
            draw_text_mut(&mut img, LINE, PADDING, y + 32, PxScale::from(20.0), &font, duration);
        }
        draw_text_mut(
            &mut img,
            PRICE,
            price_column,
            y,
            PxScale::from(26.0),
            &font,
            &format!("{} руб.", format_price(service.price)),
        );
    }

    let footer_y = (height - FOOTER_HEIGHT) as i32;
    draw_line_segment_mut(
        &mut img,
        (PADDING as f32, footer_y as f32),
        ((WIDTH - PADDING as u32) as f32, footer_y as f32),
        LINE,
    );
    draw_text_mut(
        &mut img,
        TEXT,
        PADDING,
        footer_y + 30,
        PxScale::from(20.0),
        &font,
        contact,
    );

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

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
            duration: Some("1-2 часа".to_string()),
            photo_id: None,
            page_url: None,
            is_active: true,
            sort_order: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn height_grows_with_service_count() {
        assert!(sheet_height(5) > sheet_height(1));
        assert_eq!(sheet_height(0), HEADER_HEIGHT + FOOTER_HEIGHT + 2 * PADDING as u32);
    }

    #[test]
    fn renders_png_or_reports_missing_font() {
        let services = vec![service("Свадебная съёмка", 15_000.0)];
        match render_price_sheet(&services, "@TestBot") {
            Ok(bytes) => {
                // PNG-сигнатура
                assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
            }
            Err(PriceImageError::FontUnavailable) => {
                // Окружение без системных шрифтов — допустимый исход
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
