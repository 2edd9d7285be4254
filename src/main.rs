use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineQuery};

use photobot::config::Config;
use photobot::{db, handlers, inline, App};

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

const DRAFT_TTL: Duration = Duration::from_secs(30 * 60);
const SWEEP_PERIOD: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let cfg = Config::from_env();
    let pool = db::get_db_pool(&cfg.database_url).await;
    db::init_schema(&pool).await.expect("Failed to init DB schema");

    let bot = Bot::new(cfg.bot_token.clone());
    let app = Arc::new(App::new(cfg, pool, bot.clone()));

    // Брошенные черновики не живут вечно
    {
        let sessions = app.sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_PERIOD);
            loop {
                interval.tick().await;
                let evicted = sessions.evict_stale(DRAFT_TTL).await;
                if evicted > 0 {
                    info!("evicted {} stale draft(s)", evicted);
                }
            }
        });
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let app = app.clone();
            move |bot: Bot, msg: Message| {
                let app = app.clone();
                async move { handlers::handle_message(bot, msg, app).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let app = app.clone();
            move |bot: Bot, q: CallbackQuery| {
                let app = app.clone();
                async move { handlers::handle_callback_query(bot, q, app).await }
            }
        }))
        .branch(Update::filter_inline_query().endpoint({
            let app = app.clone();
            move |bot: Bot, q: InlineQuery| {
                let app = app.clone();
                async move { inline::handle_inline_query(bot, q, app).await }
            }
        }));

    info!("photobot starting");
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
