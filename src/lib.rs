pub mod actions;
pub mod admin;
pub mod assistant;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod db;
pub mod handlers;
pub mod inline;
pub mod keyboards;
pub mod models;
pub mod notify;
pub mod price_image;
pub mod session;

use sqlx::PgPool;
use teloxide::Bot;

use crate::config::Config;
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Общее состояние процесса, клонируется в каждый обработчик через Arc.
pub struct App {
    pub cfg: Config,
    pub pool: PgPool,
    pub sessions: SessionStore,
    pub notifier: Notifier,
    pub http: reqwest::Client,
}

impl App {
    pub fn new(cfg: Config, pool: PgPool, bot: Bot) -> Self {
        App {
            notifier: Notifier::new(bot),
            sessions: SessionStore::new(),
            http: reqwest::Client::new(),
            cfg,
            pool,
        }
    }
}
