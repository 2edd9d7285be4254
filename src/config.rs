use std::env;

use teloxide::types::UserId;

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is honored via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub bot_username: String,
    pub database_url: String,
    pub admin_ids: Vec<u64>,
    pub openrouter_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_token = env::var("BOT_TOKEN").expect("BOT_TOKEN not set");
        let bot_username =
            env::var("BOT_USERNAME").unwrap_or_else(|_| "MarinaPhotoBot".to_string());
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let admin_ids = env::var("ADMIN_IDS")
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();
        let openrouter_api_key = env::var("OPENROUTER_API_KEY").ok();

        Config {
            bot_token,
            bot_username,
            database_url,
            admin_ids,
            openrouter_api_key,
        }
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id.0)
    }

    /// Deep link into this bot: `https://t.me/<username>?start=<param>`.
    pub fn deep_link(&self, param: &str) -> String {
        format!("https://t.me/{}?start={}", self.bot_username, param)
    }
}

fn parse_admin_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_admin_ids() {
        assert_eq!(parse_admin_ids("123, 456,789"), vec![123, 456, 789]);
    }

    #[test]
    fn skips_garbage_in_admin_ids() {
        assert_eq!(parse_admin_ids("123,abc, ,456"), vec![123, 456]);
        assert!(parse_admin_ids("").is_empty());
    }

    #[test]
    fn admin_gate_matches_configured_ids() {
        let cfg = Config {
            bot_token: String::new(),
            bot_username: "TestBot".to_string(),
            database_url: String::new(),
            admin_ids: vec![42],
            openrouter_api_key: None,
        };
        assert!(cfg.is_admin(UserId(42)));
        assert!(!cfg.is_admin(UserId(7)));
    }

    #[test]
    fn deep_link_uses_bot_username() {
        let cfg = Config {
            bot_token: String::new(),
            bot_username: "TestBot".to_string(),
            database_url: String::new(),
            admin_ids: vec![],
            openrouter_api_key: None,
        };
        assert_eq!(cfg.deep_link("booking"), "https://t.me/TestBot?start=booking");
    }
}
