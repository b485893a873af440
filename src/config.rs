use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_api_key: String,
    pub mail_server: String,
    pub mail_port: u16,
    pub mail_username: String,
    pub mail_password: String,
    pub mail_from: String,
    pub mail_from_name: String,
    pub mail_starttls: bool,
    pub scheduler_enabled: bool,
    pub send_confirmation_emails: bool,
    pub openai_api_key: Option<String>,
    pub uploads_dir: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            admin_api_key: get_env("ADMIN_API_KEY")?,
            mail_server: get_env("MAIL_SERVER")?,
            mail_port: get_env_parse("MAIL_PORT")?,
            mail_username: get_env("MAIL_USERNAME")?,
            mail_password: get_env("MAIL_PASSWORD")?,
            mail_from: get_env("MAIL_FROM")?,
            mail_from_name: env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| "AfterLife Message Platform".to_string()),
            mail_starttls: get_env_bool("MAIL_STARTTLS", false)?,
            scheduler_enabled: get_env_bool("SCHEDULER_ENABLED", true)?,
            send_confirmation_emails: get_env_bool("SEND_CONFIRMATION_EMAILS", false)?,
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(Error::Config(format!(
                "Invalid value for {}: {}",
                name, other
            ))),
        },
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
