pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use reqwest::Client;
use sqlx::PgPool;

use crate::services::{
    ai_service::AIService,
    delivery_service::DeliveryService,
    email_service::{Mailer, SmtpMailer},
    message_service::MessageService,
    message_store::PgMessageStore,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub message_service: MessageService,
    pub ai_service: AIService,
    pub mailer: Arc<dyn Mailer>,
    pub delivery_service: DeliveryService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let user_service = UserService::new(pool.clone());
        let message_service = MessageService::new(pool.clone());
        let ai_service = AIService::new(config.openai_api_key.clone(), http_client);

        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::from_config(config));
        let store = Arc::new(PgMessageStore::new(pool.clone()));
        let delivery_service =
            DeliveryService::new(store, mailer.clone(), config.send_confirmation_emails);

        Self {
            pool,
            user_service,
            message_service,
            ai_service,
            mailer,
            delivery_service,
        }
    }
}
