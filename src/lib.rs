pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::error::Result;
use crate::services::{
    catalog_service::CatalogService, gemini_service::GeminiService,
    question_service::QuestionService, runner_service::GenerationRunner,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub catalog_service: CatalogService,
    pub question_service: QuestionService,
    pub gemini_service: GeminiService,
    pub runner: GenerationRunner,
}

impl AppState {
    pub fn new(pool: PgPool) -> Result<Self> {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");

        let catalog_service = CatalogService::new(pool.clone());
        let question_service = QuestionService::new(pool.clone());
        let gemini_service = GeminiService::new(
            config.gemini_api_keys.clone(),
            http_client,
            config.max_validation_retries,
        )?;
        let runner = GenerationRunner::new(
            catalog_service.clone(),
            question_service.clone(),
            gemini_service.clone(),
        );

        Ok(Self {
            pool,
            catalog_service,
            question_service,
            gemini_service,
            runner,
        })
    }
}
