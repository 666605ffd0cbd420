use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    auth::SessionKeys,
    config::Config,
    db,
    providers::{FileStore, LocalFileStore, LogMailer, Mailer, MockPaymentGateway, PaymentGateway, ResendMailer},
};

pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub sessions: SessionKeys,
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
    pub files: Arc<dyn FileStore>,
}

impl AppState {
    /// Connect the database and pick providers from the config
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let db = db::connect(&config.database_url).await?;

        let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
            Some(api_key) => Arc::new(ResendMailer::new(api_key.clone(), config.email_from.clone())?),
            None => Arc::new(LogMailer),
        };
        let files = Arc::new(LocalFileStore::new(
            config.upload_dir.clone(),
            config.public_base_url.clone(),
        ));

        Ok(Self::with_providers(config, db, mailer, Arc::new(MockPaymentGateway), files))
    }

    pub fn with_providers(
        config: Config,
        db: SqlitePool,
        mailer: Arc<dyn Mailer>,
        payments: Arc<dyn PaymentGateway>,
        files: Arc<dyn FileStore>,
    ) -> Arc<Self> {
        info!(
            mailer = mailer.provider_name(),
            payments = payments.provider_name(),
            files = files.provider_name(),
            "Providers configured"
        );

        let sessions = SessionKeys::new(
            &config.session_secret,
            config.session_ttl_days,
            config.secure_cookies,
        );

        Arc::new(Self {
            config,
            db,
            sessions,
            mailer,
            payments,
            files,
        })
    }
}
