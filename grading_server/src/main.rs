mod api;
mod capture;
mod database;
mod settings;

use std::sync::Arc;

use ab_glyph::FontVec;
use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use crate::api::AppState;
use crate::database::Database;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    info!("Starting grading server on port {}", settings.port);

    let db = Database::connect_lazy(&settings.database_url())?;
    let font = load_font(&settings);

    let port = settings.port;
    let state = AppState {
        db,
        settings: Arc::new(settings),
        font: Arc::new(font),
    };

    api::serve(state, port).await
}

fn load_font(settings: &Settings) -> Option<FontVec> {
    let path = settings.font_path.as_ref()?;
    match std::fs::read(path) {
        Ok(data) => match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!("Loaded annotation font {:?}", path);
                Some(font)
            }
            Err(err) => {
                warn!("Invalid annotation font {:?}: {err}; labels disabled", path);
                None
            }
        },
        Err(err) => {
            warn!(
                "Could not read annotation font {:?}: {err}; labels disabled",
                path
            );
            None
        }
    }
}
