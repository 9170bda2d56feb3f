pub mod config;
pub mod crawler;
pub mod logging;
pub mod util;
pub mod web;

use anyhow::Result;

use crate::config::SETTINGS;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let address = SETTINGS.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    logging::info_console(format!("Listening on {}", address));
    axum::serve(listener, web::router()).await?;

    Ok(())
}
