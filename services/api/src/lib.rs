mod admin;
mod cli;
mod infra;
mod public;
mod routes;
mod server;

#[cfg(test)]
mod tests;

use talent_bridge::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
