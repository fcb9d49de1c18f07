//! Saved profile address management.
//!
//! # Environment Variables
//!
//! - `DELIVERY_API_BASE_URL` - Delivery REST API base URL
//! - `DELIVERY_USER_ID` - User whose profile is read or changed

use std::io::Write as _;

use delivery_checkout::{ApiConfig, CheckoutConfig, ProfileClient};
use delivery_core::UserId;
use thiserror::Error;
use tracing::info;

/// Errors that stop an address command before any request is made.
#[derive(Debug, Error)]
pub enum AddressCommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
}

fn target(config: &CheckoutConfig) -> Result<(&ApiConfig, UserId), AddressCommandError> {
    let api = config
        .api
        .as_ref()
        .ok_or(AddressCommandError::MissingEnvVar("DELIVERY_API_BASE_URL"))?;
    let user_id = config
        .user_id
        .ok_or(AddressCommandError::MissingEnvVar("DELIVERY_USER_ID"))?;
    Ok((api, user_id))
}

/// Print the user's saved address.
///
/// # Errors
///
/// Returns an error if the API or user is not configured, or the request
/// fails.
pub async fn show(config: &CheckoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (api, user_id) = target(config)?;
    let client = ProfileClient::new(api)?;

    let mut stdout = std::io::stdout();
    match client.get_address(user_id).await? {
        Some(address) => writeln!(stdout, "{}", address.display_line())?,
        None => writeln!(stdout, "No saved address.")?,
    }
    Ok(())
}

/// Remove the user's saved address.
///
/// # Errors
///
/// Returns an error if the API or user is not configured, or the request
/// fails.
pub async fn forget(config: &CheckoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (api, user_id) = target(config)?;
    let client = ProfileClient::new(api)?;

    let message = client.delete_address(user_id).await?;
    info!(user_id = %user_id, "Saved address removed");
    writeln!(std::io::stdout(), "{message}")?;
    Ok(())
}
