//! Capability set served by the standalone gateway.
//!
//! Only version queries, script fetches, idle notifications and status echoes
//! are handled here; every other command falls through to the trait default
//! and reaches the client as `NO_FEATURE`.

use crate::error::GatewayError;

use common::ErrorLocation;

use gateway_core::error::HandlerError;
use gateway_core::handler::HandlerResult;
use gateway_core::{CommandContext, CommandHandler, HandlerReply};

use models::OutboundTag;

use std::panic::Location;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use url::Url;

const SCRIPT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StandaloneHandler {
    client: Client,
    version: String,
}

impl StandaloneHandler {
    /// Handler reporting this package's version.
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_version(env!("CARGO_PKG_VERSION"))
    }

    #[track_caller]
    pub fn with_version(version: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(SCRIPT_FETCH_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::HttpClient {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            client,
            version: version.into(),
        })
    }

    async fn fetch_script(&self, url: &Url) -> Result<String, HandlerError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| HandlerError::Execution {
                message: format!("Failed to fetch {url}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if !response.status().is_success() {
            return Err(HandlerError::Execution {
                message: format!("Failed to fetch {url}: HTTP {}", response.status().as_u16()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        response.text().await.map_err(|e| HandlerError::Execution {
            message: format!("Failed to read script body from {url}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

#[async_trait]
impl CommandHandler for StandaloneHandler {
    async fn geppetto_version(&self, _ctx: &CommandContext) -> HandlerResult {
        Ok(HandlerReply::message(
            OutboundTag::GeppettoVersion,
            self.version.as_str(),
        ))
    }

    async fn run_script(&self, ctx: &CommandContext, url: Url) -> HandlerResult {
        let script = self.fetch_script(&url).await?;
        info!(
            "Fetched script {} for {} ({} bytes)",
            url,
            ctx.connection_id,
            script.len()
        );
        Ok(HandlerReply::message(OutboundTag::ScriptFetched, script))
    }

    async fn idle_user(&self, ctx: &CommandContext) -> HandlerResult {
        debug!("Client {} reported idle", ctx.connection_id);
        Ok(HandlerReply::None)
    }

    async fn experiment_status(&self, _ctx: &CommandContext, data: String) -> HandlerResult {
        Ok(HandlerReply::message(OutboundTag::ExperimentStatus, data))
    }
}
