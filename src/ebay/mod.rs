pub mod auth;
pub mod env;
pub mod images;
pub mod inventory;
pub mod offers;
pub mod store;
pub mod taxonomy;

use async_trait::async_trait;

pub use auth::{Credentials, TokenLifecycle};
pub use env::EbayEnv;

use crate::dispatch::{BulkSink, SubmitError};
use crate::http::build_client;

/// Authenticated handle over the bulk Sell Inventory endpoints; the sink the
/// dispatcher drains batches into.
#[derive(Clone)]
pub struct SellClient {
    http: reqwest::Client,
    env: EbayEnv,
    access_token: String,
}

impl SellClient {
    pub fn new(env: EbayEnv, access_token: String) -> Self {
        Self {
            http: build_client(),
            env,
            access_token,
        }
    }
}

#[async_trait]
impl BulkSink for SellClient {
    async fn submit_inventory(
        &self,
        requests: &[inventory::InventoryItemPayload],
    ) -> Result<(), SubmitError> {
        inventory::bulk_create_or_replace(&self.http, self.env, &self.access_token, requests)
            .await
            .map_err(|err| SubmitError(err.to_string()))
    }

    async fn submit_offers(
        &self,
        requests: &[offers::OfferPayload],
    ) -> Result<(), SubmitError> {
        offers::bulk_create_offer(&self.http, self.env, &self.access_token, requests)
            .await
            .map_err(|err| SubmitError(err.to_string()))
    }
}
