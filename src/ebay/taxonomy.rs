use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::ebay::env::EbayEnv;

#[derive(Debug, Error)]
pub enum EbayTaxonomyError {
    #[error("taxonomy request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryTreeResponse {
    category_tree_id: String,
}

/// Read-only lookup served by the application (client-credentials) token,
/// not the user token.
pub async fn default_category_tree_id(
    http: &Client,
    env: EbayEnv,
    marketplace_id: &str,
    access_token: &str,
) -> Result<String, EbayTaxonomyError> {
    let url = format!(
        "{}/commerce/taxonomy/v1/get_default_category_tree_id",
        env.api_root()
    );
    let response = http
        .get(url)
        .query(&[("marketplace_id", marketplace_id)])
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|err| EbayTaxonomyError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(EbayTaxonomyError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let payload: CategoryTreeResponse = response
        .json()
        .await
        .map_err(|err| EbayTaxonomyError::Request(err.to_string()))?;
    Ok(payload.category_tree_id)
}
