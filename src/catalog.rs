//! Read-mostly catalog endpoints
//!
//! Prices and regions change rarely, so these calls go through the
//! response cache.

use crate::client::Client;
use crate::error::Result;
use crate::pagination::ListOptions;
use crate::resource::names;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Hourly and monthly price; either may be unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Cost per hour
    #[serde(default)]
    pub hourly: Option<f64>,
    /// Cost per month
    #[serde(default)]
    pub monthly: Option<f64>,
}

/// Price override for a single region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPrice {
    /// Region id
    pub id: String,
    /// Cost per hour
    #[serde(default)]
    pub hourly: Option<f64>,
    /// Cost per month
    #[serde(default)]
    pub monthly: Option<f64>,
}

/// A network transfer price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTransferPrice {
    /// Price id
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Default price
    #[serde(default)]
    pub price: Price,
    /// Region-specific prices
    #[serde(default)]
    pub region_prices: Vec<RegionPrice>,
    /// Included transfer in GB
    #[serde(default)]
    pub transfer: u64,
}

/// A datacenter region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region id, e.g. `us-east`
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// ISO country code
    #[serde(default)]
    pub country: String,
    /// Services available in the region
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// `ok` or `outage`
    #[serde(default)]
    pub status: String,
}

impl Client {
    /// List network transfer prices (cached)
    pub async fn list_network_transfer_prices(
        &self,
        options: Option<&mut ListOptions>,
        cancel: &CancellationToken,
    ) -> Result<Vec<NetworkTransferPrice>> {
        let endpoint = self.resource(names::NETWORK_TRANSFER_PRICES)?.endpoint()?;
        self.list_all_cached(&endpoint, options, cancel).await
    }

    /// List regions (cached)
    pub async fn list_regions(
        &self,
        options: Option<&mut ListOptions>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Region>> {
        let endpoint = self.resource(names::REGIONS)?.endpoint()?;
        self.list_all_cached(&endpoint, options, cancel).await
    }
}
