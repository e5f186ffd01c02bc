//! Data source contract.

use crate::error::TransportError;
use crate::ids::{ItemId, PartitionId};
use crate::item::Item;
use crate::strategy::FetchShape;
use async_trait::async_trait;

/// Remote catalog the orchestration layer reads from.
///
/// Implementations must be cheap to share (`Arc<dyn CatalogSource>`); the
/// loader, controller and preloader all hold the same instance.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every item of a partition in the requested shape.
    async fn fetch_list(
        &self,
        partition: PartitionId,
        shape: FetchShape,
    ) -> Result<Vec<Item>, TransportError>;

    /// Fetch a single item in the requested shape.
    async fn fetch_detail(&self, id: &ItemId, shape: FetchShape) -> Result<Item, TransportError>;
}
