//! Input data locality policy.

use std::sync::Arc;

use tracing::trace;

use bidgrid_core::config::Locality;

use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy};
use crate::providers::StorageLocality;

pub struct InputLocalityStrategyParams {
    pub locality: Locality,
    pub storages: Arc<dyn StorageLocality>,
}

/// Under `Locality::Local`, only bids when every declared input is already
/// present on the node.
pub struct InputLocalityStrategy {
    locality: Locality,
    storages: Arc<dyn StorageLocality>,
}

impl InputLocalityStrategy {
    pub fn new(params: InputLocalityStrategyParams) -> Self {
        Self {
            locality: params.locality,
            storages: params.storages,
        }
    }
}

impl SemanticStrategy for InputLocalityStrategy {
    fn name(&self) -> &str {
        "input-locality"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        Box::pin(async move {
            if self.locality == Locality::Anywhere || request.job.is_stateless() {
                return Ok(BidResponse::proceed());
            }

            for input in &request.job.task.inputs {
                let local = self.storages.has_storage_locally(input).await?;
                trace!(
                    job_id = %request.job.id,
                    storage_type = %input.storage_type,
                    source = %input.source,
                    local,
                    "input locality checked"
                );
                if !local {
                    return Ok(BidResponse::reject(format!(
                        "input `{}` ({}) is not present on this node and the node only runs jobs with local data",
                        input.source, input.storage_type
                    )));
                }
            }

            Ok(BidResponse::accept("all inputs are present on this node"))
        })
    }
}
