//! Concurrent fan-out of per-dataset fetches for one material.

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::datasets::{DatasetKey, DatasetRegistry, DatasetSelection};
use crate::error::{GatewayError, Result};
use crate::gateway::assembler;
use crate::models::{DatasetPayload, MaterialPropertyResponse};
use crate::query::{compile_dataset, DetailRequest, UpstreamQuery};
use crate::upstream::Catalog;

type DatasetTask = JoinHandle<Result<Option<DatasetPayload>>>;

/// Datasets that will actually be fetched for a request.
///
/// `tasks` is keyed by task ids and is left out when none were supplied.
pub fn effective_selection(request: &DetailRequest) -> DatasetSelection {
    let mut selection = request.datasets;
    if request.task_ids.is_empty() {
        selection.remove(DatasetSelection::TASKS);
    }
    selection
}

/// Fetch every selected dataset concurrently and merge the results.
///
/// All queries are compiled before anything is dispatched. The first failing
/// fetch fails the whole call; fetches still in flight are detached and run to
/// completion on their own, and their results are discarded.
pub async fn aggregate(
    catalog: Arc<dyn Catalog>,
    registry: DatasetRegistry,
    request: &DetailRequest,
) -> Result<MaterialPropertyResponse> {
    catalog.check_credentials()?;

    let material_id = request.material_id.trim();
    if material_id.is_empty() {
        return Err(GatewayError::ClientInput(
            "A material id is required.".to_string(),
        ));
    }

    let plan: Vec<(DatasetKey, UpstreamQuery)> = effective_selection(request)
        .keys()
        .map(|key| {
            compile_dataset(registry.get(key), material_id, &request.task_ids)
                .map(|query| (key, query))
        })
        .collect::<Result<_>>()?;

    tracing::debug!(
        material_id,
        datasets = plan.len(),
        "Fetching material datasets"
    );

    let mut pending: FuturesUnordered<DatasetTask> = plan
        .into_iter()
        .map(|(key, query)| spawn_fetch(Arc::clone(&catalog), registry, key, query))
        .collect();

    let mut response = MaterialPropertyResponse::new(material_id);
    while let Some(joined) = pending.next().await {
        let outcome = joined
            .map_err(|e| GatewayError::Transport(format!("Dataset fetch aborted: {}", e)))
            .and_then(|shaped| shaped);

        match outcome {
            Ok(Some(payload)) => response.insert(payload),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    material_id,
                    error = %err,
                    detached = pending.len(),
                    "Dataset fetch failed; abandoning material detail"
                );
                // Dropping a JoinHandle detaches the task rather than aborting it
                drop(pending);
                return Err(err);
            }
        }
    }

    Ok(response)
}

fn spawn_fetch(
    catalog: Arc<dyn Catalog>,
    registry: DatasetRegistry,
    key: DatasetKey,
    query: UpstreamQuery,
) -> DatasetTask {
    tokio::spawn(async move {
        let descriptor = registry.get(key);
        let result = match catalog.fetch(descriptor.path, &query).await {
            Ok(envelope) => assembler::shape(descriptor, envelope.data),
            Err(err) => Err(err),
        };
        tracing::trace!(dataset = %key, ok = result.is_ok(), "Dataset fetch finished");
        result
    })
}
