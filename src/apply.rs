//! The applier driver: builds the dependency graph, then pulls ready nodes
//! one at a time, dispatches to the matching executor, and records
//! success/failure/skip until the graph is done.

#[cfg(test)]
mod integration_tests;

use tokio_util::sync::CancellationToken;

use crate::catalog::Catalog;
use crate::errors::{Error, ResourceIdentity};
use crate::executors;
use crate::graph::DependencyGraph;
use crate::logger::Logger;
use crate::observability::messages::apply::{
    ApplyCancelled, ApplyCompleted, ApplyStarted, ConstructionFailed,
};
use crate::observability::messages::resource::{
    ResourceApplying, ResourceFailed, ResourceSkipped, ResourceSucceeded,
};
use crate::system::System;

/// Bring the host into the state described by `catalog`.
///
/// Returns `Ok(())` iff every resource applied successfully. A single
/// resource's failure never aborts the loop: it is recorded, its
/// descendants are skipped, and `Error::NotClean` is returned only after
/// every remaining runnable resource has been attempted.
pub async fn apply(
    ctx: &CancellationToken,
    system: &dyn System,
    logger: &dyn Logger,
    catalog: &Catalog,
) -> Result<(), Error> {
    let mut graph = DependencyGraph::build(catalog).map_err(|e| {
        logger.error(&ConstructionFailed { error: &e });
        Error::Construction(e)
    })?;

    let total = catalog.len();
    logger.infof(&ApplyStarted {
        resource_count: total,
    });

    let mut applied = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    loop {
        if ctx.is_cancelled() {
            logger.infof(&ApplyCancelled {
                applied,
                remaining: total.saturating_sub(applied + failed + skipped),
            });
            return Err(Error::Cancelled);
        }

        if graph.done() {
            break;
        }

        let ready = graph.ready();
        let handle = *ready.first().ok_or_else(|| {
            Error::Internal("ready() returned empty while the graph is not done".into())
        })?;

        let identity = graph.identity(handle);
        logger.infof(&ResourceApplying {
            resource: &identity,
        });

        let body = graph.resource(handle).body.clone();
        match executors::apply(ctx, system, &identity, &body).await {
            Ok(()) => {
                graph.mark(handle);
                applied += 1;
                logger.infof(&ResourceSucceeded {
                    resource: &identity,
                });
            }
            Err(err) => {
                failed += 1;
                logger.error(&ResourceFailed { error: &err });

                let skipped_handles = graph.mark_failure(handle);
                if !skipped_handles.is_empty() {
                    let descendants: Vec<ResourceIdentity> = skipped_handles
                        .iter()
                        .map(|h| graph.identity(*h))
                        .collect();
                    skipped += descendants.len();
                    logger.infof(&ResourceSkipped {
                        parent: &identity,
                        descendants: &descendants,
                    });
                }
            }
        }
    }

    logger.infof(&ApplyCompleted {
        resource_count: total,
        failed,
        skipped,
    });

    if failed > 0 || skipped > 0 {
        Err(Error::NotClean { failed, skipped })
    } else {
        Ok(())
    }
}
