//! Percentile snapshots over stored scores

use crate::EngineError;
use kantei_domain::traits::ArtisanStore;
use kantei_domain::{Domain, PercentileService, PercentileSnapshot, ScoreKind};
use std::fmt::Display;

/// Rank one domain from the scores currently in the store
///
/// Artisans never recomputed have no stored score and are left out.
pub fn rank_domain<S>(
    store: &S,
    service: &PercentileService,
    domain: Domain,
    kind: ScoreKind,
) -> Result<PercentileSnapshot, EngineError>
where
    S: ArtisanStore,
    S::Error: Display,
{
    let scores = store.domain_scores(domain, kind).map_err(EngineError::store)?;
    tracing::debug!("Ranking {} {} scores in {}", scores.len(), kind, domain);
    Ok(service.rank(domain, scores)?)
}
