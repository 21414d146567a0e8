//! Pool resolution
//!
//! Turns a logical model name plus a request capability profile into the
//! weighted candidate set dispatch will draw from. The snapshot is taken
//! once per request; admin mutations after this point do not affect an
//! in-flight dispatch.

use crate::core::balancer::PoolWeights;
use crate::core::introspect::RequestProfile;
use crate::core::providers::ProviderStyle;
use crate::storage::database::entities::{model_with_provider, provider};
use crate::storage::Repository;
use crate::utils::error::{GatewayError, Result};
use std::collections::HashMap;
use tracing::debug;

/// One request's candidate snapshot
#[derive(Debug)]
pub struct CandidatePool {
    /// Mutable mapping-id -> weight table
    pub weights: PoolWeights,
    /// Mapping-id -> (mapping, provider) lookup
    pub lookup: HashMap<i64, (model_with_provider::Model, provider::Model)>,
    /// Attempt budget from the model row
    pub max_retry: u32,
    /// Per-request time budget in seconds from the model row
    pub timeout_seconds: u64,
}

/// Resolve the eligible candidate set for `name` under `style`
pub async fn resolve(
    repo: &dyn Repository,
    name: &str,
    style: ProviderStyle,
    profile: &RequestProfile,
) -> Result<CandidatePool> {
    let model = repo
        .find_model_by_name(name)
        .await?
        .ok_or_else(|| GatewayError::ModelNotFound(name.to_string()))?;

    let mappings = repo.find_mappings_by_model_id(model.id).await?;
    if mappings.is_empty() {
        return Err(GatewayError::NoMappings(name.to_string()));
    }

    let provider_ids: Vec<i64> = mappings.iter().map(|m| m.provider_id).collect();
    let providers = repo
        .find_providers_by_ids_and_type(&provider_ids, style.as_str())
        .await?;
    if providers.is_empty() {
        return Err(GatewayError::NoProvidersForStyle {
            model: name.to_string(),
            style: style.to_string(),
        });
    }

    let providers_by_id: HashMap<i64, provider::Model> =
        providers.into_iter().map(|p| (p.id, p)).collect();

    let mut entries = Vec::new();
    let mut lookup = HashMap::new();
    for mapping in mappings {
        let Some(provider) = providers_by_id.get(&mapping.provider_id) else {
            continue;
        };
        if !is_eligible(&mapping, profile) {
            debug!(
                mapping_id = mapping.id,
                provider = %provider.name,
                "mapping filtered out by capability profile"
            );
            continue;
        }
        entries.push((mapping.id, mapping.weight));
        lookup.insert(mapping.id, (mapping, provider.clone()));
    }

    if entries.is_empty() {
        return Err(GatewayError::NoEligibleMapping(name.to_string()));
    }

    debug!(
        model = %name,
        candidates = entries.len(),
        "resolved candidate pool"
    );

    Ok(CandidatePool {
        weights: PoolWeights::new(entries),
        lookup,
        max_retry: model.max_retry.max(1) as u32,
        timeout_seconds: model.timeout_seconds.max(1) as u64,
    })
}

/// A mapping is eligible iff, for each capability the request needs, the
/// mapping's flag is not explicitly false (null means unconstrained)
fn is_eligible(mapping: &model_with_provider::Model, profile: &RequestProfile) -> bool {
    let allows = |flag: Option<bool>| flag != Some(false);
    (!profile.tool_call || allows(mapping.tool_call))
        && (!profile.structured_output || allows(mapping.structured_output))
        && (!profile.image || allows(mapping.image))
}
