//! Stylist identity resolver
//!
//! Maps external scheduling identifiers to provider records. Unknown ids
//! are auto-provisioned with the default flat rate; known records only
//! ever have a generated placeholder name replaced — re-synchronization
//! never re-enables or re-rates a provider an administrator has
//! deliberately configured.

use shared::models::{DEFAULT_COMMISSION_RATE, StylistProvider, placeholder_name};

use crate::store::{StoreError, StoreResult, SyncStore};

/// A usable candidate name: non-empty and not itself a placeholder
fn real_name(candidate: Option<&str>) -> Option<&str> {
    candidate
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.starts_with(shared::models::UNKNOWN_PROVIDER_PREFIX))
}

/// Resolve the provider for an external scheduling id, creating one when
/// unknown. The returned record may be disabled — callers must then skip
/// synchronization without treating it as an error.
pub async fn resolve_provider(
    store: &dyn SyncStore,
    external_scheduling_id: &str,
    candidate_name: Option<&str>,
    candidate_role: Option<&str>,
    now_ms: i64,
) -> StoreResult<StylistProvider> {
    if let Some(provider) = store
        .find_provider_by_external_id(external_scheduling_id)
        .await?
    {
        if provider.has_placeholder_name() {
            if let Some(name) = real_name(candidate_name) {
                store
                    .update_provider_identity(&provider.id, name, candidate_role)
                    .await?;
                tracing::info!(
                    provider_id = %provider.id,
                    name = name,
                    "Filled in provider name from scheduling event"
                );
                return Ok(StylistProvider {
                    name: name.to_string(),
                    role: candidate_role
                        .map(str::to_string)
                        .or(provider.role.clone()),
                    ..provider
                });
            }
        }
        return Ok(provider);
    }

    let provider = StylistProvider {
        id: uuid::Uuid::new_v4().to_string(),
        external_scheduling_id: external_scheduling_id.to_string(),
        external_staff_id: None,
        name: real_name(candidate_name)
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_name(external_scheduling_id)),
        role: candidate_role.map(str::to_string),
        commission_rate: DEFAULT_COMMISSION_RATE,
        hourly_rate: 0.0,
        enabled: true,
        pin_hash: None,
        created_at: now_ms,
    };

    match store.create_provider(&provider).await {
        Ok(()) => {
            tracing::info!(
                provider_id = %provider.id,
                external_scheduling_id = external_scheduling_id,
                "Auto-provisioned provider"
            );
            Ok(provider)
        }
        // Lost a concurrent provisioning race — the winner's record is
        // authoritative
        Err(StoreError::Duplicate(_)) => store
            .find_provider_by_external_id(external_scheduling_id)
            .await?
            .ok_or_else(|| {
                StoreError::Database(format!(
                    "Provider for '{external_scheduling_id}' vanished after duplicate insert"
                ))
            }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use shared::models::ProviderUpdate;

    #[tokio::test]
    async fn unknown_id_is_provisioned_with_defaults() {
        let store = MemStore::new();
        let provider = resolve_provider(&store, "ext-1", Some("Dana R."), Some("stylist"), 10)
            .await
            .unwrap();
        assert_eq!(provider.name, "Dana R.");
        assert_eq!(provider.commission_rate, DEFAULT_COMMISSION_RATE);
        assert!(provider.enabled);

        let stored = store
            .find_provider_by_external_id("ext-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, provider.id);
    }

    #[tokio::test]
    async fn unknown_id_without_a_name_gets_a_placeholder() {
        let store = MemStore::new();
        let provider = resolve_provider(&store, "ext-2", None, None, 10).await.unwrap();
        assert!(provider.has_placeholder_name());
    }

    #[tokio::test]
    async fn placeholder_name_is_replaced_but_config_is_preserved() {
        let store = MemStore::new();
        let provisional = resolve_provider(&store, "ext-3", None, None, 10).await.unwrap();

        // Administrator tunes the record before a named event arrives
        store
            .update_provider(
                &provisional.id,
                &ProviderUpdate {
                    commission_rate: Some(55.0),
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let resolved = resolve_provider(&store, "ext-3", Some("Alex"), None, 20)
            .await
            .unwrap();
        assert_eq!(resolved.name, "Alex");
        assert_eq!(resolved.commission_rate, 55.0);
        assert!(!resolved.enabled, "resolution must not re-enable");
    }

    #[tokio::test]
    async fn real_names_are_never_overwritten() {
        let store = MemStore::new();
        resolve_provider(&store, "ext-4", Some("Dana R."), None, 10)
            .await
            .unwrap();
        let resolved = resolve_provider(&store, "ext-4", Some("Somebody Else"), None, 20)
            .await
            .unwrap();
        assert_eq!(resolved.name, "Dana R.");
    }

    #[tokio::test]
    async fn placeholder_candidates_do_not_replace_placeholders() {
        let store = MemStore::new();
        let provisional = resolve_provider(&store, "ext-5", None, None, 10).await.unwrap();
        let resolved = resolve_provider(
            &store,
            "ext-5",
            Some("Unknown provider ext-5"),
            None,
            20,
        )
        .await
        .unwrap();
        assert_eq!(resolved.name, provisional.name);
    }
}
