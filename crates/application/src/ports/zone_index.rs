use super::KeyspaceEvent;
use async_trait::async_trait;
use redzone_domain::DomainError;

/// Cache-side hooks driven by background jobs.
#[async_trait]
pub trait ZoneIndex: Send + Sync {
    /// Evict whatever cached state `event` invalidates.
    fn apply_event(&self, event: &KeyspaceEvent);

    /// Request a reload of the authoritative zone-name set.
    fn mark_zone_list_dirty(&self);

    /// Clear the dirty flag, returning whether it was set.
    fn take_zone_list_dirty(&self) -> bool;

    /// Reload the zone-name set from the store, returning its size.
    async fn reload_zone_list(&self) -> Result<usize, DomainError>;
}
