use redzone_application::ports::{KeyspaceEvent, ZoneIndex};
use redzone_domain::config::CacheConfig;
use redzone_domain::{DomainError, Record as Location, ZoneConfig};
use std::sync::Arc;
use std::time::Duration;

mod helpers;
use helpers::{a_set, ZoneFixture, PREFIX, ZONE};

async fn fixture() -> ZoneFixture {
    ZoneFixture::new()
        .zone(ZONE, ZoneConfig::default())
        .await
        .location(ZONE, "www", Location { a: a_set(&["192.0.2.1"]), ..Location::default() })
        .await
        .location(ZONE, "mail", Location { a: a_set(&["192.0.2.2"]), ..Location::default() })
        .await
}

fn location_key(label: &str) -> String {
    format!("{PREFIX}zones:{ZONE}:labels:{label}")
}

// ============================================================================
// Lookups
// ============================================================================

#[tokio::test]
async fn test_repeated_zone_lookup_returns_same_snapshot() {
    // Arrange
    let fixture = fixture().await;
    let cache = fixture.cache().await;

    // Act
    let first = cache.get_zone(ZONE).await.unwrap();
    let reads = fixture.store.gets();
    let second = cache.get_zone(ZONE).await.unwrap();

    // Assert
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fixture.store.gets(), reads);
    assert!(first.has_label("www"));
    assert!(first.has_label("mail"));
}

#[tokio::test]
async fn test_location_round_trip_through_cache() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();

    let record = cache.get_location(&zone, "www").await.unwrap();

    assert_eq!(record.a, a_set(&["192.0.2.1"]));
    assert_eq!(cache.cached_records(), 1);
}

#[tokio::test]
async fn test_apex_without_location_carries_zone_soa() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();

    let apex = cache.get_location(&zone, "@").await.unwrap();

    let soa = apex.soa.as_ref().unwrap();
    assert_eq!(soa.ns, "ns1.example.com.");
    assert!(apex.a.is_none());
}

#[tokio::test]
async fn test_missing_location_is_an_error() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();

    let result = cache.get_location(&zone, "nothere").await;

    assert!(matches!(result, Err(DomainError::LocationNotFound { .. })));
}

#[tokio::test]
async fn test_unknown_zone_is_not_found() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;

    let result = cache.get_zone("other.org.").await;

    assert!(matches!(result, Err(DomainError::ZoneNotFound(_))));
}

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    // Arrange
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();
    let reads = fixture.store.gets();

    // Act
    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        let zone = zone.clone();
        handles.push(tokio::spawn(async move {
            cache.get_location(&zone, "www").await.unwrap()
        }));
    }
    let mut records = Vec::new();
    for handle in handles {
        records.push(handle.await.unwrap());
    }

    // Assert
    assert_eq!(fixture.store.gets(), reads + 1);
    assert!(records.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

// ============================================================================
// Invalidation
// ============================================================================

#[tokio::test]
async fn test_location_event_refetches_only_that_location() {
    // Arrange
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();
    cache.get_location(&zone, "www").await.unwrap();
    let mail = cache.get_location(&zone, "mail").await.unwrap();

    fixture
        .data
        .set_location(ZONE, "www", &Location { a: a_set(&["192.0.2.9"]), ..Location::default() })
        .await
        .unwrap();

    // Act
    cache.apply_event(&KeyspaceEvent::new(location_key("www"), "set"));

    // Assert
    let zone_after = cache.get_zone(ZONE).await.unwrap();
    assert!(Arc::ptr_eq(&zone, &zone_after), "known label keeps the zone");
    let www = cache.get_location(&zone_after, "www").await.unwrap();
    assert_eq!(www.a, a_set(&["192.0.2.9"]));
    let mail_after = cache.get_location(&zone_after, "mail").await.unwrap();
    assert!(Arc::ptr_eq(&mail, &mail_after));
}

#[tokio::test]
async fn test_new_label_event_reloads_zone_index() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();
    assert!(!zone.has_label("api"));

    fixture
        .data
        .set_location(ZONE, "api", &Location { a: a_set(&["192.0.2.3"]), ..Location::default() })
        .await
        .unwrap();
    cache.apply_event(&KeyspaceEvent::new(location_key("api"), "set"));

    let reloaded = cache.get_zone(ZONE).await.unwrap();
    assert!(!Arc::ptr_eq(&zone, &reloaded));
    assert!(reloaded.has_label("api"));
}

#[tokio::test]
async fn test_deleted_label_event_reloads_zone_index() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    cache.get_zone(ZONE).await.unwrap();

    fixture.data.remove_location(ZONE, "mail").await.unwrap();
    cache.apply_event(&KeyspaceEvent::new(location_key("mail"), "del"));

    let reloaded = cache.get_zone(ZONE).await.unwrap();
    assert!(!reloaded.has_label("mail"));
}

#[tokio::test]
async fn test_zone_config_event_refreshes_apex_soa() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();
    cache.get_location(&zone, "@").await.unwrap();

    let mut config = ZoneConfig::default();
    config.soa.serial = 42;
    fixture.data.set_zone(ZONE, &config).await.unwrap();
    cache.apply_event(&KeyspaceEvent::new(format!("{PREFIX}zones:{ZONE}:config"), "set"));

    let zone = cache.get_zone(ZONE).await.unwrap();
    let apex = cache.get_location(&zone, "@").await.unwrap();
    assert_eq!(apex.soa.as_ref().unwrap().serial, 42);
}

#[tokio::test]
async fn test_foreign_keys_are_ignored() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();

    cache.apply_event(&KeyspaceEvent::new("other:zones:example.com.:config", "set"));

    let after = cache.get_zone(ZONE).await.unwrap();
    assert!(Arc::ptr_eq(&zone, &after));
}

// ============================================================================
// Zone list
// ============================================================================

#[tokio::test]
async fn test_zone_list_event_marks_dirty_once() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    cache.take_zone_list_dirty();

    cache.apply_event(&KeyspaceEvent::new(format!("{PREFIX}zones"), "sadd"));

    assert!(cache.take_zone_list_dirty());
    assert!(!cache.take_zone_list_dirty());
}

#[tokio::test]
async fn test_reload_zone_list_picks_longest_suffix() {
    // Arrange
    let fixture = fixture()
        .await
        .zone("sub.example.com.", ZoneConfig::default())
        .await;
    let cache = fixture.cache().await;

    // Act
    let count = cache.reload_zone_list().await.unwrap();

    // Assert
    assert_eq!(count, 2);
    assert_eq!(cache.find_zone("www.sub.example.com."), Some("sub.example.com.".to_string()));
    assert_eq!(cache.find_zone("www.example.com."), Some(ZONE.to_string()));
    assert_eq!(cache.find_zone("example.org."), None);
}

#[tokio::test]
async fn test_removed_zone_is_dropped_on_reload() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    let zone = cache.get_zone(ZONE).await.unwrap();
    cache.get_location(&zone, "www").await.unwrap();

    fixture.data.remove_zone(ZONE).await.unwrap();
    cache.reload_zone_list().await.unwrap();

    assert_eq!(cache.find_zone("www.example.com."), None);
    assert_eq!(cache.cached_zones(), 0);
    assert_eq!(cache.cached_records(), 0);
}

#[tokio::test]
async fn test_failed_reload_stays_dirty() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    cache.take_zone_list_dirty();
    fixture.store.set_failing(true);

    let result = cache.reload_zone_list().await;

    assert!(result.is_err());
    assert!(cache.take_zone_list_dirty());
    assert_eq!(cache.find_zone("www.example.com."), Some(ZONE.to_string()));
}

// ============================================================================
// Store outages
// ============================================================================

#[tokio::test]
async fn test_expired_entries_are_served_while_store_is_down() {
    // Arrange
    let fixture = fixture().await;
    let cache = fixture
        .cache_with(CacheConfig {
            zone_ttl_secs: 0,
            record_ttl_secs: 0,
            ..CacheConfig::default()
        })
        .await;
    let zone = cache.get_zone(ZONE).await.unwrap();
    cache.get_location(&zone, "www").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Act
    fixture.store.set_failing(true);
    let zone = cache.get_zone(ZONE).await;
    let record = match &zone {
        Ok(zone) => cache.get_location(zone, "www").await,
        Err(e) => Err(e.clone()),
    };

    // Assert
    assert!(zone.is_ok());
    assert_eq!(record.unwrap().a, a_set(&["192.0.2.1"]));
}

#[tokio::test]
async fn test_cold_cache_fails_while_store_is_down() {
    let fixture = fixture().await;
    let cache = fixture.cache().await;
    fixture.store.set_failing(true);

    let result = cache.get_zone(ZONE).await;

    assert!(matches!(result, Err(DomainError::StoreUnavailable(_))));
}
