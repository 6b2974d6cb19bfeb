//! Registry store behavior: ordering, eviction and in-place replacement.


use std::sync::Arc;

use peer_mesh::registry::{Peer, Registry, Role};
use test_harness::TempRegistry;

#[tokio::test]
async fn test_append_lands_after_existing_entries() {
    let reg = TempRegistry::new();
    reg.seed(&[
        Peer::new("a", Role::Seller, 3000),
        Peer::new("b", Role::Manager, 3001),
    ])
    .await;

    let c = Peer::new("c", Role::Seller, 3002);
    reg.registry.append(c.clone()).await.unwrap();

    let peers = reg.registry.list().await.unwrap();
    assert_eq!(peers.len(), 3);
    assert_eq!(peers.last(), Some(&c));
    assert_eq!(peers.iter().filter(|p| **p == c).count(), 1);
}

#[tokio::test]
async fn test_remove_keeps_relative_order() {
    let reg = TempRegistry::new();
    reg.seed(&[
        Peer::new("a", Role::Seller, 3000),
        Peer::new("b", Role::Manager, 3001),
        Peer::new("c", Role::Server, 3002),
        Peer::new("d", Role::Seller, 3003),
    ])
    .await;

    assert!(reg.registry.remove_by_id("b").await.unwrap());

    assert_eq!(reg.ids().await, vec!["a", "c", "d"]);
    // Removing again finds nothing and changes nothing.
    assert!(!reg.registry.remove_by_id("b").await.unwrap());
    assert_eq!(reg.ids().await, vec!["a", "c", "d"]);
}

#[tokio::test]
async fn test_replace_keeps_position() {
    let reg = TempRegistry::new();
    reg.seed(&[
        Peer::new("s1", Role::Seller, 3000),
        Peer::new("m1", Role::Manager, 3001),
        Peer::new("s2", Role::Seller, 3002),
    ])
    .await;

    let promoted = Peer::new("fresh", Role::Server, 3001);
    assert!(reg.registry.replace("m1", promoted.clone()).await.unwrap());

    let peers = reg.registry.list().await.unwrap();
    assert_eq!(peers[1], promoted);
    assert_eq!(reg.ids().await, vec!["s1", "fresh", "s2"]);
    assert_eq!(reg.registry.find_server().await.unwrap(), Some(promoted));
}

#[tokio::test]
async fn test_find_server_takes_first_in_order() {
    let reg = TempRegistry::new();
    reg.seed(&[
        Peer::new("s1", Role::Seller, 3000),
        Peer::new("sv1", Role::Server, 3001),
        Peer::new("sv2", Role::Server, 3002),
    ])
    .await;

    assert_eq!(
        reg.registry.find_server().await.unwrap().map(|p| p.id),
        Some("sv1".to_string())
    );
}

#[tokio::test]
async fn test_concurrent_appends_in_one_process_are_not_lost() {
    let reg = TempRegistry::new();
    let registry = Arc::new(Registry::new(reg.path()));

    let mut handles = Vec::new();
    for i in 0..20u16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .append(Peer::new(format!("p{}", i), Role::Seller, 3000 + i))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(registry.list().await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_snapshot_is_pretty_json_array() {
    let reg = TempRegistry::new();
    reg.seed(&[Peer::new("s1", Role::Seller, 3000)]).await;

    let raw = tokio::fs::read_to_string(reg.path()).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{"id": "s1", "role": "seller", "port": 3000}])
    );
    assert!(raw.contains('\n'));
}
