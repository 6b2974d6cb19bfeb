//! Role scheduler: one task per peer, cancel-then-install on every switch.


use std::time::Duration;

use peer_mesh::registry::{Peer, Role};
use peer_mesh::scheduler::tasks::{run_cycle, CycleOutcome};
use test_harness::{offline_context, TempRegistry};

#[tokio::test]
async fn test_fresh_scheduler_has_no_task() {
    let reg = TempRegistry::new();
    let ctx = offline_context(reg.path(), Peer::new("s1", Role::Seller, 3000));

    assert_eq!(ctx.scheduler().current_role().await, None);
    assert_eq!(ctx.scheduler().active_tasks(), 0);
    assert_eq!(ctx.scheduler().cancel().await, None);
}

#[tokio::test]
async fn test_switching_roles_leaves_exactly_one_task() {
    let reg = TempRegistry::new();
    let ctx = offline_context(reg.path(), Peer::new("s1", Role::Seller, 3000));
    let roles = [Role::Seller, Role::Manager, Role::Server, Role::Seller, Role::Server];

    for (n, role) in roles.iter().enumerate() {
        ctx.scheduler().switch_to(*role, ctx.clone()).await;
        assert_eq!(
            ctx.scheduler().active_tasks(),
            1,
            "after switch #{}",
            n + 1
        );
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.scheduler().active_tasks(), 1);
    assert_eq!(ctx.scheduler().current_role().await, Some(Role::Server));

    assert_eq!(ctx.scheduler().cancel().await, Some(Role::Server));
    assert_eq!(ctx.scheduler().active_tasks(), 0);
}

#[tokio::test]
async fn test_busy_client_task_is_cancelled_promptly() {
    let reg = TempRegistry::new();
    let mut config = test_harness::test_config(reg.path(), 45_100).with_role_interval(5, 10);
    config.server_heartbeat_ms = 5;
    let ctx = std::sync::Arc::new(
        peer_mesh::node::PeerContext::new(config, Peer::new("s1", Role::Seller, 3000)).unwrap(),
    );

    ctx.scheduler().switch_to(Role::Seller, ctx.clone()).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    ctx.scheduler().switch_to(Role::Server, ctx.clone()).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(ctx.scheduler().active_tasks(), 1);
    let stopped = tokio::time::timeout(Duration::from_secs(2), ctx.scheduler().cancel())
        .await
        .expect("cancel should not hang");
    assert_eq!(stopped, Some(Role::Server));
    assert_eq!(ctx.scheduler().active_tasks(), 0);
}

#[tokio::test]
async fn test_cycle_without_server_is_skipped() {
    let reg = TempRegistry::new();
    let me = Peer::new("s1", Role::Seller, 3000);
    reg.seed(&[me.clone(), Peer::new("m1", Role::Manager, 3001)])
        .await;
    let ctx = offline_context(reg.path(), me);

    let outcome = run_cycle(Role::Seller, &ctx).await.unwrap();

    assert_eq!(outcome, CycleOutcome::NoServer);
    assert_eq!(reg.ids().await, vec!["s1", "m1"]);
}
