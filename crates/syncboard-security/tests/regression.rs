#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Regression tests for syncboard-security: audit stores (memory and SQLite),
//! retention sweep, and policy checks.

use chrono::{Duration, Utc};
use std::sync::Arc;
use syncboard_core::{codes, InvocationContext, SecurityContext, SkillRecord, SkillType};
use syncboard_security::audit::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SWEEP_BATCH_SIZE};
use syncboard_security::{
    AuditStore, InvocationLogEntry, MemoryAuditStore, PolicyChecker, SecurityChecker,
    SecurityPolicy, SqliteAuditStore,
};

fn entry(skill: &str, code: &str, age: Duration) -> InvocationLogEntry {
    let base = InvocationLogEntry::new(
        skill,
        SkillType::Webhook,
        &InvocationContext::new().with_user("u-1"),
        "hello",
        code,
    )
    .with_timestamp(Utc::now() - age);
    if code == codes::PASSED {
        base.succeeded("pong")
    } else {
        base.failed("denied")
    }
}

fn stores() -> Vec<(&'static str, Box<dyn AuditStore>)> {
    vec![
        ("memory", Box::new(MemoryAuditStore::new()) as Box<dyn AuditStore>),
        (
            "sqlite",
            Box::new(SqliteAuditStore::open_in_memory().unwrap()) as Box<dyn AuditStore>,
        ),
    ]
}

fn assert_newest_first(entries: &[InvocationLogEntry]) {
    for pair in entries.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

// --- Reads ---

#[tokio::test]
async fn test_recent_is_newest_first_and_bounded() {
    for (name, store) in stores() {
        for i in 0..60 {
            store
                .append(entry("ping", codes::PASSED, Duration::minutes(i)))
                .await
                .unwrap();
        }

        let recent = store.recent(None).await.unwrap();
        assert_eq!(recent.len(), DEFAULT_PAGE_SIZE, "{name}");
        assert_newest_first(&recent);

        let five = store.recent(Some(5)).await.unwrap();
        assert_eq!(five.len(), 5, "{name}");
        assert_eq!(five[0].timestamp, recent[0].timestamp, "{name}");
    }
}

#[tokio::test]
async fn test_limit_is_clamped() {
    for (name, store) in stores() {
        for i in 0..(MAX_PAGE_SIZE as i64 + 5) {
            store
                .append(entry("bulk", codes::PASSED, Duration::seconds(i)))
                .await
                .unwrap();
        }
        let all = store.recent(Some(10_000)).await.unwrap();
        assert_eq!(all.len(), MAX_PAGE_SIZE, "{name}");
    }
}

#[tokio::test]
async fn test_by_skill_filters() {
    for (name, store) in stores() {
        store.append(entry("ping", codes::PASSED, Duration::minutes(3))).await.unwrap();
        store.append(entry("mail", codes::PASSED, Duration::minutes(2))).await.unwrap();
        store.append(entry("ping", codes::PASSED, Duration::minutes(1))).await.unwrap();

        let pings = store.by_skill("ping", None).await.unwrap();
        assert_eq!(pings.len(), 2, "{name}");
        assert!(pings.iter().all(|e| e.skill_name == "ping"));
        assert_newest_first(&pings);

        assert!(store.by_skill("missing", None).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_security_failures_only() {
    for (name, store) in stores() {
        store.append(entry("ping", codes::PASSED, Duration::minutes(4))).await.unwrap();
        store
            .append(entry("ping", codes::DOMAIN_NOT_ALLOWLISTED, Duration::minutes(3)))
            .await
            .unwrap();
        store.append(entry("mail", codes::NOT_APPROVED, Duration::minutes(2))).await.unwrap();
        store.append(entry("mail", codes::PASSED, Duration::minutes(1))).await.unwrap();

        let failures = store.security_failures(None).await.unwrap();
        assert_eq!(failures.len(), 2, "{name}");
        assert_eq!(failures[0].security_check_result, codes::NOT_APPROVED);
        assert_eq!(failures[1].security_check_result, codes::DOMAIN_NOT_ALLOWLISTED);
    }
}

#[tokio::test]
async fn test_sqlite_preserves_fields() {
    let store = SqliteAuditStore::open_in_memory().unwrap();
    let original = InvocationLogEntry::new(
        "greet",
        SkillType::Template,
        &InvocationContext::new()
            .with_thread("t-9")
            .with_user("u-9")
            .with_channel("telegram"),
        "Ada",
        codes::PASSED,
    )
    .succeeded("Hello, Ada")
    .with_duration(std::time::Duration::from_millis(7));
    store.append(original.clone()).await.unwrap();

    let loaded = store.recent(Some(1)).await.unwrap().remove(0);
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.skill_type, SkillType::Template);
    assert_eq!(loaded.thread_id.as_deref(), Some("t-9"));
    assert_eq!(loaded.channel.as_deref(), Some("telegram"));
    assert_eq!(loaded.output.as_deref(), Some("Hello, Ada"));
    assert!(loaded.success);
    assert_eq!(loaded.duration_ms, 7);
    assert_eq!(
        loaded.timestamp.timestamp_millis(),
        original.timestamp.timestamp_millis()
    );
}

#[tokio::test]
async fn test_sqlite_file_persists_across_open() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("audit").join("audit.db");
    {
        let store = SqliteAuditStore::open(&path).unwrap();
        store.append(entry("ping", codes::PASSED, Duration::zero())).await.unwrap();
    }
    let store = SqliteAuditStore::open(&path).unwrap();
    assert_eq!(store.recent(None).await.unwrap().len(), 1);
}

// --- Retention ---

#[tokio::test]
async fn test_sweep_removes_only_expired() {
    for (name, store) in stores() {
        store.append(entry("old", codes::PASSED, Duration::days(31))).await.unwrap();
        store.append(entry("old", codes::PASSED, Duration::days(45))).await.unwrap();
        store.append(entry("new", codes::PASSED, Duration::days(29))).await.unwrap();

        assert_eq!(store.sweep().await.unwrap(), 2, "{name}");
        assert_eq!(store.sweep().await.unwrap(), 0, "{name}");

        let remaining = store.recent(None).await.unwrap();
        assert_eq!(remaining.len(), 1, "{name}");
        assert_eq!(remaining[0].skill_name, "new");
    }
}

#[tokio::test]
async fn test_sweep_is_batched() {
    for (name, store) in stores() {
        for i in 0..(SWEEP_BATCH_SIZE + 3) {
            store
                .append(entry("old", codes::PASSED, Duration::days(40) + Duration::seconds(i as i64)))
                .await
                .unwrap();
        }
        assert_eq!(store.sweep().await.unwrap(), SWEEP_BATCH_SIZE, "{name}");
        assert_eq!(store.sweep().await.unwrap(), 3, "{name}");
        assert_eq!(store.sweep().await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn test_sweep_takes_oldest_expired_first() {
    for (name, store) in stores() {
        for i in 0..SWEEP_BATCH_SIZE {
            store
                .append(entry("stale", codes::PASSED, Duration::days(31) + Duration::seconds(i as i64)))
                .await
                .unwrap();
        }
        // Appended last but older than everything above.
        for _ in 0..3 {
            store
                .append(entry("ancient", codes::PASSED, Duration::days(90)))
                .await
                .unwrap();
        }

        assert_eq!(store.sweep().await.unwrap(), SWEEP_BATCH_SIZE, "{name}");
        assert!(store.by_skill("ancient", None).await.unwrap().is_empty(), "{name}");
        assert_eq!(store.by_skill("stale", None).await.unwrap().len(), 3, "{name}");
    }
}

// --- Concurrency ---

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_from_many_tasks() {
    let stores: Vec<(&str, Arc<dyn AuditStore>)> = vec![
        ("memory", Arc::new(MemoryAuditStore::new()) as Arc<dyn AuditStore>),
        (
            "sqlite",
            Arc::new(SqliteAuditStore::open_in_memory().unwrap()) as Arc<dyn AuditStore>,
        ),
    ];
    for (name, store) in stores {
        let mut handles = Vec::new();
        for task in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..20 {
                    let skill = format!("skill-{task}");
                    store
                        .append(entry(&skill, codes::PASSED, Duration::milliseconds(i)))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.recent(Some(MAX_PAGE_SIZE)).await.unwrap().len(), 320, "{name}");
        assert_eq!(store.by_skill("skill-7", None).await.unwrap().len(), 20, "{name}");
    }
}

// --- PolicyChecker ---

#[tokio::test]
async fn test_policy_checker_from_config() {
    let policy: SecurityPolicy = policy_from_json(
        r#"{"allowed_domains": ["hooks.n8n.example"], "blocked_patterns": ["(?i)password"]}"#,
    );
    assert_eq!(policy.max_input_length, 20_000);

    let checker = PolicyChecker::new(&policy).unwrap();
    let skill = SkillRecord::new(
        "n8n_flow",
        SkillType::Webhook,
        "Trigger workflow",
        serde_json::json!({"url": "https://hooks.n8n.example/flow"}),
    )
    .enabled();
    let ctx = SecurityContext {
        target_domain: Some("hooks.n8n.example".to_string()),
        ..Default::default()
    };

    assert!(checker.check(&skill, "run it", &ctx).await.allowed);
    let verdict = checker.check(&skill, "my Password is x", &ctx).await;
    assert_eq!(verdict.code, codes::BLOCKED_CONTENT);
}

fn policy_from_json(json: &str) -> SecurityPolicy {
    serde_json::from_str(json).unwrap()
}
