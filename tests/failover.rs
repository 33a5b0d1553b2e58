//! Primary/backup selection and circuit breaking through a running gateway.

mod common;

use common::*;

#[tokio::test]
async fn test_healthy_primary_serves_traffic() {
    let primary = start_named_backend("primary").await;
    let backup = start_named_backend("backup").await;

    let mut config = base_config();
    config.routes.push(route("reports", "/reports", vec![primary.address(), backup.address()], false));
    let gateway = spawn_gateway(config).await;

    let res = client().get(gateway.url("/reports/summary")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "primary");

    let served = primary.traffic();
    assert_eq!(served.len(), 1);
    assert_eq!(served[0].path, "/reports/summary");
    assert_eq!(served[0].header("x-gateway-secret"), Some(GATEWAY_SECRET));
    assert!(served[0].header("x-request-id").is_some());

    // the backup is neither probed nor used
    assert!(backup.requests().is_empty());
}

#[tokio::test]
async fn test_unreachable_primary_fails_over_to_backup() {
    let backup = start_named_backend("backup").await;

    let mut config = base_config();
    config.routes.push(route(
        "reports",
        "/reports",
        vec![unreachable_address().await, backup.address()],
        false,
    ));
    let gateway = spawn_gateway(config).await;

    let res = client().get(gateway.url("/reports/summary?day=1")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "backup");

    let served = backup.requests();
    assert_eq!(served.len(), 1);
    assert_eq!(served[0].path, "/reports/summary?day=1");
}

#[tokio::test]
async fn test_failing_probes_fall_back_to_tcp_connect() {
    // every health path answers 500, but the port accepts connections
    let primary = start_backend(|path| {
        if path.ends_with("health") {
            (500, "down".to_string())
        } else {
            (200, "primary".to_string())
        }
    })
    .await;
    let backup = start_named_backend("backup").await;

    let mut config = base_config();
    config.routes.push(route("reports", "/reports", vec![primary.address(), backup.address()], false));
    let gateway = spawn_gateway(config).await;

    let res = client().get(gateway.url("/reports")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "primary");

    let probed: Vec<_> = primary
        .requests()
        .into_iter()
        .filter(|r| r.path.ends_with("health"))
        .map(|r| r.path)
        .collect();
    assert_eq!(probed, vec!["/health", "/system/health", "/database/health"]);
}

#[tokio::test]
async fn test_single_unreachable_backend_is_still_used() {
    let mut config = base_config();
    config.routes.push(route("reports", "/reports", vec![unreachable_address().await], false));
    let gateway = spawn_gateway(config).await;

    let res = client().get(gateway.url("/reports")).send().await.unwrap();
    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn test_circuit_opens_after_threshold() {
    let flaky = start_backend(|path| {
        if path.ends_with("health") {
            (200, "ok".to_string())
        } else {
            (503, "overloaded".to_string())
        }
    })
    .await;

    let mut config = base_config();
    config.circuit_breaker.failure_threshold = 2;
    config.routes.push(route("orders", "/orders", vec![flaky.address()], false));
    let gateway = spawn_gateway(config).await;
    let client = client();

    // counted failures still relay the backend's own answer
    for _ in 0..2 {
        let res = client.get(gateway.url("/orders/1")).send().await.unwrap();
        assert_eq!(res.status(), 503);
        assert_eq!(res.text().await.unwrap(), "overloaded");
    }

    // the second failure opened the circuit
    let third = client.get(gateway.url("/orders/1")).send().await.unwrap();
    assert_eq!(third.status(), 503);
    assert!(third.headers().get("retry-after").is_none());
    assert_eq!(third.text().await.unwrap(), "Service temporarily unavailable");
    assert_eq!(flaky.traffic().len(), 2);
}

#[tokio::test]
async fn test_circuit_disabled_never_short_circuits() {
    let flaky = start_backend(|path| {
        if path.ends_with("health") {
            (200, "ok".to_string())
        } else {
            (503, "maintenance".to_string())
        }
    })
    .await;

    let mut config = base_config();
    config.circuit_breaker.enabled = false;
    config.circuit_breaker.failure_threshold = 1;
    config.routes.push(route("orders", "/orders", vec![flaky.address()], false));
    let gateway = spawn_gateway(config).await;
    let client = client();

    for _ in 0..3 {
        let res = client.get(gateway.url("/orders")).send().await.unwrap();
        assert_eq!(res.status(), 503);
        assert_eq!(res.headers()["retry-after"], "30");
        assert_eq!(res.text().await.unwrap(), "maintenance");
    }
    assert_eq!(flaky.traffic().len(), 3);
}
