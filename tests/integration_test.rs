//! End-to-end checks against a running server.
//!
//! Start the service (any store) and run with
//! `BASE_URL=http://localhost:3000 cargo test -- --ignored`.

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Alarm {
    id: i32,
    alarm_time: String,
    active: bool,
    timezone: f32,
}

#[derive(Debug, Deserialize)]
struct SetAlarmResponse {
    success: bool,
    alarm: Alarm,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    message: String,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into())
}

async fn list(client: &Client, base: &str) -> Result<Vec<Alarm>> {
    Ok(client
        .get(format!("{}/api/alarms", base))
        .send()
        .await?
        .json()
        .await?)
}

#[tokio::test]
#[ignore = "requires a running server at BASE_URL"]
async fn alarm_lifecycle_round_trip() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();

    // 1) Create
    let resp = client
        .post(format!("{}/api/set-alarm", base))
        .json(&json!({"alarm_time": "07:30", "timezone": -5}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: SetAlarmResponse = resp.json().await?;
    assert!(created.success);
    assert_eq!(created.alarm.alarm_time, "07:30");
    assert_eq!(created.alarm.timezone, -5.0);
    assert!(created.alarm.active);

    let id = created.alarm.id;
    let alarms = list(&client, &base).await?;
    assert!(
        alarms.iter().any(|a| a.id == id && a.active),
        "new alarm {} missing from listing",
        id
    );

    // 2) Update
    let resp = client
        .post(format!("{}/api/set-alarm", base))
        .json(&json!({"id": id, "alarm_time": "08:00", "timezone": 2}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: SetAlarmResponse = resp.json().await?;
    assert_eq!(updated.alarm.id, id);
    assert_eq!(updated.alarm.alarm_time, "08:00");

    // 3) Delete twice: both succeed
    for _ in 0..2 {
        let resp = client
            .post(format!("{}/api/delete-alarm", base))
            .json(&json!({"id": id}))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Envelope = resp.json().await?;
        assert!(body.success, "delete failed: {}", body.message);
    }

    // 4) Listing never shows inactive alarms
    let alarms = list(&client, &base).await?;
    assert!(alarms.iter().all(|a| a.active));
    assert!(alarms.iter().all(|a| a.id != id));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running server at BASE_URL"]
async fn rejects_bad_input_and_unknown_ids() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();

    for bad in ["24:00", "9:30", "", "12:60"] {
        let resp = client
            .post(format!("{}/api/set-alarm", base))
            .json(&json!({"alarm_time": bad, "timezone": 0}))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{:?} accepted", bad);
        let body: Envelope = resp.json().await?;
        assert!(!body.success);
    }

    let resp = client
        .post(format!("{}/api/alarm-stopped/{}", base, i32::MAX))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(format!("{}/api/set-alarm", base))
        .json(&json!({"id": i32::MAX, "alarm_time": "08:00", "timezone": 2}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running server at BASE_URL"]
async fn next_alarm_is_active_or_empty() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/api/next-alarm", base))
        .send()
        .await?
        .json()
        .await?;

    if body.as_object().is_some_and(|o| o.is_empty()) {
        assert!(list(&client, &base).await?.is_empty());
    } else {
        let next: Alarm = serde_json::from_value(body)?;
        assert!(next.active);
        assert_eq!(next.alarm_time.len(), 5);
    }

    Ok(())
}
