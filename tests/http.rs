use once_cell::sync::Lazy;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct WeekResponse {
    week: String,
    state: BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ExerciseResponse {
    week: String,
    day: String,
    exercise: String,
    entry: Value,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("winter_arc_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/week")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_winter_arc"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn current_week(client: &Client, server: &TestServer) -> WeekResponse {
    client
        .get(format!("{}/api/week", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn post_update(client: &Client, server: &TestServer, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/api/exercise", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_week_reports_active_week_key() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let week = current_week(&client, &server).await;
    assert!(week.week.parse::<winter_arc::WeekKey>().is_ok(), "{}", week.week);

    let again = current_week(&client, &server).await;
    assert_eq!(again.week, week.week);

    let archive: Vec<Value> = client
        .get(format!("{}/api/archive", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(archive.is_empty());
}

#[tokio::test]
async fn http_update_merges_fields_into_entry() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let week = current_week(&client, &server).await.week;

    for (field, value) in [("done", json!(true)), ("weight", json!(80)), ("rpe", json!(""))] {
        let response = post_update(
            &client,
            &server,
            json!({ "week": week, "day": "tuesday", "exercise": "back-squat", "field": field, "value": value }),
        )
        .await;
        assert!(response.status().is_success());
        let body: ExerciseResponse = response.json().await.unwrap();
        assert_eq!(body.week, week);
        assert_eq!(body.day, "tuesday");
        assert_eq!(body.exercise, "back-squat");
        assert!(body.entry.get(field).is_some());
    }

    let state = current_week(&client, &server).await.state;
    let entry = &state["tuesday"]["back-squat"];
    assert_eq!(entry["done"], json!(true));
    assert_eq!(entry["weight"].as_f64(), Some(80.0));
    assert_eq!(entry["rpe"], json!(""));
}

#[tokio::test]
async fn http_update_rejects_malformed_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let week = current_week(&client, &server).await.week;

    let bad_field = post_update(
        &client,
        &server,
        json!({ "week": week, "day": "monday", "exercise": "row", "field": "sets", "value": 3 }),
    )
    .await;
    assert_eq!(bad_field.status(), StatusCode::BAD_REQUEST);

    let bad_value = post_update(
        &client,
        &server,
        json!({ "week": week, "day": "monday", "exercise": "row", "field": "done", "value": "yes" }),
    )
    .await;
    assert_eq!(bad_value.status(), StatusCode::BAD_REQUEST);

    let bad_week = post_update(
        &client,
        &server,
        json!({ "week": "next week", "day": "monday", "exercise": "row", "field": "done", "value": true }),
    )
    .await;
    assert_eq!(bad_week.status(), StatusCode::BAD_REQUEST);

    let state = current_week(&client, &server).await.state;
    assert!(state.get("monday").and_then(|day| day.get("row")).is_none());
}

#[tokio::test]
async fn http_export_downloads_text_log() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let week = current_week(&client, &server).await.week;

    let response = post_update(
        &client,
        &server,
        json!({ "week": week, "day": "monday", "exercise": "bench-press", "field": "done", "value": true }),
    )
    .await;
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"winter-arc-log-{week}.txt\"")
    );

    let text = response.text().await.unwrap();
    assert!(text.starts_with("WINTER ARC — Workout Log\nExported: "));
    assert!(text.contains(&format!("WEEK: {week} (current)\n")));
    assert!(text.contains("  Monday:\n    [x] bench press\n"));
}

#[tokio::test]
async fn http_index_renders_week_label() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let week = current_week(&client, &server).await.week;

    let html = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(&format!("Week: {week}")));
    assert!(html.contains("id=\"export-btn\""));
}
