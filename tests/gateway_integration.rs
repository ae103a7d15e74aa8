//! End-to-end tests against a running gateway.
//!
//! Each test boots the full axum router on an ephemeral port with stub
//! shell-script workers standing in for the real Python ones, then drives
//! it over HTTP. The stubs honor the same stdio contract: read one JSON
//! request from stdin, reply on stdout, signal success via exit code.

use std::fs;
use std::net::SocketAddr;
use tempfile::TempDir;

use visamonk_gateway::config::{self, Config};
use visamonk_gateway::fallback::{FALLBACK_RESPONSES, FOLLOW_UP_PROMPTS};
use visamonk_gateway::{migrate, server};

/// Stub script bodies for the five workers, run through `sh`.
struct Workers {
    chat: String,
    scrape: String,
    reindex: String,
    file_process: String,
    tts: String,
}

impl Default for Workers {
    fn default() -> Self {
        Self {
            chat: ok_json(r#"{"success":true,"text":"Here is what I found.","followUps":["A","B"]}"#),
            scrape: ok_json(r#"{"success":true,"pages":0,"assets":[]}"#),
            reindex: ok_json(r#"{"success":true,"chunks":0,"files":0}"#),
            file_process: ok_json(r#"{"processed":true}"#),
            tts: "cat >/dev/null\nprintf 'ID3audio'\n".to_string(),
        }
    }
}

/// A worker that drains stdin and replies with a fixed JSON body.
fn ok_json(body: &str) -> String {
    format!("cat >/dev/null\necho '{}'\n", body)
}

/// A worker that fails with a diagnostic on stderr.
fn failing(stderr: &str) -> String {
    format!("cat >/dev/null\necho '{}' >&2\nexit 1\n", stderr)
}

const TEST_SECRET: &str = "integration-secret";

async fn start_gateway(tmp: &TempDir, workers: Workers) -> (SocketAddr, Config) {
    start_gateway_with_timeout(tmp, workers, 5).await
}

async fn start_gateway_with_timeout(
    tmp: &TempDir,
    workers: Workers,
    chat_timeout_secs: u64,
) -> (SocketAddr, Config) {
    let root = tmp.path();
    let scripts = root.join("scripts");
    fs::create_dir_all(&scripts).unwrap();
    for (name, body) in [
        ("chat.sh", &workers.chat),
        ("scrape.sh", &workers.scrape),
        ("reindex.sh", &workers.reindex),
        ("file_process.sh", &workers.file_process),
        ("tts.sh", &workers.tts),
    ] {
        fs::write(scripts.join(name), body).unwrap();
    }

    let config_content = format!(
        r#"[server]
bind = "127.0.0.1:0"

[auth]
secret = "{secret}"

[storage]
data_dir = "{root}/data"
scraped_dir = "{root}/scraped_data"
vectorstore_dir = "{root}/vectorstore"
db_path = "{root}/data/gateway.sqlite"

[workers]
command = "sh"

[workers.chat]
script = "{root}/scripts/chat.sh"
timeout_secs = {chat_timeout}

[workers.scrape]
script = "{root}/scripts/scrape.sh"
timeout_secs = 5

[workers.reindex]
script = "{root}/scripts/reindex.sh"
timeout_secs = 5

[workers.file_process]
script = "{root}/scripts/file_process.sh"
timeout_secs = 5

[workers.tts]
script = "{root}/scripts/tts.sh"
timeout_secs = 5
"#,
        secret = TEST_SECRET,
        root = root.display(),
        chat_timeout = chat_timeout_secs,
    );
    let config_path = root.join("gateway.toml");
    fs::write(&config_path, config_content).unwrap();

    let cfg = config::load_config(&config_path).unwrap();
    migrate::run_migrations(&cfg).await.unwrap();

    let state = server::build_state(&cfg).await.unwrap();
    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, cfg)
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

async fn login(client: &reqwest::Client, addr: SocketAddr) -> String {
    let resp = client
        .post(url(addr, "/auth/login"))
        .json(&serde_json::json!({
            "email": "admin@visamonk.ai",
            "password": "admin123",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Mint a token in the gateway's wire format with arbitrary claims.
fn sign_token(secret: &str, claims: serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload.as_bytes());
    format!("{}.{}", payload, hex::encode(mac.finalize().into_bytes()))
}

fn non_admin_token() -> String {
    let now = chrono::Utc::now().timestamp();
    sign_token(
        TEST_SECRET,
        serde_json::json!({
            "sub": "2",
            "email": "viewer@visamonk.ai",
            "isAdmin": false,
            "iat": now,
            "exp": now + 3600,
        }),
    )
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let resp = client.get(url(addr, "/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_login_issues_admin_token() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let token = login(&client, addr).await;

    // The claims segment must decode to an admin session
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    let (payload_b64, _) = token.split_once('.').unwrap();
    let claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload_b64).unwrap()).unwrap();
    assert_eq!(claims["email"], "admin@visamonk.ai");
    assert_eq!(claims["isAdmin"], true);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    for (email, password) in [
        ("admin@visamonk.ai", "wrong"),
        ("intruder@visamonk.ai", "admin123"),
        ("", ""),
    ] {
        let resp = client
            .post(url(addr, "/auth/login"))
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401, "accepted {}:{}", email, password);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["token"].is_null());
    }
}

#[tokio::test]
async fn test_verify_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let resp = client
        .get(url(addr, "/auth/verify"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["email"], "admin@visamonk.ai");
    assert_eq!(body["isAdmin"], true);

    // No header
    let resp = client.get(url(addr, "/auth/verify")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    // Tampered token
    let resp = client
        .get(url(addr, "/auth/verify"))
        .bearer_auth(format!("{}x", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_admin_endpoints_auth_ladder() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();
    let viewer = non_admin_token();

    let endpoints: [(&str, &str); 7] = [
        ("POST", "/admin/scrape"),
        ("POST", "/admin/upload"),
        ("GET", "/admin/files"),
        ("POST", "/admin/delete-files"),
        ("POST", "/admin/reindex"),
        ("POST", "/admin/clear-database"),
        ("GET", "/admin/analytics"),
    ];

    for (method, path) in endpoints {
        let request = |auth: Option<&str>| {
            let mut req = match method {
                "GET" => client.get(url(addr, path)),
                _ => client.post(url(addr, path)),
            };
            if let Some(token) = auth {
                req = req.bearer_auth(token);
            }
            req
        };

        // Missing token → 401
        let resp = request(None).send().await.unwrap();
        assert_eq!(resp.status(), 401, "{} {} without token", method, path);

        // Valid non-admin token → 403
        let resp = request(Some(&viewer)).send().await.unwrap();
        assert_eq!(resp.status(), 403, "{} {} with viewer token", method, path);
    }
}

#[tokio::test]
async fn test_chat_returns_worker_reply() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/chat"))
        .json(&serde_json::json!({
            "message": "What programs does MIT offer?",
            "language": "en",
            "history": [
                {"role": "user", "text": "hi"},
                {"role": "assistant", "text": "hello"},
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["text"], "Here is what I found.");
    assert_eq!(body["followUps"], serde_json::json!(["A", "B"]));
}

#[tokio::test]
async fn test_chat_falls_back_when_worker_fails() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        chat: failing("model unavailable"),
        ..Workers::default()
    };
    let (addr, _) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/chat"))
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "chat must not surface worker failure");
    let body: serde_json::Value = resp.json().await.unwrap();

    let text = body["text"].as_str().unwrap();
    assert!(!text.is_empty());
    assert!(
        FALLBACK_RESPONSES.contains(&text),
        "unexpected fallback text: {}",
        text
    );

    let follow_ups: Vec<&str> = body["followUps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(follow_ups, &FOLLOW_UP_PROMPTS[..3]);
}

#[tokio::test]
async fn test_chat_falls_back_on_garbage_output() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        chat: "cat >/dev/null\necho 'Traceback (most recent call last):'\n".to_string(),
        ..Workers::default()
    };
    let (addr, _) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/chat"))
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(FALLBACK_RESPONSES.contains(&body["text"].as_str().unwrap()));
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/chat"))
        .json(&serde_json::json!({"message": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_tts_streams_audio() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/tts"))
        .json(&serde_json::json!({"text": "Welcome to VisaMonk", "language": "en"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    let bytes = resp.bytes().await.unwrap();
    assert_eq!(&bytes[..], b"ID3audio");
}

#[tokio::test]
async fn test_tts_empty_output_is_500() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        // Exits 0 without producing a single audio byte
        tts: "cat >/dev/null\n".to_string(),
        ..Workers::default()
    };
    let (addr, _) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/tts"))
        .json(&serde_json::json!({"text": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn test_upload_list_delete_flow() {
    let tmp = TempDir::new().unwrap();
    let (addr, cfg) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    // Upload
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"university,program\nMIT,CS\n".to_vec())
            .file_name("universities.csv"),
    );
    let resp = client
        .post(url(addr, "/admin/upload"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["filename"], "universities.csv");
    assert_eq!(body["size"], 26);
    assert!(cfg.storage.data_dir.join("universities.csv").exists());

    // List
    let resp = client
        .get(url(addr, "/admin/files"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "universities.csv");
    assert_eq!(files[0]["location"], "uploaded");
    assert_eq!(files[0]["extension"], "CSV");

    // Delete one present and one missing name
    let resp = client
        .post(url(addr, "/admin/delete-files"))
        .bearer_auth(&token)
        .json(&serde_json::json!({"files": ["universities.csv", "missing.txt"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["deletedCount"], 1);
    assert_eq!(
        body["errors"],
        serde_json::json!(["File not found: missing.txt"])
    );
    assert!(!cfg.storage.data_dir.join("universities.csv").exists());
}

#[tokio::test]
async fn test_upload_without_file_is_400() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let form = reqwest::multipart::Form::new().text("note", "not a file");
    let resp = client
        .post(url(addr, "/admin/upload"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_delete_files_requires_array() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let resp = client
        .post(url(addr, "/admin/delete-files"))
        .bearer_auth(&token)
        .json(&serde_json::json!({"files": "universities.csv"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_scrape_persists_worker_assets() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        scrape: ok_json(
            r#"{"success":true,"pages":2,"assets":[{"name":"page_1.txt","content":"Alpha"},{"name":"page_2.txt","content":"Beta"}]}"#,
        ),
        ..Workers::default()
    };
    let (addr, cfg) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let resp = client
        .post(url(addr, "/admin/scrape"))
        .bearer_auth(&token)
        .json(&serde_json::json!({"url": "https://example.edu", "keepOldData": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["pages"], 2);

    let alpha = fs::read_to_string(cfg.storage.scraped_dir.join("page_1.txt")).unwrap();
    assert_eq!(alpha, "Alpha");

    let resp = client
        .get(url(addr, "/admin/files"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let scraped: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["location"] == "scraped")
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(scraped, vec!["page_1.txt", "page_2.txt"]);
}

#[tokio::test]
async fn test_scrape_worker_failure_is_500() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        scrape: failing("TAVILY_API_KEY not found"),
        ..Workers::default()
    };
    let (addr, _) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let resp = client
        .post(url(addr, "/admin/scrape"))
        .bearer_auth(&token)
        .json(&serde_json::json!({"url": "https://example.edu"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("TAVILY_API_KEY"), "lost diagnostics: {}", message);
}

#[tokio::test]
async fn test_reindex_reports_counters() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        reindex: ok_json(r#"{"success":true,"chunks":42,"files":3}"#),
        ..Workers::default()
    };
    let (addr, _) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let resp = client
        .post(url(addr, "/admin/reindex"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["chunks"], 42);
    assert_eq!(body["files"], 3);
}

#[tokio::test]
async fn test_reindex_degraded_reports_zero() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        reindex: "cat >/dev/null\necho 'done indexing'\n".to_string(),
        ..Workers::default()
    };
    let (addr, _) = start_gateway(&tmp, workers).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    let resp = client
        .post(url(addr, "/admin/reindex"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["chunks"], 0);
    assert_eq!(body["files"], 0);
}

#[tokio::test]
async fn test_clear_database_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let (addr, cfg) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();
    let token = login(&client, addr).await;

    fs::create_dir_all(&cfg.storage.scraped_dir).unwrap();
    fs::write(cfg.storage.scraped_dir.join("page.txt"), "x").unwrap();
    fs::create_dir_all(&cfg.storage.vectorstore_dir).unwrap();
    fs::write(cfg.storage.vectorstore_dir.join("index.faiss"), "idx").unwrap();
    fs::write(cfg.storage.vectorstore_dir.join("chunks.pkl"), "pkl").unwrap();

    for round in 0..2 {
        let resp = client
            .post(url(addr, "/admin/clear-database"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "round {}", round);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert!(body["warnings"].is_null(), "round {}: {:?}", round, body);
    }

    assert!(!cfg.storage.vectorstore_dir.join("index.faiss").exists());
    assert!(!cfg.storage.vectorstore_dir.join("chunks.pkl").exists());

    let resp = client
        .get(url(addr, "/admin/files"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_contact_and_analytics() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/contact"))
        .json(&serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "message": "How do I apply?",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Missing fields → 400
    let resp = client
        .post(url(addr, "/contact"))
        .json(&serde_json::json!({"name": "Asha"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Two identical chat queries dominate the analytics report
    for _ in 0..2 {
        client
            .post(url(addr, "/chat"))
            .json(&serde_json::json!({"message": "What is the tuition at MIT?"}))
            .send()
            .await
            .unwrap();
    }
    let token = login(&client, addr).await;
    let resp = client
        .get(url(addr, "/admin/analytics"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let top = body.as_array().unwrap();
    assert_eq!(top[0]["query"], "What is the tuition at MIT?");
    assert_eq!(top[0]["count"], 2);
}

#[tokio::test]
async fn test_chat_survives_slow_worker() {
    let tmp = TempDir::new().unwrap();
    let workers = Workers {
        chat: "cat >/dev/null\nsleep 30\n".to_string(),
        ..Workers::default()
    };
    let (addr, _) = start_gateway_with_timeout(&tmp, workers, 1).await;

    let client = reqwest::Client::new();
    let start = std::time::Instant::now();
    let resp = client
        .post(url(addr, "/chat"))
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(
        start.elapsed() < std::time::Duration::from_secs(10),
        "timeout did not fire"
    );
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(FALLBACK_RESPONSES.contains(&body["text"].as_str().unwrap()));
}

/// The auth ladder is per-request: a token minted with one secret must
/// not verify on a gateway configured with another.
#[tokio::test]
async fn test_token_from_other_deployment_rejected() {
    let tmp = TempDir::new().unwrap();
    let (addr, _) = start_gateway(&tmp, Workers::default()).await;
    let client = reqwest::Client::new();

    let now = chrono::Utc::now().timestamp();
    let foreign = sign_token(
        "some-other-secret",
        serde_json::json!({
            "sub": "1",
            "email": "admin@visamonk.ai",
            "isAdmin": true,
            "iat": now,
            "exp": now + 3600,
        }),
    );
    let resp = client
        .get(url(addr, "/auth/verify"))
        .bearer_auth(&foreign)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
