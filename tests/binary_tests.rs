use std::process::{Command, Output};

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/bitcoin_historical.html");

async fn run_cli(base_url: String, args: &[&str]) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_cmc-history"))
            .args(&args)
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .env("CMC_BASE_URL", base_url)
            .env_remove("CMC_TIMEOUT_SECS")
            .env("RUST_LOG", "off")
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn not_found_prints_diagnostic_and_exits_1() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = run_cli(
        server.uri(),
        &["fetch", "not-a-coin", "--start", "20180101", "--end", "20180105"],
    )
    .await;

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr).unwrap();
    let url = format!(
        "{}/currencies/not-a-coin/historical-data/?start=20180101&end=20180105",
        server.uri()
    );
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines[0], format!("Error fetching price data from {}", url));
    assert_eq!(lines[1], "Did you use a valid CoinMarketCap currency?");
    assert_eq!(lines.last().copied(), Some(format!("error: HTTP status 404 from {}", url).as_str()));
    assert_eq!(stderr.matches("HTTP status 404").count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn served_page_is_printed_as_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
        .mount(&server)
        .await;

    let out = run_cli(server.uri(), &["fetch", "bitcoin"]).await;

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Open,High,Low,Close,Volume,Market Cap,Average (High + Low / 2)")
    );
    assert_eq!(lines.count(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn currency_with_space_gets_hint_and_exits_1() {
    let server = MockServer::start().await;

    let out = run_cli(server.uri(), &["fetch", "bitcoin cash"]).await;

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(!stderr.contains("Error fetching price data"));
    assert!(stderr.contains("Did you use a valid CoinMarketCap currency?"));
    assert!(stderr.contains("error: invalid currency 'bitcoin cash'"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
