//! Integration tests for the Yahoo client against a mock HTTP server

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rust_screener::{
    models::Config, FundamentalsProvider, ProviderError, ValuationScreener, YahooClient,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::logging::log_test_step;
use crate::common::test_data::{qualifying_metrics, quote_summary_body};

fn client_for(server: &MockServer) -> YahooClient {
    let config = Config {
        yahoo_base_url: server.uri(),
        rate_limit_per_minute: 60_000,
        ..Config::default()
    };
    YahooClient::new(&config).expect("client should build")
}

async fn mount_ticker(server: &MockServer, ticker: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v10/finance/quoteSummary/{}", ticker)))
        .and(query_param("modules", "summaryDetail,defaultKeyStatistics,financialData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_get_metrics_parses_quote_summary() {
    let server = MockServer::start().await;
    mount_ticker(&server, "ACME", quote_summary_body(&qualifying_metrics("ACME"))).await;

    let metrics = client_for(&server).get_metrics("acme").await.unwrap();

    assert_eq!(metrics, qualifying_metrics("ACME"));
}

#[tokio::test]
async fn test_not_found_is_unknown_ticker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "quoteSummary": {
                "result": null,
                "error": { "code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZ" }
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).get_metrics("ZZZZ").await.unwrap_err();
    assert_matches!(err, ProviderError::UnknownTicker(t) if t == "ZZZZ");
}

#[tokio::test]
async fn test_server_error_is_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_metrics("ACME").await.unwrap_err();
    assert_matches!(err, ProviderError::Status { status: 503, ref body } if body == "unavailable");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>consent</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_metrics("ACME").await.unwrap_err();
    assert_matches!(err, ProviderError::Malformed(_));
}

#[tokio::test]
async fn test_unreachable_server_is_http_error() {
    let config = Config {
        yahoo_base_url: "http://127.0.0.1:1".to_string(),
        ..Config::default()
    };
    let client = YahooClient::new(&config).unwrap();

    let err = client.get_metrics("ACME").await.unwrap_err();
    assert_matches!(err, ProviderError::Http(_));
}

#[test_log::test(tokio::test)]
async fn test_screen_end_to_end() {
    log_test_step("Screening three tickers through the mock Yahoo API");
    let server = MockServer::start().await;

    let mut weak = qualifying_metrics("WEAK");
    weak.debt_to_equity = Some(1.2);

    mount_ticker(&server, "GOOD", quote_summary_body(&qualifying_metrics("GOOD"))).await;
    mount_ticker(&server, "WEAK", quote_summary_body(&weak)).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let screener = ValuationScreener::new(client_for(&server));
    let tickers = vec!["GONE".to_string(), "WEAK".to_string(), "GOOD".to_string()];
    let run = screener.screen_run(&tickers).await;

    assert_eq!(run.fetched, vec!["WEAK".to_string(), "GOOD".to_string()]);
    assert_eq!(run.failed.len(), 1);
    assert_eq!(run.failed[0].ticker, "GONE");
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].ticker, "GOOD");
    assert_eq!(run.results[0].margin_of_safety, "36.8%");
}
