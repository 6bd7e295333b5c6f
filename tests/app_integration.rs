use chrono::NaiveDate;
use fundgain::core::{Investment, PriceResolver};
use fundgain::providers::FintualProvider;
use std::fs;
use std::time::Duration;
use tracing::info;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    pub fn day_body(entries: &[(&str, f64)]) -> String {
        let data: Vec<String> = entries
            .iter()
            .map(|(date, price)| {
                format!(r#"{{"type": "day", "attributes": {{"date": "{date}", "price": {price}}}}}"#)
            })
            .collect();
        format!(r#"{{"data": [{}]}}"#, data.join(","))
    }

    pub async fn mount_day(server: &MockServer, fund_id: &str, date: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/{fund_id}/days")))
            .and(query_param("date", date))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }

    pub async fn mount_range(server: &MockServer, fund_id: &str, from: &str, to: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/{fund_id}/days")))
            .and(query_param("from_date", from))
            .and(query_param("to_date", to))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }
}

use test_utils::{date, day_body, mount_day, mount_range};

fn investment() -> Investment {
    Investment {
        start_date: date("2023-04-06"),
        end_date: date("2024-04-06"),
        initial_amount: 100_000.0,
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let server = MockServer::start().await;

    // Fund 1 grows 10%, its end date falls on a gap filled from the nearest day
    mount_day(&server, "1", "2023-04-06", day_body(&[("2023-04-06", 100.0)])).await;
    mount_day(&server, "1", "2024-04-06", day_body(&[])).await;
    mount_range(
        &server,
        "1",
        "2024-03-22",
        "2024-04-21",
        day_body(&[("2024-04-08", 999.0), ("2024-04-05", 110.0)]),
    )
    .await;
    // Fund 2 grows 20%
    mount_day(&server, "2", "2023-04-06", day_body(&[("2023-04-06", 50.0)])).await;
    mount_day(&server, "2", "2024-04-06", day_body(&[("2024-04-06", 60.0)])).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
        funds:
          alpha: "1"
          beta: "2"
        provider:
          base_url: {}
          timeout_secs: 2
        search:
          max_search: 3
    "#,
        server.uri()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let portfolios_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        portfolios_file.path(),
        r#"[{"alpha": 0.5, "beta": 0.5}, {"alpha": 1.0}, {"alpha": 0.5, "gamma": 0.5}]"#,
    )
    .expect("Failed to write portfolios file");

    let result = fundgain::run(
        Some(config_file.path().to_str().unwrap()),
        portfolios_file.path(),
        &investment(),
    )
    .await;
    info!(?result, "Run finished");

    let best = result
        .expect("Run failed")
        .expect("A best portfolio should be found");
    assert_eq!(best.index, 0);
    assert!((best.gain - 15_000.0).abs() < 1e-6);
}

#[test_log::test(tokio::test)]
async fn test_unresolvable_fund_searches_bounded_windows_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/404/days"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
        .expect(1 + 4)
        .mount(&server)
        .await;

    let provider = FintualProvider::new(&server.uri(), Duration::from_secs(2)).unwrap();
    let resolver = PriceResolver::new(provider).with_search(4, 15);

    assert_eq!(resolver.resolve("404", date("2023-04-06")).await, None);
    assert_eq!(resolver.resolve("404", date("2023-04-06")).await, None);
}

#[test_log::test(tokio::test)]
async fn test_malformed_exact_day_falls_through_to_window() {
    let server = MockServer::start().await;
    mount_day(&server, "187", "2023-04-08", "not json".to_string()).await;
    mount_range(
        &server,
        "187",
        "2023-03-24",
        "2023-04-23",
        day_body(&[("2023-04-10", 1020.0), ("2023-04-06", 1000.0)]),
    )
    .await;

    let provider = FintualProvider::new(&server.uri(), Duration::from_secs(2)).unwrap();
    let resolver = PriceResolver::new(provider);

    // Both are two days away; the first listed wins
    assert_eq!(resolver.resolve("187", date("2023-04-08")).await, Some(1020.0));
}

#[test_log::test(tokio::test)]
async fn test_missing_portfolios_file_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "{}").unwrap();

    let result = fundgain::run(
        Some(config_path.to_str().unwrap()),
        &dir.path().join("portfolios.json"),
        &investment(),
    )
    .await;
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read portfolios file")
    );
}

#[test_log::test(tokio::test)]
async fn test_only_losing_portfolios_select_nothing() {
    let server = MockServer::start().await;
    mount_day(&server, "1", "2023-04-06", day_body(&[("2023-04-06", 100.0)])).await;
    mount_day(&server, "1", "2024-04-06", day_body(&[("2024-04-06", 90.0)])).await;

    let config_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        config_file.path(),
        format!("funds:\n  alpha: \"1\"\nprovider:\n  base_url: {}\n", server.uri()),
    )
    .unwrap();
    let portfolios_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(portfolios_file.path(), r#"[{"alpha": 1.0}, {"alpha": 0.5}]"#).unwrap();

    let best = fundgain::run(
        Some(config_file.path().to_str().unwrap()),
        portfolios_file.path(),
        &investment(),
    )
    .await
    .unwrap();
    assert!(best.is_none());
}
