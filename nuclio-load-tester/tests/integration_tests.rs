//! Integration tests for the Nuclio load tester
//!
//! These tests run the full driver against a local mock function endpoint:
//! - Invocation counts for various worker/request combinations
//! - Wire contract (header, content type, body bytes)
//! - Failure isolation against an unreachable endpoint
//! - Configuration layering from file and command line

use axum::http::StatusCode;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::net::TcpListener;

use nuclio_load_tester::config::{CliArgs, LoadTestConfig};
use nuclio_load_tester::driver::LoadTest;
use nuclio_load_tester::origin::MockOrigin;
use nuclio_load_tester::output::MemorySink;

const CONTRACT_BODY: &[u8] = br#"{"base_currency":"USD","target_currency":"SGD","amount":"100"}"#;

/// Start a mock origin on an ephemeral port and return it with its invoke URL
async fn start_mock_origin(status: StatusCode, body: &str) -> (MockOrigin, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let origin = MockOrigin::new(status, body);

    tokio::spawn(origin.clone().serve(listener));

    (origin, format!("http://{}/invoke", addr))
}

/// URL of a port nothing is listening on
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/invoke", port)
}

fn test_config(url: String, threads: usize, requests_per_thread: usize) -> LoadTestConfig {
    LoadTestConfig {
        url,
        threads,
        requests_per_thread,
        request_timeout_seconds: 5,
        ..Default::default()
    }
}

#[cfg(test)]
mod invocation_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_worker_single_request() {
        let (origin, url) = start_mock_origin(StatusCode::OK, "OK").await;
        let sink = Arc::new(MemorySink::new());

        let report = LoadTest::new(test_config(url, 1, 1), sink.clone())
            .unwrap()
            .run()
            .await;

        assert_eq!(report.total_requests, 1);
        assert_eq!(origin.received(), 1);

        let responses: Vec<_> = sink
            .lines()
            .into_iter()
            .filter(|l| l.starts_with("Response: "))
            .collect();
        assert_eq!(responses, vec!["Response: 200 - OK".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_five_workers_two_requests_each() {
        let (origin, url) = start_mock_origin(StatusCode::OK, "{\"converted\":\"134.50\"}").await;
        let sink = Arc::new(MemorySink::new());

        LoadTest::new(test_config(url, 5, 2), sink.clone())
            .unwrap()
            .run()
            .await;

        assert_eq!(origin.received(), 10);
        assert_eq!(sink.count_prefixed("Response: 200 - "), 10);
        assert_eq!(sink.count_prefixed("Request failed: "), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_total_attempts_is_threads_times_requests() {
        for (threads, requests) in [(1, 3), (4, 1), (3, 4)] {
            let (origin, url) = start_mock_origin(StatusCode::OK, "OK").await;
            let sink = Arc::new(MemorySink::new());

            LoadTest::new(test_config(url, threads, requests), sink.clone())
                .unwrap()
                .run()
                .await;

            assert_eq!(origin.received(), (threads * requests) as u64);
            assert_eq!(sink.count_prefixed("Response: "), threads * requests);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wire_contract() {
        let (origin, url) = start_mock_origin(StatusCode::OK, "OK").await;
        let sink = Arc::new(MemorySink::new());
        let config = LoadTestConfig {
            function_name: "fx-rates".to_string(),
            ..test_config(url, 2, 2)
        };

        LoadTest::new(config, sink).unwrap().run().await;

        let invocations = origin.invocations();
        assert_eq!(invocations.len(), 4);
        for invocation in invocations {
            assert_eq!(invocation.method, "POST");
            assert_eq!(invocation.path, "/invoke");
            assert_eq!(invocation.function_name.as_deref(), Some("fx-rates"));
            assert_eq!(invocation.content_type.as_deref(), Some("application/json"));
            assert_eq!(invocation.body, CONTRACT_BODY);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_error_status_is_printed_like_success() {
        let (origin, url) = start_mock_origin(StatusCode::INTERNAL_SERVER_ERROR, "  boom \n").await;
        let sink = Arc::new(MemorySink::new());

        LoadTest::new(test_config(url, 2, 1), sink.clone())
            .unwrap()
            .run()
            .await;

        assert_eq!(origin.received(), 2);
        let lines = sink.lines();
        assert_eq!(
            lines.iter().filter(|l| *l == "Response: 500 - boom").count(),
            2
        );
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_port_every_attempt_fails_and_run_completes() {
        let sink = Arc::new(MemorySink::new());

        let report = LoadTest::new(test_config(closed_port_url(), 2, 3), sink.clone())
            .unwrap()
            .run()
            .await;

        assert_eq!(report.total_requests, 6);
        assert_eq!(sink.count_prefixed("Request failed: "), 6);
        assert_eq!(sink.count_prefixed("Response: "), 0);

        let lines = sink.lines();
        let last = lines.last().unwrap();
        assert!(last.starts_with("Load test completed in "));
        assert!(last.ends_with(" seconds"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duration_line_has_two_decimals() {
        let sink = Arc::new(MemorySink::new());

        LoadTest::new(test_config(closed_port_url(), 1, 1), sink.clone())
            .unwrap()
            .run()
            .await;

        let lines = sink.lines();
        let seconds = lines
            .last()
            .unwrap()
            .trim_start_matches("Load test completed in ")
            .trim_end_matches(" seconds");
        let (_, fraction) = seconds.split_once('.').unwrap();
        assert_eq!(fraction.len(), 2);
        assert!(seconds.parse::<f64>().is_ok());
    }
}

#[cfg(test)]
mod configuration_tests {
    use super::*;

    #[test]
    fn test_default_invocation_targets_local_gateway() {
        let cli = CliArgs::parse_from(["nuclio-load-tester"]);
        let mut config = LoadTestConfig::default();
        config.apply_cli_overrides(&cli);

        assert_eq!(config.url, "http://127.0.0.1:8080/invoke");
        assert_eq!(config.function_name, "currency-converter");
        assert_eq!(config.threads, 10);
        assert_eq!(config.requests_per_thread, 10);
        assert_eq!(config.total_requests(), 100);
    }

    #[test]
    fn test_file_then_cli_precedence() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "url = \"http://10.1.2.3:8070/\"\nfunction_name = \"from-file\"\nthreads = 4\nrequests_per_thread = 7"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = CliArgs::parse_from([
            "nuclio-load-tester",
            "--config",
            &path,
            "--threads",
            "2",
        ]);

        let config = LoadTestConfig::load(&cli).unwrap();

        assert_eq!(config.url, "http://10.1.2.3:8070/");
        assert_eq!(config.function_name, "from-file");
        assert_eq!(config.threads, 2);
        assert_eq!(config.requests_per_thread, 7);
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "threads = 0").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = CliArgs::parse_from(["nuclio-load-tester", "--config", &path]);

        assert!(LoadTestConfig::load(&cli).is_err());
    }

    #[test]
    fn test_misspelled_file_key_is_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "thread = 4").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = CliArgs::parse_from(["nuclio-load-tester", "--config", &path]);

        assert!(LoadTestConfig::load(&cli).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = CliArgs::parse_from([
            "nuclio-load-tester",
            "--config",
            "/nonexistent/nuclio-load-test.toml",
        ]);

        assert!(LoadTestConfig::load(&cli).is_err());
    }

    #[test]
    fn test_dumped_config_loads_back() {
        let config = LoadTestConfig {
            threads: 3,
            function_name: "round-trip".to_string(),
            ..Default::default()
        };

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = CliArgs::parse_from(["nuclio-load-tester", "--config", &path]);

        assert_eq!(LoadTestConfig::load(&cli).unwrap(), config);
    }
}

#[cfg(test)]
mod process_tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_binary_exits_zero_when_every_request_fails() {
        let output = Command::new(env!("CARGO_BIN_EXE_nuclio-load-tester"))
            .args([
                "--url",
                &closed_port_url(),
                "--threads",
                "2",
                "--requests-per-thread",
                "3",
                "--timeout-seconds",
                "5",
            ])
            .env_remove("RUST_LOG")
            .output()
            .unwrap();

        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();

        assert_eq!(lines[0], "Starting load test with 2 threads, 3 requests each");
        assert_eq!(lines[1], "Target function: currency-converter");
        assert_eq!(lines[2], "Total requests: 6");
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("Request failed: ")).count(),
            6
        );

        // Only report lines reach stdout; logs go to stderr.
        assert_eq!(lines.len(), 3 + 6 + 2);
        assert_eq!(lines[lines.len() - 2], "");

        let last = lines[lines.len() - 1];
        let seconds = last
            .strip_prefix("Load test completed in ")
            .and_then(|rest| rest.strip_suffix(" seconds"))
            .unwrap();
        let (_, fraction) = seconds.split_once('.').unwrap();
        assert_eq!(fraction.len(), 2);
        assert!(seconds.parse::<f64>().is_ok());

        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Starting load test"));
        assert!(!stderr.contains("Request failed: "));
    }

    #[test]
    fn test_binary_rejects_invalid_configuration_before_sending() {
        let output = Command::new(env!("CARGO_BIN_EXE_nuclio-load-tester"))
            .args(["--threads", "0"])
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert!(String::from_utf8(output.stdout).unwrap().is_empty());
    }

    #[test]
    fn test_dump_config_ignores_environment() {
        let output = Command::new(env!("CARGO_BIN_EXE_nuclio-load-tester"))
            .arg("--dump-config")
            .env("NUCLIO_LOADTEST_THREADS", "3")
            .env("THREADS", "3")
            .output()
            .unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("threads = 10"));
        assert!(stdout.contains("requests_per_thread = 10"));
    }
}
