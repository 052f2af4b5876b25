use std::fs;
use std::path::Path;

use bulkrooms_core::config::{AppConfig, LoadOptions};
use bulkrooms_core::counters::CounterService;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 4] =
    ["webhook_endpoint", "counters_storage", "geolocation", "autosuggest"];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            json!({
                "overall_status": "fail",
                "summary": "doctor serialization failed",
                "error": error.to_string(),
            })
            .to_string()
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::new(
                "config_validation",
                CheckStatus::Pass,
                "configuration loaded and validated",
            ));
            checks.push(check_webhook(&config));
            checks.push(check_counters(&config));
            checks.push(check_geolocation(&config));
            checks.push(check_autosuggest(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::new(
                "config_validation",
                CheckStatus::Fail,
                error.to_string(),
            ));
            checks.extend(DEPENDENT_CHECKS.into_iter().map(|name| {
                DoctorCheck::new(
                    name,
                    CheckStatus::Skipped,
                    "skipped because configuration did not load",
                )
            }));
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let (overall_status, summary) = if failed {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

/// Reports scheme and host only; the path of a spreadsheet web app URL is a credential.
fn check_webhook(config: &AppConfig) -> DoctorCheck {
    let url = config.webhook.url.expose_secret();
    let Some((scheme, rest)) = url.split_once("://") else {
        return DoctorCheck::new("webhook_endpoint", CheckStatus::Fail, "webhook url has no scheme");
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return DoctorCheck::new("webhook_endpoint", CheckStatus::Fail, "webhook url has no host");
    }

    DoctorCheck::new(
        "webhook_endpoint",
        CheckStatus::Pass,
        format!(
            "posting quotes to sheet `{}` and contact messages to sheet `{}` \
             via {scheme}://{host}/***",
            config.webhook.quote_sheet,
            config.webhook.contact_sheet
        ),
    )
}

fn check_counters(config: &AppConfig) -> DoctorCheck {
    let counters = match CounterService::init(&config.counters) {
        Ok(counters) => counters,
        Err(error) => {
            return DoctorCheck::new("counters_storage", CheckStatus::Fail, error.to_string());
        }
    };

    let directory = counters
        .path()
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if fs::metadata(directory).is_ok_and(|metadata| metadata.permissions().readonly()) {
        return DoctorCheck::new(
            "counters_storage",
            CheckStatus::Fail,
            format!("counters directory `{}` is read-only", directory.display()),
        );
    }

    let snapshot = counters.snapshot();
    DoctorCheck::new(
        "counters_storage",
        CheckStatus::Pass,
        format!(
            "`{}`: {} hours saved, {} savings, {} quotes",
            counters.path().display(),
            snapshot.hours_saved,
            snapshot.savings,
            snapshot.quotes_submitted
        ),
    )
}

fn check_geolocation(config: &AppConfig) -> DoctorCheck {
    if !config.geolocation.enabled {
        return DoctorCheck::new("geolocation", CheckStatus::Skipped, "geolocation is disabled");
    }
    DoctorCheck::new(
        "geolocation",
        CheckStatus::Pass,
        format!("looking up visitors via `{}`", config.geolocation.base_url),
    )
}

fn check_autosuggest(config: &AppConfig) -> DoctorCheck {
    let Some(base_url) = config.autosuggest.base_url.as_deref() else {
        return DoctorCheck::new(
            "autosuggest",
            CheckStatus::Skipped,
            "no provider configured; location suggestions are disabled",
        );
    };

    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return DoctorCheck::new(
            "autosuggest",
            CheckStatus::Fail,
            format!("autosuggest base url `{base_url}` must start with http:// or https://"),
        );
    }

    let key = if config.autosuggest.api_key.is_some() { "with" } else { "without" };
    DoctorCheck::new(
        "autosuggest",
        CheckStatus::Pass,
        format!(
            "suggesting places from `{base_url}` {key} an api key (default region {})",
            config.autosuggest.default_region
        ),
    )
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
