use std::collections::BTreeMap;

use serde::Serialize;

pub(crate) const UNKNOWN_LOG_ID: &str = "unknown";

/// Identifies the ledger and schema every log line belongs to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogContext<'a> {
    ledger: &'a str,
    schema: &'a str,
}

impl<'a> LogContext<'a> {
    pub(crate) fn new(ledger: &'a str, schema: &'a str) -> Self {
        Self { ledger, schema }
    }

    pub(crate) fn unknown() -> Self {
        Self::new(UNKNOWN_LOG_ID, UNKNOWN_LOG_ID)
    }
}

#[derive(Serialize)]
struct LogLine<'a> {
    level: &'static str,
    event: &'a str,
    ledger: &'a str,
    schema: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counters: Option<BTreeMap<&'a str, u64>>,
}

fn emit(line: &LogLine<'_>) {
    if let Ok(json) = serde_json::to_string(line) {
        eprintln!("{json}");
    }
}

pub(crate) fn log_info(ctx: LogContext<'_>, event: &str, counters: Option<BTreeMap<&str, u64>>) {
    emit(&LogLine {
        level: "INFO",
        event,
        ledger: ctx.ledger,
        schema: ctx.schema,
        reason_code: None,
        detail: None,
        counters,
    });
}

pub(crate) fn log_info_detail(ctx: LogContext<'_>, event: &str, detail: &str) {
    emit(&LogLine {
        level: "INFO",
        event,
        ledger: ctx.ledger,
        schema: ctx.schema,
        reason_code: None,
        detail: Some(detail),
        counters: None,
    });
}

pub(crate) fn log_warn(ctx: LogContext<'_>, event: &str, reason_code: &str, detail: Option<&str>) {
    emit(&LogLine {
        level: "WARN",
        event,
        ledger: ctx.ledger,
        schema: ctx.schema,
        reason_code: Some(reason_code),
        detail,
        counters: None,
    });
}

pub(crate) fn log_error(ctx: LogContext<'_>, event: &str, reason_code: &str, detail: Option<&str>) {
    emit(&LogLine {
        level: "ERROR",
        event,
        ledger: ctx.ledger,
        schema: ctx.schema,
        reason_code: Some(reason_code),
        detail,
        counters: None,
    });
}
