use crate::event::LogPayload;
use crate::i18n;

const SEPARATOR: &str = " | ";

/// Human-readable duration: seconds with one decimal from 1000ms up, else milliseconds.
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms >= 1000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{duration_ms}ms")
    }
}

/// Display line for a `log` event. Absent fields contribute nothing.
pub fn format_step(lang: &str, payload: &LogPayload) -> String {
    let mut head = Vec::new();
    if let Some(step) = present(&payload.step) {
        head.push(format!("#{step}"));
    }
    if let Some(tool) = present(&payload.tool) {
        head.push(format!("{} ({tool})", i18n::action_label(lang, tool)));
    }
    if let Some(status) = present(&payload.status) {
        head.push(status.to_string());
    }

    let mut parts = Vec::new();
    if !head.is_empty() {
        parts.push(head.join(" "));
    }
    if let Some(reason) = present(&payload.reason) {
        parts.push(reason.to_string());
    }
    if let Some(duration_ms) = payload.duration_ms {
        parts.push(format_duration(duration_ms));
    }
    if let Some(error) = present(&payload.error) {
        parts.push(format!("{}: {error}", i18n::resolve(lang, "log.error")));
    }
    parts.join(SEPARATOR)
}

/// `"<label>: <detail>"`, or just the label when the detail is blank.
pub fn labelled(lang: &str, key: &str, detail: Option<&str>) -> String {
    let label = i18n::resolve(lang, key);
    match detail.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => format!("{label}: {text}"),
        None => label.to_string(),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
