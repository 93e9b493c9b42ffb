//! Extraction of user-facing messages from failed provider responses.
//!
//! Statistics services answer errors either with JSON (`{"error": {"message": ..}}`,
//! `{"message": ..}`, `{"error": ".."}`) or with OGC-style XML
//! (`<ServiceExceptionReport><ServiceException>..</ServiceException></ServiceExceptionReport>`).
//! Anything unparseable maps to [`GENERIC_STATISTICS_MESSAGE`].

use quick_xml::events::Event;
use serde_json::Value;

use crate::OrbitaError;

/// Message shown when no readable reason can be recovered.
pub const GENERIC_STATISTICS_MESSAGE: &str =
    "Unable to fetch statistics for this area and time range.";

/// Best-effort readable message from a raw error body.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "orbita_core::payload::error_message", skip(body), fields(len = body.len()))
)]
#[must_use]
pub fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    let parsed = if trimmed.starts_with('<') {
        xml_message(trimmed)
    } else {
        json_message(trimmed)
    };
    parsed
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!("no readable message in error body; using generic text");
            GENERIC_STATISTICS_MESSAGE.to_string()
        })
}

/// Readable message for any statistics failure.
///
/// Payload errors go through [`error_message`]; connector errors keep their
/// message; everything else falls back to the generic text.
#[must_use]
pub fn failure_message(err: &OrbitaError) -> String {
    match err {
        OrbitaError::RemotePayload { body, .. } => error_message(body),
        OrbitaError::Connector { msg, .. } if !msg.trim().is_empty() => msg.clone(),
        OrbitaError::ProviderTimeout { .. } => {
            "The statistics service did not answer in time.".to_string()
        }
        _ => GENERIC_STATISTICS_MESSAGE.to_string(),
    }
}

fn json_message(body: &str) -> Option<String> {
    let v: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %_e, "error body is not JSON");
            return None;
        }
    };
    match v.get("error") {
        Some(Value::Object(o)) => o
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(Value::String(s)) => Some(s.clone()),
        _ => v.get("message").and_then(Value::as_str).map(str::to_string),
    }
}

fn xml_message(body: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut inside = false;
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"ServiceException" || name.as_ref() == b"ExceptionText" {
                    inside = true;
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if inside
                    && (name.as_ref() == b"ServiceException"
                        || name.as_ref() == b"ExceptionText")
                {
                    return Some(out);
                }
            }
            Ok(Event::Text(t)) if inside => {
                out.push_str(t.unescape().ok()?.as_ref());
            }
            Ok(Event::CData(t)) if inside => {
                out.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::Eof) => return None,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_e, "malformed XML error body");
                return None;
            }
            _ => {}
        }
    }
}
