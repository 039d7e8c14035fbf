// src/formatting.rs

use crate::core::RequestSnapshot;

/// A trait for turning a captured request into the text of an alert.
///
/// Output is raw text; escaping for the messaging dialect happens in the
/// notifier.
pub trait AlertFormatter: Send + Sync {
    fn format(&self, headline: &str, snapshot: &RequestSnapshot) -> String;
}

/// One labelled line per snapshot field, headed by the trigger reason.
pub struct PlainTextFormatter;

impl AlertFormatter for PlainTextFormatter {
    fn format(&self, headline: &str, snapshot: &RequestSnapshot) -> String {
        let lines = [
            format!("🚨 {}", headline),
            format!("Waktu: {}", snapshot.timestamp),
            format!("IP: {}", snapshot.address),
            format!("Lokasi: {}", snapshot.location),
            format!("Method: {}", snapshot.method),
            format!("URL: {}", snapshot.path),
            format!("User-Agent: {}", snapshot.agent),
            format!("Query: {}", snapshot.query),
            format!("Headers: {}", snapshot.headers),
        ];
        lines.join("\n")
    }
}
