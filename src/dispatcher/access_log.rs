use super::core::DispatchOutcome;
use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;

/// Tracing target for access-log records.
pub const ACCESS_LOG_TARGET: &str = "restdispatch::access";

/// Everything the access log needs about one finished request.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRecord {
    pub client_addr: String,
    pub started_at: DateTime<Local>,
    pub method: String,
    pub uri: String,
    pub proto: String,
    pub status: u16,
    pub content_length: usize,
    pub elapsed: Duration,
    /// Not part of the formatted line
    pub outcome: DispatchOutcome,
}

impl AccessRecord {
    /// Elapsed time in seconds, as logged in `timeDur`.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// `<client> - - [DD/Mon/YYYY HH:MM:SS] "<METHOD> <URI> <PROTO>" <status> <length> <seconds>`
impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - - [{}] \"{} {} {}\" {} {} {:.6}",
            self.client_addr,
            self.started_at.format("%d/%b/%Y %H:%M:%S"),
            self.method,
            self.uri,
            self.proto,
            self.status,
            self.content_length,
            self.elapsed_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_access_line_format() {
        let started_at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let record = AccessRecord {
            client_addr: "10.1.2.3".into(),
            started_at,
            method: "GET".into(),
            uri: "/user/profile/?id=1".into(),
            proto: "HTTP/1.1".into(),
            status: 200,
            content_length: 42,
            elapsed: Duration::from_micros(1500),
            outcome: DispatchOutcome::Dispatched,
        };
        assert_eq!(
            record.to_string(),
            "10.1.2.3 - - [05/Mar/2024 14:07:09] \"GET /user/profile/?id=1 HTTP/1.1\" 200 42 0.001500"
        );
    }
}
