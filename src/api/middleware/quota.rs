//! Quota response headers

use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::gate::QuotaStatus;

pub const QUOTA_LIMIT: &str = "X-Quota-Limit";
pub const QUOTA_USED: &str = "X-Quota-Used";
pub const QUOTA_REMAINING: &str = "X-Quota-Remaining";
pub const QUOTA_RESET: &str = "X-Quota-Reset";

/// Add quota headers to an admitted response
pub fn add_quota_headers(headers: &mut HeaderMap, status: &QuotaStatus) {
    // X-Quota-Limit: requests allowed per window
    if let Ok(name) = HeaderName::try_from(QUOTA_LIMIT) {
        headers.insert(name, HeaderValue::from(status.limit));
    }

    if let Ok(name) = HeaderName::try_from(QUOTA_USED) {
        headers.insert(name, HeaderValue::from(status.used));
    }

    if let Ok(name) = HeaderName::try_from(QUOTA_REMAINING) {
        headers.insert(name, HeaderValue::from(status.remaining));
    }

    // X-Quota-Reset: Unix timestamp when the window ends
    if let Ok(name) = HeaderName::try_from(QUOTA_RESET) {
        headers.insert(name, HeaderValue::from(status.resets_at.timestamp()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_headers_written() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let status = QuotaStatus {
            used: 3,
            limit: 10,
            remaining: 7,
            window_start: start,
            resets_at: start + Duration::hours(24),
        };

        let mut headers = HeaderMap::new();
        add_quota_headers(&mut headers, &status);

        assert_eq!(headers.get(QUOTA_LIMIT).unwrap(), "10");
        assert_eq!(headers.get(QUOTA_USED).unwrap(), "3");
        assert_eq!(headers.get(QUOTA_REMAINING).unwrap(), "7");
        assert_eq!(
            headers.get(QUOTA_RESET).unwrap().to_str().unwrap(),
            (start + Duration::hours(24)).timestamp().to_string()
        );
    }
}
