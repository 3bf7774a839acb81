//! Expiry values and the header-driven expiry policy

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::fmt;

/// Recorded expiry of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Due for re-fetching once this instant has passed
    At(DateTime<Utc>),

    /// Never due; compared against the store's far-future sentinel
    Never,

    /// Registered without an expiry date; always due
    Unspecified,
}

impl Expiry {
    /// Converts an optional instant, `None` meaning no expiry was provided
    pub fn from_option(expires: Option<DateTime<Utc>>) -> Self {
        match expires {
            Some(at) => Self::At(at),
            None => Self::Unspecified,
        }
    }

    /// Returns true if the expiry lies strictly before `now`
    ///
    /// `never_expires` is the sentinel instant standing in for [`Expiry::Never`].
    pub fn is_due(&self, now: DateTime<Utc>, never_expires: DateTime<Utc>) -> bool {
        match self {
            Self::At(at) => *at < now,
            Self::Never => never_expires < now,
            Self::Unspecified => true,
        }
    }

    /// Renders the value column of the persisted state file
    pub fn to_record_value(&self) -> String {
        match self {
            Self::At(at) => at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Never => "never".to_string(),
            Self::Unspecified => "unspecified".to_string(),
        }
    }

    /// Parses the value column of the persisted state file
    pub fn from_record_value(value: &str) -> Option<Self> {
        match value {
            "never" => Some(Self::Never),
            "unspecified" => Some(Self::Unspecified),
            other => DateTime::parse_from_rfc3339(other)
                .ok()
                .map(|at| Self::At(at.with_timezone(&Utc))),
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_record_value())
    }
}

/// Derives the next expiry of a resource from its response headers
///
/// # Rules
///
/// | Header | Expiry |
/// |--------|--------|
/// | `Cache-Control: no-store` or `no-cache` | now (due immediately) |
/// | `Cache-Control: max-age=N` | now + N seconds |
/// | `Expires: <HTTP date>` | that date |
/// | `Expires` unparseable | now (already expired) |
/// | none of the above | now + `default_ttl` |
///
/// `Cache-Control` takes precedence over `Expires`. Header names match
/// case-insensitively. A lifetime reaching past the latest representable
/// instant yields [`Expiry::Never`].
pub fn expiry_from_headers(
    headers: &[(String, String)],
    now: DateTime<Utc>,
    default_ttl: Duration,
) -> Expiry {
    let header = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
    };

    if let Some(cache_control) = header("Cache-Control") {
        for directive in cache_control.split(',') {
            let directive = directive.trim().to_ascii_lowercase();
            if directive == "no-store" || directive == "no-cache" {
                return Expiry::At(now);
            }
            if let Some(seconds) = directive.strip_prefix("max-age=") {
                let seconds = seconds.trim_matches('"');
                if !seconds.is_empty() && seconds.bytes().all(|b| b.is_ascii_digit()) {
                    return match seconds.parse::<i64>().ok().and_then(Duration::try_seconds) {
                        Some(lifetime) => expires_after(now, lifetime),
                        None => Expiry::Never,
                    };
                }
            }
        }
    }

    if let Some(expires) = header("Expires") {
        return match DateTime::parse_from_rfc2822(expires) {
            Ok(at) => Expiry::At(at.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!("Unparseable Expires header '{}': {}", expires, e);
                Expiry::At(now)
            }
        };
    }

    expires_after(now, default_ttl)
}

fn expires_after(now: DateTime<Utc>, lifetime: Duration) -> Expiry {
    match now.checked_add_signed(lifetime) {
        Some(at) => Expiry::At(at),
        None => {
            tracing::debug!(
                "Lifetime of {}s overflows, treating as never expiring",
                lifetime.num_seconds()
            );
            Expiry::Never
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_is_due() {
        let sentinel = now() + Duration::days(365 * 1000);
        assert!(Expiry::At(now() - Duration::seconds(1)).is_due(now(), sentinel));
        assert!(!Expiry::At(now()).is_due(now(), sentinel));
        assert!(!Expiry::At(now() + Duration::seconds(1)).is_due(now(), sentinel));
        assert!(!Expiry::Never.is_due(now() + Duration::days(365 * 500), sentinel));
        assert!(Expiry::Unspecified.is_due(now(), sentinel));
    }

    #[test]
    fn test_record_value_roundtrip() {
        let at = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap() + Duration::milliseconds(678);
        for expiry in [Expiry::At(at), Expiry::Never, Expiry::Unspecified] {
            let value = expiry.to_record_value();
            assert_eq!(Expiry::from_record_value(&value), Some(expiry), "value {}", value);
        }
        assert_eq!(Expiry::from_record_value("yesterday"), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Expiry::from_option(None), Expiry::Unspecified);
        assert_eq!(Expiry::from_option(Some(now())), Expiry::At(now()));
    }

    #[test]
    fn test_policy_max_age_wins_over_expires() {
        let h = headers(&[
            ("Expires", "Thu, 01 Jan 2099 00:00:00 GMT"),
            ("cache-control", "public, max-age=600"),
        ]);
        assert_eq!(
            expiry_from_headers(&h, now(), Duration::hours(24)),
            Expiry::At(now() + Duration::seconds(600))
        );
    }

    #[test]
    fn test_policy_no_cache() {
        let h = headers(&[("Cache-Control", "no-cache")]);
        assert_eq!(
            expiry_from_headers(&h, now(), Duration::hours(24)),
            Expiry::At(now())
        );
    }

    #[test]
    fn test_policy_expires_header() {
        let h = headers(&[("Expires", "Wed, 21 Oct 2026 07:28:00 GMT")]);
        assert_eq!(
            expiry_from_headers(&h, now(), Duration::hours(24)),
            Expiry::At(Utc.with_ymd_and_hms(2026, 10, 21, 7, 28, 0).unwrap())
        );
    }

    #[test]
    fn test_policy_invalid_expires_is_already_expired() {
        let h = headers(&[("Expires", "0")]);
        assert_eq!(
            expiry_from_headers(&h, now(), Duration::hours(24)),
            Expiry::At(now())
        );
    }

    #[test]
    fn test_policy_default_ttl() {
        let h = headers(&[("Content-Type", "application/n-triples")]);
        assert_eq!(
            expiry_from_headers(&h, now(), Duration::hours(24)),
            Expiry::At(now() + Duration::hours(24))
        );
    }

    #[test]
    fn test_policy_huge_max_age_never_expires() {
        for value in ["99999999999999", "9999999999999999", "99999999999999999999999"] {
            let h = headers(&[("Cache-Control", &format!("max-age={}", value))]);
            assert_eq!(
                expiry_from_headers(&h, now(), Duration::hours(24)),
                Expiry::Never,
                "max-age={}",
                value
            );
        }
    }

    #[test]
    fn test_policy_malformed_max_age_is_ignored() {
        let h = headers(&[("Cache-Control", "max-age=-5, max-age=abc")]);
        assert_eq!(
            expiry_from_headers(&h, now(), Duration::hours(1)),
            Expiry::At(now() + Duration::hours(1))
        );
    }

    #[test]
    fn test_policy_huge_default_ttl_never_expires() {
        assert_eq!(
            expiry_from_headers(&[], now(), Duration::days(365 * 300_000)),
            Expiry::Never
        );
    }
}
