//! Natural-language time phrases for `recall_memory`.
//!
//! Phrases are tested in [`TEMPORAL_RULES`] order against the query,
//! case-insensitively; the first phrase present wins regardless of where it
//! appears in the text. Month and week offsets are fixed day counts, not
//! calendar arithmetic. All instants are UTC.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

/// How a matched phrase turns "now" into a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffRule {
    StartOfToday,
    StartOfYesterday,
    StartOfWeek,
    StartOfMonth,
    DaysAgo(i64),
}

/// Phrase vocabulary in priority order.
pub const TEMPORAL_RULES: &[(&str, CutoffRule)] = &[
    ("today", CutoffRule::StartOfToday),
    ("yesterday", CutoffRule::StartOfYesterday),
    ("this week", CutoffRule::StartOfWeek),
    ("this month", CutoffRule::StartOfMonth),
    ("last week", CutoffRule::DaysAgo(7)),
    ("last month", CutoffRule::DaysAgo(30)),
    ("last 3 months", CutoffRule::DaysAgo(90)),
];

/// Result of scanning a query for a time phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalQuery {
    /// Query with the matched phrase removed, or the original text when none matched.
    pub cleaned: String,
    pub phrase: Option<&'static str>,
    /// Records must have `timestamp >= cutoff`.
    pub cutoff: Option<DateTime<Utc>>,
}

pub fn parse_temporal(query: &str, now: DateTime<Utc>) -> TemporalQuery {
    for &(phrase, rule) in TEMPORAL_RULES {
        if let Some(start) = find_ignore_ascii_case(query, phrase) {
            let mut stripped = String::with_capacity(query.len());
            stripped.push_str(&query[..start]);
            stripped.push(' ');
            stripped.push_str(&query[start + phrase.len()..]);
            return TemporalQuery {
                cleaned: stripped.split_whitespace().collect::<Vec<_>>().join(" "),
                phrase: Some(phrase),
                cutoff: Some(rule.cutoff(now)),
            };
        }
    }
    TemporalQuery {
        cleaned: query.to_string(),
        phrase: None,
        cutoff: None,
    }
}

impl CutoffRule {
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = now
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        match self {
            Self::StartOfToday => midnight,
            Self::StartOfYesterday => midnight - Duration::days(1),
            Self::StartOfWeek => {
                midnight - Duration::days(i64::from(now.weekday().num_days_from_monday()))
            }
            Self::StartOfMonth => midnight - Duration::days(i64::from(now.day0())),
            Self::DaysAgo(days) => now - Duration::days(days),
        }
    }
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
///
/// `needle` must be ASCII, so a match can only start and end on char boundaries.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let (h, n) = (haystack.as_bytes(), needle.as_bytes());
    if n.is_empty() || n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Wednesday, 2025-06-11 15:45:30 UTC.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 11, 15, 45, 30).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn yesterday_strips_phrase() {
        let q = parse_temporal("yesterday budget review", now());
        assert_eq!(q.cleaned, "budget review");
        assert_eq!(q.phrase, Some("yesterday"));
        assert_eq!(q.cutoff, Some(at(2025, 6, 10, 0, 0, 0)));
    }

    #[test]
    fn no_phrase_leaves_query_untouched() {
        let q = parse_temporal("  quarterly   report ", now());
        assert_eq!(q.cleaned, "  quarterly   report ");
        assert!(q.phrase.is_none());
        assert!(q.cutoff.is_none());
    }

    #[test]
    fn each_rule_computes_its_cutoff() {
        let cases = [
            ("notes from today", at(2025, 6, 11, 0, 0, 0)),
            ("this week standup", at(2025, 6, 9, 0, 0, 0)),
            ("this month plans", at(2025, 6, 1, 0, 0, 0)),
            ("last week", at(2025, 6, 4, 15, 45, 30)),
            ("last month invoices", at(2025, 5, 12, 15, 45, 30)),
            ("last 3 months", at(2025, 3, 13, 15, 45, 30)),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_temporal(text, now()).cutoff, Some(expected), "{text}");
        }
    }

    #[test]
    fn week_start_on_monday_is_same_day() {
        let monday = at(2025, 6, 9, 8, 0, 0);
        assert_eq!(
            CutoffRule::StartOfWeek.cutoff(monday),
            at(2025, 6, 9, 0, 0, 0)
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_removes_first_occurrence() {
        let q = parse_temporal("Meeting notes from Yesterday and yesterday again", now());
        assert_eq!(q.cleaned, "Meeting notes from and yesterday again");
        assert_eq!(q.phrase, Some("yesterday"));
    }

    #[test]
    fn priority_order_beats_text_position() {
        // "this week" appears later in the text but outranks "last week".
        let q = parse_temporal("last week vs this week", now());
        assert_eq!(q.phrase, Some("this week"));
        assert_eq!(q.cleaned, "last week vs");
    }

    #[test]
    fn last_month_outranks_last_3_months() {
        let q = parse_temporal("last 3 months", now());
        assert_eq!(q.phrase, Some("last 3 months"));

        let q = parse_temporal("last month and last 3 months", now());
        assert_eq!(q.phrase, Some("last month"));
        assert_eq!(q.cleaned, "and last 3 months");
    }

    #[test]
    fn non_ascii_text_is_safe() {
        let q = parse_temporal("café notes today ☕", now());
        assert_eq!(q.cleaned, "café notes ☕");
        assert_eq!(q.phrase, Some("today"));
    }
}
