//! Feed timestamp normalization.
//!
//! Feeds disagree on date formats. [`normalize_date`] tries a fixed list of
//! layouts in order and falls back to the current time when none match.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Known feed timestamp layouts, in the order they are tried.
pub const FEED_DATE_LAYOUTS: [DateLayout; 5] = [
    DateLayout::Rfc1123Z,
    DateLayout::Rfc1123,
    DateLayout::NumericZone,
    DateLayout::NamedZone,
    DateLayout::Rfc3339,
];

/// One accepted timestamp layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `Mon, 02 Jan 2006 15:04:05 -0700`, weekday optional
    NumericZone,
    /// `Mon, 02 Jan 2006 15:04:05 MST`, weekday optional
    NamedZone,
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
}

impl DateLayout {
    /// Parse `raw` in this layout.
    pub fn parse(self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        match self {
            DateLayout::Rfc1123Z => parse_numeric_zone(raw, "%a, %d %b %Y %H:%M:%S %z"),
            DateLayout::Rfc1123 => parse_named_zone(raw, "%a, %d %b %Y %H:%M:%S"),
            DateLayout::NumericZone => {
                parse_numeric_zone(strip_weekday(raw), "%d %b %Y %H:%M:%S %z")
            }
            DateLayout::NamedZone => parse_named_zone(strip_weekday(raw), "%d %b %Y %H:%M:%S"),
            DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Parse a feed timestamp, first matching layout wins.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    FEED_DATE_LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(raw))
}

/// Parse a feed timestamp, using the current time when no layout matches.
pub fn normalize_date(raw: &str) -> DateTime<Utc> {
    parse_date(raw).unwrap_or_else(|| {
        if !raw.trim().is_empty() {
            log::debug!("Unrecognized feed date {:?}, using current time", raw);
        }
        Utc::now()
    })
}

fn parse_numeric_zone(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, format)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_named_zone(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = raw.rsplit_once(' ')?;
    let offset = FixedOffset::east_opt(zone_offset_secs(zone)?)?;
    let naive = NaiveDateTime::parse_from_str(stamp.trim_end(), format).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn strip_weekday(raw: &str) -> &str {
    match raw.split_once(", ") {
        Some((day, rest)) if day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest
        }
        _ => raw,
    }
}

/// Offset of a zone abbreviation in seconds east of UTC. Unknown alphabetic
/// abbreviations are treated as UTC; anything else is not a zone name.
fn zone_offset_secs(zone: &str) -> Option<i32> {
    if zone.is_empty() || zone.len() > 5 || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let hours = match zone.to_ascii_uppercase().as_str() {
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => 0,
    };
    Some(hours * 3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn rfc1123z_round_trips() {
        let raw = instant()
            .with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap())
            .format("%a, %d %b %Y %H:%M:%S %z")
            .to_string();
        assert_eq!(DateLayout::Rfc1123Z.parse(&raw), Some(instant()));
        assert_eq!(normalize_date(&raw), instant());
    }

    #[test]
    fn rfc1123_with_named_zone_round_trips() {
        assert_eq!(
            parse_date("Tue, 05 Mar 2024 14:07:09 GMT"),
            Some(instant())
        );
        assert_eq!(
            parse_date("Tue, 05 Mar 2024 09:07:09 EST"),
            Some(instant())
        );
        assert_eq!(
            parse_date("Tue, 05 Mar 2024 07:07:09 PDT"),
            Some(instant())
        );
    }

    #[test]
    fn explicit_layouts_accept_missing_weekday() {
        assert_eq!(
            DateLayout::NumericZone.parse("05 Mar 2024 14:07:09 +0000"),
            Some(instant())
        );
        assert_eq!(
            DateLayout::NamedZone.parse("05 Mar 2024 14:07:09 UTC"),
            Some(instant())
        );
        assert_eq!(DateLayout::Rfc1123.parse("05 Mar 2024 14:07:09 UTC"), None);
    }

    #[test]
    fn rfc3339_round_trips() {
        assert_eq!(parse_date("2024-03-05T16:07:09+02:00"), Some(instant()));
        assert_eq!(parse_date(&instant().to_rfc3339()), Some(instant()));
    }

    #[test]
    fn unknown_zone_abbreviation_is_utc() {
        assert_eq!(
            parse_date("Tue, 05 Mar 2024 14:07:09 CEST"),
            Some(instant())
        );
    }

    #[test]
    fn unparsable_dates_fall_back_to_now() {
        for raw in ["", "yesterday", "2024/03/05", "Tue, 05 Mar 2024 14:07:09 +0000 extra"] {
            let before = Utc::now();
            let parsed = normalize_date(raw);
            assert!(parsed >= before, "{raw:?} parsed to {parsed}");
        }
    }
}
