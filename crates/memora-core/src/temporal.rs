//! Natural-language date and duration parsing.
//!
//! Converts free text plus a base instant into an absolute local-naive
//! timestamp, for English and Italian input. Parsing is a fixed, ordered
//! chain of small matcher functions; the first match wins, so every rule's
//! precedence is explicit and testable on its own. `None` is the parse
//! failure signal.
//!
//! Supported forms:
//! - Keywords: `today`, `tomorrow`, `tonight`, `now` (`oggi`, `domani`,
//!   `stasera`, `adesso`)
//! - Time of day: `morning`, `noon`, `afternoon`, `evening`, `night`
//! - Relative: `next monday`, `in 2 hours`, `in 3 days`, `tra 2 giorni`
//! - Compound: `thursday in two weeks`, `monday in 3 weeks`
//! - Explicit time: `at 3pm`, `at 15:00`, `tomorrow at 9am`, `alle 18`
//! - Dates: `dec 25`, `2025-12-25`, `15 dicembre`

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// With no explicit time of day, dates resolve to end of day.
const DEFAULT_TIME: (u32, u32) = (23, 59);

/// Keyword → wall-clock time. Order matters: `afternoon` must be checked
/// before `noon` and `tonight` before `night`, since the longer words
/// contain the shorter ones.
const TIME_KEYWORDS: &[(&str, (u32, u32))] = &[
    ("afternoon", (14, 0)),
    ("pomeriggio", (14, 0)),
    ("morning", (9, 0)),
    ("mattina", (9, 0)),
    ("noon", (12, 0)),
    ("mezzogiorno", (12, 0)),
    ("evening", (19, 0)),
    ("sera", (19, 0)),
    ("tonight", (20, 0)),
    ("night", (21, 0)),
    ("notte", (21, 0)),
];

/// Three-letter weekday prefixes, English then Italian; 0 = Sunday.
const WEEKDAYS: &[(&str, u32)] = &[
    ("sun", 0),
    ("mon", 1),
    ("tue", 2),
    ("wed", 3),
    ("thu", 4),
    ("fri", 5),
    ("sat", 6),
    ("dom", 0),
    ("lun", 1),
    ("mar", 2),
    ("mer", 3),
    ("gio", 4),
    ("ven", 5),
    ("sab", 6),
];

const MONTHS_EN: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const MONTHS_IT: [&str; 12] = [
    "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
];

struct Ctx<'a> {
    text: &'a str,
    base: NaiveDateTime,
    /// Time of day detected anywhere in the input (keyword or `at HH:MM`).
    tod: Option<NaiveTime>,
}

type Matcher = for<'a> fn(&Ctx<'a>) -> Option<NaiveDateTime>;

/// Ordered precedence chain; first match wins.
const MATCHERS: &[Matcher] = &[
    match_time_anchor,
    match_today_tomorrow,
    match_next_weekday,
    match_weekday_in_weeks,
    match_bare_weekday,
    match_relative_offset,
    match_iso,
    match_month_day,
    match_time_only,
];

/// Parse a natural-language date expression relative to `base`.
///
/// Returns `None` when the input matches no rule; callers must treat that
/// as "no date", never as an instant.
pub fn parse_date(input: &str, base: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = input.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let ctx = Ctx {
        text: &text,
        base,
        tod: detect_time_of_day(&text),
    };
    MATCHERS.iter().find_map(|matcher| matcher(&ctx))
}

/// Parse a duration like `30m`, `1h`, `2d`, `1w`, `10s` into seconds.
/// A bare number (or an unknown unit letter) means minutes.
pub fn parse_duration(input: &str) -> Option<i64> {
    let text = input.trim();
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let n: i64 = digits.parse().ok()?;
    let unit = text[digits.len()..].trim().chars().next();
    let seconds = match unit.map(|c| c.to_ascii_lowercase()) {
        Some('s') => n,
        Some('h') => n * 3_600,
        Some('d') => n * 86_400,
        Some('w') => n * 604_800,
        _ => n * 60,
    };
    Some(seconds)
}

/// Inverse of the ISO rule in [`parse_date`]: minute precision, so
/// `parse_date(&format_date(t), base)` round-trips.
pub fn format_date(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_TIME.0, DEFAULT_TIME.1, 0)
        .expect("default time is valid")
}

fn date_at(date: NaiveDate, ctx: &Ctx) -> Option<NaiveDateTime> {
    Some(date.and_time(ctx.tod.unwrap_or_else(default_time)))
}

fn detect_time_of_day(text: &str) -> Option<NaiveTime> {
    for (keyword, (hour, minute)) in TIME_KEYWORDS {
        if text.contains(keyword) {
            return NaiveTime::from_hms_opt(*hour, *minute, 0);
        }
    }
    explicit_time(text)
}

/// `at 3pm`, `at 15:00`, `alle 18`, `@ 9:30am`.
fn explicit_time(text: &str) -> Option<NaiveTime> {
    let rest = ["at ", "alle ", "@ "]
        .iter()
        .find_map(|prefix| text.find(prefix).map(|i| &text[i + prefix.len()..]))?;
    let rest = rest.trim_start();

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let mut hour: u32 = digits.parse().ok()?;
    let mut after = &rest[digits.len()..];

    let mut minute = 0;
    if let Some(stripped) = after.strip_prefix(':') {
        let minute_digits: String =
            stripped.chars().take_while(|c| c.is_ascii_digit()).collect();
        if minute_digits.is_empty() {
            return None;
        }
        minute = minute_digits.parse().ok()?;
        after = &stripped[minute_digits.len()..];
    }

    let after = after.trim_start();
    if after.starts_with("pm") {
        if hour < 12 {
            hour += 12;
        }
    } else if after.starts_with("am") && hour == 12 {
        hour = 0;
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn weekday_at_start(text: &str) -> Option<u32> {
    WEEKDAYS
        .iter()
        .find(|(prefix, _)| text.starts_with(prefix))
        .map(|(_, day)| *day)
}

/// Days from `base` to the next strict occurrence of `target` (0 = Sunday);
/// the same weekday as today resolves to a full week ahead.
fn days_until_weekday(base: NaiveDateTime, target: u32) -> i64 {
    let today = i64::from(base.weekday().num_days_from_sunday());
    let mut diff = i64::from(target) - today;
    if diff <= 0 {
        diff += 7;
    }
    diff
}

fn leading_int(text: &str) -> Option<(i64, &str)> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some((digits.parse().ok()?, &text[digits.len()..]))
}

/// Spelled-out counts two through four, both languages.
fn spelled_number(text: &str) -> Option<i64> {
    if text.starts_with("two") || text.starts_with("due") {
        Some(2)
    } else if text.starts_with("three") || text.starts_with("tre") {
        Some(3)
    } else if text.starts_with("four") || text.starts_with("quattro") {
        Some(4)
    } else {
        None
    }
}

/// Rule 1: keywords that fix a time without moving the date.
fn match_time_anchor(ctx: &Ctx) -> Option<NaiveDateTime> {
    match ctx.text {
        "tonight" | "stasera" => ctx
            .base
            .date()
            .and_hms_opt(20, 0, 0),
        "now" | "adesso" => Some(ctx.base + Duration::seconds(60)),
        _ => None,
    }
}

/// Rule 2: `today` / `tomorrow` and localized equivalents, combined with
/// any detected time of day.
fn match_today_tomorrow(ctx: &Ctx) -> Option<NaiveDateTime> {
    let is_today = ctx.text == "today"
        || ctx.text == "oggi"
        || ctx.text.starts_with("today ")
        || ctx.text.starts_with("oggi ");
    if is_today {
        return date_at(ctx.base.date(), ctx);
    }
    if ctx.text.contains("tomorrow") || ctx.text.contains("domani") {
        return date_at(ctx.base.date() + Duration::days(1), ctx);
    }
    None
}

/// Rule 3: `next <weekday>`, `next week`, `<weekday> prossimo`.
fn match_next_weekday(ctx: &Ctx) -> Option<NaiveDateTime> {
    if let Some(rest) = ctx.text.strip_prefix("next ") {
        if rest.starts_with("week") {
            return date_at(ctx.base.date() + Duration::days(7), ctx);
        }
        let target = weekday_at_start(rest)?;
        let days = days_until_weekday(ctx.base, target);
        return date_at(ctx.base.date() + Duration::days(days), ctx);
    }

    if ctx.text.contains("prossim") {
        let target = weekday_at_start(ctx.text)?;
        let days = days_until_weekday(ctx.base, target);
        return date_at(ctx.base.date() + Duration::days(days), ctx);
    }

    None
}

/// Rule 4: `<weekday> in N week(s)` / `<weekday> tra N settimane`, with N
/// as digits or spelled two through four. N weeks means the target weekday
/// of the (N-1)th following week.
fn match_weekday_in_weeks(ctx: &Ctx) -> Option<NaiveDateTime> {
    let target = weekday_at_start(ctx.text)?;
    let rest = ctx
        .text
        .find(" in ")
        .map(|i| &ctx.text[i + 4..])
        .or_else(|| ctx.text.find(" tra ").map(|i| &ctx.text[i + 5..]))?;

    if !rest.contains("week") && !rest.contains("settiman") {
        return None;
    }
    let weeks = spelled_number(rest).or_else(|| leading_int(rest).map(|(n, _)| n))?;
    if weeks < 1 {
        return None;
    }

    let days = days_until_weekday(ctx.base, target) + (weeks - 1) * 7;
    date_at(ctx.base.date() + Duration::days(days), ctx)
}

/// Rule 5: a bare weekday name resolves like `next <weekday>`.
fn match_bare_weekday(ctx: &Ctx) -> Option<NaiveDateTime> {
    let target = weekday_at_start(ctx.text)?;
    let days = days_until_weekday(ctx.base, target);
    date_at(ctx.base.date() + Duration::days(days), ctx)
}

/// Rule 6: `in N <unit>` / `tra N <unit>`. Hours and minutes are raw
/// offsets from the base instant; days, weeks and months are
/// calendar-anchored and take the detected (or default) time of day.
fn match_relative_offset(ctx: &Ctx) -> Option<NaiveDateTime> {
    let rest = ctx
        .text
        .strip_prefix("in ")
        .or_else(|| ctx.text.strip_prefix("tra "))?;
    let (n, after) = leading_int(rest.trim_start())?;
    let unit = after.trim_start();

    if unit.starts_with("hour") || unit.starts_with("or") {
        Some(ctx.base + Duration::hours(n))
    } else if unit.starts_with("min") {
        Some(ctx.base + Duration::minutes(n))
    } else if unit.starts_with("day") || unit.starts_with("giorn") {
        date_at(ctx.base.date() + Duration::days(n), ctx)
    } else if unit.starts_with("week") || unit.starts_with("settiman") {
        date_at(ctx.base.date() + Duration::days(7 * n), ctx)
    } else if unit.starts_with("month") || unit.starts_with("mes") {
        let months = u32::try_from(n).ok()?;
        ctx.base
            .date()
            .checked_add_months(Months::new(months))
            .and_then(|date| date_at(date, ctx))
    } else {
        None
    }
}

/// Rule 8: ISO `YYYY-MM-DD[ HH:MM[:SS]]`.
fn match_iso(ctx: &Ctx) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(ctx.text, "%Y-%m-%d %H:%M") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(ctx.text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(ctx.text, "%Y-%m-%d") {
        return date_at(date, ctx);
    }
    None
}

/// Rule 9: `<Month> <Day>` / `<Day> <Month>` with localized month
/// abbreviations; a date already behind the base rolls forward one year.
fn match_month_day(ctx: &Ctx) -> Option<NaiveDateTime> {
    let month_index = (0..12).find(|&m| {
        ctx.text.contains(MONTHS_EN[m]) || ctx.text.contains(MONTHS_IT[m])
    })?;

    let day_digits: String = ctx
        .text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let day: u32 = day_digits.parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(ctx.base.year(), month_index as u32 + 1, day)?;
    let candidate = date_at(date, ctx)?;
    if candidate < ctx.base {
        let next_year = NaiveDate::from_ymd_opt(ctx.base.year() + 1, month_index as u32 + 1, day)?;
        return date_at(next_year, ctx);
    }
    Some(candidate)
}

/// Rule 7 (terminal form): a bare time of day resolves to today or
/// tomorrow, whichever is strictly after the base.
fn match_time_only(ctx: &Ctx) -> Option<NaiveDateTime> {
    let tod = ctx.tod?;
    let candidate = ctx.base.date().and_time(tod);
    if candidate > ctx.base {
        Some(candidate)
    } else {
        Some(candidate + Duration::days(1))
    }
}
