use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Format a dollar amount the way prices are shown to users: `$1,250.00`.
pub fn format_price(amount: f64) -> String {
    if !amount.is_finite() {
        return "N/A".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Approximate distance between `then` and `now` in words, e.g.
/// `"3 days ago"`, `"about 1 hour ago"` or `"in 2 minutes"`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    if delta < Duration::zero() {
        format!("in {}", distance_in_words(-delta))
    } else {
        format!("{} ago", distance_in_words(delta))
    }
}

/// Like [`time_ago`] for listing dates, which are stored as strings. Accepts
/// RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as midnight UTC).
/// Unparseable input is returned unchanged.
pub fn date_ago(date: &str, now: DateTime<Utc>) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(date) {
        return time_ago(ts.with_timezone(&Utc), now);
    }
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(day) => match day.and_hms_opt(0, 0, 0) {
            Some(midnight) => time_ago(midnight.and_utc(), now),
            None => date.to_string(),
        },
        Err(_) => date.to_string(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn distance_in_words(d: Duration) -> String {
    let secs = d.num_seconds();
    let mins = (secs as f64 / 60.0).round() as i64;

    if secs < 30 {
        "less than a minute".to_string()
    } else if mins < 45 {
        plural(mins.max(1), "minute")
    } else if mins < 90 {
        "about 1 hour".to_string()
    } else if mins < 24 * 60 {
        format!("about {}", plural((mins as f64 / 60.0).round() as i64, "hour"))
    } else if mins < 42 * 60 {
        "1 day".to_string()
    } else if mins < 30 * 24 * 60 {
        plural((mins as f64 / (24.0 * 60.0)).round() as i64, "day")
    } else if mins < 45 * 24 * 60 {
        "about 1 month".to_string()
    } else if mins < 60 * 24 * 60 {
        "about 2 months".to_string()
    } else if mins < 365 * 24 * 60 {
        plural((mins as f64 / (30.0 * 24.0 * 60.0)).round() as i64, "month")
    } else {
        let years = mins / (365 * 24 * 60);
        let rem_months = (mins % (365 * 24 * 60)) / (30 * 24 * 60);
        match rem_months {
            0..=2 => format!("about {}", plural(years, "year")),
            3..=8 => format!("over {}", plural(years, "year")),
            _ => format!("almost {}", plural(years + 1, "year")),
        }
    }
}
