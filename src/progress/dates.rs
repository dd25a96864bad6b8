use chrono::{Datelike, NaiveDate};

/// Parses the date formats found in the sheets: `YYYY-MM-DD`, `YYYY/MM/DD`,
/// `DD-MM-YYYY` and `DD/MM/YYYY`. A trailing time part is ignored.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(['T', ' ']).next()?;
    let parts: Vec<&str> = date_part.split(['-', '/']).collect();
    if parts.len() != 3 {
        return None;
    }
    let num = |s: &str| s.trim().parse::<u32>().ok();

    let (year, month, day) = if parts[0].len() == 4 {
        (num(parts[0])?, num(parts[1])?, num(parts[2])?)
    } else if parts[2].len() == 4 {
        (num(parts[2])?, num(parts[1])?, num(parts[0])?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// Week of the year with weeks starting on Sunday, formatted `YYYY-Www`.
pub fn week_id(date: NaiveDate) -> String {
    let Some(jan1) = NaiveDate::from_ymd_opt(date.year(), 1, 1) else {
        return format!("{}-W01", date.year());
    };
    let offset = jan1.weekday().num_days_from_sunday();
    let days = date.ordinal0() + offset + 1;
    let week = days.div_ceil(7);
    format!("{}-W{:02}", date.year(), week)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn today_iso() -> String {
    today().format("%Y-%m-%d").to_string()
}

pub fn current_week_id() -> String {
    week_id(today())
}
