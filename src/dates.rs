use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

/// Calendar dates cross the wire as `YYYY-MM-DD`.
pub const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, &ISO_DATE)
}

pub fn format_date(date: Date) -> String {
    date.format(&ISO_DATE).unwrap_or_else(|_| date.to_string())
}
