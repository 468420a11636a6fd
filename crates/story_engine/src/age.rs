/// Parse listing age text such as `"3 hours ago"` into elapsed seconds.
///
/// Only minute, hour and day units are understood; anything else yields `None`.
pub fn parse_age_seconds(age_text: &str) -> Option<u64> {
    let lowered = age_text.trim().to_lowercase();
    let mut words = lowered.split_whitespace();
    let (value, unit, ago) = (words.next()?, words.next()?, words.next()?);
    if words.next().is_some() || ago != "ago" {
        return None;
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = value.parse().ok()?;
    let per_unit = match unit.strip_suffix('s').unwrap_or(unit) {
        "minute" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        _ => return None,
    };
    value.checked_mul(per_unit)
}
