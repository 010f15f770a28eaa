// ============================================================
// ACADEMIC YEAR NORMALIZATION
// ============================================================
// An academic year arrives as "start-end" where end may be 2 or 4
// digits ("21-22", "2021-22", "2021-2022"). The registry keys its
// databases as "<start>_<end>" with a 4-digit end; some attribute
// codings (the "YY-ZZ" form) store the compact "start-YY" instead.

use tracing::warn;

/// Normalize a raw academic-year string into a registry key,
/// e.g. "21-22" -> "2021_2022", "2021-2022" -> "2021_2022".
///
/// Strings without a '-' or with non-numeric endpoints are returned
/// unchanged; the registry lookup will simply miss and the row is
/// reported as unconfigured rather than failing the batch.
pub fn to_registry_key(raw: &str) -> String {
    let Some((start, end)) = year_parts(raw) else {
        return raw.to_string();
    };
    match (start.trim().parse::<i32>(), end.trim().parse::<i32>()) {
        (Ok(mut start), Ok(mut end)) => {
            if start < 100 {
                start += 2000; // "21" -> 2021
            }
            if end < 100 {
                end += 2000;
            }
            format!("{}_{}", start, end)
        }
        _ => {
            warn!("unparseable academic year '{}', leaving as-is", raw);
            raw.to_string()
        }
    }
}

/// Inverse direction: compact a 4-digit end year back to 2 digits,
/// e.g. "2021-2022" -> "2021-22". Used only when the target attribute
/// declares the compact "YY-ZZ" coding.
pub fn to_display_value(raw: &str) -> String {
    let Some((start, end)) = year_parts(raw) else {
        return raw.to_string();
    };
    match (start.trim().parse::<i32>(), end.trim().parse::<i32>()) {
        (Ok(start), Ok(mut end)) => {
            if end > 100 {
                end -= 2000; // "2022" -> 22
            }
            format!("{}-{}", start, end)
        }
        _ => {
            warn!("unparseable academic year '{}', leaving as-is", raw);
            raw.to_string()
        }
    }
}

/// First two '-'-separated segments; any further segments are
/// ignored so "2021-22-bis" reads as the 2021-22 year.
fn year_parts(raw: &str) -> Option<(&str, &str)> {
    let mut parts = raw.split('-');
    match (parts.next(), parts.next()) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    }
}
