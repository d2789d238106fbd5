use regex::Regex;
use std::sync::LazyLock;

static PERCENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d{1,3})%").ok());

static COUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:of|/)\s*(\d+)").ok());

/// Infer a completion fraction in `[0, 1]` from one line of output.
///
/// A percentage wins over a count; `None` when neither is present or the count
/// has a zero total.
pub fn estimate_progress(line: &str) -> Option<f64> {
    if let Some(percent) = PERCENT
        .as_ref()
        .and_then(|re| re.captures(line))
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        return Some(f64::from(percent.min(100)) / 100.0);
    }

    let caps = COUNT.as_ref()?.captures(line)?;
    let current = caps[1].parse::<f64>().ok()?;
    let total = caps[2].parse::<f64>().ok()?;
    if total <= 0.0 {
        return None;
    }
    Some((current / total).clamp(0.0, 1.0))
}
