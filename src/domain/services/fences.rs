#[cfg(test)]
#[path = "fences_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"(?m)```\w+").unwrap();
});

static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"(?m)```\n?$").unwrap();
});

fn strip_once(text: &str) -> String {
    let res = FENCE_OPEN.replace_all(text, "");
    let res = FENCE_CLOSE.replace_all(&res, "");

    return res.trim().to_string();
}

/// Removes the markdown fences models wrap their markup in, even when asked
/// not to. Runs until nothing changes so stripping twice equals stripping
/// once.
pub fn strip_code_fences(text: &str) -> String {
    let mut current = text.trim().to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
