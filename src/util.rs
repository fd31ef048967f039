use std::sync::LazyLock;

use regex::Regex;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number pattern"));

/// FNV-1a over the seed's UTF-16 code units, reduced to `[0, 1)` in 1e-4 steps.
/// Stable across builds and platforms.
pub fn hash01(seed: &str) -> f32 {
    let mut hash: u32 = 2_166_136_261;
    for unit in seed.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash.wrapping_mul(16_777_619);
    }
    (hash % 10_000) as f32 / 10_000.0
}

/// Symmetric jitter in `[-span / 2, span / 2)` derived from `id` + `salt`.
pub fn stable_offset(id: &str, salt: &str, span: f32) -> f32 {
    let mut seed = String::with_capacity(id.len() + salt.len());
    seed.push_str(id);
    seed.push_str(salt);
    (hash01(&seed) - 0.5) * span
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    let max_chars = max_chars.max(1);
    if label.chars().count() <= max_chars {
        return label.to_string();
    }

    let mut out = label.chars().take(max_chars - 1).collect::<String>();
    out.push('\u{2026}');
    out
}

pub fn prettify_key(key: &str) -> String {
    key.replace('_', " ")
}

/// First signed decimal number embedded in `text` ("12 weeks" -> 12.0).
pub fn first_number(text: &str) -> Option<f64> {
    FIRST_NUMBER
        .find(text)
        .and_then(|found| found.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub fn lerp(lo: f32, hi: f32, t: f32) -> f32 {
    lo + (hi - lo) * t
}

/// Spread position of item `index` of `count` along `[0, 1]`; singletons sit at the middle.
pub fn spread_fraction(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.5
    } else {
        index as f32 / (count - 1) as f32
    }
}
