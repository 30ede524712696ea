//! Activity categories of the UniMiB SHAR "daily living" subset.
//!
//! The raw release names its nine categories in alphabetical order. The
//! paper's Table 2 uses different names; `getting_up` and `standing_up`
//! were matched to StandingUpFL (~210 examples) and StandingUpFS (~160
//! examples) by comparing class counts (216 and 153 in the raw data).

/// Raw category names, ordered by 1-based raw category id.
pub const RAW_CATEGORY_NAMES: [&str; NUM_CATEGORIES] = [
    "getting_up",
    "going_down",
    "going_up",
    "jumping",
    "lying_down",
    "running",
    "sitting_down",
    "standing_up",
    "walking",
];

/// Number of activity categories.
pub const NUM_CATEGORIES: usize = 9;

/// Raw name to canonical name.
const CATEGORY_RENAMES: [(&str, &str); NUM_CATEGORIES] = [
    ("going_up", "UpStairs"),
    ("going_down", "DownStairs"),
    ("getting_up", "StandFromLie"),
    ("standing_up", "StandFromSit"),
    ("jumping", "Jump"),
    ("walking", "Walk"),
    ("running", "Run"),
    ("lying_down", "LieDown"),
    ("sitting_down", "SitDown"),
];

/// Canonical categories that count as horizontal motion.
pub const HORIZONTAL_MOTION_CATEGORIES: [&str; 4] = ["Walk", "Run", "UpStairs", "DownStairs"];

/// Canonical name for a raw category name.
///
/// Names outside the rename table pass through unchanged.
pub fn canonical_category_name(raw: &str) -> &str {
    CATEGORY_RENAMES
        .iter()
        .find(|(from, _)| *from == raw)
        .map_or(raw, |(_, to)| *to)
}

/// Whether a canonical category name denotes horizontal motion.
pub fn is_horizontal_motion(category_name: &str) -> bool {
    HORIZONTAL_MOTION_CATEGORIES.contains(&category_name)
}
