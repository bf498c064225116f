/// Cumulative XP required to reach each level. `LEVEL_THRESHOLDS[i]` is the
/// entry point of level `i + 1`; the table length is the level cap.
pub const LEVEL_THRESHOLDS: [u64; 10] = [0, 100, 250, 500, 1000, 2000, 3500, 5000, 7500, 10000];

pub fn compute_level(xp: u64) -> u32 {
    level_for_xp(xp, &LEVEL_THRESHOLDS)
}

/// Walks `thresholds` in ascending order and stops at the first one not met,
/// so a level is never reached without all lower thresholds being met.
/// An empty table yields level 1.
pub fn level_for_xp(xp: u64, thresholds: &[u64]) -> u32 {
    let met = thresholds
        .iter()
        .take_while(|threshold| xp >= **threshold)
        .count();
    met.max(1) as u32
}

/// XP still missing for the next level, `None` at the cap.
pub fn xp_to_next_level(xp: u64) -> Option<u64> {
    let level = compute_level(xp) as usize;
    LEVEL_THRESHOLDS
        .get(level)
        .map(|next| next.saturating_sub(xp))
}

/// Fraction of the current level already earned, in `0.0..=1.0`.
pub fn level_progress(xp: u64) -> f64 {
    let level = compute_level(xp) as usize;
    let floor = LEVEL_THRESHOLDS[level - 1];
    match LEVEL_THRESHOLDS.get(level) {
        Some(&ceiling) => (xp - floor) as f64 / (ceiling - floor) as f64,
        None => 1.0,
    }
}
