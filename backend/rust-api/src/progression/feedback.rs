use rand::Rng;

use crate::models::ScoreBand;

const EXCELLENT: &[&str] = &[
    "Flawless! Every check passed.",
    "Outstanding work, that is exactly the expected output.",
    "Perfect run. On to the next challenge!",
];

const GOOD: &[&str] = &[
    "Nearly there, just a detail or two missing.",
    "Solid attempt. Compare your output with the expected result once more.",
];

const FAIR: &[&str] = &[
    "Halfway there. Re-read the lab steps and try again.",
    "Some checks passed. Keep going!",
];

const NEEDS_WORK: &[&str] = &[
    "Not quite yet. Review the instructions and run it again.",
    "The output does not match yet. Every expert was once a beginner.",
    "Keep at it! Check the expected output and retry.",
];

pub fn messages_for(band: ScoreBand) -> &'static [&'static str] {
    match band {
        ScoreBand::Excellent => EXCELLENT,
        ScoreBand::Good => GOOD,
        ScoreBand::Fair => FAIR,
        ScoreBand::NeedsWork => NEEDS_WORK,
    }
}

/// Picks a message with a caller-supplied selector. `select` receives the
/// number of candidates and returns an index; out-of-range indices wrap.
pub fn pick_feedback_with<F>(band: ScoreBand, select: F) -> &'static str
where
    F: FnOnce(usize) -> usize,
{
    let candidates = messages_for(band);
    candidates[select(candidates.len()) % candidates.len()]
}

pub fn pick_feedback<R: Rng>(band: ScoreBand, rng: &mut R) -> &'static str {
    pick_feedback_with(band, |len| rng.random_range(0..len))
}
