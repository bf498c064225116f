use lazy_static::lazy_static;
use regex::Regex;

use super::ProgressionError;
use crate::models::{ActivityKind, LabCheck, ScoreBand, VerificationOutcome};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static regex");
}

static LAB_CHECKS: [LabCheck; 5] = [
    LabCheck {
        id: "hello-world",
        title: "Hello, World",
        credits: ActivityKind::LabSession,
        expected_fragments: &["hello, world!"],
    },
    LabCheck {
        id: "linux-permissions",
        title: "Linux file permissions",
        credits: ActivityKind::LabSession,
        expected_fragments: &["-rwxr-x---", "chmod 750"],
    },
    LabCheck {
        id: "docker-first-container",
        title: "Run your first container",
        credits: ActivityKind::LabSession,
        expected_fragments: &["hello from docker!", "this message shows that your installation appears to be working correctly."],
    },
    LabCheck {
        id: "rest-api-project",
        title: "Build a REST API",
        credits: ActivityKind::ProjectWork,
        expected_fragments: &["http/1.1 200 ok", "content-type: application/json", "\"status\": \"healthy\""],
    },
    LabCheck {
        id: "portfolio-site",
        title: "Deploy a portfolio site",
        credits: ActivityKind::ProjectWork,
        expected_fragments: &["deployment complete"],
    },
];

pub fn lab_catalog() -> &'static [LabCheck] {
    &LAB_CHECKS
}

pub fn find_lab(lab_id: &str) -> Result<&'static LabCheck, ProgressionError> {
    LAB_CHECKS
        .iter()
        .find(|lab| lab.id == lab_id)
        .ok_or_else(|| ProgressionError::UnknownLab(lab_id.to_string()))
}

/// Lowercases and collapses whitespace runs so formatting noise in pasted
/// terminal output does not fail a check.
pub fn normalize(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

pub fn score_band(score: u8) -> ScoreBand {
    match score {
        90..=u8::MAX => ScoreBand::Excellent,
        70..=89 => ScoreBand::Good,
        50..=69 => ScoreBand::Fair,
        _ => ScoreBand::NeedsWork,
    }
}

/// Case-insensitive substring check of every expected fragment.
pub fn verify_submission(check: &LabCheck, submitted: &str) -> VerificationOutcome {
    let haystack = normalize(submitted);
    let required = check.expected_fragments.len();
    let matched = check
        .expected_fragments
        .iter()
        .filter(|fragment| haystack.contains(&normalize(fragment)))
        .count();

    let score = if required == 0 {
        100
    } else {
        (matched * 100 / required) as u8
    };

    VerificationOutcome {
        passed: matched == required,
        score,
        matched,
        required,
        band: score_band(score),
    }
}
