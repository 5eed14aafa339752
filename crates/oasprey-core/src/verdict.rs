//! Verdict over a batch of checked interactions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ValidationError};

/// One interaction that did not satisfy the API spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Position of the interaction in its source file
    pub index: usize,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub error: ValidationError,
}

impl Finding {
    /// One-line terminal rendering: `[Code] GET /path -> 200: message`
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {} {} -> {}: {}",
            self.error.code, self.method, self.path, self.status, self.error.message
        )
    }
}

/// Policy for which interactions are checked
#[derive(Debug, Clone, Default)]
pub struct VerdictPolicy {
    /// Status codes whose interactions are skipped
    pub skip_statuses: Vec<u16>,
}

impl VerdictPolicy {
    #[must_use]
    pub fn should_check(&self, status: u16) -> bool {
        !self.skip_statuses.contains(&status)
    }

    /// Determine the verdict for a run.
    ///
    /// PASS requires at least one checked interaction, no findings and no
    /// unreadable interactions. Findings exit 1, tool errors alone exit 3.
    #[must_use]
    pub fn verdict(&self, findings: &[Finding], checked: u64, error_count: u64) -> Verdict {
        if checked == 0 && findings.is_empty() {
            return Verdict {
                status: VerdictStatus::Fail,
                exit_code: 3,
                reason: if error_count > 0 {
                    format!("No interactions were checked ({error_count} errors)")
                } else {
                    "No interactions were checked".to_string()
                },
            };
        }

        let exit_code = if !findings.is_empty() {
            1
        } else if error_count > 0 {
            3
        } else {
            0
        };

        let status = if exit_code == 0 {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let reason = if status == VerdictStatus::Pass {
            format!("All {checked} interactions satisfied the API spec")
        } else {
            let mut parts = Vec::new();
            if !findings.is_empty() {
                let mut by_code: BTreeMap<&'static str, usize> = BTreeMap::new();
                for f in findings {
                    *by_code.entry(f.error.code.as_str()).or_default() += 1;
                }
                let breakdown = by_code
                    .iter()
                    .map(|(code, n)| format!("{n} {code}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                parts.push(format!(
                    "{} of {checked} interactions failed ({breakdown})",
                    findings.len()
                ));
            }
            if error_count > 0 {
                parts.push(format!("{error_count} errors (unreadable interactions)"));
            }
            parts.join("; ")
        };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }

    /// Count findings per error kind, for JSON output.
    #[must_use]
    pub fn breakdown(findings: &[Finding]) -> BTreeMap<ErrorCode, usize> {
        let mut map = BTreeMap::new();
        for f in findings {
            *map.entry(f.error.code).or_default() += 1;
        }
        map
    }

    /// One line per error kind: count, identifier and what it means.
    #[must_use]
    pub fn breakdown_lines(findings: &[Finding]) -> Vec<String> {
        Self::breakdown(findings)
            .into_iter()
            .map(|(code, count)| format!("{count:>4} {code}: {}", code.description()))
            .collect()
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
