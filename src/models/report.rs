use std::fmt;

/// Final status of one processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Succeeded,
    Failed,
    Skipped,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileStatus::Succeeded => "Succeeded",
            FileStatus::Failed => "Failed",
            FileStatus::Skipped => "Skipped",
        };
        f.write_str(label)
    }
}

/// Outcome of processing a single file.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub file_name: String,
    pub status: FileStatus,
    pub updates_made: u64,
    pub error: Option<String>,
}

impl RunResult {
    pub fn succeeded(file_name: impl Into<String>, updates_made: u64) -> Self {
        Self {
            file_name: file_name.into(),
            status: FileStatus::Succeeded,
            updates_made,
            error: None,
        }
    }

    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: FileStatus::Failed,
            updates_made: 0,
            error: Some(error.into()),
        }
    }
}

/// Run-scoped accumulator for one rule. Counters only ever increase across
/// the files of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule_name: String,
    pub matches_found: u64,
    pub updates_made: u64,
}

impl RuleOutcome {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            matches_found: 0,
            updates_made: 0,
        }
    }
}

/// The final, immutable aggregate report for one execution of the batch.
///
/// The per-rule breakdown is ordered the way the rules were declared in
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,
    pub files_skipped: u64,
    pub total_updates: u64,
    pub per_rule: Vec<RuleOutcome>,
}

impl RunSummary {
    /// Render the summary in human-readable form for the console and log.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(60));
        out.push_str("\nPROCESSING COMPLETE\n");
        out.push_str(&format!("Files processed: {}\n", self.files_processed));
        out.push_str(&format!("Succeeded: {}\n", self.files_succeeded));
        out.push_str(&format!("Failed: {}\n", self.files_failed));
        if self.files_skipped > 0 {
            out.push_str(&format!("Skipped: {}\n", self.files_skipped));
        }
        out.push_str(&format!("Total updates made: {}\n", self.total_updates));

        if !self.per_rule.is_empty() {
            out.push_str("Breakdown by rule:\n");
            for outcome in &self.per_rule {
                out.push_str(&format!(
                    "  '{}': {} matches, {} updates\n",
                    outcome.rule_name, outcome.matches_found, outcome.updates_made
                ));
            }
        }

        out.push_str(&"=".repeat(60));
        out
    }
}
