#[cfg(test)]
#[path = "report_test.rs"]
mod tests;

use std::path;

/// What happened to a single entry of a generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Created(path::PathBuf),
    Failed { path: String, error: String },
    Skipped { entry: usize, reason: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcomes: Vec<FileOutcome>,
}

impl GenerationReport {
    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn created(&self) -> Vec<&path::PathBuf> {
        return self
            .outcomes
            .iter()
            .filter_map(|outcome| {
                if let FileOutcome::Created(path) = outcome {
                    return Some(path);
                }
                return None;
            })
            .collect();
    }

    pub fn problems(&self) -> usize {
        return self.outcomes.len() - self.created().len();
    }

    /// Entries the model returned in a shape that could not be used.
    pub fn skipped(&self) -> usize {
        return self
            .outcomes
            .iter()
            .filter(|outcome| return matches!(outcome, FileOutcome::Skipped { .. }))
            .count();
    }

    pub fn failed(&self) -> usize {
        return self
            .outcomes
            .iter()
            .filter(|outcome| return matches!(outcome, FileOutcome::Failed { .. }))
            .count();
    }

    /// One line closing a run, e.g. `Done. Created 2 files, 1 skipped.`
    pub fn summary(&self) -> String {
        let mut summary = format!("Done. Created {} files", self.created().len());
        let skipped = self.skipped();
        if skipped > 0 {
            summary.push_str(&format!(", {skipped} skipped"));
        }
        let failed = self.failed();
        if failed > 0 {
            summary.push_str(&format!(", {failed} could not be written"));
        }
        summary.push('.');

        return summary;
    }
}
