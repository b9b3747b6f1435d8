use crate::output::Progress;
use std::future::Future;

/// Run `work` and tag its result with `unit`, so a fan-out of units can be
/// settled into a [`RunReport`] after they all finish.
pub async fn labeled<F>(unit: String, work: F) -> (String, anyhow::Result<()>)
where
    F: Future<Output = anyhow::Result<()>>,
{
    (unit, work.await)
}

/// A unit of work that failed, with the full error chain.
#[derive(Debug)]
pub struct UnitFailure {
    pub unit: String,
    pub error: anyhow::Error,
}

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub written: usize,
    pub skipped: usize,
    pub failures: Vec<UnitFailure>,
}

impl RunReport {
    pub fn record(&mut self, unit: impl Into<String>, error: anyhow::Error) {
        let unit = unit.into();
        tracing::error!(unit = %unit, error = format!("{error:#}"), "Unit failed");
        self.failures.push(UnitFailure { unit, error });
    }

    /// Fold settled unit results in. Successes carry nothing; failures are kept.
    pub fn settle<I>(&mut self, results: I)
    where
        I: IntoIterator<Item = (String, anyhow::Result<()>)>,
    {
        for (unit, result) in results {
            if let Err(error) = result {
                self.record(unit, error);
            }
        }
    }

    pub fn count_files(&mut self, progress: &Progress) {
        self.written = progress.written();
        self.skipped = progress.skipped();
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log the closing banner.
    pub fn log_summary(&self) {
        if self.is_success() {
            tracing::info!(
                written = self.written,
                skipped = self.skipped,
                "Finished with no errors"
            );
        } else {
            let units: Vec<&str> = self.failures.iter().map(|f| f.unit.as_str()).collect();
            tracing::error!(
                written = self.written,
                skipped = self.skipped,
                failures = self.failures.len(),
                units = ?units,
                "Finished with errors"
            );
        }
    }
}
