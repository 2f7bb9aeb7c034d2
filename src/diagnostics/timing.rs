use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Wall-clock time spent in one finder stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Stage-by-stage timing of one finder run, in execution order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Runs `stage`, records its elapsed time under `label` and passes its
    /// result through.
    pub fn measure<T>(&mut self, label: &str, stage: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = stage();
        self.stages.push(StageTiming {
            label: label.to_string(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        });
        out
    }

    /// Elapsed time of the first stage with this label.
    pub fn stage(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

/// `build 0.012 | finish 0.004 | ... (total 0.031 ms)`
impl fmt::Display for TimingBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{} {:.3}", s.label, s.elapsed_ms)?;
        }
        write!(f, " (total {:.3} ms)", self.total_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_records_stages_in_order() {
        let mut timing = TimingBreakdown::default();
        let n = timing.measure("build", || 3);
        timing.measure("fit", || ());
        timing.total_ms = 1.0;
        assert_eq!(n, 3);
        let labels: Vec<&str> = timing.stages.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["build", "fit"]);
        assert!(timing.stage("fit").is_some_and(|ms| ms >= 0.0));
        assert!(timing.stage("dedup").is_none());
        let text = timing.to_string();
        assert!(text.starts_with("build ") && text.ends_with("(total 1.000 ms)"), "{text}");
    }
}
