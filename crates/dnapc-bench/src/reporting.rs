use crate::errors::BenchResult;
use crate::metrics::Histogram;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EvaluationMetric {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl fmt::Display for EvaluationMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMetric::Integer(i) => write!(f, "{}", i),
            EvaluationMetric::Float(fl) => write!(f, "{:.6}", fl),
            EvaluationMetric::String(s) => write!(f, "{}", s),
            EvaluationMetric::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Everything a task produced: named metrics, written files and any
/// histograms computed for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub task: String,
    pub metrics: Vec<(String, EvaluationMetric)>,
    pub artifacts: Vec<PathBuf>,
    pub histograms: Vec<Histogram>,
}

impl TaskReport {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            metrics: Vec::new(),
            artifacts: Vec::new(),
            histograms: Vec::new(),
        }
    }

    pub fn add_metric(&mut self, name: impl Into<String>, metric: EvaluationMetric) {
        self.metrics.push((name.into(), metric));
    }

    pub fn add_artifact(&mut self, path: PathBuf) {
        self.artifacts.push(path);
    }

    pub fn add_histogram(&mut self, histogram: Histogram) {
        self.histograms.push(histogram);
    }

    pub fn metric(&self, name: &str) -> Option<&EvaluationMetric> {
        self.metrics
            .iter()
            .find(|(metric_name, _)| metric_name == name)
            .map(|(_, metric)| metric)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.artifacts.is_empty() && self.histograms.is_empty()
    }

    /// Pretty JSON next to the other run outputs.
    pub fn save(&self, path: &Path) -> BenchResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task: {}", self.task)?;
        for (name, metric) in &self.metrics {
            writeln!(f, "  {}: {}", name, metric)?;
        }
        if !self.artifacts.is_empty() {
            writeln!(f, "  artifacts written: {}", self.artifacts.len())?;
        }
        for histogram in &self.histograms {
            writeln!(
                f,
                "  histogram {} [{:.3}, {:.3}] over {} values",
                histogram.label,
                histogram.min,
                histogram.max,
                histogram.total()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lookup_and_display() {
        let mut report = TaskReport::new("evaluate_y_reconstruction");
        assert!(report.is_empty());
        report.add_metric("mse", EvaluationMetric::Float(0.25));
        report.add_metric("pairs", EvaluationMetric::Integer(2));

        assert_eq!(report.metric("pairs"), Some(&EvaluationMetric::Integer(2)));
        assert!(report.metric("max").is_none());
        let text = report.to_string();
        assert!(text.contains("mse: 0.250000"));
    }

    #[test]
    fn test_save_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("play.json");
        let report = TaskReport::new("play");
        report.save(&path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["task"], "play");
        assert!(saved["metrics"].as_array().unwrap().is_empty());
    }
}
