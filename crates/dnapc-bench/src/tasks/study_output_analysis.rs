use super::{progress_bar, role_index, BenchTask, TaskContext, TaskName};
use crate::align::zip_aligned;
use crate::errors::BenchResult;
use crate::loader::Record;
use crate::metrics::{Histogram, HISTOGRAM_BINS};
use crate::reporting::{EvaluationMetric, TaskReport};
use crate::sequencer::{aligned_io_files, LazyRecords};

const ROLES: [&str; 4] = ["x", "y", "y_hat", "x_hat"];

/// Value distributions of each source block and its reconstruction.
///
/// Every aligned `(x, y, y_hat, x_hat)` group contributes one histogram per
/// column of `x` and of `x_hat`.
#[derive(Debug, Default)]
pub struct StudyOutputAnalysis {}

impl StudyOutputAnalysis {
    pub fn new() -> Self {
        StudyOutputAnalysis {}
    }
}

impl BenchTask for StudyOutputAnalysis {
    fn name(&self) -> TaskName {
        TaskName::StudyOutputAnalysis
    }

    fn run(&self, ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport> {
        let config = ctx.config;
        let (roles, files) = aligned_io_files(config, &[])?;
        let mut indices = [0usize; 4];
        for (slot, label) in indices.iter_mut().zip(ROLES) {
            *slot = role_index(&roles, label)?;
        }
        let [x_index, _, _, x_hat_index] = indices;

        ctx.scratch.roles = roles;
        ctx.scratch.files = files.clone();

        let groups = LazyRecords::new(zip_aligned(files));
        let bar = progress_bar(groups.remaining(), config.show_progress);
        let mut report = TaskReport::new(self.name().as_str());
        let mut studied = 0usize;

        for group in groups {
            let group = group?;
            let name = crate::names::extract_name(&group.paths[x_index]);
            for (label, index) in [("x", x_index), ("x_hat", x_hat_index)] {
                for histogram in histograms(&format!("{}/{}", name, label), &group.records[index])? {
                    report.add_histogram(histogram);
                }
            }

            studied += 1;
            ctx.scratch.last_group = Some(group);
            bar.inc(1);
        }
        bar.finish_and_clear();

        report.add_metric("groups", EvaluationMetric::Integer(studied as i64));
        report.add_metric(
            "bins",
            EvaluationMetric::Integer(HISTOGRAM_BINS as i64),
        );
        Ok(report)
    }
}

/// One histogram per point-table column, or a single one over all values of
/// an array.
fn histograms(prefix: &str, record: &Record) -> BenchResult<Vec<Histogram>> {
    match record {
        Record::Points(table) => Ok(table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                Histogram::from_values(
                    format!("{}/{}", prefix, column),
                    table.data().column(i).iter().copied(),
                    HISTOGRAM_BINS,
                )
            })
            .collect()),
        other => {
            let values = other.to_array()?;
            Ok(vec![Histogram::from_values(
                prefix,
                values.iter().copied(),
                HISTOGRAM_BINS,
            )])
        }
    }
}
