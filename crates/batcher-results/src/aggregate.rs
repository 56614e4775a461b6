use std::io::Write;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_exp::Job;
use csv::WriterBuilder;
use tracing::info;

use crate::stats::StatsProvider;
use crate::tree::ResultTree;

/// Groups jobs by parameter values and collects their stats.
pub struct ResultAggregator<'a> {
    stats: &'a dyn StatsProvider,
}

/// A built result tree together with what is needed to emit it.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub params: Vec<String>,
    pub stats: Vec<String>,
    /// Distinct experiment display names in encounter order.
    pub graph_names: Vec<String>,
    pub tree: ResultTree,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(stats: &'a dyn StatsProvider) -> Self {
        Self { stats }
    }

    pub fn aggregate(
        &self,
        jobs: &[Job],
        params: &[String],
        stats: &[String],
    ) -> Result<Aggregation, BatcherError> {
        let mut tree = ResultTree::new(params.len());
        let mut graph_names = Vec::new();
        for job in jobs {
            let path = params
                .iter()
                .map(|param| job.param(param).map(ToString::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            let graph_name = job.graph_name()?;
            if !graph_names.contains(&graph_name) {
                graph_names.push(graph_name);
            }
            let values = stats
                .iter()
                .map(|stat| self.stats.get_stat(job, stat).to_string())
                .collect();
            tree.insert(&path, values)?;
        }
        info!(jobs = jobs.len(), series = graph_names.len(), "aggregated results");
        Ok(Aggregation {
            params: params.to_vec(),
            stats: stats.to_vec(),
            graph_names,
            tree,
        })
    }
}

impl Aggregation {
    /// Grouping columns followed by either the experiment names (one stat)
    /// or the stat names (several stats).
    pub fn header(&self) -> Vec<String> {
        let mut header = self.params.clone();
        if self.stats.len() == 1 {
            header.extend(self.graph_names.iter().cloned());
        } else {
            header.extend(self.stats.iter().cloned());
        }
        header
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.tree.rows()
    }

    /// Writes header and rows as CSV.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), BatcherError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(out);
        writer
            .write_record(self.header())
            .map_err(|err| wrap_csv("results.write_header", err))?;
        for row in self.rows() {
            writer
                .write_record(&row)
                .map_err(|err| wrap_csv("results.write_row", err))?;
        }
        writer.flush().map_err(|err| {
            BatcherError::Io(ErrorInfo::new("results.flush", err.to_string()))
        })
    }

    /// CSV text of this aggregation.
    pub fn to_csv_string(&self) -> Result<String, BatcherError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|err| {
            BatcherError::Serde(ErrorInfo::new("results.utf8", err.to_string()))
        })
    }
}

fn wrap_csv(code: &str, err: csv::Error) -> BatcherError {
    BatcherError::Serde(ErrorInfo::new(code, "CSV output failure").with_hint(err.to_string()))
}
