use crate::error::{QuintError, QuintResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Observed redshifts, distance moduli and their uncertainties.
///
/// Immutable after construction; share it by reference across evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    z: Vec<f64>,
    mu: Vec<f64>,
    sigma_mu: Vec<f64>,
}

/// Column names of the reformatted supernova table.
pub const CSV_COLUMNS: [&str; 3] = ["z", "mu", "sigma_mu"];

/// Columns of the Pantheon+ release table mapped onto `z`, `mu`, `sigma_mu`.
pub const PANTHEON_COLUMNS: [&str; 3] = ["zHD", "m_b_corr", "m_b_corr_err"];

impl Dataset {
    pub fn new(z: Vec<f64>, mu: Vec<f64>, sigma_mu: Vec<f64>) -> QuintResult<Self> {
        if z.len() != mu.len() || z.len() != sigma_mu.len() {
            return Err(QuintError::ColumnLengthMismatch {
                z: z.len(),
                mu: mu.len(),
                sigma_mu: sigma_mu.len(),
            });
        }
        Ok(Self { z, mu, sigma_mu })
    }

    /// Parses comma-separated text whose header names `z`, `mu` and `sigma_mu`.
    pub fn from_csv_str(text: &str) -> QuintResult<Self> {
        let dataset = parse_table(text, CSV_COLUMNS, |line| line.split(',').collect())?;
        debug!(rows = dataset.len(), "loaded supernova dataset from csv");
        Ok(dataset)
    }

    /// Parses the whitespace-separated Pantheon+ release table.
    pub fn from_pantheon_table(text: &str) -> QuintResult<Self> {
        let dataset = parse_table(text, PANTHEON_COLUMNS, |line| {
            line.split_whitespace().collect()
        })?;
        debug!(rows = dataset.len(), "loaded Pantheon+ release table");
        Ok(dataset)
    }

    /// Renders the dataset in the three-column csv layout.
    pub fn to_csv_string(&self) -> String {
        let mut out = CSV_COLUMNS.join(",");
        out.push('\n');
        for ((z, mu), sigma) in self.z.iter().zip(&self.mu).zip(&self.sigma_mu) {
            out.push_str(&format!("{z},{mu},{sigma}\n"));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    pub fn redshifts(&self) -> &[f64] {
        &self.z
    }

    pub fn distance_moduli(&self) -> &[f64] {
        &self.mu
    }

    pub fn uncertainties(&self) -> &[f64] {
        &self.sigma_mu
    }
}

fn parse_table<'a, F>(text: &'a str, columns: [&str; 3], split: F) -> QuintResult<Dataset>
where
    F: Fn(&'a str) -> Vec<&'a str>,
{
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| QuintError::MissingColumn(columns[0].to_string()))?;
    let names: Vec<&str> = split(header).into_iter().map(str::trim).collect();

    let mut indices = [0usize; 3];
    for (slot, column) in indices.iter_mut().zip(columns) {
        *slot = names
            .iter()
            .position(|name| *name == column)
            .ok_or_else(|| QuintError::MissingColumn(column.to_string()))?;
    }

    let mut values: [Vec<f64>; 3] = Default::default();
    for (line_no, line) in lines {
        let fields = split(line);
        if fields.len() != names.len() {
            return Err(QuintError::MalformedRow {
                line: line_no,
                reason: format!("expected {} fields, found {}", names.len(), fields.len()),
            });
        }
        for (column, &idx) in values.iter_mut().zip(&indices) {
            let raw = fields[idx].trim();
            let parsed = raw.parse::<f64>().map_err(|_| QuintError::MalformedRow {
                line: line_no,
                reason: format!("`{raw}` in column `{}` is not a number", names[idx]),
            })?;
            column.push(parsed);
        }
    }

    let [z, mu, sigma_mu] = values;
    Dataset::new(z, mu, sigma_mu)
}
