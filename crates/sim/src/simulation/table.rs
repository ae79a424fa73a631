//! Dense numeric output tables.
//!
//! Replicates finish with histories of different lengths. Assembly runs in
//! two passes: the caller supplies per-replicate row counts, prefix sums give
//! every replicate a disjoint block of the final buffer, and each block is
//! filled independently. Output is therefore identical for any worker count.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, Write};

/// A row-major table of `f64` values with named columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTable {
    columns: Vec<String>,
    data: Vec<f64>,
}

impl OutputTable {
    /// Build a table from per-block row counts and a block filler.
    ///
    /// `fill(i, out)` receives block `i` as a slice of exactly
    /// `counts[i] * columns.len()` values. With `parallel`, blocks are filled on
    /// the current rayon pool; builds without the `parallel` feature ignore it.
    pub fn assemble<F>(columns: Vec<String>, counts: &[usize], parallel: bool, fill: F) -> Self
    where
        F: Fn(usize, &mut [f64]) + Sync,
    {
        let width = columns.len();
        let offsets = row_offsets(counts);
        let total = offsets.last().copied().unwrap_or(0);
        let mut data = vec![0.0; total * width];

        let mut blocks: Vec<&mut [f64]> = Vec::with_capacity(counts.len());
        let mut rest = data.as_mut_slice();
        for &count in counts {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(count * width);
            blocks.push(head);
            rest = tail;
        }

        #[cfg(feature = "parallel")]
        if parallel {
            blocks
                .into_par_iter()
                .enumerate()
                .for_each(|(i, block)| fill(i, block));
            return Self { columns, data };
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        for (i, block) in blocks.into_iter().enumerate() {
            fill(i, block);
        }
        Self { columns, data }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.data.len() / self.columns.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major values.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let width = self.n_cols();
        self.data.get(i * width..(i + 1) * width)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_cols().max(1))
    }

    /// Index of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy out the named column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows().map(|row| row[idx]).collect())
    }

    /// Write the table as CSV with a header line.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{}", self.columns.join(","))?;
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(|x| format_value(*x)).collect();
            writeln!(writer, "{}", line.join(","))?;
        }
        writer.flush()
    }
}

/// Integers print without a fractional part, everything else at full
/// precision.
fn format_value(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else if x.is_nan() {
        "NaN".to_string()
    } else {
        format!("{x}")
    }
}

/// Prefix sums of `counts`, starting at 0; the last entry is the total.
pub fn row_offsets(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    let mut acc = 0;
    offsets.push(acc);
    for &c in counts {
        acc += c;
        offsets.push(acc);
    }
    offsets
}

/// Trait column names `V1..Vq`.
fn trait_columns(q: usize) -> impl Iterator<Item = String> {
    (1..=q).map(|k| format!("V{k}"))
}

/// Columns of a time-series table: `rep, time, <id>, N, V1..Vq`.
pub fn trajectory_columns(id: &str, q: usize) -> Vec<String> {
    ["rep", "time", id, "N"]
        .into_iter()
        .map(str::to_string)
        .chain(trait_columns(q))
        .collect()
}

/// Columns of a final-state table: `rep, <id>, N, V1..Vq`.
pub fn final_state_columns(id: &str, q: usize) -> Vec<String> {
    ["rep", id, "N"]
        .into_iter()
        .map(str::to_string)
        .chain(trait_columns(q))
        .collect()
}
