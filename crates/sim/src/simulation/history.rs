//! Per-replicate snapshot storage.

use crate::ecology::TraitVector;

/// State of one replicate at one recorded time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSlice {
    /// 0-based step index.
    pub time: usize,
    /// Clone or species id per row.
    pub ids: Vec<u64>,
    pub abundances: Vec<f64>,
    pub traits: Vec<TraitVector>,
}

impl TimeSlice {
    pub fn new(time: usize) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    pub fn push(&mut self, id: u64, abundance: f64, traits: &TraitVector) {
        self.ids.push(id);
        self.abundances.push(abundance);
        self.traits.push(traits.clone());
    }

    /// Number of populations recorded.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Write one row per population into `out`.
    ///
    /// Rows are `[rep, time, id, N, V1..Vq]`, or `[rep, id, N, V1..Vq]`
    /// without `with_time`. `out` must hold exactly `len()` rows.
    pub fn fill_rows(&self, rep: usize, with_time: bool, out: &mut [f64]) {
        if self.is_empty() {
            return;
        }
        let width = out.len() / self.len();
        for (row, ((id, n), v)) in out
            .chunks_exact_mut(width)
            .zip(self.ids.iter().zip(&self.abundances).zip(&self.traits))
        {
            let mut col = 0;
            row[col] = rep as f64;
            col += 1;
            if with_time {
                row[col] = self.time as f64;
                col += 1;
            }
            row[col] = *id as f64;
            row[col + 1] = *n;
            row[col + 2..].copy_from_slice(v.as_slice());
        }
    }
}

/// Ordered snapshots of one replicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    slices: Vec<TimeSlice>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slice: TimeSlice) {
        self.slices.push(slice);
    }

    pub fn slices(&self) -> &[TimeSlice] {
        &self.slices
    }

    /// Total rows over all snapshots.
    pub fn n_rows(&self) -> usize {
        self.slices.iter().map(TimeSlice::len).sum()
    }

    /// Write every snapshot as `[rep, time, id, N, V1..Vq]` rows.
    pub fn fill_rows(&self, rep: usize, q: usize, out: &mut [f64]) {
        let width = q + 4;
        let mut offset = 0;
        for slice in &self.slices {
            let end = offset + slice.len() * width;
            slice.fill_rows(rep, true, &mut out[offset..end]);
            offset = end;
        }
    }
}
