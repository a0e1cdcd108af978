use crate::core::series::HospitalId;

/// Symmetric N×N distance matrix over hospitals, zero on the diagonal.
///
/// Indexed in registry order: row/column `i` belongs to `hospital_ids[i]`.
/// Storage is dense row-major; only `set` writes, and it writes both halves.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub hospital_ids: Vec<HospitalId>,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Create an all-zero matrix for the given hospitals.
    pub fn zeros(hospital_ids: &[HospitalId]) -> Self {
        let n = hospital_ids.len();
        Self {
            hospital_ids: hospital_ids.to_vec(),
            data: vec![0.0; n * n],
        }
    }

    /// Build from a condensed upper triangle (row-major over `i < j`).
    pub fn from_condensed(hospital_ids: &[HospitalId], condensed: &[f64]) -> Self {
        let n = hospital_ids.len();
        assert_eq!(
            condensed.len(),
            n * n.saturating_sub(1) / 2,
            "Condensed length does not match hospital count"
        );
        let mut dm = Self::zeros(hospital_ids);
        let mut k = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                dm.set(i, j, condensed[k]);
                k += 1;
            }
        }
        dm
    }

    pub fn len(&self) -> usize {
        self.hospital_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hospital_ids.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.len() + j]
    }

    /// Set `d[i][j]` and `d[j][i]`. Writes to the diagonal are ignored.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, d: f64) {
        if i == j {
            return;
        }
        let n = self.len();
        self.data[i * n + j] = d;
        self.data[j * n + i] = d;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.len();
        &self.data[i * n..(i + 1) * n]
    }

    /// Upper triangle (`i < j`) in row-major order.
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.len();
        let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.get(i, j));
            }
        }
        out
    }

    /// Check `d[i][j] == d[j][i]` and `d[i][i] == 0` for every entry.
    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| self.get(i, i) == 0.0 && (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}
