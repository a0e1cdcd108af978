use crate::core::distance_matrix::DistanceMatrix;
use crate::core::partition::Partition;

/// One agglomeration step of the dendrogram.
///
/// Node numbering follows the usual linkage-matrix convention: leaves are
/// `0..n`, and the cluster created by merge `k` is node `n + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    /// Average pairwise distance between the two merged clusters.
    pub distance: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

/// Average-linkage (UPGMA) agglomerative clustering.
///
/// Repeatedly merges the two closest active clusters, updating distances with
/// the Lance–Williams rule `d(a∪b, k) = (n_a d(a,k) + n_b d(b,k)) / (n_a + n_b)`.
/// Ties are broken by the lowest pair of slots. Non-finite distances are
/// treated as infinitely far. Returns `n - 1` merges for `n >= 1` leaves.
pub fn average_linkage(dm: &DistanceMatrix) -> Vec<Merge> {
    let n = dm.len();
    if n < 2 {
        return vec![];
    }

    // Working copy indexed by slot; merged clusters reuse the lower slot.
    let mut d: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            dm.row(i)
                .iter()
                .map(|&v| if v.is_finite() { v } else { f64::INFINITY })
                .collect()
        })
        .collect();
    let mut active = vec![true; n];
    let mut size = vec![1usize; n];
    let mut node = (0..n).collect::<Vec<_>>();
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..(n - 1) {
        let mut best = (usize::MAX, usize::MAX, f64::INFINITY);
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if active[j] && (d[i][j] < best.2 || best.0 == usize::MAX) {
                    best = (i, j, d[i][j]);
                }
            }
        }
        let (a, b, dist) = best;

        let (na, nb) = (size[a] as f64, size[b] as f64);
        for k in 0..n {
            if !active[k] || k == a || k == b {
                continue;
            }
            let merged = (na * d[a][k] + nb * d[b][k]) / (na + nb);
            d[a][k] = merged;
            d[k][a] = merged;
        }

        let (left, right) = if node[a] < node[b] {
            (node[a], node[b])
        } else {
            (node[b], node[a])
        };
        merges.push(Merge {
            left,
            right,
            distance: dist,
            size: size[a] + size[b],
        });

        size[a] += size[b];
        active[b] = false;
        node[a] = n + step;
    }

    merges
}

/// Flat cluster labels from cutting the dendrogram at `threshold`.
///
/// Two leaves share a label iff they are joined by merges whose distance is
/// `<= threshold`. Average linkage never produces inversions, so this equals a
/// cut on cophenetic distance. Labels are union-find roots (arbitrary values).
pub fn cut_at_distance(n: usize, merges: &[Merge], threshold: f64) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..n + merges.len()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for (k, m) in merges.iter().enumerate() {
        if m.distance <= threshold {
            let new_node = n + k;
            let ra = find(&mut parent, m.left);
            let rb = find(&mut parent, m.right);
            parent[ra] = new_node;
            parent[rb] = new_node;
        }
    }

    (0..n).map(|leaf| find(&mut parent, leaf)).collect()
}

/// Cluster hospitals by average linkage cut at a distance threshold.
///
/// Produces a strict partition: every hospital lands in exactly one cluster,
/// singletons included. An empty matrix gives an empty partition and a single
/// hospital gives one singleton cluster.
pub fn cluster(dm: &DistanceMatrix, threshold: f64) -> Partition {
    let merges = average_linkage(dm);
    let labels = cut_at_distance(dm.len(), &merges, threshold);
    let partition = Partition::from_labels(&dm.hospital_ids, &labels);
    tracing::debug!(
        hospitals = dm.len(),
        clusters = partition.len(),
        threshold,
        "Cut average-linkage dendrogram"
    );
    partition
}
