use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::series::HospitalId;

/// Identity of a cluster within one clustering run. Positive, no other meaning.
pub type ClusterId = u32;

/// One group of hospitals, stored as indices into the run's hospital list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub members: BTreeSet<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Strict partition of a hospital list into clusters.
///
/// Clusters live in an arena (`clusters[k]` has id `k + 1`) and each hospital
/// index maps to exactly one arena slot, so membership never aliases the
/// hospital registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    hospital_ids: Vec<HospitalId>,
    clusters: Vec<Cluster>,
    assignment: Vec<usize>,
}

impl Partition {
    /// Build from one label per hospital.
    ///
    /// Labels may be arbitrary; clusters are numbered `1..` in order of their
    /// first member in `hospital_ids`.
    pub fn from_labels(hospital_ids: &[HospitalId], labels: &[usize]) -> Self {
        assert_eq!(
            hospital_ids.len(),
            labels.len(),
            "One label per hospital is required"
        );
        let mut slot_of_label: BTreeMap<usize, usize> = BTreeMap::new();
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut assignment = Vec::with_capacity(labels.len());

        for (idx, &label) in labels.iter().enumerate() {
            let slot = *slot_of_label.entry(label).or_insert_with(|| {
                clusters.push(Cluster {
                    id: clusters.len() as ClusterId + 1,
                    members: BTreeSet::new(),
                });
                clusters.len() - 1
            });
            clusters[slot].members.insert(idx);
            assignment.push(slot);
        }

        Self {
            hospital_ids: hospital_ids.to_vec(),
            clusters,
            assignment,
        }
    }

    /// Every hospital in its own cluster.
    pub fn singletons(hospital_ids: &[HospitalId]) -> Self {
        let labels: Vec<usize> = (0..hospital_ids.len()).collect();
        Self::from_labels(hospital_ids, &labels)
    }

    pub fn hospital_ids(&self) -> &[HospitalId] {
        &self.hospital_ids
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        (id as usize)
            .checked_sub(1)
            .and_then(|slot| self.clusters.get(slot))
    }

    /// Cluster holding the hospital at registry index `idx`.
    pub fn cluster_of_index(&self, idx: usize) -> Option<&Cluster> {
        self.assignment.get(idx).map(|&slot| &self.clusters[slot])
    }

    pub fn cluster_of(&self, hospital_id: HospitalId) -> Option<&Cluster> {
        self.hospital_ids
            .iter()
            .position(|&h| h == hospital_id)
            .and_then(|idx| self.cluster_of_index(idx))
    }

    pub fn member_ids(&self, cluster: &Cluster) -> Vec<HospitalId> {
        cluster
            .members
            .iter()
            .map(|&idx| self.hospital_ids[idx])
            .collect()
    }

    /// Output contract: cluster id → member hospital ids.
    pub fn to_map(&self) -> BTreeMap<ClusterId, Vec<HospitalId>> {
        self.clusters
            .iter()
            .map(|c| (c.id, self.member_ids(c)))
            .collect()
    }

    /// Every hospital index appears in exactly one cluster.
    pub fn is_strict(&self) -> bool {
        let mut seen = vec![false; self.hospital_ids.len()];
        for c in &self.clusters {
            for &idx in &c.members {
                if idx >= seen.len() || seen[idx] {
                    return false;
                }
                seen[idx] = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}
