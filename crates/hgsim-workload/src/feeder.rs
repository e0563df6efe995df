//! Split-large-cloudlet and sort logic (§4.3).

use crate::descriptor::WorkloadDescriptor;

/// Splits oversize jobs (when `split_large_cloudlets`) and sorts the result
/// by `arrival_time` ascending, ties broken stably by `id`.
///
/// Fresh ids for split fragments are allocated starting at one past the
/// largest id in the input, so they never collide with an original id.
pub fn prepare_workload(
    descriptors: Vec<WorkloadDescriptor>,
    max_cloudlet_pes: u32,
    split_large_cloudlets: bool,
) -> Vec<WorkloadDescriptor> {
    let mut next_fresh_id = descriptors.iter().map(|d| d.id).max().map(|m| m + 1).unwrap_or(0);

    let mut out = Vec::with_capacity(descriptors.len());
    for d in descriptors {
        if split_large_cloudlets && d.cores_required > max_cloudlet_pes && max_cloudlet_pes > 0 {
            let n_splits = (d.cores_required as f64 / max_cloudlet_pes as f64).ceil() as u32;
            let mi_per_split = (d.length_mi / n_splits as f64).floor();
            let mut remaining_cores = d.cores_required;
            for _ in 0..n_splits {
                let cores = max_cloudlet_pes.min(remaining_cores);
                remaining_cores -= cores;
                let id = next_fresh_id;
                next_fresh_id += 1;
                out.push(WorkloadDescriptor {
                    id,
                    arrival_time: d.arrival_time,
                    length_mi: mi_per_split,
                    cores_required: cores,
                    input_kb: d.input_kb,
                    output_kb: d.output_kb,
                });
            }
        } else {
            out.push(d);
        }
    }

    out.sort_by(|a, b| a.arrival_time.total_cmp(&b.arrival_time).then_with(|| a.id.cmp(&b.id)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_split_large_cloudlet() {
        let descriptors = vec![WorkloadDescriptor {
            id: 0,
            arrival_time: 0.0,
            length_mi: 300_000.0,
            cores_required: 10,
            input_kb: 0.0,
            output_kb: 0.0,
        }];
        let out = prepare_workload(descriptors, 4, true);
        assert_eq!(out.len(), 3);
        let pes: Vec<u32> = out.iter().map(|d| d.cores_required).collect();
        assert_eq!(pes, vec![4, 4, 2]);
        for d in &out {
            assert_eq!(d.length_mi, 100_000.0);
            assert_eq!(d.arrival_time, 0.0);
        }
        // every fragment, including the first, gets a fresh id distinct from
        // the original job's id
        let ids: Vec<u64> = out.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn no_split_when_disabled_or_small_enough() {
        let descriptors = vec![WorkloadDescriptor {
            id: 0,
            arrival_time: 0.0,
            length_mi: 1000.0,
            cores_required: 10,
            input_kb: 0.0,
            output_kb: 0.0,
        }];
        let out = prepare_workload(descriptors.clone(), 4, false);
        assert_eq!(out, descriptors);
    }

    #[test]
    fn stable_sort_ties_broken_by_id() {
        let descriptors = vec![
            WorkloadDescriptor { id: 5, arrival_time: 1.0, length_mi: 1.0, cores_required: 1, input_kb: 0.0, output_kb: 0.0 },
            WorkloadDescriptor { id: 2, arrival_time: 1.0, length_mi: 1.0, cores_required: 1, input_kb: 0.0, output_kb: 0.0 },
            WorkloadDescriptor { id: 1, arrival_time: 0.0, length_mi: 1.0, cores_required: 1, input_kb: 0.0, output_kb: 0.0 },
        ];
        let out = prepare_workload(descriptors, 8, true);
        let ids: Vec<u64> = out.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 5]);
    }
}
