//! Global multi-DC router (§4.7): arrival intake, waiting queue, batching & routing.

use std::collections::VecDeque;

use hgsim_workload::WorkloadDescriptor;

/// The top-level broker assigning batches of arriving cloudlets to datacenters.
pub struct GlobalRouter {
    all: Vec<WorkloadDescriptor>,
    next_arrival_index: usize,
    global_waiting: VecDeque<WorkloadDescriptor>,
}

impl GlobalRouter {
    /// `sorted_workload` must already be sorted by arrival time (ties by id),
    /// as produced by [`hgsim_workload::prepare_workload`].
    pub fn new(sorted_workload: Vec<WorkloadDescriptor>) -> Self {
        Self {
            all: sorted_workload,
            next_arrival_index: 0,
            global_waiting: VecDeque::new(),
        }
    }

    pub fn total_cloudlets(&self) -> usize {
        self.all.len()
    }

    pub fn arrivals_exhausted(&self) -> bool {
        self.next_arrival_index >= self.all.len()
    }

    /// Scans arrivals into `globalWaiting` up to `clock + dt`. `next_arrival_index`
    /// is a monotonic cursor into `all` (sorted by arrival time), so every arrival
    /// below the window's lower bound was already consumed by an earlier call;
    /// there is no separate `windowStart` to track. Returns the number of jobs
    /// intaken.
    pub fn intake(&mut self, clock: f64, dt: f64) -> usize {
        let window_end = clock + dt;
        let mut count = 0;
        while self.next_arrival_index < self.all.len() {
            let arrival_time = self.all[self.next_arrival_index].arrival_time;
            if arrival_time >= window_end {
                break;
            }
            self.global_waiting.push_back(self.all[self.next_arrival_index]);
            self.next_arrival_index += 1;
            count += 1;
        }
        count
    }

    pub fn waiting_len(&self) -> usize {
        self.global_waiting.len()
    }

    pub fn is_waiting_empty(&self) -> bool {
        self.global_waiting.is_empty()
    }

    /// Up to `k` head jobs, without mutation, for the observation builder.
    pub fn peek_batch(&self, k: usize) -> Vec<WorkloadDescriptor> {
        self.global_waiting.iter().take(k).copied().collect()
    }

    /// Pops up to `min(batch_size, actions.len(), waiting_len)` head jobs and
    /// pairs each with its requested DC index. Jobs in the batch beyond the
    /// supplied actions are left in the queue (§4.7 "missing actions leave
    /// jobs in queue").
    pub fn route_batch(&mut self, batch_size: usize, actions: &[i64]) -> Vec<(WorkloadDescriptor, i64)> {
        let n = batch_size.min(actions.len()).min(self.global_waiting.len());
        let mut out = Vec::with_capacity(n);
        for &dc_index in actions.iter().take(n) {
            let job = self.global_waiting.pop_front().expect("bounded by waiting_len above");
            out.push((job, dc_index));
        }
        out
    }

    /// Re-queues a job at the head of `globalWaiting`, used when a routed
    /// `dcIndex` turns out to be out of range.
    pub fn requeue_front(&mut self, job: WorkloadDescriptor) {
        self.global_waiting.push_front(job);
    }

    /// `[#small(<=2 cores), #medium(3-4), #large(>=5)]` over the whole queue.
    pub fn pes_distribution(&self) -> [usize; 3] {
        let mut dist = [0usize; 3];
        for job in &self.global_waiting {
            match job.cores_required {
                0..=2 => dist[0] += 1,
                3..=4 => dist[1] += 1,
                _ => dist[2] += 1,
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: u64, arrival_time: f64, cores: u32) -> WorkloadDescriptor {
        WorkloadDescriptor {
            id,
            arrival_time,
            length_mi: 1000.0,
            cores_required: cores,
            input_kb: 0.0,
            output_kb: 0.0,
        }
    }

    #[test]
    fn first_intake_picks_up_all_arrivals_before_window_end() {
        let mut router = GlobalRouter::new(vec![descriptor(0, 0.0, 2), descriptor(1, 0.5, 2)]);
        let count = router.intake(0.0, 1.0);
        assert_eq!(count, 2);
        assert_eq!(router.waiting_len(), 2);
    }

    #[test]
    fn i6_intake_minus_routed_equals_delta_waiting() {
        let mut router = GlobalRouter::new(vec![descriptor(0, 0.0, 2), descriptor(1, 0.0, 2), descriptor(2, 5.0, 2)]);
        let before = router.waiting_len();
        let intaken = router.intake(0.0, 1.0);
        let routed = router.route_batch(10, &[0, 1]);
        let after = router.waiting_len();
        assert_eq!(intaken as isize - routed.len() as isize, after as isize - before as isize);
    }

    #[test]
    fn route_batch_consumes_full_queue_with_round_robin_actions() {
        let jobs: Vec<_> = (0..6).map(|i| descriptor(i, 0.0, 2)).collect();
        let mut router = GlobalRouter::new(jobs);
        router.intake(0.0, 1.0);
        let routed = router.route_batch(6, &[0, 1, 2, 0, 1, 2]);
        assert_eq!(routed.len(), 6);
        assert!(router.is_waiting_empty());
    }

    #[test]
    fn missing_actions_leave_jobs_in_queue() {
        let jobs: Vec<_> = (0..4).map(|i| descriptor(i, 0.0, 2)).collect();
        let mut router = GlobalRouter::new(jobs);
        router.intake(0.0, 1.0);
        let routed = router.route_batch(4, &[0, 1]);
        assert_eq!(routed.len(), 2);
        assert_eq!(router.waiting_len(), 2);
    }

    #[test]
    fn pes_distribution_buckets_correctly() {
        let jobs = vec![descriptor(0, 0.0, 1), descriptor(1, 0.0, 4), descriptor(2, 0.0, 8)];
        let mut router = GlobalRouter::new(jobs);
        router.intake(0.0, 1.0);
        assert_eq!(router.pes_distribution(), [1, 1, 1]);
    }
}
