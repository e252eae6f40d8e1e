use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, warn};

use crate::config::AlignerConfig;
use crate::{Aligner, AlignerError, AlignmentOutcome, Sequence};

/// Aligns many independent pairs on a fixed pool of worker threads.
pub struct BatchAligner {
    work_tx: Option<Sender<WorkItem>>,
    result_rx: Receiver<WorkResult>,
    workers: Vec<thread::JoinHandle<()>>,
}

struct WorkItem {
    index: usize,
    seq1: Sequence,
    seq2: Sequence,
}

struct WorkResult {
    index: usize,
    worker_id: usize,
    result: Result<AlignmentOutcome, AlignerError>,
}

impl BatchAligner {
    pub fn new(aligner: Aligner, workers: usize) -> Result<Self, AlignerError> {
        if workers == 0 {
            return Err(AlignerError::ConfigError(
                "batch alignment needs at least one worker".to_string(),
            ));
        }

        let (work_tx, work_rx) = bounded(workers * 2);
        let (result_tx, result_rx) = unbounded();
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let aligner = aligner.clone();
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("aligner-{worker_id}"))
                .spawn(move || Self::worker(worker_id, aligner, work_rx, result_tx))?;
            handles.push(handle);
        }

        Ok(Self {
            work_tx: Some(work_tx),
            result_rx,
            workers: handles,
        })
    }

    pub fn from_config(config: &AlignerConfig) -> Result<Self, AlignerError> {
        Self::new(Aligner::from_config(config), config.performance.workers)
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    fn worker(
        worker_id: usize,
        aligner: Aligner,
        work_rx: Receiver<WorkItem>,
        result_tx: Sender<WorkResult>,
    ) {
        while let Ok(work) = work_rx.recv() {
            let result = aligner.align(&work.seq1, &work.seq2);
            let sent = result_tx.send(WorkResult {
                index: work.index,
                worker_id,
                result,
            });
            if sent.is_err() {
                break;
            }
        }
        debug!("worker {worker_id} shutting down");
    }

    /// Aligns every pair and returns outcomes in input order. If any pair
    /// fails, the error of the earliest failing pair is returned.
    pub fn align_all(
        &mut self,
        pairs: Vec<(Sequence, Sequence)>,
    ) -> Result<Vec<AlignmentOutcome>, AlignerError> {
        let total = pairs.len();
        let work_tx = self
            .work_tx
            .as_ref()
            .ok_or_else(|| AlignerError::WorkerError("batch aligner is shut down".to_string()))?;

        // Results are collected on this thread while the work channel is
        // fed from a scoped sender so a full queue cannot stall the caller.
        let mut slots: Vec<Option<Result<AlignmentOutcome, AlignerError>>> =
            (0..total).map(|_| None).collect();
        let result_rx = &self.result_rx;

        thread::scope(|scope| -> Result<(), AlignerError> {
            let feeder = scope.spawn(move || {
                for (index, (seq1, seq2)) in pairs.into_iter().enumerate() {
                    if work_tx.send(WorkItem { index, seq1, seq2 }).is_err() {
                        return false;
                    }
                }
                true
            });

            for _ in 0..total {
                let work_result = result_rx
                    .recv()
                    .map_err(|e| AlignerError::WorkerError(e.to_string()))?;
                if let Err(e) = &work_result.result {
                    warn!("worker {} failed on pair {}: {e}", work_result.worker_id, work_result.index);
                }
                slots[work_result.index] = Some(work_result.result);
            }

            match feeder.join() {
                Ok(true) => Ok(()),
                _ => Err(AlignerError::WorkerError("failed to dispatch work".to_string())),
            }
        })?;

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    Err(AlignerError::WorkerError(format!("no result for pair {index}")))
                })
            })
            .collect()
    }
}

impl Drop for BatchAligner {
    fn drop(&mut self) {
        // Closing the work channel stops the workers
        self.work_tx.take();

        while let Some(worker) = self.workers.pop() {
            join_worker(worker);
        }
    }
}

/// Joins a worker, reporting whether it exited without panicking.
fn join_worker(worker: thread::JoinHandle<()>) -> bool {
    let name = worker.thread().name().unwrap_or("unnamed").to_string();
    match worker.join() {
        Ok(()) => true,
        Err(_) => {
            warn!("{name} panicked before shutdown");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlignmentMode, ScoringScheme};

    fn pairs() -> Vec<(Sequence, Sequence)> {
        [
            ("GATTACA", "GCATGCU"),
            ("AGCTA", "AGTCA"),
            ("A", "A"),
            ("TTACGTT", "ACG"),
            ("ACACACTA", "AGCACACA"),
        ]
        .into_iter()
        .map(|(a, b)| (Sequence::from(a), Sequence::from(b)))
        .collect()
    }

    #[test]
    fn test_results_keep_input_order() {
        let aligner = Aligner::new(ScoringScheme::new(2, -1, -2)).with_alignment_mode(AlignmentMode::Local);
        let mut batch = BatchAligner::new(aligner.clone(), 3).unwrap();
        assert_eq!(batch.workers(), 3);

        let outcomes = batch.align_all(pairs()).unwrap();
        let expected: Vec<_> = pairs()
            .iter()
            .map(|(a, b)| aligner.align(a, b).unwrap())
            .collect();
        assert_eq!(outcomes, expected);

        // The pool is reusable.
        assert_eq!(batch.align_all(pairs()).unwrap().len(), 5);
        assert!(batch.align_all(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_first_failure_is_reported() {
        let mut batch = BatchAligner::new(Aligner::default(), 2).unwrap();
        let mut work = pairs();
        work.insert(1, (Sequence::from(""), Sequence::from("ACGT")));
        assert!(matches!(batch.align_all(work), Err(AlignerError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_zero_workers() {
        assert!(matches!(
            BatchAligner::new(Aligner::default(), 0),
            Err(AlignerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_join_worker_reports_panics() {
        let clean = thread::spawn(|| {});
        assert!(join_worker(clean));

        let panicking = thread::Builder::new()
            .name("aligner-worker-test".to_string())
            .spawn(|| panic!("worker blew up"))
            .unwrap();
        assert!(!join_worker(panicking));
    }
}
