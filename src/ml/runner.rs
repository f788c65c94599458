// ============================================================
// Layer 5 — Minibatch Runner
// ============================================================
// One controlled pass (or several epochs) of batched training or
// evaluation over an ImageDataset, reporting mean loss and
// accuracy.
//
// Per epoch:
//   1. Shuffle the full index permutation 0..N with the context RNG
//   2. Cut it into consecutive chunks of batch_size
//      (last chunk may be short; ceil(N / batch_size) chunks)
//   3. predict → loss → correct → (training only) update_parameters
//   4. loss_sum += loss * actual_batch_size, correct += hits
//   5. Training only: every log_interval-th batch → on_iteration
//   6. mean_loss = loss_sum / N, accuracy = correct / N → on_epoch
//
// Loss and correctness are read before the update, so they
// describe the parameters the batch was actually scored with.
//
// Only the final epoch's summary is returned; earlier epochs
// reach the caller through the RunObserver side channel.
//
// Reference: Burn Book §5 (Training)
//            rand crate documentation (SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::ImageDataset;
use crate::domain::error::TrainError;
use crate::domain::sample::Minibatch;
use crate::domain::stats::{BatchProgress, EpochStats, EpochSummary, Phase};
use crate::domain::traits::{ModelHandle, RunObserver};

/// What a single call to `run` should do.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub phase:        Phase,
    pub epochs:       usize,
    pub batch_size:   usize,
    pub is_training:  bool,
    /// Report every n-th training batch; ignored when evaluating
    pub log_interval: usize,
}

impl RunPlan {
    pub fn training(epochs: usize, batch_size: usize, log_interval: usize) -> Self {
        Self { phase: Phase::Train, epochs, batch_size, is_training: true, log_interval }
    }

    /// A single evaluation epoch.
    pub fn evaluation(phase: Phase, batch_size: usize) -> Self {
        Self { phase, epochs: 1, batch_size, is_training: false, log_interval: 1 }
    }

    fn validate(&self, records: usize, can_update: bool) -> Result<(), TrainError> {
        if records == 0 {
            return Err(TrainError::invalid("dataset is empty"));
        }
        if self.batch_size == 0 {
            return Err(TrainError::invalid("batch size must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(TrainError::invalid("epochs must be at least 1"));
        }
        if self.is_training && self.log_interval == 0 {
            return Err(TrainError::invalid("log interval must be at least 1"));
        }
        if self.is_training && !can_update {
            return Err(TrainError::invalid(
                "training requested but the model cannot update its parameters",
            ));
        }
        Ok(())
    }
}

/// Everything a run needs besides the data: the model, the shuffle RNG,
/// and whoever listens for progress.
pub struct TrainingContext<M: ModelHandle> {
    model:     M,
    rng:       StdRng,
    observers: Vec<Box<dyn RunObserver>>,
}

impl<M: ModelHandle> TrainingContext<M> {
    /// `seed` makes the shuffle order reproducible; None draws from entropy.
    pub fn new(model: M, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { model, rng, observers: Vec::new() }
    }

    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn notify_iteration(&mut self, progress: &BatchProgress) {
        for observer in self.observers.iter_mut() {
            observer.on_iteration(progress);
        }
    }

    fn notify_epoch(&mut self, summary: &EpochSummary) {
        for observer in self.observers.iter_mut() {
            observer.on_epoch(summary);
        }
    }
}

/// Run `plan` over `dataset` and return the final epoch's summary.
pub fn run<M: ModelHandle>(
    ctx:     &mut TrainingContext<M>,
    dataset: &ImageDataset,
    plan:    &RunPlan,
) -> Result<EpochSummary, TrainError> {
    let total = dataset.sample_count();
    plan.validate(total, ctx.model.can_update())?;

    tracing::info!(
        "Running {} for {} epoch(s): {} records, batch size {}",
        plan.phase, plan.epochs, total, plan.batch_size,
    );

    let mut order: Vec<usize> = (0..total).collect();
    let mut iteration = 0usize;
    let mut last      = None;

    for epoch in 1..=plan.epochs {
        order.shuffle(&mut ctx.rng);
        let mut stats = EpochStats::default();

        for chunk in order.chunks(plan.batch_size) {
            let batch = dataset.gather(chunk)?;
            let (loss, correct) = run_batch(&mut ctx.model, &batch, plan.is_training)?;
            stats.record(loss, &correct);

            if plan.is_training && iteration % plan.log_interval == 0 {
                let hits = correct.iter().filter(|&&hit| hit).count();
                ctx.notify_iteration(&BatchProgress {
                    iteration: iteration + 1,
                    loss,
                    accuracy: hits as f64 / correct.len() as f64,
                });
            }
            iteration += 1;
        }

        let summary = stats.finish(plan.phase, epoch, total)?;
        tracing::debug!(
            "{} epoch {} done: loss={:.4} acc={:.4}",
            plan.phase, epoch, summary.mean_loss, summary.accuracy,
        );
        ctx.notify_epoch(&summary);
        last = Some(summary);
    }

    last.ok_or_else(|| TrainError::invalid("run performed no epochs"))
}

/// Score one batch and, when training, take one update step.
/// Returns the batch mean loss and the per-record correctness flags.
fn run_batch<M: ModelHandle>(
    model:    &mut M,
    batch:    &Minibatch,
    training: bool,
) -> Result<(f64, Vec<bool>), TrainError> {
    let labels  = batch.labels();
    let scores  = model.predict(batch, training).map_err(TrainError::computation)?;
    let loss    = model.loss(&scores, &labels).map_err(TrainError::computation)?;
    let correct = model.correct(&scores, &labels).map_err(TrainError::computation)?;

    if correct.len() != batch.len() {
        return Err(TrainError::computation(anyhow::anyhow!(
            "model returned {} correctness flags for {} records",
            correct.len(),
            batch.len()
        )));
    }

    if training {
        model
            .update_parameters(scores, &labels)
            .map_err(TrainError::computation)?;
    }

    Ok((loss, correct))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every batch it sees. Labels equal record indices in these
    /// tests, so the recorded labels are the visiting order.
    struct FakeModel {
        batches:   Vec<Vec<usize>>,
        updates:   usize,
        trainable: bool,
        fail_at:   Option<usize>,
        loss_fn:   fn(usize) -> f64,
        hit_fn:    fn(usize) -> bool,
    }

    impl FakeModel {
        fn new(loss_fn: fn(usize) -> f64, hit_fn: fn(usize) -> bool) -> Self {
            Self { batches: Vec::new(), updates: 0, trainable: true, fail_at: None, loss_fn, hit_fn }
        }

        fn constant() -> Self {
            Self::new(|_| 1.0, |_| true)
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.iter().map(Vec::len).collect()
        }
    }

    impl ModelHandle for FakeModel {
        type Scores = Vec<usize>;

        fn predict(&mut self, batch: &Minibatch, _training: bool) -> anyhow::Result<Vec<usize>> {
            if self.fail_at == Some(self.batches.len()) {
                anyhow::bail!("device lost");
            }
            self.batches.push(batch.labels());
            Ok(batch.labels())
        }

        fn loss(&self, scores: &Vec<usize>, _labels: &[usize]) -> anyhow::Result<f64> {
            Ok((self.loss_fn)(scores.len()))
        }

        fn correct(&self, _scores: &Vec<usize>, labels: &[usize]) -> anyhow::Result<Vec<bool>> {
            Ok(labels.iter().map(|&l| (self.hit_fn)(l)).collect())
        }

        fn can_update(&self) -> bool {
            self.trainable
        }

        fn update_parameters(&mut self, _scores: Vec<usize>, _labels: &[usize]) -> anyhow::Result<()> {
            self.updates += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorded {
        iterations: Vec<BatchProgress>,
        epochs:     Vec<EpochSummary>,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl RunObserver for Recorder {
        fn on_iteration(&mut self, progress: &BatchProgress) {
            self.0.borrow_mut().iterations.push(progress.clone());
        }

        fn on_epoch(&mut self, summary: &EpochSummary) {
            self.0.borrow_mut().epochs.push(summary.clone());
        }
    }

    fn dataset(n: usize) -> ImageDataset {
        let features = (0..n).map(|i| vec![i as f32]).collect();
        let labels   = (0..n).collect();
        ImageDataset::from_parts(features, labels, [1, 1, 1]).unwrap()
    }

    fn eval_plan(batch_size: usize) -> RunPlan {
        RunPlan::evaluation(Phase::Validation, batch_size)
    }

    #[test]
    fn test_chunk_count_and_sizes() {
        for n in 1..=12 {
            for b in 1..=13 {
                let mut ctx = TrainingContext::new(FakeModel::constant(), Some(7));
                run(&mut ctx, &dataset(n), &eval_plan(b)).unwrap();

                let sizes = ctx.model().batch_sizes();
                assert_eq!(sizes.len(), (n + b - 1) / b, "n={n} b={b}");
                assert_eq!(sizes.iter().sum::<usize>(), n, "n={n} b={b}");
                assert!(sizes[..sizes.len() - 1].iter().all(|&s| s == b));
            }
        }
    }

    #[test]
    fn test_batch_larger_than_dataset_is_one_chunk() {
        let mut ctx = TrainingContext::new(FakeModel::constant(), Some(1));
        run(&mut ctx, &dataset(3), &eval_plan(64)).unwrap();
        assert_eq!(ctx.model().batch_sizes(), vec![3]);
    }

    #[test]
    fn test_mean_loss_is_weighted_by_batch_size() {
        // Loss depends on batch size: batches [3, 3, 1] → losses [1.5, 1.5, 0.5]
        let model   = FakeModel::new(|size| size as f64 * 0.5, |_| true);
        let mut ctx = TrainingContext::new(model, Some(3));
        let summary = run(&mut ctx, &dataset(7), &eval_plan(3)).unwrap();

        let expected = (1.5 * 3.0 + 1.5 * 3.0 + 0.5 * 1.0) / 7.0;
        assert!((summary.mean_loss - expected).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_counts_correct_records() {
        let model   = FakeModel::new(|_| 0.0, |label| label % 3 == 0);
        let mut ctx = TrainingContext::new(model, Some(11));
        let summary = run(&mut ctx, &dataset(10), &eval_plan(4)).unwrap();

        // labels 0, 3, 6, 9 are correct
        assert!((summary.accuracy - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_every_epoch_visits_each_record_once() {
        let n = 20;
        let mut orders = Vec::new();

        for seed in 0..5 {
            let mut ctx = TrainingContext::new(FakeModel::constant(), Some(seed));
            let plan    = RunPlan { epochs: 3, ..eval_plan(6) };
            run(&mut ctx, &dataset(n), &plan).unwrap();

            let visited: Vec<usize> = ctx.model().batches.concat();
            assert_eq!(visited.len(), 3 * n);
            for epoch in visited.chunks(n) {
                let mut sorted = epoch.to_vec();
                sorted.sort_unstable();
                assert_eq!(sorted, (0..n).collect::<Vec<_>>());
            }
            orders.push(visited);
        }

        assert!(orders.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_evaluation_never_updates() {
        let mut ctx = TrainingContext::new(FakeModel::new(|s| s as f64, |l| l % 2 == 0), Some(5));
        let data    = dataset(9);

        let first  = run(&mut ctx, &data, &eval_plan(4)).unwrap();
        let second = run(&mut ctx, &data, &eval_plan(4)).unwrap();

        assert_eq!(ctx.model().updates, 0);
        assert_eq!(first.mean_loss, second.mean_loss);
        assert_eq!(first.accuracy, second.accuracy);
    }

    #[test]
    fn test_training_updates_once_per_batch() {
        let mut ctx = TrainingContext::new(FakeModel::constant(), Some(5));
        run(&mut ctx, &dataset(10), &RunPlan::training(2, 4, 100)).unwrap();
        // 2 epochs × ceil(10 / 4) batches
        assert_eq!(ctx.model().updates, 6);
    }

    #[test]
    fn test_five_records_batch_two_end_to_end() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut ctx  = TrainingContext::new(FakeModel::constant(), None)
            .with_observer(Recorder(recorded.clone()));

        let summary = run(&mut ctx, &dataset(5), &eval_plan(2)).unwrap();

        assert_eq!(summary.mean_loss, 1.0);
        assert_eq!(summary.accuracy, 1.0);
        assert_eq!(summary.epoch, 1);
        assert_eq!(ctx.model().batch_sizes(), vec![2, 2, 1]);

        let recorded = recorded.borrow();
        assert!(recorded.iterations.is_empty());
        assert_eq!(recorded.epochs, vec![summary]);
    }

    #[test]
    fn test_progress_cadence_and_last_epoch_returned() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut ctx  = TrainingContext::new(FakeModel::constant(), Some(2))
            .with_observer(Recorder(recorded.clone()));

        let summary = run(&mut ctx, &dataset(5), &RunPlan::training(2, 1, 2)).unwrap();

        let recorded = recorded.borrow();
        let logged: Vec<usize> = recorded.iterations.iter().map(|p| p.iteration).collect();
        assert_eq!(logged, vec![1, 3, 5, 7, 9]);
        assert!(recorded.iterations.iter().all(|p| p.accuracy == 1.0));
        assert_eq!(recorded.epochs.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(summary.epoch, 2);
        assert_eq!(summary.phase, Phase::Train);
    }

    #[test]
    fn test_invalid_inputs_are_rejected_before_any_batch() {
        let cases = [
            (dataset(0), eval_plan(4)),
            (dataset(4), eval_plan(0)),
            (dataset(4), RunPlan { epochs: 0, ..eval_plan(2) }),
            (dataset(4), RunPlan::training(1, 2, 0)),
        ];
        for (data, plan) in cases.iter() {
            let mut ctx = TrainingContext::new(FakeModel::constant(), Some(0));
            let err     = run(&mut ctx, data, plan).unwrap_err();
            assert!(matches!(err, TrainError::InvalidInput(_)), "{plan:?}");
            assert!(ctx.model().batches.is_empty());
        }
    }

    #[test]
    fn test_training_without_update_capability_is_invalid() {
        let mut model = FakeModel::constant();
        model.trainable = false;
        let mut ctx = TrainingContext::new(model, Some(0));

        let err = run(&mut ctx, &dataset(4), &RunPlan::training(1, 2, 1)).unwrap_err();
        assert!(matches!(err, TrainError::InvalidInput(_)));
        assert!(ctx.model().batches.is_empty());
    }

    #[test]
    fn test_capability_failure_propagates_without_retry() {
        let mut model = FakeModel::constant();
        model.fail_at = Some(1);
        let mut ctx = TrainingContext::new(model, Some(0));

        let err = run(&mut ctx, &dataset(6), &RunPlan::training(1, 2, 1)).unwrap_err();
        match err {
            TrainError::ComputationFailure(cause) => assert_eq!(cause.to_string(), "device lost"),
            other => panic!("unexpected error: {other:?}"),
        }
        // First batch ran and updated; the failing batch was attempted once
        assert_eq!(ctx.model().batches.len(), 1);
        assert_eq!(ctx.model().updates, 1);
    }
}
