//! Learning-rate schedules evaluated once per epoch.

use crate::error::{Result, TrainError};

/// Maps a 0-based epoch index to the learning rate used during that epoch.
pub trait LearningRateSchedule: Send {
    fn learning_rate(&self, epoch: usize) -> f64;
}

impl<F> LearningRateSchedule for F
where
    F: Fn(usize) -> f64 + Send,
{
    fn learning_rate(&self, epoch: usize) -> f64 {
        self(epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl LearningRateSchedule for Constant {
    fn learning_rate(&self, _epoch: usize) -> f64 {
        self.0
    }
}

/// Multiplies the initial rate by `drop` every `epochs_drop` epochs:
///
/// `rate(e) = initial_learning_rate * drop ^ floor((1 + e) / epochs_drop)`
///
/// The `+ 1` makes the first drop land after `epochs_drop` epochs have
/// completed, so with `epochs_drop = 10` epoch 9 is the first reduced one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecay {
    initial_learning_rate: f64,
    drop: f64,
    epochs_drop: f64,
}

impl StepDecay {
    pub fn new(initial_learning_rate: f64, drop: f64, epochs_drop: f64) -> Result<Self> {
        if !initial_learning_rate.is_finite() || initial_learning_rate <= 0.0 {
            return Err(TrainError::invalid(
                "initial_learning_rate",
                format!("must be a positive finite number, got {initial_learning_rate}"),
            ));
        }
        if !drop.is_finite() || drop <= 0.0 || drop > 1.0 {
            return Err(TrainError::invalid(
                "learning_rate_drop",
                format!("must lie in (0, 1], got {drop}"),
            ));
        }
        if !epochs_drop.is_finite() || epochs_drop <= 0.0 {
            return Err(TrainError::invalid(
                "epochs_drop",
                format!("must be a positive finite number, got {epochs_drop}"),
            ));
        }

        Ok(Self {
            initial_learning_rate,
            drop,
            epochs_drop,
        })
    }

    /// Number of drops applied by the time `epoch` runs.
    pub fn drops_at(&self, epoch: usize) -> f64 {
        ((epoch as f64 + 1.0) / self.epochs_drop).floor()
    }
}

impl LearningRateSchedule for StepDecay {
    fn learning_rate(&self, epoch: usize) -> f64 {
        self.initial_learning_rate * self.drop.powf(self.drops_at(epoch))
    }
}

/// Validates the parameters and evaluates the step-decay rate for `epoch`.
pub fn step_decay(
    epoch: usize,
    initial_learning_rate: f64,
    drop: f64,
    epochs_drop: f64,
) -> Result<f64> {
    StepDecay::new(initial_learning_rate, drop, epochs_drop).map(|s| s.learning_rate(epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn halves_every_ten_epochs() {
        let s = StepDecay::new(0.01, 0.5, 10.0).unwrap();
        assert!(close(s.learning_rate(0), 0.01));
        assert!(close(s.learning_rate(8), 0.01));
        assert!(close(s.learning_rate(9), 0.005));
        assert!(close(s.learning_rate(19), 0.005));
        assert!(close(s.learning_rate(20), 0.0025));
    }

    #[test]
    fn drop_of_one_is_constant() {
        let s = StepDecay::new(0.3, 1.0, 2.0).unwrap();
        for epoch in 0..100 {
            assert_eq!(s.learning_rate(epoch), 0.3);
        }
    }

    #[test]
    fn fractional_interval() {
        // floor((1 + e) / 2.5): 0, 0, 1, 1, 2
        let s = StepDecay::new(1.0, 0.1, 2.5).unwrap();
        let rates: Vec<f64> = (0..5).map(|e| s.learning_rate(e)).collect();
        let expected = [1.0, 1.0, 0.1, 0.1, 0.01];
        for (got, want) in rates.iter().zip(expected) {
            assert!(close(*got, want), "{got} != {want}");
        }
    }

    #[test]
    fn interval_of_one_drops_on_first_epoch() {
        let s = StepDecay::new(1.0, 0.5, 1.0).unwrap();
        assert!(close(s.learning_rate(0), 0.5));
    }

    #[test]
    fn last_epoch_index_does_not_overflow() {
        let s = StepDecay::new(0.01, 0.5, 10.0).unwrap();
        let last = s.learning_rate(usize::MAX);
        assert!(last <= s.learning_rate(usize::MAX - 1));
        assert!(last < s.initial_learning_rate);

        let flat = StepDecay::new(0.01, 1.0, 10.0).unwrap();
        assert_eq!(flat.learning_rate(usize::MAX), 0.01);
    }

    #[test]
    fn rejects_out_of_domain_parameters() {
        let cases = [
            (0.0, 0.5, 10.0, "initial_learning_rate"),
            (-1.0, 0.5, 10.0, "initial_learning_rate"),
            (f64::NAN, 0.5, 10.0, "initial_learning_rate"),
            (0.01, 0.0, 10.0, "learning_rate_drop"),
            (0.01, 1.5, 10.0, "learning_rate_drop"),
            (0.01, 0.5, 0.0, "epochs_drop"),
            (0.01, 0.5, -3.0, "epochs_drop"),
            (0.01, 0.5, f64::INFINITY, "epochs_drop"),
        ];
        for (initial, drop, epochs_drop, param) in cases {
            match step_decay(0, initial, drop, epochs_drop) {
                Err(TrainError::InvalidParameter { name, .. }) => assert_eq!(name, param),
                other => panic!("expected InvalidParameter for {param}, got {other:?}"),
            }
        }
    }

    #[test]
    fn closures_are_schedules() {
        let s = |epoch: usize| 1.0 / (epoch + 1) as f64;
        assert_eq!(s.learning_rate(3), 0.25);
        assert_eq!(Constant(0.1).learning_rate(42), 0.1);
    }
}
