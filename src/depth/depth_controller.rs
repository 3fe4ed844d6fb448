//! Depth-hold PID computation.
//!
//! One call to [`compute_tick`] is one sample period. The caller owns the
//! [`PidState`] and threads it from tick to tick.

use super::error_window::ErrorWindow;

/// Sample period the derivative and integral terms assume, in seconds
pub const SAMPLING_TIME: f64 = 0.1;

pub const KP: f64 = 0.5;
pub const KI: f64 = 0.08;
pub const KD: f64 = 0.5;

/// Bound applied to the windowed integral sum
pub const INTEGRAL_LIMIT: f64 = 10.0;

/// Controller output magnitude that maps onto the ends of [-1, 1]
pub const SENSITIVITY: f64 = 1.0;

/// Distance from the setpoint that counts as holding depth, in meters
pub const DEPTH_THRESHOLD_ABS: f64 = 0.05;

/// Whether the vehicle is still moving toward its setpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthMode {
    Seeking,
    Holding,
}

/// PID memory carried between ticks
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PidState {
    previous_error: f64,
    history: ErrorWindow,
    integral_sum: f64,
}

impl PidState {
    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Integrated error samples, most recent first
    pub fn history(&self) -> &ErrorWindow {
        &self.history
    }

    /// Windowed integral as of the last tick, already clamped
    pub fn integral_sum(&self) -> f64 {
        self.integral_sum
    }
}

/// Everything one tick computed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthCorrection {
    pub error: f64,
    pub derivative: f64,
    pub integral_sum: f64,
    /// Weighted PID sum before normalization
    pub output: f64,
    /// Correction signal published downstream
    pub normalized_output: f64,
    pub reached_target: bool,
}

impl DepthCorrection {
    pub fn mode(&self) -> DepthMode {
        if self.reached_target {
            DepthMode::Holding
        } else {
            DepthMode::Seeking
        }
    }
}

/// Rescales a controller output from [-SENSITIVITY, SENSITIVITY] to [-1, 1].
///
/// Outputs beyond the sensitivity band are not clamped and land outside [-1, 1].
pub fn normalize(output: f64) -> f64 {
    ((output + SENSITIVITY) / (2.0 * SENSITIVITY)) * 2.0 - 1.0
}

/// Runs one PID step for the given setpoint and measured depth.
pub fn compute_tick(
    setpoint: f64,
    measured_depth: f64,
    mut state: PidState,
) -> (DepthCorrection, PidState) {
    let error = setpoint - measured_depth;
    let derivative = (error - state.previous_error) / SAMPLING_TIME;

    state.history.push(error * SAMPLING_TIME);
    let integral_sum = state.history.sum().clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);

    let output = KP * error + KI * integral_sum + KD * derivative;
    // TODO: confirm whether the published correction should be clamped to [-1, 1].
    let normalized_output = normalize(output);

    state.previous_error = error;
    state.integral_sum = integral_sum;

    let correction = DepthCorrection {
        error,
        derivative,
        integral_sum,
        output,
        normalized_output,
        reached_target: (setpoint - measured_depth).abs() <= DEPTH_THRESHOLD_ABS,
    };
    (correction, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::error_window::HISTORY_CAPACITY;

    const EPS: f64 = 1e-9;

    fn run(setpoint: f64, measurements: &[f64], state: PidState) -> (DepthCorrection, PidState) {
        let mut state = state;
        let mut last = None;
        for &depth in measurements {
            let (correction, next) = compute_tick(setpoint, depth, state);
            state = next;
            last = Some(correction);
        }
        (last.expect("at least one measurement"), state)
    }

    #[test]
    fn first_step_uses_zero_previous_error() {
        let (correction, state) = compute_tick(2.0, 0.0, PidState::default());

        assert_eq!(correction.error, 2.0);
        assert!((correction.derivative - 20.0).abs() < EPS);
        assert!((correction.integral_sum - 0.2).abs() < EPS);
        // 0.5 * 2 + 0.08 * 0.2 + 0.5 * 20
        assert!((correction.output - 11.016).abs() < EPS);
        assert!((correction.normalized_output - 11.016).abs() < EPS);
        assert!(!correction.reached_target);
        assert_eq!(correction.mode(), DepthMode::Seeking);

        assert_eq!(state.previous_error(), 2.0);
        assert!((state.history().latest() - 0.2).abs() < EPS);
    }

    #[test]
    fn settles_to_midpoint_when_holding_setpoint() {
        let mut measurements = vec![0.0; 5];
        measurements.extend(std::iter::repeat(2.0).take(HISTORY_CAPACITY));
        let (correction, state) = run(2.0, &measurements, PidState::default());

        assert_eq!(correction.integral_sum, 0.0);
        assert_eq!(correction.derivative, 0.0);
        assert_eq!(correction.normalized_output, 0.0);
        assert!(correction.reached_target);
        assert_eq!(correction.mode(), DepthMode::Holding);
        assert_eq!(state.integral_sum(), 0.0);
    }

    #[test]
    fn integral_matches_a_plain_list_window_exactly() {
        let setpoint = 1.5;
        let mut state = PidState::default();
        let mut history = vec![0.0; HISTORY_CAPACITY];

        for tick in 0..1000 {
            let depth = ((tick * 53) % 97) as f64 * 0.031;
            let (correction, next) = compute_tick(setpoint, depth, state);
            state = next;

            let error = setpoint - depth;
            history.insert(0, error * SAMPLING_TIME);
            history.truncate(HISTORY_CAPACITY);
            let expected = history
                .iter()
                .fold(0.0, |acc, s| acc + s)
                .clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);

            assert_eq!(correction.integral_sum, expected, "tick {tick}");
        }
    }

    #[test]
    fn constant_measurement_from_start_is_exactly_neutral() {
        let (correction, _) = run(2.0, &[2.0; 150], PidState::default());
        assert_eq!(correction.integral_sum, 0.0);
        assert_eq!(correction.derivative, 0.0);
        assert_eq!(correction.normalized_output, 0.0);
        assert!(correction.reached_target);
    }

    #[test]
    fn integral_is_clamped_under_sustained_error() {
        let mut state = PidState::default();
        for _ in 0..500 {
            let (correction, next) = compute_tick(100.0, 0.0, state);
            assert!(correction.integral_sum <= INTEGRAL_LIMIT);
            assert!(correction.integral_sum >= -INTEGRAL_LIMIT);
            state = next;
        }
        assert_eq!(state.integral_sum(), INTEGRAL_LIMIT);

        let mut state = PidState::default();
        for _ in 0..500 {
            let (correction, next) = compute_tick(0.0, 100.0, state);
            assert!(correction.integral_sum >= -INTEGRAL_LIMIT);
            state = next;
        }
        assert_eq!(state.integral_sum(), -INTEGRAL_LIMIT);
    }

    #[test]
    fn history_never_grows_past_capacity() {
        let mut state = PidState::default();
        for tick in 0..(HISTORY_CAPACITY * 3 + 7) {
            let (_, next) = compute_tick(1.0, tick as f64 * 0.01, state);
            state = next;
            assert_eq!(state.history().iter().count(), HISTORY_CAPACITY);
        }
    }

    #[test]
    fn target_threshold_is_inclusive() {
        let (correction, _) = compute_tick(0.05, 0.0, PidState::default());
        assert!(correction.reached_target);

        let (correction, _) = compute_tick(2.0, 1.96, PidState::default());
        assert!(correction.reached_target);

        let (correction, _) = compute_tick(2.0, 1.9, PidState::default());
        assert!(!correction.reached_target);

        let (correction, _) = compute_tick(2.0, 2.1, PidState::default());
        assert!(!correction.reached_target);
    }

    #[test]
    fn normalization_is_linear_and_unclamped() {
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(SENSITIVITY), 1.0);
        assert_eq!(normalize(-SENSITIVITY), -1.0);
        assert!((normalize(0.25) - 0.25).abs() < EPS);
        assert!((normalize(3.0) - 3.0).abs() < EPS);
        assert!((normalize(-4.5) + 4.5).abs() < EPS);
    }

    #[test]
    fn identical_inputs_and_state_are_deterministic() {
        let (_, warmed) = run(3.0, &[0.0, 0.4, 1.1, 1.9, 2.6], PidState::default());

        let first = compute_tick(3.0, 2.8, warmed.clone());
        let second = compute_tick(3.0, 2.8, warmed);
        assert_eq!(first, second);
    }
}
