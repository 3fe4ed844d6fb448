//! Thruster PWM conversion and the command set emitted every tick.

/// Neutral PWM pulse width for a thruster ESC
pub const PWM_CENTER: u16 = 1500;

/// Maximum deviation from [`PWM_CENTER`] in either direction
pub const PWM_RANGE: u16 = 130;

/// Lowest PWM value a thruster can be commanded to
pub const PWM_MIN: u16 = PWM_CENTER - PWM_RANGE;

/// Highest PWM value a thruster can be commanded to
pub const PWM_MAX: u16 = PWM_CENTER + PWM_RANGE;

/// Maps a normalized axis value onto the thruster PWM range.
///
/// Values outside [-1, 1] are clamped first, so the result always lies in
/// [`PWM_MIN`, `PWM_MAX`]. NaN is treated as neutral.
pub fn pwm(value: f64) -> u16 {
    if value.is_nan() {
        return PWM_CENTER;
    }
    let clamped = value.clamp(-1.0, 1.0);
    (f64::from(PWM_CENTER) + clamped * f64::from(PWM_RANGE)).round() as u16
}

/// The five thruster commands produced by one mapping tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrusterCommandSet {
    pub t1: u16,
    pub t2: u16,
    pub t3: u16,
    pub t4: u16,
    pub t5: u16,
}

impl Default for ThrusterCommandSet {
    fn default() -> Self {
        Self {
            t1: PWM_CENTER,
            t2: PWM_CENTER,
            t3: PWM_CENTER,
            t4: PWM_CENTER,
            t5: PWM_CENTER,
        }
    }
}

impl ThrusterCommandSet {
    /// Horizontal emission group, in the order the actuator driver expects
    pub fn horizontal(&self) -> [u16; 3] {
        [self.t4, self.t1, self.t2]
    }

    /// Vertical emission group, in the order the actuator driver expects
    pub fn vertical(&self) -> [u16; 2] {
        [self.t5, self.t3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_axis_maps_to_center() {
        assert_eq!(pwm(0.0), 1500);
        assert_eq!(pwm(-0.0), 1500);
    }

    #[test]
    fn full_deflection_hits_range_limits() {
        assert_eq!(pwm(1.0), 1630);
        assert_eq!(pwm(-1.0), 1370);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(pwm(2.0), PWM_MAX);
        assert_eq!(pwm(-7.5), PWM_MIN);
        assert_eq!(pwm(f64::INFINITY), PWM_MAX);
        assert_eq!(pwm(f64::NEG_INFINITY), PWM_MIN);
        assert_eq!(pwm(f64::NAN), PWM_CENTER);
    }

    #[test]
    fn pwm_is_bounded_and_monotonic_across_the_axis() {
        let mut previous = pwm(-1.0);
        for step in 0..=2000 {
            let value = -1.0 + f64::from(step) * 0.001;
            let current = pwm(value);
            assert!((PWM_MIN..=PWM_MAX).contains(&current), "{value} -> {current}");
            assert!(current >= previous, "pwm decreased at {value}");
            previous = current;
        }
    }

    #[test]
    fn rounds_to_nearest_pulse_width() {
        // 1500 + 0.5 * 130 = 1565
        assert_eq!(pwm(0.5), 1565);
        // 1500 + 0.01 * 130 = 1501.3
        assert_eq!(pwm(0.01), 1501);
        // 1500 - 0.3 * 130 = 1461
        assert_eq!(pwm(-0.3), 1461);
    }

    #[test]
    fn emission_groups_follow_driver_order() {
        let set = ThrusterCommandSet {
            t1: 1401,
            t2: 1402,
            t3: 1403,
            t4: 1404,
            t5: 1405,
        };
        assert_eq!(set.horizontal(), [1404, 1401, 1402]);
        assert_eq!(set.vertical(), [1405, 1403]);
    }
}
