/// Fixed time-step accumulator.
///
/// Real elapsed time is added with [`Timer::accumulate`]; every call to
/// [`Timer::consume_step`] removes one fixed step while enough time is left.
/// The leftover fraction is the interpolation factor between the last two
/// simulated states.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    time_step: f32,
    accumulator: f32,
    /// Total simulated time, in seconds
    simulated_time: f64,
    nb_steps: u64,
}

impl Timer {
    pub fn new(time_step: f32) -> Self {
        Self {
            time_step,
            accumulator: 0.0,
            simulated_time: 0.0,
            nb_steps: 0,
        }
    }

    pub fn get_time_step(&self) -> f32 {
        self.time_step
    }

    pub fn set_time_step(&mut self, time_step: f32) {
        self.time_step = time_step;
    }

    /// Adds elapsed real time. Negative or non-finite values are ignored.
    pub fn accumulate(&mut self, elapsed: f32) {
        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed;
        }
    }

    /// Returns true if at least one full step of time is accumulated
    pub fn is_possible_to_take_step(&self) -> bool {
        self.accumulator >= self.time_step
    }

    /// Removes one fixed step from the accumulator
    pub fn consume_step(&mut self) {
        self.accumulator -= self.time_step;
        self.simulated_time += self.time_step as f64;
        self.nb_steps += 1;
    }

    /// Records a step taken outside the accumulator
    pub(crate) fn record_step(&mut self) {
        self.simulated_time += self.time_step as f64;
        self.nb_steps += 1;
    }

    /// Drops accumulated time that could not be simulated
    pub fn discard_backlog(&mut self) {
        self.accumulator %= self.time_step;
    }

    /// Fraction of a step left in the accumulator, in [0, 1)
    pub fn interpolation_factor(&self) -> f32 {
        (self.accumulator / self.time_step).clamp(0.0, 1.0)
    }

    pub fn get_simulated_time(&self) -> f64 {
        self.simulated_time
    }

    pub fn get_nb_steps(&self) -> u64 {
        self.nb_steps
    }
}
