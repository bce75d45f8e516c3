//! Simulator driver: wraps a machine with pacing, pause/resume and batch
//! testing. The engine stays synchronous; the host's timer calls
//! [`Simulator::tick`] at [`Simulator::interval`] during auto-run.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::core::machine::Machine;
use crate::core::sim::{TraceEntry, Verdict};
use crate::errors::SerializationError;

/// Auto-run ticks never fire faster than this.
pub const MIN_INTERVAL_MS: u64 = 50;

/// Maps a speed setting in `1..=10` to the auto-run tick interval,
/// ≈ (1000 − 90·speed) ms floored at [`MIN_INTERVAL_MS`].
#[must_use]
pub fn interval_for_speed(speed: u8) -> Duration {
    let speed = u64::from(speed.clamp(1, 10));
    Duration::from_millis((1000 - 90 * speed).max(MIN_INTERVAL_MS))
}

/// Result of a single batch test case.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub input: String,
    pub accepted: bool,
    pub trace: Vec<TraceEntry>,
}

type Callback = Box<dyn FnMut(&Machine)>;

/// Owns a machine and drives its simulation lifecycle.
pub struct Simulator {
    machine: Machine,
    speed: u8,
    paused: bool,
    on_step_complete: Option<Callback>,
    on_simulation_complete: Option<Callback>,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("machine", &self.machine.kind())
            .field("speed", &self.speed)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Wraps `machine` with the default speed setting.
    #[must_use]
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            speed: 5,
            paused: false,
            on_step_complete: None,
            on_simulation_complete: None,
        }
    }

    /// The wrapped machine.
    #[must_use]
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Mutable access for the editor.
    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Unwraps the machine.
    #[must_use]
    pub fn into_machine(self) -> Machine {
        self.machine
    }

    /// Registers a callback fired after every step.
    pub fn on_step_complete(&mut self, callback: impl FnMut(&Machine) + 'static) {
        self.on_step_complete = Some(Box::new(callback));
    }

    /// Registers a callback fired when a run terminates.
    pub fn on_simulation_complete(&mut self, callback: impl FnMut(&Machine) + 'static) {
        self.on_simulation_complete = Some(Box::new(callback));
    }

    /// Sets the auto-run speed, clamped to `1..=10`.
    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.clamp(1, 10);
    }

    /// The current speed setting.
    #[must_use]
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// The tick interval the host timer should use for auto-run.
    #[must_use]
    pub fn interval(&self) -> Duration {
        interval_for_speed(self.speed)
    }

    /// Prepares a run over `input`.
    pub fn init(&mut self, input: &str) {
        self.paused = false;
        self.machine.init_simulation(input);
    }

    /// Advances one step and fires the lifecycle callbacks.
    pub fn step(&mut self) {
        let was_decided = self.machine.sim.verdict != Verdict::Undecided;
        self.machine.step();
        if let Some(callback) = &mut self.on_step_complete {
            callback(&self.machine);
        }
        if !was_decided && self.machine.sim.verdict != Verdict::Undecided {
            self.machine.sim.running = false;
            if let Some(callback) = &mut self.on_simulation_complete {
                callback(&self.machine);
            }
        }
    }

    /// Arms auto-run; the host then calls [`Simulator::tick`] every
    /// [`Simulator::interval`].
    pub fn run(&mut self) {
        self.paused = false;
        self.machine.sim.running = true;
    }

    /// One auto-run pulse. Consults the pause flag for cooperative
    /// cancellation and returns whether the run is still undecided.
    pub fn tick(&mut self) -> bool {
        if self.paused || !self.machine.sim.running {
            return self.machine.sim.verdict == Verdict::Undecided;
        }
        self.step();
        self.machine.sim.verdict == Verdict::Undecided
    }

    /// Drives the run synchronously to completion with the default budget.
    pub fn run_to_completion(&mut self) {
        self.paused = false;
        let budget = self.machine.kind().step_budget();
        let mut steps = 0usize;
        self.machine.sim.running = true;
        while self.machine.sim.verdict == Verdict::Undecided && steps < budget {
            self.step();
            steps += 1;
        }
        if self.machine.sim.verdict == Verdict::Undecided {
            // Budget exhausted without a verdict.
            self.machine.reject_budget_exhausted(budget);
            if let Some(callback) = &mut self.on_simulation_complete {
                callback(&self.machine);
            }
        }
        self.machine.sim.running = false;
    }

    /// Suspends auto-run between ticks.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes a paused auto-run.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether auto-run is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stops the run, leaving the post-step state inspectable.
    pub fn stop(&mut self) {
        self.paused = false;
        self.machine.sim.running = false;
    }

    /// Discards the run state entirely.
    pub fn reset(&mut self) {
        self.paused = false;
        self.machine.reset_simulation();
    }

    /// Tests `input` on a serialized-then-deserialized working copy; the
    /// live model is untouched.
    pub fn test_string(&self, input: &str) -> Result<TestOutcome, SerializationError> {
        let mut copy = Machine::from_structured(&self.machine.to_structured())?;
        let accepted = copy.accepts(input);
        debug!(input, accepted, "test string finished");
        Ok(TestOutcome {
            input: input.to_string(),
            accepted,
            trace: copy.sim.trace,
        })
    }

    /// Runs a batch of test inputs sequentially, each on a fresh working
    /// copy so no state leaks across cases.
    pub fn run_batch_tests<I, S>(&self, inputs: I) -> Result<Vec<TestOutcome>, SerializationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for input in inputs {
            outcomes.push(self.test_string(input.as_ref())?);
        }
        Ok(outcomes)
    }
}
