use std::collections::BTreeSet;

use crate::core::state::StateId;
use crate::core::tape::Tape;

/// Tri-valued outcome of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Undecided,
    Accepted,
    Rejected,
}

/// One concurrent pushdown configuration: control state, stack (top at the
/// right end) and how much of the input has been consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct PdaConfiguration {
    pub state: StateId,
    pub stack: Vec<char>,
    pub input_index: usize,
}

impl PdaConfiguration {
    /// Renders the stack top-first for traces and the UI.
    #[must_use]
    pub fn stack_display(&self) -> String {
        self.stack.iter().rev().collect()
    }
}

/// The single Turing-machine configuration: control state, tape and head.
#[derive(Debug, Clone, PartialEq)]
pub struct TmConfiguration {
    pub state: StateId,
    pub tape: Tape,
    pub head: i64,
}

/// The set of active configurations of a run, shaped per machine type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveConfigs {
    /// No simulation has been initialized.
    #[default]
    Idle,
    /// DFA (singleton) or NFA (ε-closed set) active states.
    Finite(BTreeSet<StateId>),
    /// Concurrent PDA configurations, in exploration order.
    Pushdown(Vec<PdaConfiguration>),
    /// The TM configuration; `None` once the machine has died.
    Tape(Option<TmConfiguration>),
}

impl ActiveConfigs {
    /// Whether no configuration is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Idle => true,
            Self::Finite(set) => set.is_empty(),
            Self::Pushdown(configs) => configs.is_empty(),
            Self::Tape(config) => config.is_none(),
        }
    }

    /// Ids of the states occupied by live configurations.
    #[must_use]
    pub fn state_ids(&self) -> Vec<StateId> {
        match self {
            Self::Idle => Vec::new(),
            Self::Finite(set) => set.iter().copied().collect(),
            Self::Pushdown(configs) => {
                let mut ids: Vec<StateId> = configs.iter().map(|c| c.state).collect();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
            Self::Tape(config) => config.iter().map(|c| c.state).collect(),
        }
    }
}

/// One record in the step-by-step trace shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// Step index; 0 is the initial configuration.
    pub step: usize,
    /// Display names of the active states.
    pub states: String,
    /// Input not yet consumed.
    pub remaining_input: String,
    /// The symbol under consideration, if any.
    pub current_symbol: Option<char>,
    /// Human-readable description of what happened.
    pub description: String,
    /// Stack snapshot (PDA), top-first.
    pub stack: Option<String>,
    /// Tape window snapshot (TM).
    pub tape: Option<String>,
    /// Head logical position (TM).
    pub head: Option<i64>,
}

impl TraceEntry {
    /// Creates a trace entry without stack or tape snapshots.
    #[must_use]
    pub fn new(
        step: usize,
        states: impl Into<String>,
        remaining_input: impl Into<String>,
        current_symbol: Option<char>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            step,
            states: states.into(),
            remaining_input: remaining_input.into(),
            current_symbol,
            description: description.into(),
            stack: None,
            tape: None,
            head: None,
        }
    }

    /// Attaches a stack snapshot.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attaches a tape snapshot and head position.
    #[must_use]
    pub fn with_tape(mut self, tape: impl Into<String>, head: i64) -> Self {
        self.tape = Some(tape.into());
        self.head = Some(head);
        self
    }
}

/// Per-run mutable simulation state, owned by the machine.
#[derive(Debug, Clone, Default)]
pub struct SimState {
    /// The input string, one symbol per element.
    pub input: Vec<char>,
    /// Cursor into `input`. For PDAs this mirrors the first configuration.
    pub cursor: usize,
    /// Live configurations.
    pub active: ActiveConfigs,
    /// Ordered step records.
    pub trace: Vec<TraceEntry>,
    /// Acceptance verdict.
    pub verdict: Verdict,
    /// Distinguishes paused-but-mid-run from finished.
    pub running: bool,
    /// (state, head, tape) signatures consumed by the TM loop heuristic.
    pub(crate) tm_seen: Vec<(StateId, i64, String)>,
}

impl SimState {
    /// Clears all run state back to idle.
    pub fn reset(&mut self) {
        self.input.clear();
        self.cursor = 0;
        self.active = ActiveConfigs::Idle;
        self.trace.clear();
        self.verdict = Verdict::Undecided;
        self.running = false;
        self.tm_seen.clear();
    }

    /// The input not yet consumed by the cursor.
    #[must_use]
    pub fn remaining_input(&self) -> String {
        self.input[self.cursor.min(self.input.len())..].iter().collect()
    }

    /// The symbol under the cursor, if any remains.
    #[must_use]
    pub fn current_symbol(&self) -> Option<char> {
        self.input.get(self.cursor).copied()
    }
}
