use std::collections::{BTreeSet, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::debug;

use crate::core::history::History;
use crate::core::sim::{ActiveConfigs, SimState, Verdict};
use crate::core::state::{State, StateId};
use crate::core::transition::{Label, Transition, TransitionId};
use crate::core::{dfa, nfa, pda, tm};

/// Default step budget for finite automata runs.
pub const FA_STEP_BUDGET: usize = 10_000;
/// Default step budget for PDA runs.
pub const PDA_STEP_BUDGET: usize = 1_000;
/// Default step budget for TM runs.
pub const TM_STEP_BUDGET: usize = 10_000;

/// The four supported machine models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineKind {
    Dfa,
    Nfa,
    Pda,
    Tm,
}

impl MachineKind {
    /// Serialization tag for this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Dfa => "dfa",
            Self::Nfa => "nfa",
            Self::Pda => "pda",
            Self::Tm => "tm",
        }
    }

    /// Parses a serialization tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "dfa" => Some(Self::Dfa),
            "nfa" => Some(Self::Nfa),
            "pda" => Some(Self::Pda),
            "tm" => Some(Self::Tm),
            _ => None,
        }
    }

    /// Default `run` bound for this kind.
    #[must_use]
    pub fn step_budget(self) -> usize {
        match self {
            Self::Dfa | Self::Nfa => FA_STEP_BUDGET,
            Self::Pda => PDA_STEP_BUDGET,
            Self::Tm => TM_STEP_BUDGET,
        }
    }
}

/// PDA acceptance configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdaOptions {
    /// Symbol the stack is initialized with.
    pub initial_stack_symbol: char,
    /// Accept when a finished configuration sits in a final state.
    pub accept_by_final_state: bool,
    /// Accept when a finished configuration has emptied its stack.
    pub accept_by_empty_stack: bool,
}

impl Default for PdaOptions {
    fn default() -> Self {
        Self {
            initial_stack_symbol: 'Z',
            accept_by_final_state: true,
            accept_by_empty_stack: false,
        }
    }
}

/// TM tape configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmOptions {
    /// The blank symbol filling unwritten cells.
    pub blank: char,
}

impl Default for TmOptions {
    fn default() -> Self {
        Self { blank: '□' }
    }
}

/// Per-kind payload of a machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Dfa,
    Nfa,
    Pda(PdaOptions),
    Tm(TmOptions),
}

impl Variant {
    #[must_use]
    fn kind(&self) -> MachineKind {
        match self {
            Self::Dfa => MachineKind::Dfa,
            Self::Nfa => MachineKind::Nfa,
            Self::Pda(_) => MachineKind::Pda,
            Self::Tm(_) => MachineKind::Tm,
        }
    }
}

/// Outcome of [`Machine::validate`]. Errors make simulation meaningless;
/// warnings flag suspicious but well-formed models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Whether the model carries no errors (warnings are permitted).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// An automaton: a transition graph, a derived alphabet, per-kind options
/// and the mutable state of the current simulation run.
///
/// The machine exclusively owns its states and transitions; transitions
/// refer to states by id and every mutation maintains the invariants that
/// endpoints are live and at most one state is initial.
#[derive(Debug, Clone)]
pub struct Machine {
    variant: Variant,
    pub(crate) states: IndexMap<StateId, State>,
    pub(crate) transitions: IndexMap<TransitionId, Transition>,
    pub(crate) alphabet: BTreeSet<char>,
    pub(crate) initial: Option<StateId>,
    next_state_id: StateId,
    next_transition_id: TransitionId,
    /// State of the current run. Read-only for callers.
    pub sim: SimState,
    history: History,
}

impl Machine {
    /// Creates an empty machine of the given kind with default options.
    #[must_use]
    pub fn new(kind: MachineKind) -> Self {
        let variant = match kind {
            MachineKind::Dfa => Variant::Dfa,
            MachineKind::Nfa => Variant::Nfa,
            MachineKind::Pda => Variant::Pda(PdaOptions::default()),
            MachineKind::Tm => Variant::Tm(TmOptions::default()),
        };
        Self {
            variant,
            states: IndexMap::new(),
            transitions: IndexMap::new(),
            alphabet: BTreeSet::new(),
            initial: None,
            next_state_id: 0,
            next_transition_id: 0,
            sim: SimState::default(),
            history: History::default(),
        }
    }

    /// Creates an empty DFA.
    #[must_use]
    pub fn dfa() -> Self {
        Self::new(MachineKind::Dfa)
    }

    /// Creates an empty NFA.
    #[must_use]
    pub fn nfa() -> Self {
        Self::new(MachineKind::Nfa)
    }

    /// Creates an empty PDA.
    #[must_use]
    pub fn pda() -> Self {
        Self::new(MachineKind::Pda)
    }

    /// Creates an empty TM.
    #[must_use]
    pub fn tm() -> Self {
        Self::new(MachineKind::Tm)
    }

    /// The kind tag of this machine.
    #[must_use]
    pub fn kind(&self) -> MachineKind {
        self.variant.kind()
    }

    /// PDA options, when this machine is a PDA.
    #[must_use]
    pub fn pda_options(&self) -> Option<&PdaOptions> {
        match &self.variant {
            Variant::Pda(options) => Some(options),
            _ => None,
        }
    }

    /// Mutable PDA options for the editor.
    pub fn pda_options_mut(&mut self) -> Option<&mut PdaOptions> {
        match &mut self.variant {
            Variant::Pda(options) => Some(options),
            _ => None,
        }
    }

    /// TM options, when this machine is a TM.
    #[must_use]
    pub fn tm_options(&self) -> Option<&TmOptions> {
        match &self.variant {
            Variant::Tm(options) => Some(options),
            _ => None,
        }
    }

    /// Mutable TM options for the editor.
    pub fn tm_options_mut(&mut self) -> Option<&mut TmOptions> {
        match &mut self.variant {
            Variant::Tm(options) => Some(options),
            _ => None,
        }
    }

    /// Replaces the per-kind payload. Used by loaders and converters.
    pub(crate) fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All states, in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// All transitions, in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    /// Looks up a state by id.
    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    /// Looks up a transition by id.
    #[must_use]
    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(&id)
    }

    /// Number of states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Transitions leaving `state`, in insertion order.
    pub fn transitions_from(&self, state: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.values().filter(move |t| t.from == state)
    }

    /// Transitions entering `state`, in insertion order.
    pub fn transitions_to(&self, state: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.values().filter(move |t| t.to == state)
    }

    /// Transitions from `from` to `to`, in insertion order.
    pub fn transitions_between(
        &self,
        from: StateId,
        to: StateId,
    ) -> impl Iterator<Item = &Transition> {
        self.transitions
            .values()
            .filter(move |t| t.from == from && t.to == to)
    }

    /// All accepting states.
    #[must_use]
    pub fn final_states(&self) -> Vec<&State> {
        self.states.values().filter(|s| s.is_final).collect()
    }

    /// Id of the initial state, if one is set.
    #[must_use]
    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    /// The initial state, if one is set.
    #[must_use]
    pub fn initial_state(&self) -> Option<&State> {
        self.initial.and_then(|id| self.states.get(&id))
    }

    /// The derived input alphabet: the union of non-ε input symbols across
    /// all transitions, in sorted order.
    #[must_use]
    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    /// Display name of a state, or `"?"` for an unknown id.
    #[must_use]
    pub fn state_name(&self, id: StateId) -> &str {
        self.states.get(&id).map_or("?", |s| s.name.as_str())
    }

    /// Comma-joined display names for a set of state ids.
    #[must_use]
    pub fn state_names(&self, ids: &[StateId]) -> String {
        let names: Vec<&str> = ids.iter().map(|&id| self.state_name(id)).collect();
        names.join(", ")
    }

    // ------------------------------------------------------------------
    // Mutations (history-recording)
    // ------------------------------------------------------------------

    /// Appends a state and returns its issued id.
    ///
    /// The first state added becomes initial; a state added with
    /// `is_initial` set displaces the previous initial state.
    pub fn add_state(&mut self, mut state: State) -> StateId {
        self.push_history();
        let id = self.next_state_id;
        self.next_state_id += 1;
        state.id = id;
        if self.states.is_empty() {
            state.is_initial = true;
        }
        if state.is_initial {
            self.clear_initial_flag();
            self.initial = Some(id);
        }
        self.states.insert(id, state);
        id
    }

    /// Removes a state and every transition incident to it. Removing the
    /// initial state promotes the first remaining state, if any. Unknown
    /// ids are a no-op.
    pub fn remove_state(&mut self, id: StateId) {
        if !self.states.contains_key(&id) {
            return;
        }
        self.push_history();
        self.states.shift_remove(&id);
        self.transitions.retain(|_, t| t.from != id && t.to != id);
        if self.initial == Some(id) {
            self.initial = None;
            if let Some(first) = self.states.values_mut().next() {
                first.is_initial = true;
                self.initial = Some(first.id);
            }
        }
    }

    /// Appends a transition, updating the derived alphabet. Returns `None`
    /// (and leaves the machine untouched) when an endpoint is missing or
    /// the label shape does not match the machine kind.
    pub fn add_transition(&mut self, mut transition: Transition) -> Option<TransitionId> {
        if !self.states.contains_key(&transition.from)
            || !self.states.contains_key(&transition.to)
            || !self.label_fits(&transition.label)
        {
            return None;
        }
        self.push_history();
        let id = self.next_transition_id;
        self.next_transition_id += 1;
        transition.id = id;
        self.absorb_label(&transition.label);
        self.transitions.insert(id, transition);
        Some(id)
    }

    /// Removes a transition. Unknown ids are a no-op.
    pub fn remove_transition(&mut self, id: TransitionId) {
        if !self.transitions.contains_key(&id) {
            return;
        }
        self.push_history();
        self.transitions.shift_remove(&id);
    }

    /// Makes `id` the initial state, displacing the previous one. Unknown
    /// ids are a no-op.
    pub fn set_initial_state(&mut self, id: StateId) {
        if !self.states.contains_key(&id) {
            return;
        }
        self.push_history();
        self.clear_initial_flag();
        if let Some(state) = self.states.get_mut(&id) {
            state.is_initial = true;
        }
        self.initial = Some(id);
    }

    /// Empties the model and resets identity counters.
    pub fn clear(&mut self) {
        self.push_history();
        self.states.clear();
        self.transitions.clear();
        self.alphabet.clear();
        self.initial = None;
        self.next_state_id = 0;
        self.next_transition_id = 0;
        self.sim.reset();
    }

    // ------------------------------------------------------------------
    // Editor refinements (not history-recording)
    // ------------------------------------------------------------------

    /// Moves a state on the canvas.
    pub fn move_state(&mut self, id: StateId, x: f64, y: f64) {
        if let Some(state) = self.states.get_mut(&id) {
            state.x = x;
            state.y = y;
        }
    }

    /// Renames a state.
    pub fn rename_state(&mut self, id: StateId, name: impl Into<String>) {
        if let Some(state) = self.states.get_mut(&id) {
            state.name = name.into();
        }
    }

    /// Toggles the accepting flag of a state.
    pub fn set_final(&mut self, id: StateId, is_final: bool) {
        if let Some(state) = self.states.get_mut(&id) {
            state.is_final = is_final;
        }
    }

    /// Toggles the TM halt flag of a state.
    pub fn set_halt(&mut self, id: StateId, is_halt: bool) {
        if let Some(state) = self.states.get_mut(&id) {
            state.is_halt = is_halt;
        }
    }

    /// Sets the editor selection flag on a state.
    pub fn select_state(&mut self, id: StateId, selected: bool) {
        if let Some(state) = self.states.get_mut(&id) {
            state.selected = selected;
        }
    }

    /// Sets the editor selection flag on a transition.
    pub fn select_transition(&mut self, id: TransitionId, selected: bool) {
        if let Some(transition) = self.transitions.get_mut(&id) {
            transition.selected = selected;
        }
    }

    /// Clears every selection flag.
    pub fn clear_selection(&mut self) {
        for state in self.states.values_mut() {
            state.selected = false;
        }
        for transition in self.transitions.values_mut() {
            transition.selected = false;
        }
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Restores the snapshot taken before the most recent mutation.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_undo() else {
            return false;
        };
        let current = self.to_structured();
        self.history.push_redo(current);
        self.restore(&snapshot);
        true
    }

    /// Reapplies the most recently undone mutation.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_redo() else {
            return false;
        };
        let current = self.to_structured();
        self.history.push_undo(current);
        self.restore(&snapshot);
        true
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of retained undo snapshots.
    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
    }

    fn push_history(&mut self) {
        let snapshot = self.to_structured();
        self.history.record(snapshot);
    }

    /// Swaps in a snapshot's graph, keeping this machine's history.
    fn restore(&mut self, snapshot: &crate::io::structured::StructuredMachine) {
        // Snapshots are produced by `to_structured` and always load.
        if let Ok(machine) = Machine::from_structured(snapshot) {
            self.variant = machine.variant;
            self.states = machine.states;
            self.transitions = machine.transitions;
            self.alphabet = machine.alphabet;
            self.initial = machine.initial;
            self.next_state_id = machine.next_state_id;
            self.next_transition_id = machine.next_transition_id;
            self.sim.reset();
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Checks the model against the contract of its kind.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.initial.is_none() {
            report.errors.push("machine has no initial state".to_string());
        }
        match &self.variant {
            Variant::Dfa => dfa::validate(self, &mut report),
            Variant::Nfa => nfa::validate(self, &mut report),
            Variant::Pda(_) => pda::validate(self, &mut report),
            Variant::Tm(_) => tm::validate(self, &mut report),
        }
        report
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Prepares a fresh run over `input`.
    pub fn init_simulation(&mut self, input: &str) {
        self.clear_run_flags();
        self.sim.reset();
        self.sim.input = input.chars().collect();
        match &self.variant {
            Variant::Dfa => dfa::init(self),
            Variant::Nfa => nfa::init(self),
            Variant::Pda(_) => pda::init(self),
            Variant::Tm(_) => tm::init(self),
        }
        debug!(kind = self.kind().tag(), input, "simulation initialized");
    }

    /// Advances the run by one atomic step. A no-op once the verdict is
    /// decided or before `init_simulation`.
    pub fn step(&mut self) {
        if self.sim.verdict != Verdict::Undecided
            || matches!(self.sim.active, ActiveConfigs::Idle)
        {
            return;
        }
        match &self.variant {
            Variant::Dfa => dfa::step(self),
            Variant::Nfa => nfa::step(self),
            Variant::Pda(_) => pda::step(self),
            Variant::Tm(_) => {
                tm::step(self);
                tm::loop_guard(self);
            }
        }
    }

    /// Inspects the current configurations without mutating anything.
    #[must_use]
    pub fn check_acceptance(&self) -> Verdict {
        match &self.variant {
            Variant::Dfa | Variant::Nfa => nfa::check_acceptance(self),
            Variant::Pda(_) => pda::check_acceptance(self),
            Variant::Tm(_) => tm::check_acceptance(self),
        }
    }

    /// Drives [`Machine::step`] until the verdict is decided, no
    /// configuration survives, or `max_steps` is exhausted. Budget
    /// exhaustion rejects with a dedicated trace entry.
    pub fn run(&mut self, max_steps: usize) {
        self.sim.running = true;
        let mut steps = 0usize;
        while self.sim.verdict == Verdict::Undecided {
            if steps >= max_steps {
                self.reject_budget_exhausted(max_steps);
                break;
            }
            self.step();
            steps += 1;
            if self.sim.verdict == Verdict::Undecided && self.sim.active.is_empty() {
                self.sim.verdict = Verdict::Rejected;
            }
        }
        self.sim.running = false;
        debug!(
            kind = self.kind().tag(),
            steps,
            verdict = ?self.sim.verdict,
            "run finished"
        );
    }

    /// Rejects the run with the dedicated budget-exhaustion trace entry.
    /// Shared by [`Machine::run`] and the simulator driver so the recorded
    /// budget is always the one that was actually spent.
    pub(crate) fn reject_budget_exhausted(&mut self, max_steps: usize) {
        self.sim.verdict = Verdict::Rejected;
        let entry = crate::core::sim::TraceEntry::new(
            self.sim.trace.len(),
            self.state_names(&self.sim.active.state_ids()),
            self.sim.remaining_input(),
            None,
            format!("step budget of {max_steps} exhausted"),
        );
        self.sim.trace.push(entry);
    }

    /// Runs with the default step budget for this kind.
    pub fn run_default(&mut self) {
        self.run(self.kind().step_budget());
    }

    /// Convenience: initializes over `input`, runs to completion and
    /// reports acceptance.
    pub fn accepts(&mut self, input: &str) -> bool {
        self.init_simulation(input);
        self.run_default();
        self.sim.verdict == Verdict::Accepted
    }

    /// Clears the run state and all per-step renderer flags.
    pub fn reset_simulation(&mut self) {
        self.sim.reset();
        self.clear_run_flags();
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    /// Subset construction. Returns `None` unless this machine is an NFA.
    #[must_use]
    pub fn to_dfa(&self) -> Option<Machine> {
        matches!(self.variant, Variant::Nfa).then(|| dfa::determinize(self))
    }

    /// Reinterprets a DFA as a structurally identical NFA. Returns `None`
    /// unless this machine is a DFA.
    #[must_use]
    pub fn to_nfa(&self) -> Option<Machine> {
        matches!(self.variant, Variant::Dfa).then(|| dfa::lift_to_nfa(self))
    }

    // ------------------------------------------------------------------
    // Crate-internal plumbing
    // ------------------------------------------------------------------

    /// Clears per-step renderer flags. Steps call this on entry so the
    /// renderer always sees the snapshot of the latest step only.
    pub(crate) fn begin_step(&mut self) {
        self.clear_run_flags();
    }

    fn clear_run_flags(&mut self) {
        for transition in self.transitions.values_mut() {
            transition.highlighted = false;
        }
        for state in self.states.values_mut() {
            state.active = false;
        }
    }

    /// Sets the highlight flag on the given transitions.
    pub(crate) fn highlight(&mut self, ids: &[TransitionId]) {
        for id in ids {
            if let Some(transition) = self.transitions.get_mut(id) {
                transition.highlighted = true;
            }
        }
    }

    /// Sets the active flag on the given states.
    pub(crate) fn mark_active(&mut self, ids: impl IntoIterator<Item = StateId>) {
        for id in ids {
            if let Some(state) = self.states.get_mut(&id) {
                state.active = true;
            }
        }
    }

    fn clear_initial_flag(&mut self) {
        if let Some(previous) = self.initial
            && let Some(state) = self.states.get_mut(&previous)
        {
            state.is_initial = false;
        }
    }

    fn label_fits(&self, label: &Label) -> bool {
        match (&self.variant, label) {
            (Variant::Dfa | Variant::Nfa, Label::Finite(_)) => true,
            (Variant::Pda(_), Label::Pushdown { .. }) => true,
            (Variant::Tm(_), Label::Tape { .. }) => true,
            _ => false,
        }
    }

    /// Folds a label's non-ε input symbols into the derived alphabet.
    fn absorb_label(&mut self, label: &Label) {
        match label {
            Label::Finite(symbols) => self.alphabet.extend(symbols.iter().copied()),
            Label::Pushdown { read, .. } => {
                if let Some(c) = read {
                    self.alphabet.insert(*c);
                }
            }
            Label::Tape { read, .. } => {
                let blank = self.tm_options().map_or('□', |o| o.blank);
                if !tm::is_blank_symbol(*read, blank) {
                    self.alphabet.insert(*read);
                }
            }
        }
    }

    /// Recomputes the derived alphabet from scratch. Loaders call this
    /// after rewiring transitions.
    pub(crate) fn rebuild_alphabet(&mut self) {
        self.alphabet.clear();
        let labels: Vec<Label> = self.transitions.values().map(|t| t.label.clone()).collect();
        for label in &labels {
            self.absorb_label(label);
        }
    }

    /// Inserts a state preserving its id. Loader/converter path: no
    /// history, no invariant normalization beyond the initial pointer.
    pub(crate) fn insert_state_raw(&mut self, state: State) {
        self.next_state_id = self.next_state_id.max(state.id + 1);
        if state.is_initial {
            self.initial = Some(state.id);
        }
        self.states.insert(state.id, state);
    }

    /// Appends a symbol to a finite transition's symbol list. XML loader
    /// path for merging per-symbol `<transition>` elements.
    pub(crate) fn push_fa_symbol(&mut self, id: TransitionId, symbol: char) {
        if let Some(transition) = self.transitions.get_mut(&id)
            && let Label::Finite(symbols) = &mut transition.label
            && !symbols.contains(&symbol)
        {
            symbols.push(symbol);
            self.alphabet.insert(symbol);
        }
    }

    /// Inserts a transition preserving its id. Loader/converter path.
    pub(crate) fn insert_transition_raw(&mut self, transition: Transition) {
        self.next_transition_id = self.next_transition_id.max(transition.id + 1);
        self.absorb_label(&transition.label);
        self.transitions.insert(transition.id, transition);
    }

    /// States reachable from the initial state by forward BFS over every
    /// transition, labels ignored.
    pub(crate) fn reachable_from_initial(&self) -> HashSet<StateId> {
        let mut seen = HashSet::new();
        let Some(start) = self.initial else {
            return seen;
        };
        seen.insert(start);
        let mut queue = VecDeque::from([start]);
        while let Some(state) = queue.pop_front() {
            for transition in self.transitions_from(state) {
                if seen.insert(transition.to) {
                    queue.push_back(transition.to);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::State;
    use crate::core::transition::{Label, Transition};

    fn two_state_nfa() -> Machine {
        let mut machine = Machine::nfa();
        let a = machine.add_state(State::new("q0", 0.0, 0.0));
        let b = machine.add_state(State::new("q1", 100.0, 0.0).accepting());
        machine.add_transition(Transition::new(a, b, Label::symbols(['a'])));
        machine
    }

    #[test]
    fn test_first_state_becomes_initial() {
        let machine = two_state_nfa();
        assert_eq!(machine.initial(), Some(0));
        assert!(machine.state(0).unwrap().is_initial);
        assert!(!machine.state(1).unwrap().is_initial);
    }

    #[test]
    fn test_at_most_one_initial() {
        let mut machine = two_state_nfa();
        let c = machine.add_state(State::new("q2", 0.0, 100.0).initial());
        assert_eq!(machine.initial(), Some(c));
        let flagged: Vec<_> = machine.states().filter(|s| s.is_initial).collect();
        assert_eq!(flagged.len(), 1);
    }

    #[test]
    fn test_remove_state_cascades_and_promotes() {
        let mut machine = two_state_nfa();
        machine.remove_state(0);
        assert_eq!(machine.state_count(), 1);
        assert_eq!(machine.transition_count(), 0);
        // the remaining state was promoted to initial
        assert_eq!(machine.initial(), Some(1));
        assert!(machine.state(1).unwrap().is_initial);
    }

    #[test]
    fn test_dangling_transition_rejected() {
        let mut machine = two_state_nfa();
        assert!(
            machine
                .add_transition(Transition::new(0, 99, Label::epsilon()))
                .is_none()
        );
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn test_alphabet_derived_from_labels() {
        let mut machine = two_state_nfa();
        machine.add_transition(Transition::new(1, 1, Label::symbols(['b', 'a'])));
        assert_eq!(
            machine.alphabet().iter().copied().collect::<Vec<_>>(),
            vec!['a', 'b']
        );
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut machine = two_state_nfa();
        assert_eq!(machine.state_count(), 2);
        machine.remove_state(1);
        assert_eq!(machine.state_count(), 1);
        assert!(machine.undo());
        assert_eq!(machine.state_count(), 2);
        assert!(machine.redo());
        assert_eq!(machine.state_count(), 1);
    }

    #[test]
    fn test_history_caps_out_fifo() {
        use crate::core::history::HISTORY_CAP;
        let mut machine = Machine::nfa();
        for i in 0..(HISTORY_CAP + 10) {
            machine.add_state(State::new(format!("q{i}"), 0.0, 0.0));
        }
        assert_eq!(machine.history_depth(), HISTORY_CAP);
    }

    #[test]
    fn test_clear_resets_counters() {
        let mut machine = two_state_nfa();
        machine.clear();
        assert_eq!(machine.state_count(), 0);
        let id = machine.add_state(State::new("fresh", 0.0, 0.0));
        assert_eq!(id, 0);
    }
}
