//! NFA operational semantics: ε-closure, symbol moves and the set-based
//! step relation shared with the DFA acceptance check.

use std::collections::BTreeSet;

use crate::core::machine::{Machine, ValidationReport};
use crate::core::sim::{ActiveConfigs, TraceEntry, Verdict};
use crate::core::state::StateId;
use crate::core::transition::TransitionId;

/// Computes the least superset of `seed` closed under ε-transitions,
/// using a worklist. `BTreeSet` keeps the result in the canonical sorted
/// order the subset construction serializes.
///
/// # Arguments
///
/// - `machine` (`&Machine`) - The automaton whose ε-transitions are followed.
/// - `seed` (`&BTreeSet<StateId>`) - The set of states to close over.
///
/// # Returns
///
/// - `BTreeSet<StateId>` - The ε-closure of `seed`, sorted by state id.
#[must_use]
pub fn epsilon_closure(machine: &Machine, seed: &BTreeSet<StateId>) -> BTreeSet<StateId> {
    let mut closure = seed.clone();
    let mut stack: Vec<StateId> = seed.iter().copied().collect();
    while let Some(state) = stack.pop() {
        for transition in machine.transitions_from(state) {
            if transition.label.is_epsilon() && closure.insert(transition.to) {
                stack.push(transition.to);
            }
        }
    }
    closure
}

/// Collects the targets reachable from `states` over non-ε transitions
/// consuming `symbol`.
///
/// # Arguments
///
/// - `machine` (`&Machine`) - The automaton whose transitions are consulted.
/// - `states` (`&BTreeSet<StateId>`) - The source states of the move.
/// - `symbol` (`char`) - The input symbol to advance on.
///
/// # Returns
///
/// - `(BTreeSet<StateId>, Vec<TransitionId>)` - The target states and the
///   transitions used to reach them (for highlighting).
#[must_use]
pub fn move_on(
    machine: &Machine,
    states: &BTreeSet<StateId>,
    symbol: char,
) -> (BTreeSet<StateId>, Vec<TransitionId>) {
    let mut frontier = BTreeSet::new();
    let mut used = Vec::new();
    for &state in states {
        for transition in machine.transitions_from(state) {
            if transition.label.accepts(symbol) {
                frontier.insert(transition.to);
                used.push(transition.id);
            }
        }
    }
    (frontier, used)
}

/// Seeds a fresh run with the ε-closure of the initial state and records
/// the opening trace entry.
///
/// # Arguments
///
/// - `machine` (`&mut Machine`) - The automaton whose simulation state is
///   initialized. The input must already be loaded into `machine.sim`.
///
/// # Returns
/// None
pub(crate) fn init(machine: &mut Machine) {
    let mut seed = BTreeSet::new();
    if let Some(start) = machine.initial() {
        seed.insert(start);
    }
    let closure = epsilon_closure(machine, &seed);
    let ids: Vec<StateId> = closure.iter().copied().collect();
    machine.mark_active(ids.iter().copied());
    let entry = TraceEntry::new(
        0,
        machine.state_names(&ids),
        machine.sim.remaining_input(),
        machine.sim.current_symbol(),
        format!("start in ε-closure {{{}}}", machine.state_names(&ids)),
    );
    machine.sim.active = ActiveConfigs::Finite(closure);
    machine.sim.trace.push(entry);
}

/// Consumes one input symbol over the whole active set, or decides the
/// verdict when the input is exhausted. The new active set is the
/// ε-closure of the move; an empty result rejects and terminates.
///
/// # Arguments
///
/// - `machine` (`&mut Machine`) - The automaton being stepped.
///
/// # Returns
/// None
pub(crate) fn step(machine: &mut Machine) {
    machine.begin_step();
    let ActiveConfigs::Finite(active) = machine.sim.active.clone() else {
        return;
    };
    if active.is_empty() {
        machine.sim.verdict = Verdict::Rejected;
        push_entry(machine, None, "no active states; input rejected");
        return;
    }
    if machine.sim.cursor >= machine.sim.input.len() {
        decide_on_exhausted_input(machine, &active);
        return;
    }

    let symbol = machine.sim.input[machine.sim.cursor];
    let (moved, used) = move_on(machine, &active, symbol);
    let next = epsilon_closure(machine, &moved);
    if next.is_empty() {
        machine.sim.verdict = Verdict::Rejected;
        machine.sim.active = ActiveConfigs::Finite(next);
        push_entry(
            machine,
            Some(symbol),
            format!("no transition consumes '{symbol}'; input rejected"),
        );
        return;
    }

    machine.sim.cursor += 1;
    machine.highlight(&used);
    let ids: Vec<StateId> = next.iter().copied().collect();
    machine.mark_active(ids.iter().copied());
    machine.sim.active = ActiveConfigs::Finite(next);
    push_entry(
        machine,
        Some(symbol),
        format!("consumed '{symbol}'"),
    );
}

/// Decides the verdict once the cursor has reached the end of the input.
///
/// # Arguments
///
/// - `machine` (`&mut Machine`) - The automaton being decided.
/// - `active` (`&BTreeSet<StateId>`) - The current (ε-closed) active set.
///
/// # Returns
/// None
fn decide_on_exhausted_input(machine: &mut Machine, active: &BTreeSet<StateId>) {
    let accepting: Vec<StateId> = active
        .iter()
        .copied()
        .filter(|id| machine.state(*id).is_some_and(|s| s.is_final))
        .collect();
    if accepting.is_empty() {
        machine.sim.verdict = Verdict::Rejected;
        push_entry(machine, None, "input consumed in non-final states; rejected");
    } else {
        machine.sim.verdict = Verdict::Accepted;
        let names = machine.state_names(&accepting);
        push_entry(
            machine,
            None,
            format!("input consumed; final state {names} active; accepted"),
        );
    }
    let ids: Vec<StateId> = active.iter().copied().collect();
    machine.mark_active(ids);
}

/// Shared DFA/NFA acceptance query: the whole input must be consumed and
/// some active state must be final. Mid-input acceptance is never claimed.
///
/// # Arguments
///
/// - `machine` (`&Machine`) - The automaton whose configuration is inspected.
///
/// # Returns
///
/// - `Verdict` - `Undecided` while input remains, otherwise `Accepted` or
///   `Rejected` on finality of the active set.
#[must_use]
pub(crate) fn check_acceptance(machine: &Machine) -> Verdict {
    let ActiveConfigs::Finite(active) = &machine.sim.active else {
        return Verdict::Undecided;
    };
    if machine.sim.cursor < machine.sim.input.len() {
        return Verdict::Undecided;
    }
    let accepted = active
        .iter()
        .any(|id| machine.state(*id).is_some_and(|s| s.is_final));
    if accepted {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    }
}

/// Warns about non-initial states unreachable from the initial state,
/// following ε-edges and labeled edges alike.
///
/// # Arguments
///
/// - `machine` (`&Machine`) - The automaton being validated.
/// - `report` (`&mut ValidationReport`) - Collector the warnings are
///   appended to.
///
/// # Returns
/// None
pub(crate) fn validate(machine: &Machine, report: &mut ValidationReport) {
    let reachable = machine.reachable_from_initial();
    for state in machine.states() {
        if !state.is_initial && !reachable.contains(&state.id) {
            report
                .warnings
                .push(format!("state {} is unreachable", state.name));
        }
    }
}

fn push_entry(machine: &mut Machine, symbol: Option<char>, description: impl Into<String>) {
    let ids = machine.sim.active.state_ids();
    let entry = TraceEntry::new(
        machine.sim.trace.len(),
        machine.state_names(&ids),
        machine.sim.remaining_input(),
        symbol,
        description,
    );
    machine.sim.trace.push(entry);
}
