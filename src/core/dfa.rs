//! DFA step semantics, determinism validation and the subset construction
//! that determinizes an NFA.

use std::collections::{BTreeSet, HashMap, VecDeque};

use indexmap::IndexMap;
use tracing::debug;

use crate::core::machine::{Machine, ValidationReport};
use crate::core::nfa;
use crate::core::sim::{ActiveConfigs, TraceEntry, Verdict};
use crate::core::state::{State, StateId};
use crate::core::transition::{Label, Transition};

/// Seeds a fresh run with the singleton initial state and records the
/// opening trace entry.
///
/// # Arguments
///
/// - `machine` (`&mut Machine`) - The automaton whose simulation state is
///   initialized. The input must already be loaded into `machine.sim`.
///
/// # Returns
/// None
pub(crate) fn init(machine: &mut Machine) {
    let mut active = BTreeSet::new();
    if let Some(start) = machine.initial() {
        active.insert(start);
        machine.mark_active([start]);
    }
    let names = machine.state_names(&active.iter().copied().collect::<Vec<_>>());
    let entry = TraceEntry::new(
        0,
        names.clone(),
        machine.sim.remaining_input(),
        machine.sim.current_symbol(),
        format!("start in {names}"),
    );
    machine.sim.active = ActiveConfigs::Finite(active);
    machine.sim.trace.push(entry);
}

/// Follows the unique transition on the symbol under the cursor. A missing
/// transition rejects immediately; exhausted input decides on finality of
/// the single active state.
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
    let Some(&current) = active.iter().next() else {
        machine.sim.verdict = Verdict::Rejected;
        push_entry(machine, None, "no active state; input rejected");
        return;
    };

    if machine.sim.cursor >= machine.sim.input.len() {
        let is_final = machine.state(current).is_some_and(|s| s.is_final);
        let name = machine.state_name(current).to_string();
        machine.sim.verdict = if is_final {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        machine.mark_active([current]);
        let outcome = if is_final { "accepted" } else { "rejected" };
        push_entry(
            machine,
            None,
            format!("input consumed in {name}; {outcome}"),
        );
        return;
    }

    let symbol = machine.sim.input[machine.sim.cursor];
    let hit = machine
        .transitions_from(current)
        .find(|t| t.label.accepts(symbol))
        .map(|t| (t.id, t.to));
    let Some((transition_id, target)) = hit else {
        machine.sim.verdict = Verdict::Rejected;
        machine.sim.active = ActiveConfigs::Finite(BTreeSet::new());
        let name = machine.state_name(current).to_string();
        push_entry(
            machine,
            Some(symbol),
            format!("no transition from {name} on '{symbol}'; input rejected"),
        );
        return;
    };

    machine.sim.cursor += 1;
    machine.highlight(&[transition_id]);
    machine.mark_active([target]);
    machine.sim.active = ActiveConfigs::Finite(BTreeSet::from([target]));
    let from = machine.state_name(current).to_string();
    let to = machine.state_name(target).to_string();
    push_entry(
        machine,
        Some(symbol),
        format!("{from} --'{symbol}'--> {to}"),
    );
}

/// Determinism and completeness checks.
///
/// Errors: duplicate (state, symbol) transitions and any ε-transition.
/// Warnings: missing (state, symbol) pairs and unreachable non-initial
/// states.
///
/// # Arguments
///
/// - `machine` (`&Machine`) - The automaton being validated.
/// - `report` (`&mut ValidationReport`) - Collector the errors and
///   warnings are appended to.
///
/// # Returns
/// None
pub(crate) fn validate(machine: &Machine, report: &mut ValidationReport) {
    for state in machine.states() {
        let mut seen: HashMap<char, usize> = HashMap::new();
        for transition in machine.transitions_from(state.id) {
            if transition.label.is_epsilon() {
                report.errors.push(format!(
                    "ε-transition from {} is not allowed in a DFA",
                    state.name
                ));
            }
            if let Label::Finite(symbols) = &transition.label {
                for &symbol in symbols {
                    *seen.entry(symbol).or_default() += 1;
                }
            }
        }
        for (symbol, count) in &seen {
            if *count > 1 {
                report.errors.push(format!(
                    "state {} has {count} transitions on '{symbol}'",
                    state.name
                ));
            }
        }
        for &symbol in machine.alphabet() {
            if !seen.contains_key(&symbol) {
                report.warnings.push(format!(
                    "state {} has no transition on '{symbol}'",
                    state.name
                ));
            }
        }
    }
    nfa::validate(machine, report);
}

/// Subset construction: builds the DFA of ε-closed NFA state subsets
/// reachable from the initial closure. Subset identity is the sorted id
/// sequence; DFA states are named `{q_i, q_j, …}` after their members.
///
/// # Arguments
///
/// - `source` (`&Machine`) - The NFA to be determinized.
///
/// # Returns
///
/// - `Machine` - The equivalent DFA. Empty when `source` has no initial
///   state.
#[must_use]
pub fn determinize(source: &Machine) -> Machine {
    let mut result = Machine::dfa();
    let Some(start) = source.initial() else {
        return result;
    };

    let alphabet: Vec<char> = source.alphabet().iter().copied().collect();
    let mut map: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut queue: VecDeque<Vec<StateId>> = VecDeque::new();

    let closure = nfa::epsilon_closure(source, &BTreeSet::from([start]));
    let seed_key: Vec<StateId> = closure.iter().copied().collect();
    let seed_id = add_subset_state(&mut result, source, &seed_key, map.len());
    map.insert(seed_key.clone(), seed_id);
    queue.push_back(seed_key);

    while let Some(key) = queue.pop_front() {
        let from_id = map[&key];
        let subset: BTreeSet<StateId> = key.iter().copied().collect();
        for &symbol in &alphabet {
            let (moved, _) = nfa::move_on(source, &subset, symbol);
            if moved.is_empty() {
                continue;
            }
            let target = nfa::epsilon_closure(source, &moved);
            let target_key: Vec<StateId> = target.iter().copied().collect();
            let to_id = match map.get(&target_key) {
                Some(&id) => id,
                None => {
                    let id = add_subset_state(&mut result, source, &target_key, map.len());
                    map.insert(target_key.clone(), id);
                    queue.push_back(target_key);
                    id
                }
            };
            result.add_transition(Transition::new(from_id, to_id, Label::symbols([symbol])));
        }
    }

    result.clear_history();
    debug!(
        nfa_states = source.state_count(),
        dfa_states = result.state_count(),
        "subset construction finished"
    );
    result
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

/// Creates the DFA state standing for an NFA subset.
///
/// # Arguments
///
/// - `result` (`&mut Machine`) - The DFA under construction.
/// - `source` (`&Machine`) - The NFA whose states name the subset.
/// - `key` (`&[StateId]`) - The sorted NFA state ids forming the subset.
/// - `index` (`usize`) - Running subset count, used for grid placement.
///
/// # Returns
///
/// - `StateId` - The id of the freshly added DFA state.
fn add_subset_state(
    result: &mut Machine,
    source: &Machine,
    key: &[StateId],
    index: usize,
) -> StateId {
    let name = format!("{{{}}}", source.state_names(key));
    let (x, y) = grid_position(index);
    let mut state = State::new(name, x, y);
    state.is_final = key
        .iter()
        .any(|id| source.state(*id).is_some_and(|s| s.is_final));
    result.add_state(state)
}

// Converted machines have no geometry of their own; lay the subsets out on
// a simple grid.
fn grid_position(index: usize) -> (f64, f64) {
    let col = index % 4;
    let row = index / 4;
    (120.0 + col as f64 * 180.0, 120.0 + row as f64 * 160.0)
}

/// Reinterprets a DFA as an NFA: same states, same edges, only the type
/// tag changes.
///
/// # Arguments
///
/// - `source` (`&Machine`) - The DFA to reinterpret.
///
/// # Returns
///
/// - `Machine` - A structurally identical machine tagged as an NFA.
#[must_use]
pub fn lift_to_nfa(source: &Machine) -> Machine {
    let mut result = Machine::nfa();
    for state in source.states() {
        result.insert_state_raw(state.clone());
    }
    for transition in source.transitions() {
        result.insert_transition_raw(transition.clone());
    }
    result
}
