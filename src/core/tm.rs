//! Single-tape Turing machine semantics: deterministic transition
//! selection, tape writes with dynamic growth, halt detection and the
//! loop heuristic.

use std::collections::HashMap;

use tracing::debug;

use crate::core::machine::{Machine, ValidationReport};
use crate::core::sim::{ActiveConfigs, TmConfiguration, TraceEntry, Verdict};
use crate::core::tape::Tape;
use crate::core::transition::{Direction, Label};

/// The loop heuristic arms once the trace is longer than this.
const LOOP_GUARD_MIN_TRACE: usize = 100;
/// Window of recent steps inspected by the loop heuristic.
const LOOP_GUARD_WINDOW: usize = 50;

/// Whether `symbol` reads as the blank for a machine using `blank`.
/// `□` and `_` are always blank aliases.
#[must_use]
pub(crate) fn is_blank_symbol(symbol: char, blank: char) -> bool {
    symbol == blank || symbol == '□' || symbol == '_'
}

fn normalize(symbol: char, blank: char) -> char {
    if is_blank_symbol(symbol, blank) {
        blank
    } else {
        symbol
    }
}

pub(crate) fn init(machine: &mut Machine) {
    let blank = machine.tm_options().map_or('□', |o| o.blank);
    let input: String = machine.sim.input.iter().collect();
    let config = machine.initial().map(|start| {
        machine.mark_active([start]);
        TmConfiguration {
            state: start,
            tape: Tape::from_input(&input, blank),
            head: 0,
        }
    });
    let entry = match &config {
        Some(c) => TraceEntry::new(
            0,
            machine.state_name(c.state).to_string(),
            machine.sim.remaining_input(),
            Some(c.tape.read(c.head)),
            format!("start on tape '{}'", c.tape.window_string()),
        )
        .with_tape(c.tape.window_string(), c.head),
        None => TraceEntry::new(0, "", machine.sim.remaining_input(), None, "no initial state"),
    };
    machine.sim.active = ActiveConfigs::Tape(config);
    machine.sim.trace.push(entry);
}

/// Reads the cell under the head, picks the first transition whose
/// read-symbol matches, writes, moves and switches state. Entering a
/// final or halt state terminates the run; accept iff the state is final.
pub(crate) fn step(machine: &mut Machine) {
    machine.begin_step();
    let ActiveConfigs::Tape(config) = machine.sim.active.clone() else {
        return;
    };
    let Some(mut config) = config else {
        machine.sim.verdict = Verdict::Rejected;
        push_halt_entry(machine, None, "no active configuration; rejected");
        return;
    };

    let blank = machine.tm_options().map_or('□', |o| o.blank);
    let cell = config.tape.read(config.head);
    debug!(
        state = machine.state_name(config.state),
        cell = %cell,
        head = config.head,
        "tm step"
    );

    let hit = machine
        .transitions_from(config.state)
        .find_map(|t| match &t.label {
            Label::Tape {
                read,
                write,
                direction,
            } if normalize(*read, blank) == normalize(cell, blank) => {
                Some((t.id, t.to, *write, *direction))
            }
            _ => None,
        });

    let Some((transition_id, target, write, direction)) = hit else {
        // No matching transition: the verdict is the finality of the
        // state the machine is stuck in.
        let is_final = machine.state(config.state).is_some_and(|s| s.is_final);
        machine.sim.verdict = if is_final {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        let name = machine.state_name(config.state).to_string();
        let outcome = if is_final { "accepted" } else { "rejected" };
        machine.mark_active([config.state]);
        push_halt_entry(
            machine,
            Some(&config),
            format!("no transition from {name} on '{cell}'; {outcome}"),
        );
        return;
    };

    config.tape.write(config.head, normalize(write, blank));
    match direction {
        Direction::Left => config.head -= 1,
        Direction::Right => config.head += 1,
        Direction::Stay => {}
    }
    config.tape.ensure(config.head);
    config.state = target;
    machine.sim.active = ActiveConfigs::Tape(Some(config.clone()));

    machine.highlight(&[transition_id]);
    machine.mark_active([target]);

    let target_state = machine.state(target).cloned();
    let (is_final, is_halt) = target_state
        .as_ref()
        .map_or((false, false), |s| (s.is_final, s.is_halt));
    let name = machine.state_name(target).to_string();

    let entry = TraceEntry::new(
        machine.sim.trace.len(),
        name.clone(),
        machine.sim.remaining_input(),
        Some(config.tape.read(config.head)),
        format!(
            "wrote '{}', moved {}, now in {name}",
            normalize(write, blank),
            direction
        ),
    )
    .with_tape(config.tape.window_string(), config.head);
    machine.sim.trace.push(entry);

    machine
        .sim
        .tm_seen
        .push((config.state, config.head, config.tape.window_string()));

    if is_final || is_halt {
        machine.sim.verdict = if is_final {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        let outcome = if is_final { "accepted" } else { "rejected" };
        push_halt_entry(
            machine,
            Some(&config),
            format!("halted in {name}; {outcome}"),
        );
    }
}

/// Acceptance query: decided only once the head sits in a final or halt
/// state.
#[must_use]
pub(crate) fn check_acceptance(machine: &Machine) -> Verdict {
    let ActiveConfigs::Tape(Some(config)) = &machine.sim.active else {
        return Verdict::Undecided;
    };
    match machine.state(config.state) {
        Some(state) if state.is_final => Verdict::Accepted,
        Some(state) if state.is_halt => Verdict::Rejected,
        _ => Verdict::Undecided,
    }
}

/// Heuristic nontermination detection, consulted by `run` after each step:
/// once the trace exceeds [`LOOP_GUARD_MIN_TRACE`] entries, a
/// (state, head, tape) signature recurring more than twice within the most
/// recent [`LOOP_GUARD_WINDOW`] steps halts the run as a reject.
pub(crate) fn loop_guard(machine: &mut Machine) {
    if machine.sim.verdict != Verdict::Undecided
        || machine.sim.trace.len() <= LOOP_GUARD_MIN_TRACE
    {
        return;
    }
    let fired = {
        let seen = &machine.sim.tm_seen;
        let window = &seen[seen.len().saturating_sub(LOOP_GUARD_WINDOW)..];
        let mut counts: HashMap<&(u32, i64, String), usize> = HashMap::new();
        window.iter().any(|signature| {
            let count = counts.entry(signature).or_default();
            *count += 1;
            *count > 2
        })
    };
    if fired {
        machine.sim.verdict = Verdict::Rejected;
        let entry = TraceEntry::new(
            machine.sim.trace.len(),
            machine.state_names(&machine.sim.active.state_ids()),
            machine.sim.remaining_input(),
            None,
            "potential infinite loop detected; run halted",
        );
        machine.sim.trace.push(entry);
        debug!("tm loop guard fired");
    }
}

/// The TM does not require a final state. Warns about non-halt non-final
/// states with no outgoing transitions.
pub(crate) fn validate(machine: &Machine, report: &mut ValidationReport) {
    for state in machine.states() {
        if !state.is_final
            && !state.is_halt
            && machine.transitions_from(state.id).next().is_none()
        {
            report.warnings.push(format!(
                "state {} has no outgoing transitions and is not a halt state",
                state.name
            ));
        }
    }
}

fn push_halt_entry(
    machine: &mut Machine,
    config: Option<&TmConfiguration>,
    description: impl Into<String>,
) {
    let mut entry = TraceEntry::new(
        machine.sim.trace.len(),
        machine.state_names(&machine.sim.active.state_ids()),
        machine.sim.remaining_input(),
        None,
        description,
    );
    if let Some(c) = config {
        entry = entry.with_tape(c.tape.window_string(), c.head);
    }
    machine.sim.trace.push(entry);
}
