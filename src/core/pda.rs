//! PDA semantics: a breadth-style search over a set of concurrent
//! `(state, stack, inputIndex)` configurations.

use tracing::trace;

use crate::core::machine::{Machine, PdaOptions, ValidationReport};
use crate::core::nfa;
use crate::core::sim::{ActiveConfigs, PdaConfiguration, TraceEntry, Verdict};
use crate::core::transition::{Label, Transition, TransitionId};

pub(crate) fn init(machine: &mut Machine) {
    let options = machine.pda_options().copied().unwrap_or_default();
    let mut configs = Vec::new();
    if let Some(start) = machine.initial() {
        configs.push(PdaConfiguration {
            state: start,
            stack: vec![options.initial_stack_symbol],
            input_index: 0,
        });
        machine.mark_active([start]);
    }
    let entry = TraceEntry::new(
        0,
        machine.state_names(&configs.iter().map(|c| c.state).collect::<Vec<_>>()),
        machine.sim.remaining_input(),
        machine.sim.current_symbol(),
        format!(
            "start with stack '{}'",
            configs.first().map(PdaConfiguration::stack_display).unwrap_or_default()
        ),
    )
    .with_stack(
        configs
            .first()
            .map(PdaConfiguration::stack_display)
            .unwrap_or_default(),
    );
    machine.sim.active = ActiveConfigs::Pushdown(configs);
    machine.sim.trace.push(entry);
}

/// Whether `transition` applies to `config`: source state matches, the
/// input symbol is ε or the symbol under the configuration's cursor, and
/// the stack-read is ε or the top of the configuration's stack.
fn applies(transition: &Transition, config: &PdaConfiguration, input: &[char]) -> bool {
    let Label::Pushdown { read, pop, .. } = &transition.label else {
        return false;
    };
    if transition.from != config.state {
        return false;
    }
    let input_ok = match read {
        None => true,
        Some(symbol) => {
            config.input_index < input.len() && input[config.input_index] == *symbol
        }
    };
    let stack_ok = match pop {
        None => true,
        Some(symbol) => config.stack.last() == Some(symbol),
    };
    input_ok && stack_ok
}

/// Applies `transition` to `config`, producing the successor configuration.
/// Stacks are copied so concurrent configurations never alias.
fn apply(transition: &Transition, config: &PdaConfiguration) -> PdaConfiguration {
    let Label::Pushdown { read, pop, push } = &transition.label else {
        unreachable!("pushdown label checked by `applies`");
    };
    let mut stack = config.stack.clone();
    if pop.is_some() {
        stack.pop();
    }
    // `push` is written top-first; pushing right-to-left leaves its first
    // character on top.
    stack.extend(push.chars().rev());
    PdaConfiguration {
        state: transition.to,
        stack,
        input_index: config.input_index + usize::from(read.is_some()),
    }
}

/// One micro-step of the configuration set: every applicable transition of
/// every live configuration fires, and the union becomes the new set.
///
/// Acceptance is a terminating side effect: a finished configuration that
/// satisfies the accept mode decides the run before any expansion.
pub(crate) fn step(machine: &mut Machine) {
    if check_acceptance(machine) == Verdict::Accepted {
        machine.sim.verdict = Verdict::Accepted;
        push_accept_entry(machine);
        return;
    }

    machine.begin_step();
    let ActiveConfigs::Pushdown(configs) = machine.sim.active.clone() else {
        return;
    };
    if configs.is_empty() {
        machine.sim.verdict = Verdict::Rejected;
        push_entry(machine, "no live configurations; input rejected");
        return;
    }

    let input = machine.sim.input.clone();
    let mut next: Vec<PdaConfiguration> = Vec::new();
    let mut used: Vec<TransitionId> = Vec::new();
    let mut descriptions: Vec<String> = Vec::new();

    for config in &configs {
        let candidates: Vec<(TransitionId, Transition)> = machine
            .transitions_from(config.state)
            .map(|t| (t.id, t.clone()))
            .collect();
        for (id, transition) in candidates {
            if !applies(&transition, config, &input) {
                continue;
            }
            let successor = apply(&transition, config);
            used.push(id);
            trace!(
                from = machine.state_name(config.state),
                to = machine.state_name(successor.state),
                stack = %successor.stack_display(),
                "pda move"
            );
            if !next.contains(&successor) {
                descriptions.push(format!(
                    "{} [{}] → {} [{}]",
                    machine.state_name(config.state),
                    config.stack_display(),
                    machine.state_name(successor.state),
                    successor.stack_display(),
                ));
                next.push(successor);
            }
        }
    }

    if next.is_empty() {
        machine.sim.verdict = Verdict::Rejected;
        machine.sim.active = ActiveConfigs::Pushdown(next);
        push_entry(machine, "all configurations stuck; input rejected");
        return;
    }

    machine.highlight(&used);
    machine.mark_active(next.iter().map(|c| c.state));
    // The canonical display cursor and stack follow the first configuration.
    machine.sim.cursor = next[0].input_index;
    let first_stack = next[0].stack_display();
    machine.sim.active = ActiveConfigs::Pushdown(next);
    let entry = TraceEntry::new(
        machine.sim.trace.len(),
        machine.state_names(&machine.sim.active.state_ids()),
        machine.sim.remaining_input(),
        machine.sim.current_symbol(),
        descriptions.join("; "),
    )
    .with_stack(first_stack);
    machine.sim.trace.push(entry);
}

/// A finished configuration (all input consumed) accepts when the mode
/// flags say so; otherwise the run stays undecided until the set dies.
#[must_use]
pub(crate) fn check_acceptance(machine: &Machine) -> Verdict {
    let ActiveConfigs::Pushdown(configs) = &machine.sim.active else {
        return Verdict::Undecided;
    };
    let options = machine.pda_options().copied().unwrap_or_default();
    let input_len = machine.sim.input.len();
    for config in configs {
        if config.input_index != input_len {
            continue;
        }
        if accepted_by(&options, machine, config) {
            return Verdict::Accepted;
        }
    }
    if configs.is_empty() {
        Verdict::Rejected
    } else {
        Verdict::Undecided
    }
}

fn accepted_by(options: &PdaOptions, machine: &Machine, config: &PdaConfiguration) -> bool {
    if options.accept_by_final_state
        && machine.state(config.state).is_some_and(|s| s.is_final)
    {
        return true;
    }
    options.accept_by_empty_stack && config.stack.is_empty()
}

pub(crate) fn validate(machine: &Machine, report: &mut ValidationReport) {
    nfa::validate(machine, report);
}

fn push_entry(machine: &mut Machine, description: impl Into<String>) {
    let ids = machine.sim.active.state_ids();
    let entry = TraceEntry::new(
        machine.sim.trace.len(),
        machine.state_names(&ids),
        machine.sim.remaining_input(),
        machine.sim.current_symbol(),
        description,
    );
    machine.sim.trace.push(entry);
}

fn push_accept_entry(machine: &mut Machine) {
    let options = machine.pda_options().copied().unwrap_or_default();
    let input_len = machine.sim.input.len();
    let winner: Option<PdaConfiguration> = match &machine.sim.active {
        ActiveConfigs::Pushdown(configs) => configs
            .iter()
            .find(|c| c.input_index == input_len && accepted_by(&options, machine, c))
            .cloned(),
        _ => return,
    };
    let description = winner.as_ref().map_or_else(
        || "accepted".to_string(),
        |c| {
            let how = if options.accept_by_final_state
                && machine.state(c.state).is_some_and(|s| s.is_final)
            {
                "final state"
            } else {
                "empty stack"
            };
            format!(
                "configuration {} [{}] accepts by {how}",
                machine.state_name(c.state),
                c.stack_display()
            )
        },
    );
    let mut entry = TraceEntry::new(
        machine.sim.trace.len(),
        machine.state_names(&machine.sim.active.state_ids()),
        machine.sim.remaining_input(),
        None,
        description,
    );
    if let Some(c) = winner {
        entry = entry.with_stack(c.stack_display());
    }
    machine.sim.trace.push(entry);
}
