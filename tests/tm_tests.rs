use automalab::{ActiveConfigs, Direction, Label, Machine, State, Transition, Verdict};

fn tape(read: char, write: char, direction: Direction) -> Label {
    Label::Tape {
        read,
        write,
        direction,
    }
}

/// The bit flipper: rewrites 0↔1 moving right, halts on blank.
fn bit_flipper() -> Machine {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let halt = machine.add_state(State::new("qH", 200.0, 0.0).accepting().halting());
    machine.add_transition(Transition::new(q0, q0, tape('0', '1', Direction::Right)));
    machine.add_transition(Transition::new(q0, q0, tape('1', '0', Direction::Right)));
    machine.add_transition(Transition::new(q0, halt, tape('□', '□', Direction::Stay)));
    machine
}

fn tm_config(machine: &Machine) -> &automalab::core::sim::TmConfiguration {
    match &machine.sim.active {
        ActiveConfigs::Tape(Some(config)) => config,
        _ => panic!("live tape configuration expected"),
    }
}

#[test]
fn test_bit_flipper_flips() {
    let mut machine = bit_flipper();
    assert!(machine.accepts("0110"));
    let config = tm_config(&machine);
    let cells: String = (0..4).map(|i| config.tape.read(i)).collect();
    assert_eq!(cells, "1001");
}

#[test]
fn test_halt_state_reached() {
    let mut machine = bit_flipper();
    machine.init_simulation("01");
    machine.run_default();
    assert_eq!(machine.sim.verdict, Verdict::Accepted);
    let config = tm_config(&machine);
    assert_eq!(machine.state_name(config.state), "qH");
}

#[test]
fn test_empty_input_halts_immediately() {
    let mut machine = bit_flipper();
    machine.init_simulation("");
    machine.run_default();
    // the head starts on a blank, so the very first step halts
    assert_eq!(machine.sim.verdict, Verdict::Accepted);
}

#[test]
fn test_halt_without_final_rejects() {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let dead = machine.add_state(State::new("dead", 200.0, 0.0).halting());
    machine.add_transition(Transition::new(q0, dead, tape('□', '□', Direction::Stay)));
    assert!(!machine.accepts(""));
}

#[test]
fn test_stuck_state_rejects() {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    machine.add_state(State::new("q1", 200.0, 0.0).accepting());
    machine.add_transition(Transition::new(q0, q0, tape('a', 'a', Direction::Right)));
    // no transition matches the blank under the head
    assert!(!machine.accepts(""));
    let last = machine.sim.trace.last().unwrap();
    assert!(last.description.contains("no transition"));
}

#[test]
fn test_tape_grows_left() {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let q1 = machine.add_state(State::new("q1", 150.0, 0.0));
    let halt = machine.add_state(State::new("qH", 300.0, 0.0).accepting().halting());
    machine.add_transition(Transition::new(q0, q1, tape('a', 'b', Direction::Left)));
    machine.add_transition(Transition::new(q1, halt, tape('□', 'c', Direction::Stay)));
    assert!(machine.accepts("a"));
    let config = tm_config(&machine);
    assert_eq!(config.tape.left_logical(), -1);
    assert_eq!(config.tape.read(-1), 'c');
    assert_eq!(config.tape.read(0), 'b');
    assert_eq!(config.head, -1);
}

#[test]
fn test_runaway_machine_exhausts_budget() {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    machine.add_transition(Transition::new(q0, q0, tape('□', '□', Direction::Right)));
    machine.init_simulation("");
    machine.run(500);
    assert_eq!(machine.sim.verdict, Verdict::Rejected);
    let last = machine.sim.trace.last().unwrap();
    assert!(
        last.description.contains("step budget")
            || last.description.contains("potential infinite loop")
    );
}

#[test]
fn test_stationary_loop_trips_guard() {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let q1 = machine.add_state(State::new("q1", 150.0, 0.0));
    machine.add_transition(Transition::new(q0, q1, tape('□', '□', Direction::Stay)));
    machine.add_transition(Transition::new(q1, q0, tape('□', '□', Direction::Stay)));
    machine.init_simulation("");
    machine.run_default();
    assert_eq!(machine.sim.verdict, Verdict::Rejected);
    assert!(
        machine
            .sim
            .trace
            .iter()
            .any(|e| e.description.contains("potential infinite loop"))
    );
    // the heuristic fires long before the step budget
    assert!(machine.sim.trace.len() < 200);
}

#[test]
fn test_underscore_reads_as_blank() {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let halt = machine.add_state(State::new("qH", 200.0, 0.0).accepting().halting());
    machine.add_transition(Transition::new(q0, halt, tape('_', '_', Direction::Stay)));
    assert!(machine.accepts(""));
}

#[test]
fn test_trace_carries_tape_snapshots() {
    let mut machine = bit_flipper();
    machine.init_simulation("01");
    machine.run_default();
    let with_tape = machine.sim.trace.iter().filter(|e| e.tape.is_some()).count();
    assert!(with_tape >= 3);
}
