use automalab::{Direction, Label, Machine, MachineKind, State, Transition};

fn sample_dfa() -> Machine {
    let mut machine = Machine::dfa();
    let q0 = machine.add_state(State::new("q0", 50.0, 60.0));
    let q1 = machine.add_state(State::new("q1", 200.0, 60.0).accepting());
    machine.add_transition(Transition::new(q0, q1, Label::symbols(['a'])));
    machine.add_transition(Transition::new(q1, q1, Label::symbols(['b'])));
    machine
}

fn sample_pda() -> Machine {
    let mut machine = Machine::pda();
    machine.pda_options_mut().unwrap().accept_by_empty_stack = true;
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let q1 = machine.add_state(State::new("q1", 150.0, 0.0).accepting());
    machine.add_transition(Transition::new(
        q0,
        q0,
        Label::Pushdown {
            read: Some('a'),
            pop: Some('Z'),
            push: "AZ".to_string(),
        },
    ));
    machine.add_transition(Transition::new(
        q0,
        q1,
        Label::Pushdown {
            read: None,
            pop: Some('A'),
            push: String::new(),
        },
    ));
    machine
}

fn sample_tm() -> Machine {
    let mut machine = Machine::tm();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let halt = machine.add_state(State::new("qH", 150.0, 0.0).accepting().halting());
    machine.add_transition(Transition::new(
        q0,
        q0,
        Label::Tape {
            read: '0',
            write: '1',
            direction: Direction::Right,
        },
    ));
    machine.add_transition(Transition::new(
        q0,
        halt,
        Label::Tape {
            read: '□',
            write: '□',
            direction: Direction::Stay,
        },
    ));
    machine
}

fn assert_same_graph(a: &Machine, b: &Machine) {
    assert_eq!(a.kind(), b.kind());
    assert_eq!(a.state_count(), b.state_count());
    assert_eq!(a.transition_count(), b.transition_count());
    assert_eq!(a.initial(), b.initial());
    assert_eq!(a.alphabet(), b.alphabet());
    for state in a.states() {
        let other = b.state(state.id).expect("state survives round-trip");
        assert_eq!(state.name, other.name);
        assert_eq!((state.x, state.y), (other.x, other.y));
        assert_eq!(state.is_initial, other.is_initial);
        assert_eq!(state.is_final, other.is_final);
        assert_eq!(state.is_halt, other.is_halt);
    }
    for transition in a.transitions() {
        let other = b.transition(transition.id).expect("transition survives");
        assert_eq!(transition.from, other.from);
        assert_eq!(transition.to, other.to);
        assert_eq!(transition.label, other.label);
    }
}

#[test]
fn test_structured_round_trip_dfa() {
    let machine = sample_dfa();
    let restored = Machine::from_structured(&machine.to_structured()).unwrap();
    assert_same_graph(&machine, &restored);
}

#[test]
fn test_structured_round_trip_pda() {
    let machine = sample_pda();
    let structured = machine.to_structured();
    assert_eq!(structured.initial_stack_symbol, Some('Z'));
    assert_eq!(structured.accept_by_final_state, Some(true));
    assert_eq!(structured.accept_by_empty_stack, Some(true));
    assert_eq!(structured.stack_alphabet.as_deref(), Some(['A', 'Z'].as_slice()));

    let restored = Machine::from_structured(&structured).unwrap();
    assert_same_graph(&machine, &restored);
    assert_eq!(machine.pda_options(), restored.pda_options());
}

#[test]
fn test_structured_round_trip_tm() {
    let machine = sample_tm();
    let structured = machine.to_structured();
    assert_eq!(structured.blank_symbol, Some('□'));
    assert_eq!(
        structured.tape_alphabet.as_deref(),
        Some(['0', '1', '□'].as_slice())
    );

    let restored = Machine::from_structured(&structured).unwrap();
    assert_same_graph(&machine, &restored);
}

#[test]
fn test_json_round_trip_preserves_language() {
    let mut machine = sample_dfa();
    let json = machine.to_json().unwrap();
    let mut restored = Machine::from_json(&json).unwrap();
    for input in ["", "a", "ab", "abb", "ba"] {
        assert_eq!(machine.accepts(input), restored.accepts(input));
    }
}

#[test]
fn test_load_resets_identity_counters() {
    let machine = sample_dfa();
    let mut restored = Machine::from_structured(&machine.to_structured()).unwrap();
    let fresh = restored.add_state(State::new("fresh", 0.0, 0.0));
    assert_eq!(fresh, 2);
    let t = restored.add_transition(Transition::new(fresh, fresh, Label::symbols(['c'])));
    assert_eq!(t, Some(2));
}

#[test]
fn test_load_does_not_record_history() {
    let machine = sample_dfa();
    let mut restored = Machine::from_structured(&machine.to_structured()).unwrap();
    assert!(!restored.can_undo());
    restored.remove_state(0);
    assert!(restored.can_undo());
}

#[test]
fn test_dangling_endpoint_is_an_error() {
    let machine = sample_dfa();
    let mut structured = machine.to_structured();
    structured.transitions[0].to_state = 99;
    assert!(Machine::from_structured(&structured).is_err());
}

#[test]
fn test_unknown_type_is_an_error() {
    let machine = sample_dfa();
    let mut structured = machine.to_structured();
    structured.kind = "mealy".to_string();
    assert!(Machine::from_structured(&structured).is_err());
}

#[test]
fn test_malformed_json_leaves_caller_with_error() {
    assert!(Machine::from_json("{ not json").is_err());
}

#[test]
fn test_xml_round_trip_fa() {
    let mut machine = Machine::nfa();
    let q0 = machine.add_state(State::new("q0", 10.0, 20.0));
    let q1 = machine.add_state(State::new("q1", 150.0, 20.0).accepting());
    machine.add_transition(Transition::new(q0, q1, Label::symbols(['a', 'b'])));
    machine.add_transition(Transition::new(q0, q1, Label::epsilon()));

    let xml = machine.to_interchange_xml();
    // one <transition> element per accepted symbol plus the ε edge
    assert_eq!(xml.matches("<from>").count(), 3);

    let mut restored = Machine::from_interchange_xml(&xml).unwrap();
    assert_eq!(restored.kind(), MachineKind::Nfa);
    assert_eq!(restored.state_count(), 2);
    // the two symbol elements merge back into one transition
    assert_eq!(restored.transition_count(), 2);
    for input in ["a", "b", "", "ab"] {
        assert_eq!(machine.accepts(input), restored.accepts(input));
    }
}

#[test]
fn test_xml_dfa_loads_as_nfa() {
    let machine = sample_dfa();
    let xml = machine.to_interchange_xml();
    assert!(xml.contains("<type>fa</type>"));
    let mut restored = Machine::from_interchange_xml(&xml).unwrap();
    assert_eq!(restored.kind(), MachineKind::Nfa);
    let mut original = machine;
    for input in ["", "a", "ab", "abb"] {
        assert_eq!(original.accepts(input), restored.accepts(input));
    }
}

#[test]
fn test_xml_round_trip_pda() {
    let machine = sample_pda();
    let xml = machine.to_interchange_xml();
    assert!(xml.contains("<type>pda</type>"));
    assert!(xml.contains("<pop>Z</pop>"));
    assert!(xml.contains("<push>AZ</push>"));

    let restored = Machine::from_interchange_xml(&xml).unwrap();
    assert_eq!(restored.kind(), MachineKind::Pda);
    assert_eq!(restored.transition_count(), 2);
    let labels: Vec<&Label> = restored.transitions().map(|t| &t.label).collect();
    assert!(labels.contains(&&Label::Pushdown {
        read: Some('a'),
        pop: Some('Z'),
        push: "AZ".to_string(),
    }));
    assert!(labels.contains(&&Label::Pushdown {
        read: None,
        pop: Some('A'),
        push: String::new(),
    }));
}

#[test]
fn test_xml_round_trip_tm() {
    let machine = sample_tm();
    let xml = machine.to_interchange_xml();
    assert!(xml.contains("<type>turing</type>"));
    assert!(xml.contains("<move>R</move>"));

    let restored = Machine::from_interchange_xml(&xml).unwrap();
    assert_eq!(restored.kind(), MachineKind::Tm);
    let labels: Vec<&Label> = restored.transitions().map(|t| &t.label).collect();
    assert!(labels.contains(&&Label::Tape {
        read: '0',
        write: '1',
        direction: Direction::Right,
    }));
    // blank read/write cells round-trip through empty elements
    assert!(labels.contains(&&Label::Tape {
        read: '□',
        write: '□',
        direction: Direction::Stay,
    }));
}

#[test]
fn test_xml_escapes_names() {
    let mut machine = Machine::nfa();
    machine.add_state(State::new("a<b>&\"c\"", 0.0, 0.0));
    let xml = machine.to_interchange_xml();
    assert!(xml.contains("a&lt;b&gt;&amp;&quot;c&quot;"));
    let restored = Machine::from_interchange_xml(&xml).unwrap();
    assert_eq!(restored.state(0).unwrap().name, "a<b>&\"c\"");
}

#[test]
fn test_malformed_xml_is_an_error() {
    assert!(Machine::from_interchange_xml("<structure>").is_err());
    assert!(Machine::from_interchange_xml("<structure><type>fa</type></structure>").is_err());
}
