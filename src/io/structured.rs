//! The structured serialization form: a plain record that round-trips
//! every core field of a machine, and the JSON convenience wrappers the
//! document store uses.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::machine::{Machine, MachineKind, PdaOptions, TmOptions, Variant};
use crate::core::state::{State, StateId};
use crate::core::transition::{Direction, Label, Transition, TransitionId};
use crate::errors::SerializationError;

/// Serialized state record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredState {
    pub id: StateId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_halt: bool,
}

/// Serialized transition record. Per-kind fields are optional and omitted
/// when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTransition {
    pub id: TransitionId,
    pub from_state: StateId,
    pub to_state: StateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_read: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_write: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_symbol: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_symbol: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_point: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_offset: Option<(f64, f64)>,
}

/// Serialized machine record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredMachine {
    #[serde(rename = "type")]
    pub kind: String,
    pub states: Vec<StructuredState>,
    pub transitions: Vec<StructuredTransition>,
    #[serde(default)]
    pub alphabet: Vec<char>,
    #[serde(default)]
    pub initial_state_id: Option<StateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blank_symbol: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tape_alphabet: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_stack_symbol: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_by_final_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_by_empty_stack: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_alphabet: Option<Vec<char>>,
}

impl Machine {
    /// Serializes the model (not the run state) into the structured form.
    #[must_use]
    pub fn to_structured(&self) -> StructuredMachine {
        let states = self
            .states()
            .map(|s| StructuredState {
                id: s.id,
                name: s.name.clone(),
                x: s.x,
                y: s.y,
                is_initial: s.is_initial,
                is_final: s.is_final,
                is_halt: s.is_halt,
            })
            .collect();
        let transitions = self.transitions().map(structured_transition).collect();

        let mut structured = StructuredMachine {
            kind: self.kind().tag().to_string(),
            states,
            transitions,
            alphabet: self.alphabet().iter().copied().collect(),
            initial_state_id: self.initial(),
            blank_symbol: None,
            tape_alphabet: None,
            initial_stack_symbol: None,
            accept_by_final_state: None,
            accept_by_empty_stack: None,
            stack_alphabet: None,
        };
        if let Some(options) = self.pda_options() {
            structured.initial_stack_symbol = Some(options.initial_stack_symbol);
            structured.accept_by_final_state = Some(options.accept_by_final_state);
            structured.accept_by_empty_stack = Some(options.accept_by_empty_stack);
            structured.stack_alphabet = Some(derive_stack_alphabet(self, options));
        }
        if let Some(options) = self.tm_options() {
            structured.blank_symbol = Some(options.blank);
            structured.tape_alphabet = Some(derive_tape_alphabet(self, options));
        }
        structured
    }

    /// Reconstructs a machine from the structured form: rebuilds state
    /// identity, rewires endpoints, repopulates the alphabet and resets
    /// identity counters past the largest loaded id.
    ///
    /// Loading never records a history entry.
    pub fn from_structured(
        structured: &StructuredMachine,
    ) -> Result<Machine, SerializationError> {
        let kind = MachineKind::from_tag(&structured.kind)
            .ok_or_else(|| SerializationError::UnknownMachineType(structured.kind.clone()))?;
        let mut machine = Machine::new(kind);

        if kind == MachineKind::Pda {
            machine.set_variant(Variant::Pda(PdaOptions {
                initial_stack_symbol: structured.initial_stack_symbol.unwrap_or('Z'),
                accept_by_final_state: structured.accept_by_final_state.unwrap_or(true),
                accept_by_empty_stack: structured.accept_by_empty_stack.unwrap_or(false),
            }));
        }
        if kind == MachineKind::Tm {
            machine.set_variant(Variant::Tm(TmOptions {
                blank: structured.blank_symbol.unwrap_or('□'),
            }));
        }

        // The initial pointer prefers the explicit field; otherwise the
        // first flagged state wins and extra flags are dropped.
        let flagged = structured.states.iter().find(|s| s.is_initial).map(|s| s.id);
        let initial = structured
            .initial_state_id
            .filter(|id| structured.states.iter().any(|s| s.id == *id))
            .or(flagged);

        let mut seen_states = HashSet::new();
        for record in &structured.states {
            if !seen_states.insert(record.id) {
                return Err(SerializationError::DuplicateStateId(record.id));
            }
            let mut state = State::new(record.name.clone(), record.x, record.y);
            state.id = record.id;
            state.is_initial = initial == Some(record.id);
            state.is_final = record.is_final;
            state.is_halt = record.is_halt;
            machine.insert_state_raw(state);
        }

        let mut seen_transitions = HashSet::new();
        for record in &structured.transitions {
            if !seen_transitions.insert(record.id) {
                return Err(SerializationError::DuplicateTransitionId(record.id));
            }
            for endpoint in [record.from_state, record.to_state] {
                if machine.state(endpoint).is_none() {
                    return Err(SerializationError::DanglingEndpoint {
                        transition: record.id,
                        state: endpoint,
                    });
                }
            }
            let label = label_from_record(kind, record)?;
            let mut transition = Transition::new(record.from_state, record.to_state, label);
            transition.id = record.id;
            transition.control_point = record.control_point;
            transition.label_offset = record.label_offset;
            machine.insert_transition_raw(transition);
        }

        machine.rebuild_alphabet();
        Ok(machine)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(&self.to_structured())?)
    }

    /// Loads from the JSON form of the structured record.
    pub fn from_json(text: &str) -> Result<Machine, SerializationError> {
        let structured: StructuredMachine = serde_json::from_str(text)?;
        Machine::from_structured(&structured)
    }
}

fn structured_transition(transition: &Transition) -> StructuredTransition {
    let mut record = StructuredTransition {
        id: transition.id,
        from_state: transition.from,
        to_state: transition.to,
        symbols: None,
        stack_read: None,
        stack_write: None,
        read_symbol: None,
        write_symbol: None,
        direction: None,
        control_point: transition.control_point,
        label_offset: transition.label_offset,
    };
    match &transition.label {
        Label::Finite(symbols) => {
            record.symbols = Some(symbols.clone());
        }
        Label::Pushdown { read, pop, push } => {
            record.symbols = Some(read.iter().copied().collect());
            record.stack_read = *pop;
            if !push.is_empty() {
                record.stack_write = Some(push.clone());
            }
        }
        Label::Tape {
            read,
            write,
            direction,
        } => {
            record.read_symbol = Some(*read);
            record.write_symbol = Some(*write);
            record.direction = Some(direction.as_char());
        }
    }
    record
}

fn label_from_record(
    kind: MachineKind,
    record: &StructuredTransition,
) -> Result<Label, SerializationError> {
    match kind {
        MachineKind::Dfa | MachineKind::Nfa => Ok(Label::Finite(
            record.symbols.clone().unwrap_or_default(),
        )),
        MachineKind::Pda => Ok(Label::Pushdown {
            read: record.symbols.as_ref().and_then(|s| s.first().copied()),
            pop: record.stack_read,
            push: record.stack_write.clone().unwrap_or_default(),
        }),
        MachineKind::Tm => {
            let read = record
                .read_symbol
                .ok_or(SerializationError::MissingField("readSymbol"))?;
            let write = record
                .write_symbol
                .ok_or(SerializationError::MissingField("writeSymbol"))?;
            let direction_char = record
                .direction
                .ok_or(SerializationError::MissingField("direction"))?;
            let direction = Direction::parse(direction_char).ok_or_else(|| {
                SerializationError::InvalidValue {
                    what: "direction",
                    value: direction_char.to_string(),
                }
            })?;
            Ok(Label::Tape {
                read,
                write,
                direction,
            })
        }
    }
}

fn derive_stack_alphabet(machine: &Machine, options: &PdaOptions) -> Vec<char> {
    let mut symbols = BTreeSet::new();
    symbols.insert(options.initial_stack_symbol);
    for transition in machine.transitions() {
        if let Label::Pushdown { pop, push, .. } = &transition.label {
            if let Some(c) = pop {
                symbols.insert(*c);
            }
            symbols.extend(push.chars());
        }
    }
    symbols.into_iter().collect()
}

fn derive_tape_alphabet(machine: &Machine, options: &TmOptions) -> Vec<char> {
    let mut symbols = BTreeSet::new();
    symbols.insert(options.blank);
    for transition in machine.transitions() {
        if let Label::Tape { read, write, .. } = &transition.label {
            symbols.insert(*read);
            symbols.insert(*write);
        }
    }
    symbols.into_iter().collect()
}
