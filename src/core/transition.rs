use std::fmt;

use crate::core::state::StateId;

/// Identifier type for transitions.
pub type TransitionId = u32;

/// The distinguished empty symbol.
pub const EPSILON: char = 'ε';

/// Head movement of a Turing-machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Stay,
}

impl Direction {
    /// Parses a direction letter, case-insensitively.
    #[must_use]
    pub fn parse(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            'S' => Some(Self::Stay),
            _ => None,
        }
    }

    /// Canonical single-letter form.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Stay => 'S',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Machine-type-dependent label carried by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    /// DFA/NFA: an ordered set of input symbols. Empty means ε.
    Finite(Vec<char>),
    /// PDA: input symbol, stack-read symbol and stack-write string.
    /// `None` / empty string mean ε; `push` is written top-first.
    Pushdown {
        read: Option<char>,
        pop: Option<char>,
        push: String,
    },
    /// TM: exactly one read/write/direction triple.
    Tape {
        read: char,
        write: char,
        direction: Direction,
    },
}

impl Label {
    /// A finite-automaton label over the given symbols.
    #[must_use]
    pub fn symbols(symbols: impl IntoIterator<Item = char>) -> Self {
        Self::Finite(symbols.into_iter().filter(|&c| c != EPSILON).collect())
    }

    /// The ε label for finite automata.
    #[must_use]
    pub fn epsilon() -> Self {
        Self::Finite(Vec::new())
    }

    /// Whether this is an ε-transition (finite automata only).
    #[must_use]
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Self::Finite(symbols) if symbols.is_empty())
    }

    /// Whether this label consumes `symbol` (finite automata only).
    #[must_use]
    pub fn accepts(&self, symbol: char) -> bool {
        matches!(self, Self::Finite(symbols) if symbols.contains(&symbol))
    }
}

impl fmt::Display for Label {
    /// Emits the label in the mini-grammar the editor parses:
    /// `a,b` for finite automata, `a,Z→AZ` for PDAs, `0→1,R` for TMs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(symbols) => {
                if symbols.is_empty() {
                    return write!(f, "{EPSILON}");
                }
                for (i, c) in symbols.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Self::Pushdown { read, pop, push } => {
                let read = read.unwrap_or(EPSILON);
                let pop = pop.unwrap_or(EPSILON);
                if push.is_empty() {
                    write!(f, "{read},{pop}→{EPSILON}")
                } else {
                    write!(f, "{read},{pop}→{push}")
                }
            }
            Self::Tape {
                read,
                write: w,
                direction,
            } => write!(f, "{read}→{w},{direction}"),
        }
    }
}

/// A labeled edge between two states.
///
/// Endpoints are held by identity; the owning machine resolves them on
/// access and removes the transition when either endpoint dies.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Identifier, issued by the owning machine.
    pub id: TransitionId,
    /// Source state id.
    pub from: StateId,
    /// Destination state id.
    pub to: StateId,
    /// Machine-type-dependent label.
    pub label: Label,
    /// Set for one step after the transition was taken.
    pub highlighted: bool,
    /// Editor selection flag.
    pub selected: bool,
    /// Optional curve control point for the renderer.
    pub control_point: Option<(f64, f64)>,
    /// Optional label placement offset for the renderer.
    pub label_offset: Option<(f64, f64)>,
}

impl Transition {
    /// Creates a new transition. The id is assigned when the transition is
    /// added to a machine.
    #[must_use]
    pub fn new(from: StateId, to: StateId, label: Label) -> Self {
        Self {
            id: 0,
            from,
            to,
            label,
            highlighted: false,
            selected: false,
            control_point: None,
            label_offset: None,
        }
    }
}
