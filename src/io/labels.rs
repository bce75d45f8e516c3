//! Transition-label mini-grammars, one per machine type:
//!
//! - DFA: a single symbol; empty or `ε` means ε.
//! - NFA: comma-separated symbols; empty or `ε` means ε.
//! - PDA: `input,pop;push` or `input,pop→push`; missing fields are ε.
//! - TM: `read;write,dir` or `read→write,dir` with `dir ∈ {L,R,S}`,
//!   case-insensitive.
//!
//! Formatting is the [`std::fmt::Display`] impl on
//! [`crate::core::transition::Label`]; this module owns parsing.

use crate::core::machine::MachineKind;
use crate::core::transition::{Direction, EPSILON, Label};
use crate::errors::LabelError;

/// Parses `text` under the grammar of `kind`.
pub fn parse_label(kind: MachineKind, text: &str) -> Result<Label, LabelError> {
    match kind {
        MachineKind::Dfa => parse_dfa(text),
        MachineKind::Nfa => Ok(parse_nfa(text)),
        MachineKind::Pda => parse_pda(text),
        MachineKind::Tm => parse_tm(text),
    }
}

fn is_epsilon_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == "ε"
}

/// A single optional symbol: `None` for ε.
fn parse_symbol(text: &str) -> Result<Option<char>, LabelError> {
    let trimmed = text.trim();
    if is_epsilon_text(trimmed) {
        return Ok(None);
    }
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return Ok(None);
    };
    if chars.next().is_some() {
        return Err(LabelError::new(format!(
            "expected a single symbol, found `{trimmed}`"
        )));
    }
    Ok(Some(first))
}

fn parse_dfa(text: &str) -> Result<Label, LabelError> {
    match parse_symbol(text)? {
        // DFAs forbid ε-transitions, but parsing stays permissive so the
        // editor can show the problem through validate() instead.
        None => Ok(Label::epsilon()),
        Some(symbol) => Ok(Label::Finite(vec![symbol])),
    }
}

fn parse_nfa(text: &str) -> Label {
    if is_epsilon_text(text) {
        return Label::epsilon();
    }
    let mut symbols = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        if is_epsilon_text(part) {
            continue;
        }
        for symbol in part.chars() {
            if symbol != EPSILON && !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
    }
    Label::Finite(symbols)
}

/// Splits `text` on the first `;` or `→`, the two spellings of the
/// push/write separator.
fn split_arrow(text: &str) -> Option<(&str, &str)> {
    text.split_once('→').or_else(|| text.split_once(';'))
}

fn parse_pda(text: &str) -> Result<Label, LabelError> {
    if is_epsilon_text(text) {
        return Ok(Label::Pushdown {
            read: None,
            pop: None,
            push: String::new(),
        });
    }
    let (head, push_text) = split_arrow(text).unwrap_or((text, ""));
    let (read_text, pop_text) = head.split_once(',').unwrap_or((head, ""));
    let read = parse_symbol(read_text)?;
    let pop = parse_symbol(pop_text)?;
    let push_text = push_text.trim();
    let push = if is_epsilon_text(push_text) {
        String::new()
    } else {
        push_text.chars().filter(|&c| c != EPSILON).collect()
    };
    Ok(Label::Pushdown { read, pop, push })
}

fn normalize_blank(symbol: char) -> char {
    if symbol == '_' { '□' } else { symbol }
}

fn parse_tm(text: &str) -> Result<Label, LabelError> {
    let (read_text, rest) = split_arrow(text).ok_or_else(|| {
        LabelError::new(format!("expected `read;write,dir` or `read→write,dir`, found `{text}`"))
    })?;
    let (write_text, dir_text) = rest.rsplit_once(',').ok_or_else(|| {
        LabelError::new(format!("missing direction in `{text}`"))
    })?;
    let dir_text = dir_text.trim();
    let mut dir_chars = dir_text.chars();
    let direction = dir_chars
        .next()
        .filter(|_| dir_chars.next().is_none())
        .and_then(Direction::parse)
        .ok_or_else(|| {
            LabelError::new(format!("direction must be L, R or S, found `{dir_text}`"))
        })?;
    // Blanks may be spelled □, _ or left empty.
    let read = parse_symbol(read_text)?.map_or('□', normalize_blank);
    let write = parse_symbol(write_text)?.map_or('□', normalize_blank);
    Ok(Label::Tape {
        read,
        write,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dfa_single_symbol() {
        assert_eq!(
            parse_label(MachineKind::Dfa, "a").unwrap(),
            Label::Finite(vec!['a'])
        );
        assert!(parse_label(MachineKind::Dfa, "ab").is_err());
        assert_eq!(parse_label(MachineKind::Dfa, "ε").unwrap(), Label::epsilon());
    }

    #[test]
    fn test_nfa_symbol_list() {
        assert_eq!(
            parse_nfa("a, b,c"),
            Label::Finite(vec!['a', 'b', 'c'])
        );
        assert_eq!(parse_nfa(""), Label::epsilon());
        assert_eq!(parse_nfa("ε"), Label::epsilon());
    }

    #[test]
    fn test_pda_both_arrow_spellings() {
        let expected = Label::Pushdown {
            read: Some('a'),
            pop: Some('Z'),
            push: "AZ".to_string(),
        };
        assert_eq!(parse_label(MachineKind::Pda, "a,Z;AZ").unwrap(), expected);
        assert_eq!(parse_label(MachineKind::Pda, "a,Z→AZ").unwrap(), expected);
    }

    #[test]
    fn test_pda_missing_fields_default_to_epsilon() {
        assert_eq!(
            parse_label(MachineKind::Pda, "a").unwrap(),
            Label::Pushdown {
                read: Some('a'),
                pop: None,
                push: String::new(),
            }
        );
        assert_eq!(
            parse_label(MachineKind::Pda, "ε,Z→Z").unwrap(),
            Label::Pushdown {
                read: None,
                pop: Some('Z'),
                push: "Z".to_string(),
            }
        );
    }

    #[test]
    fn test_tm_triple() {
        assert_eq!(
            parse_label(MachineKind::Tm, "0→1,R").unwrap(),
            Label::Tape {
                read: '0',
                write: '1',
                direction: Direction::Right,
            }
        );
        assert_eq!(
            parse_label(MachineKind::Tm, "0;1,r").unwrap(),
            Label::Tape {
                read: '0',
                write: '1',
                direction: Direction::Right,
            }
        );
        assert!(parse_label(MachineKind::Tm, "0→1,X").is_err());
        assert!(parse_label(MachineKind::Tm, "01R").is_err());
    }

    #[test]
    fn test_tm_blank_spellings() {
        for text in ["_→_,S", "→,S", "□→□,s"] {
            assert_eq!(
                parse_label(MachineKind::Tm, text).unwrap(),
                Label::Tape {
                    read: '□',
                    write: '□',
                    direction: Direction::Stay,
                },
                "failed on {text:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_display() {
        let label = parse_label(MachineKind::Pda, "a,Z→AZ").unwrap();
        assert_eq!(label.to_string(), "a,Z→AZ");
        let label = parse_label(MachineKind::Tm, "0;1,R").unwrap();
        assert_eq!(label.to_string(), "0→1,R");
        let label = parse_label(MachineKind::Nfa, "a,b").unwrap();
        assert_eq!(label.to_string(), "a,b");
    }
}
