//! Redcode assembler.
//!
//! Translates textual Redcode into core instructions in two passes: the first
//! collects label bindings, the second emits instructions with label operands
//! resolved to PC-relative offsets. Because every resolved offset is relative,
//! the emitted sequence can be placed at any core address without relocation.
//!
//! # Syntax
//!
//! ```text
//! target: ADD #4, ptr     ; optional label, inline comment
//!         MOV #0, @ptr
//!         JMP target
//! ptr:    DAT #0, #0
//!         END
//! ```
//!
//! - Opcodes are case-insensitive; `SEQ` assembles as `CMP`
//! - Operands are an optional mode sigil (`#`, `$`, `@`, `<`, `>`) followed by
//!   a label or a signed decimal integer; `$` (direct) is the default
//! - Blank lines, `;` comment lines (including `;name` / `;author` metadata),
//!   and the `END` directive emit nothing

use crate::mars::errors::MarsError;
use crate::mars::isa::{AddrMode, Arity, Instruction, Opcode};
use std::collections::HashMap;

const COMMENT_CHAR: char = ';';
const LABEL_SEPARATOR: char = ':';

/// An instruction-bearing source line, with its 1-based line number for
/// diagnostics. Label prefixes and comments have already been stripped.
struct SourceLine<'a> {
    number: usize,
    text: &'a str,
}

/// Returns true if the line's first token is the `END` directive.
fn is_end_directive(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|tok| tok.eq_ignore_ascii_case("END"))
}

/// Assembles Redcode source into an instruction sequence.
///
/// Errors carry the 1-based source line; nothing is emitted on failure.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, MarsError> {
    // Pass 1: bind each label to the index of the instruction that follows it,
    // keeping the surviving instruction lines for the emission pass.
    let mut labels: HashMap<&str, usize> = HashMap::new();
    let mut lines: Vec<SourceLine> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = match raw.split_once(COMMENT_CHAR) {
            Some((code, _)) => code.trim(),
            None => raw.trim(),
        };
        if line.is_empty() {
            continue;
        }

        let mut text = line;
        if let Some((label, rest)) = line.split_once(LABEL_SEPARATOR) {
            // Later definitions of the same name rebind it.
            labels.insert(label.trim(), lines.len());
            text = rest.trim();
            if text.is_empty() {
                continue;
            }
        }
        if is_end_directive(text) {
            continue;
        }

        lines.push(SourceLine {
            number: index + 1,
            text,
        });
    }

    // Pass 2: parse each instruction, resolving labels relative to its index.
    let mut out = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        out.push(parse_instruction(line, index, &labels)?);
    }
    Ok(out)
}

/// Parses one instruction line into an [`Instruction`].
///
/// `index` is the position this instruction will occupy in the emitted
/// sequence; label operands resolve to `label_index - index`.
fn parse_instruction(
    line: &SourceLine<'_>,
    index: usize,
    labels: &HashMap<&str, usize>,
) -> Result<Instruction, MarsError> {
    let mut tokens: Vec<&str> = line.text.split_whitespace().collect();

    let mnemonic = tokens[0];
    let op = Opcode::from_mnemonic(mnemonic).ok_or_else(|| MarsError::UnknownOpcode {
        line: line.number,
        name: mnemonic.to_string(),
    })?;

    // Operands fused into one token ("MOV 0,1") are split back apart.
    if tokens.len() == 2 {
        if let Some((a, b)) = tokens[1].split_once(',') {
            if !a.is_empty() && !b.is_empty() {
                tokens = vec![tokens[0], a, b];
            }
        }
    }

    let mut inst = Instruction {
        op,
        a_mode: AddrMode::Direct,
        b_mode: AddrMode::Direct,
        a: 0,
        b: 0,
    };

    let given = tokens.len() - 1;
    match op.arity() {
        Arity::UpToTwo => {
            if let Some(token) = tokens.get(1) {
                (inst.a_mode, inst.a) = parse_operand(token, index, labels, line.number)?;
            }
            if let Some(token) = tokens.get(2) {
                (inst.b_mode, inst.b) = parse_operand(token, index, labels, line.number)?;
            }
        }
        Arity::One => {
            let token = tokens.get(1).ok_or_else(|| MarsError::MissingOperands {
                line: line.number,
                mnemonic: mnemonic.to_string(),
                expected: 1,
                actual: given,
            })?;
            (inst.a_mode, inst.a) = parse_operand(token, index, labels, line.number)?;
        }
        Arity::Two => {
            if given < 2 {
                return Err(MarsError::MissingOperands {
                    line: line.number,
                    mnemonic: mnemonic.to_string(),
                    expected: 2,
                    actual: given,
                });
            }
            (inst.a_mode, inst.a) = parse_operand(tokens[1], index, labels, line.number)?;
            (inst.b_mode, inst.b) = parse_operand(tokens[2], index, labels, line.number)?;
        }
    }

    Ok(inst)
}

/// Parses one operand token into its addressing mode and value.
///
/// Trailing commas are trimmed; a leading sigil selects the mode (direct by
/// default); the remainder is a label (resolved PC-relative) or an integer
/// (used verbatim).
fn parse_operand(
    token: &str,
    index: usize,
    labels: &HashMap<&str, usize>,
    line_number: usize,
) -> Result<(AddrMode, i32), MarsError> {
    let token = token.trim_end_matches(',');

    let (mode, rest) = match token.chars().next().and_then(AddrMode::from_sigil) {
        Some(mode) => (mode, &token[1..]),
        None => (AddrMode::Direct, token),
    };

    let invalid = || MarsError::InvalidOperand {
        line: line_number,
        token: token.to_string(),
    };
    if rest.is_empty() {
        return Err(invalid());
    }

    let value = match labels.get(rest) {
        Some(&target) => target as i32 - index as i32,
        None => rest.parse::<i32>().map_err(|_| invalid())?,
    };
    Ok((mode, value))
}
