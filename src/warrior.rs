//! Warrior data model and built-in sample warriors.

use crate::mars::core::Owner;
use crate::mars::isa::{AddrMode, Instruction, Opcode};

/// A Redcode program entered into a battle.
///
/// The code array is consumed at load: once a battle copies it into the core,
/// the core is the source of truth and the warrior record stays fixed. The
/// ownership tag and start address are assigned by the battle manager during
/// setup.
#[derive(Debug, Clone)]
pub struct Warrior {
    pub name: String,
    pub author: String,
    pub code: Vec<Instruction>,
    /// Ownership tag stamped on this warrior's cells and processes.
    pub color: Owner,
    /// Core address of the first instruction.
    pub start: usize,
}

impl Warrior {
    /// Creates a warrior; the battle manager fills in `color` and `start`.
    pub fn new(name: impl Into<String>, author: impl Into<String>, code: Vec<Instruction>) -> Self {
        Warrior {
            name: name.into(),
            author: author.into(),
            code,
            color: Owner::EMPTY,
            start: 0,
        }
    }
}

fn inst(op: Opcode, a_mode: AddrMode, a: i32, b_mode: AddrMode, b: i32) -> Instruction {
    Instruction {
        op,
        a_mode,
        b_mode,
        a,
        b,
    }
}

// Classic sample warriors, usable as CLI defaults and test opponents.

/// The Imp: a single instruction that copies itself one cell ahead, forever.
pub fn imp() -> Warrior {
    Warrior::new(
        "Imp",
        "A.K. Dewdney",
        vec![inst(Opcode::Mov, AddrMode::Direct, 0, AddrMode::Direct, 1)],
    )
}

/// The Dwarf: bombs every fourth cell while sitting still.
pub fn dwarf() -> Warrior {
    Warrior::new(
        "Dwarf",
        "A.K. Dewdney",
        vec![
            inst(Opcode::Add, AddrMode::Immediate, 4, AddrMode::Direct, 3),
            inst(Opcode::Mov, AddrMode::Immediate, 0, AddrMode::Indirect, 2),
            inst(Opcode::Jmp, AddrMode::Direct, -2, AddrMode::Direct, 0),
            inst(Opcode::Dat, AddrMode::Immediate, 0, AddrMode::Immediate, 0),
        ],
    )
}

/// The Stone: carries its bomb separately and strides five cells at a time.
pub fn stone() -> Warrior {
    Warrior::new(
        "Stone",
        "Core War Community",
        vec![
            inst(Opcode::Mov, AddrMode::Direct, 3, AddrMode::Indirect, 4),
            inst(Opcode::Add, AddrMode::Immediate, 5, AddrMode::Direct, 3),
            inst(Opcode::Jmp, AddrMode::Direct, -2, AddrMode::Direct, 0),
            inst(Opcode::Dat, AddrMode::Immediate, 0, AddrMode::Immediate, 0),
            inst(Opcode::Dat, AddrMode::Immediate, 0, AddrMode::Immediate, 4),
        ],
    )
}

/// The Twin Imp: splits once, then two imps march one cell apart.
pub fn twin_imp() -> Warrior {
    Warrior::new(
        "Twin Imp",
        "Core War Community",
        vec![
            inst(Opcode::Spl, AddrMode::Direct, 2, AddrMode::Direct, 0),
            inst(Opcode::Mov, AddrMode::Direct, 0, AddrMode::Direct, 1),
            inst(Opcode::Mov, AddrMode::Direct, 0, AddrMode::Direct, 1),
        ],
    )
}

/// The full built-in roster.
pub fn builtins() -> Vec<Warrior> {
    vec![imp(), dwarf(), stone(), twin_imp()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mars::assembler::assemble;

    #[test]
    fn builtins_match_their_redcode_sources() {
        let dwarf_source = "\
start:  ADD #4, ptr
        MOV #0, @ptr
        JMP start
ptr:    DAT #0, #0
";
        assert_eq!(assemble(dwarf_source).unwrap(), dwarf().code);

        let stone_source = "\
loop:   MOV bomb, @ptr
        ADD #5, ptr
        JMP loop
bomb:   DAT #0, #0
ptr:    DAT #0, #4
";
        assert_eq!(assemble(stone_source).unwrap(), stone().code);

        let twin_source = "\
        SPL second
first:  MOV $0, $1
second: MOV $0, $1
";
        assert_eq!(assemble(twin_source).unwrap(), twin_imp().code);

        assert_eq!(assemble("MOV $0, $1").unwrap(), imp().code);
    }

    #[test]
    fn new_warriors_start_unassigned() {
        let w = imp();
        assert_eq!(w.color, Owner::EMPTY);
        assert_eq!(w.start, 0);
    }

    #[test]
    fn roster_is_nonempty_and_named() {
        let roster = builtins();
        assert!(roster.len() >= 2);
        for w in &roster {
            assert!(!w.name.is_empty());
            assert!(!w.code.is_empty());
        }
    }
}
