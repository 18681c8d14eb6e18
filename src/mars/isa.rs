//! Instruction set definitions.
//!
//! The `for_each_opcode!` macro holds the canonical opcode table (variant,
//! mnemonic, operand arity) and invokes a callback macro for code generation,
//! so the enum, the mnemonic lookup, and the arity rules cannot drift apart.
//!
//! Instructions are plain value records: an opcode, two addressing modes, and
//! two signed operand fields. Operand fields are interpreted modulo the core
//! size whenever they are used as addresses.

use std::fmt;

/// How many operands an opcode takes in assembly source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Zero, one, or two operands; missing fields default to `$0`.
    UpToTwo,
    /// Exactly one operand (the A field).
    One,
    /// Exactly two operands.
    Two,
}

/// Invokes a callback macro with the complete opcode definition list.
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// Data. Kills the process that executes it; every empty cell holds one.
            Dat, "DAT", Arity::UpToTwo,
            /// Copies the source cell, or plants a `DAT` bomb when the source is immediate.
            Mov, "MOV", Arity::Two,
            /// Adds the source into the destination's operand fields.
            Add, "ADD", Arity::Two,
            /// Subtracts the source from the destination's operand fields.
            Sub, "SUB", Arity::Two,
            /// Unconditional jump.
            Jmp, "JMP", Arity::One,
            /// Jumps when the tested value is zero.
            Jmz, "JMZ", Arity::Two,
            /// Jumps when the tested value is nonzero.
            Jmn, "JMN", Arity::Two,
            /// Decrements the target's B field, jumping when it reaches zero.
            Djn, "DJN", Arity::Two,
            /// Skips the next instruction when the operands compare equal.
            Cmp, "CMP", Arity::Two,
            /// Splits off a new process at the target address.
            Spl, "SPL", Arity::One,
            /// No operation.
            Nop, "NOP", Arity::Two,
        }
    };
}

macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident, $mnemonic:literal, $arity:expr
        ),* $(,)?
    ) => {
        /// Instruction operation codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl Opcode {
            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns how many operands this opcode takes in source.
            pub const fn arity(&self) -> Arity {
                match self {
                    $( Opcode::$name => $arity, )*
                }
            }

            /// Looks up an opcode by mnemonic, case-insensitively.
            ///
            /// `SEQ` is accepted as an alias of `CMP`.
            pub fn from_mnemonic(token: &str) -> Option<Opcode> {
                let upper = token.to_ascii_uppercase();
                match upper.as_str() {
                    "SEQ" => Some(Opcode::Cmp),
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Operand addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddrMode {
    /// `#`: the operand is a literal value, not an address.
    Immediate,
    /// `$`: the operand is a PC-relative offset. Default when no sigil is given.
    #[default]
    Direct,
    /// `@`: the operand points at a cell whose B field is the final offset.
    Indirect,
    /// `<`: as indirect, but the pointer's B field is decremented first.
    Predecrement,
    /// `>`: as indirect, but the pointer's B field is incremented afterwards.
    Postincrement,
}

impl AddrMode {
    /// Returns the source sigil for this mode.
    pub const fn sigil(&self) -> char {
        match self {
            AddrMode::Immediate => '#',
            AddrMode::Direct => '$',
            AddrMode::Indirect => '@',
            AddrMode::Predecrement => '<',
            AddrMode::Postincrement => '>',
        }
    }

    /// Maps a source sigil to its addressing mode.
    pub fn from_sigil(c: char) -> Option<AddrMode> {
        match c {
            '#' => Some(AddrMode::Immediate),
            '$' => Some(AddrMode::Direct),
            '@' => Some(AddrMode::Indirect),
            '<' => Some(AddrMode::Predecrement),
            '>' => Some(AddrMode::Postincrement),
            _ => None,
        }
    }
}

impl fmt::Display for AddrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sigil())
    }
}

/// A single core instruction. Copying is bitwise; cells hold these by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub a_mode: AddrMode,
    pub b_mode: AddrMode,
    pub a: i32,
    pub b: i32,
}

impl Instruction {
    /// A `DAT #a, #b` instruction, the shape of both empty cells and bombs.
    pub const fn dat(a: i32, b: i32) -> Self {
        Instruction {
            op: Opcode::Dat,
            a_mode: AddrMode::Immediate,
            b_mode: AddrMode::Immediate,
            a,
            b,
        }
    }
}

impl Default for Instruction {
    /// `DAT #0, #0`, what every core cell starts as.
    fn default() -> Self {
        Instruction::dat(0, 0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}, {}{}",
            self.op, self.a_mode, self.a, self.b_mode, self.b
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_lookup_is_case_insensitive() {
        assert_eq!(Opcode::from_mnemonic("mov"), Some(Opcode::Mov));
        assert_eq!(Opcode::from_mnemonic("Mov"), Some(Opcode::Mov));
        assert_eq!(Opcode::from_mnemonic("MOV"), Some(Opcode::Mov));
        assert_eq!(Opcode::from_mnemonic("XYZ"), None);
    }

    #[test]
    fn seq_is_an_alias_of_cmp() {
        assert_eq!(Opcode::from_mnemonic("SEQ"), Some(Opcode::Cmp));
        assert_eq!(Opcode::from_mnemonic("seq"), Some(Opcode::Cmp));
        assert_eq!(Opcode::from_mnemonic("CMP"), Some(Opcode::Cmp));
    }

    #[test]
    fn mnemonic_round_trip() {
        for op in [
            Opcode::Dat,
            Opcode::Mov,
            Opcode::Add,
            Opcode::Sub,
            Opcode::Jmp,
            Opcode::Jmz,
            Opcode::Jmn,
            Opcode::Djn,
            Opcode::Cmp,
            Opcode::Spl,
            Opcode::Nop,
        ] {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
    }

    #[test]
    fn arities() {
        assert_eq!(Opcode::Dat.arity(), Arity::UpToTwo);
        assert_eq!(Opcode::Jmp.arity(), Arity::One);
        assert_eq!(Opcode::Spl.arity(), Arity::One);
        assert_eq!(Opcode::Mov.arity(), Arity::Two);
        assert_eq!(Opcode::Nop.arity(), Arity::Two);
    }

    #[test]
    fn sigil_round_trip() {
        for mode in [
            AddrMode::Immediate,
            AddrMode::Direct,
            AddrMode::Indirect,
            AddrMode::Predecrement,
            AddrMode::Postincrement,
        ] {
            assert_eq!(AddrMode::from_sigil(mode.sigil()), Some(mode));
        }
        assert_eq!(AddrMode::from_sigil('x'), None);
    }

    #[test]
    fn instruction_display() {
        let inst = Instruction {
            op: Opcode::Mov,
            a_mode: AddrMode::Immediate,
            b_mode: AddrMode::Direct,
            a: 0,
            b: 1,
        };
        assert_eq!(inst.to_string(), "MOV #0, $1");
        assert_eq!(Instruction::default().to_string(), "DAT #0, #0");
    }
}
