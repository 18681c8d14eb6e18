//! Error types for assembly and warrior loading.

use thiserror::Error;

/// Errors that can occur while assembling Redcode or loading a warrior.
///
/// Assembly variants carry the 1-based source line they were raised on.
/// Runtime events (process death by `DAT` or by ownership loss) are process
/// state, not errors, and never surface here.
#[derive(Debug, Error)]
pub enum MarsError {
    /// Mnemonic that is not part of the instruction set.
    #[error("line {line}: unknown opcode: {name}")]
    UnknownOpcode { line: usize, name: String },
    /// Operand that is neither a known label nor a decimal integer.
    #[error("line {line}: invalid operand: {token}")]
    InvalidOperand { line: usize, token: String },
    /// Instruction line ended before all required operands were given.
    #[error("line {line}: {mnemonic} requires {expected} operand(s), got {actual}")]
    MissingOperands {
        line: usize,
        mnemonic: String,
        expected: usize,
        actual: usize,
    },
    /// Warrior code that does not fit in the core.
    #[error("warrior {name} is {len} instructions long, core only holds {core_size}")]
    CodeTooLong {
        name: String,
        len: usize,
        core_size: usize,
    },
    /// Warrior file that could not be read.
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
