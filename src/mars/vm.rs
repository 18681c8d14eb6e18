//! MARS execution engine.
//!
//! The VM owns the process list and drives exactly one instruction per cycle,
//! rotating over all alive processes of all warriors in round-robin order. A
//! warrior with three processes therefore runs three times as often as one
//! with a single process; that asymmetry is the classic MARS fairness rule.
//!
//! Everything is single-threaded and deterministic: dead processes are reaped
//! lazily at the top of the next cycle, and the effects of each instruction
//! are fully applied before any other process runs.

use crate::mars::core::{Core, Owner};
use crate::mars::isa::{AddrMode, Instruction, Opcode};

/// Default cap on concurrently alive processes per warrior.
///
/// A `SPL` past the cap silently falls through, which keeps fork-bomb
/// warriors from growing their schedule share without bound.
pub const MAX_PROCESSES_PER_WARRIOR: usize = 64;

/// A single execution context: one program counter belonging to one warrior.
#[derive(Debug, Clone, Copy)]
pub struct Process {
    /// Tag of the warrior this process runs for.
    pub owner: Owner,
    /// Program counter: core address of the next instruction.
    pub pc: usize,
    /// Cleared when the process executes `DAT` or loses its code.
    pub alive: bool,
}

/// The Core War virtual machine (MARS).
pub struct Vm {
    core: Core,
    processes: Vec<Process>,
    /// Index of the process that runs next, kept in `[0, processes.len())`
    /// by reducing modulo the list length after every mutation.
    current: usize,
    process_cap: usize,
}

impl Vm {
    /// Creates a virtual machine over the given core.
    pub fn new(core: Core) -> Self {
        Vm::with_process_cap(core, MAX_PROCESSES_PER_WARRIOR)
    }

    /// Creates a virtual machine with a custom per-warrior process cap.
    pub fn with_process_cap(core: Core, process_cap: usize) -> Self {
        Vm {
            core,
            processes: Vec::new(),
            current: 0,
            process_cap,
        }
    }

    /// Shared access to the core, for inspection between cycles.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Mutable access to the core, for loading warriors.
    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    /// Registers a new process for a warrior at the given start address.
    pub fn add_process(&mut self, owner: Owner, pc: usize) {
        self.processes.push(Process {
            owner,
            pc,
            alive: true,
        });
    }

    /// The current process list (dead entries linger until the next cycle).
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// The process the next cycle will select, if any.
    pub fn current_process(&self) -> Option<&Process> {
        self.processes.get(self.current)
    }

    /// Returns true if the warrior has at least one alive process.
    pub fn is_warrior_alive(&self, owner: Owner) -> bool {
        self.processes.iter().any(|p| p.owner == owner && p.alive)
    }

    /// Counts the warrior's alive processes.
    pub fn alive_process_count(&self, owner: Owner) -> usize {
        self.processes
            .iter()
            .filter(|p| p.owner == owner && p.alive)
            .count()
    }

    /// Executes one cycle: reap dead processes, run one instruction for the
    /// current process, advance the round-robin cursor.
    pub fn execute_cycle(&mut self) {
        if self.processes.is_empty() {
            return;
        }

        self.processes.retain(|p| p.alive);
        if self.processes.is_empty() {
            return;
        }

        self.current %= self.processes.len();
        self.execute_instruction(self.current);
        self.current = (self.current + 1) % self.processes.len();
    }

    /// Executes a single instruction on behalf of the process at `slot`.
    fn execute_instruction(&mut self, slot: usize) {
        let mut proc = self.processes[slot];

        self.core.mark_execute(proc.pc as i64);
        let inst = self.core.read(proc.pc as i64);

        // A foreign tag on the cell means another warrior overwrote this
        // code; the process dies without executing it. Unowned cells are
        // fine: only foreign ownership kills.
        let owner = self.core.owner_at(proc.pc as i64);
        if !owner.is_empty() && owner != proc.owner {
            self.processes[slot].alive = false;
            return;
        }

        let next_pc = (proc.pc + 1) % self.core.size();

        match inst.op {
            Opcode::Dat => proc.alive = false,
            Opcode::Mov => self.op_mov(&mut proc, &inst, next_pc),
            Opcode::Add => self.op_add(&mut proc, &inst, next_pc),
            Opcode::Sub => self.op_sub(&mut proc, &inst, next_pc),
            Opcode::Jmp => self.op_jmp(&mut proc, &inst),
            Opcode::Jmz => self.op_jmz(&mut proc, &inst, next_pc, true),
            Opcode::Jmn => self.op_jmz(&mut proc, &inst, next_pc, false),
            Opcode::Djn => self.op_djn(&mut proc, &inst, next_pc),
            Opcode::Cmp => self.op_cmp(&mut proc, &inst, next_pc),
            Opcode::Spl => self.op_spl(&mut proc, &inst, next_pc, slot),
            Opcode::Nop => proc.pc = next_pc,
        }

        self.processes[slot] = proc;
    }

    /// Resolves an operand to a core address, or to its raw value for
    /// immediate mode; callers branch on immediate where semantics differ.
    ///
    /// The predecrement and postincrement modes update the pointer cell's B
    /// field; when `writing`, the update is stored back with [`Owner::EMPTY`]
    /// so pointer bookkeeping never claims the cell for anyone.
    fn resolve(&mut self, pc: usize, mode: AddrMode, operand: i32, writing: bool) -> i64 {
        let base = pc as i64 + operand as i64;
        match mode {
            AddrMode::Immediate => operand as i64,
            AddrMode::Direct => self.core.normalize(base) as i64,
            AddrMode::Indirect => {
                let pointer = self.core.normalize(base) as i64;
                let inst = self.core.read(pointer);
                self.core.normalize(pointer + inst.b as i64) as i64
            }
            AddrMode::Predecrement => {
                let pointer = self.core.normalize(base) as i64;
                let mut inst = self.core.read(pointer);
                inst.b = self.wrap_field(inst.b as i64 - 1);
                if writing {
                    self.core.write(pointer, inst, Owner::EMPTY);
                }
                self.core.normalize(pointer + inst.b as i64) as i64
            }
            AddrMode::Postincrement => {
                let pointer = self.core.normalize(base) as i64;
                let mut inst = self.core.read(pointer);
                let result = self.core.normalize(pointer + inst.b as i64) as i64;
                inst.b = self.wrap_field(inst.b as i64 + 1);
                if writing {
                    self.core.write(pointer, inst, Owner::EMPTY);
                }
                result
            }
        }
    }

    /// Reduces an operand-field value into `[0, size)`.
    fn wrap_field(&self, value: i64) -> i32 {
        self.core.normalize(value) as i32
    }

    fn op_mov(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize) {
        let src = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        let dst = self.resolve(proc.pc, inst.b_mode, inst.b, true);

        if inst.a_mode == AddrMode::Immediate {
            // Moving an immediate plants a bomb.
            self.core
                .write(dst, Instruction::dat(src as i32, 0), proc.owner);
        } else {
            let copied = self.core.read(src);
            self.core.write(dst, copied, proc.owner);
        }
        proc.pc = next_pc;
    }

    fn op_add(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize) {
        let src = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        let dst = self.resolve(proc.pc, inst.b_mode, inst.b, true);

        let mut target = self.core.read(dst);
        if inst.a_mode == AddrMode::Immediate {
            target.b = self.wrap_field(target.b as i64 + src);
        } else {
            let source = self.core.read(src);
            target.a = self.wrap_field(target.a as i64 + source.a as i64);
            target.b = self.wrap_field(target.b as i64 + source.b as i64);
        }
        self.core.write(dst, target, proc.owner);
        proc.pc = next_pc;
    }

    fn op_sub(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize) {
        let src = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        let dst = self.resolve(proc.pc, inst.b_mode, inst.b, true);

        let mut target = self.core.read(dst);
        if inst.a_mode == AddrMode::Immediate {
            target.b = self.wrap_field(target.b as i64 - src);
        } else {
            let source = self.core.read(src);
            target.a = self.wrap_field(target.a as i64 - source.a as i64);
            target.b = self.wrap_field(target.b as i64 - source.b as i64);
        }
        self.core.write(dst, target, proc.owner);
        proc.pc = next_pc;
    }

    fn op_jmp(&mut self, proc: &mut Process, inst: &Instruction) {
        let target = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        proc.pc = self.core.normalize(target);
    }

    /// Shared body of `JMZ` (`jump_if_zero`) and `JMN` (its negation).
    fn op_jmz(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize, jump_if_zero: bool) {
        let src = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        let value = if inst.a_mode == AddrMode::Immediate {
            src
        } else {
            self.core.read(src).b as i64
        };

        if (value == 0) == jump_if_zero {
            let target = self.resolve(proc.pc, inst.b_mode, inst.b, false);
            proc.pc = self.core.normalize(target);
        } else {
            proc.pc = next_pc;
        }
    }

    fn op_djn(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize) {
        // An immediate target has nothing to decrement; fall through.
        if inst.a_mode == AddrMode::Immediate {
            proc.pc = next_pc;
            return;
        }

        let src = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        let mut target = self.core.read(src);
        target.b = self.wrap_field(target.b as i64 - 1);
        self.core.write(src, target, proc.owner);

        if target.b == 0 {
            let jump = self.resolve(proc.pc, inst.b_mode, inst.b, false);
            proc.pc = self.core.normalize(jump);
        } else {
            proc.pc = next_pc;
        }
    }

    fn op_cmp(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize) {
        let a = self.resolve(proc.pc, inst.a_mode, inst.a, false);
        let b = self.resolve(proc.pc, inst.b_mode, inst.b, false);

        // Referenced cells compare on their B fields only.
        let equal = match (
            inst.a_mode == AddrMode::Immediate,
            inst.b_mode == AddrMode::Immediate,
        ) {
            (true, true) => a == b,
            (true, false) => a == self.core.read(b).b as i64,
            (false, true) => self.core.read(a).b as i64 == b,
            (false, false) => self.core.read(a).b == self.core.read(b).b,
        };

        proc.pc = if equal {
            // Skip one instruction.
            (next_pc + 1) % self.core.size()
        } else {
            next_pc
        };
    }

    fn op_spl(&mut self, proc: &mut Process, inst: &Instruction, next_pc: usize, slot: usize) {
        let target = self.resolve(proc.pc, inst.a_mode, inst.a, false);

        if self.alive_process_count(proc.owner) < self.process_cap {
            let child = Process {
                owner: proc.owner,
                pc: self.core.normalize(target),
                alive: true,
            };
            // Insert right after the current slot; the insertion position is
            // part of the scheduling contract.
            self.processes.insert(slot + 1, child);
        }
        proc.pc = next_pc;
    }
}
