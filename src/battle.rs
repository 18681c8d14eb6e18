//! Battle orchestration: warrior placement, cycle driving, statistics.
//!
//! The battle manager composes the core, the VM, and the warrior roster. It
//! places warriors at evenly spaced core addresses, drives the VM one cycle
//! at a time, keeps per-warrior statistics, and decides when the battle is
//! over. A tournament driver on top runs round-robin pairings.

use crate::mars::core::{Core, Owner};
use crate::mars::errors::MarsError;
use crate::mars::vm::{Vm, MAX_PROCESSES_PER_WARRIOR};
use crate::utils::log::Logger;
use crate::warrior::Warrior;
use std::time::{Duration, Instant};

/// Tunable battle parameters.
#[derive(Debug, Clone, Copy)]
pub struct BattleConfig {
    /// Number of cells in the circular core.
    pub core_size: usize,
    /// Cycle ceiling; reaching it declares a draw.
    pub max_cycles: usize,
    /// Per-warrior cap on concurrently alive processes.
    pub max_processes: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        BattleConfig {
            core_size: 8000,
            max_cycles: 80_000,
            max_processes: MAX_PROCESSES_PER_WARRIOR,
        }
    }
}

/// Final result of a battle. The index refers into the battle's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(usize),
    Draw,
}

/// Statistics collected over one battle.
#[derive(Debug)]
pub struct BattleStats {
    pub started: Instant,
    pub ended: Option<Instant>,
    /// Cycles driven so far (one VM step each).
    pub total_cycles: usize,
    /// Per-warrior high-water mark of alive processes.
    pub max_processes: Vec<usize>,
    /// Per-warrior count of instructions executed.
    pub instructions_run: Vec<usize>,
    pub outcome: Option<Outcome>,
}

impl BattleStats {
    fn new(warrior_count: usize) -> Self {
        BattleStats {
            started: Instant::now(),
            ended: None,
            total_cycles: 0,
            max_processes: vec![1; warrior_count],
            instructions_run: vec![0; warrior_count],
            outcome: None,
        }
    }

    /// Wall-clock duration of the battle so far (or in total, once ended).
    pub fn duration(&self) -> Duration {
        self.ended.unwrap_or_else(Instant::now) - self.started
    }
}

/// Runs one battle between a roster of warriors.
pub struct BattleManager {
    vm: Vm,
    warriors: Vec<Warrior>,
    stats: BattleStats,
    config: BattleConfig,
    log: Logger,
}

impl std::fmt::Debug for BattleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleManager").finish()
    }
}

impl BattleManager {
    /// Sets up a battle: assigns each warrior its ownership tag, copies its
    /// code into the core at evenly spaced start addresses, and registers
    /// one process per warrior.
    ///
    /// Fails if any warrior's code does not fit in the core.
    pub fn new(config: BattleConfig, mut warriors: Vec<Warrior>) -> Result<Self, MarsError> {
        for warrior in &warriors {
            if warrior.code.len() > config.core_size {
                return Err(MarsError::CodeTooLong {
                    name: warrior.name.clone(),
                    len: warrior.code.len(),
                    core_size: config.core_size,
                });
            }
        }

        let mut vm = Vm::with_process_cap(Core::new(config.core_size), config.max_processes);
        let log = Logger::new("battle");

        let spacing = config.core_size / warriors.len().max(1);
        for (i, warrior) in warriors.iter_mut().enumerate() {
            warrior.color = Owner::warrior(i);
            warrior.start = i * spacing;
            for (j, inst) in warrior.code.iter().enumerate() {
                vm.core_mut()
                    .write((warrior.start + j) as i64, *inst, warrior.color);
            }
            vm.add_process(warrior.color, warrior.start);
            log.info(&format!(
                "loaded {} at address {}",
                warrior.name, warrior.start
            ));
        }

        let stats = BattleStats::new(warriors.len());
        Ok(BattleManager {
            vm,
            warriors,
            stats,
            config,
            log,
        })
    }

    /// Executes one cycle and updates statistics.
    ///
    /// Returns `false` once the battle is decided: a single warrior left
    /// standing, none left, or the cycle ceiling reached.
    pub fn run_cycle(&mut self) -> bool {
        if self.stats.total_cycles >= self.config.max_cycles {
            self.finish(Outcome::Draw);
            return false;
        }

        // Account the instruction to the warrior about to run.
        if let Some(proc) = self.vm.current_process() {
            if proc.alive {
                if let Some(i) = self.warrior_index(proc.owner) {
                    self.stats.instructions_run[i] += 1;
                }
            }
        }

        self.vm.execute_cycle();
        self.stats.total_cycles += 1;

        for (i, warrior) in self.warriors.iter().enumerate() {
            let count = self.vm.alive_process_count(warrior.color);
            if count > self.stats.max_processes[i] {
                self.stats.max_processes[i] = count;
            }
        }

        let mut alive = (0..self.warriors.len())
            .filter(|&i| self.vm.is_warrior_alive(self.warriors[i].color));
        match (alive.next(), alive.next()) {
            (Some(survivor), None) => {
                self.finish(Outcome::Winner(survivor));
                false
            }
            (None, _) => {
                self.finish(Outcome::Draw);
                false
            }
            _ => true,
        }
    }

    /// Drives cycles until the battle is decided, returning the outcome.
    pub fn run_to_completion(&mut self) -> Outcome {
        while self.run_cycle() {}
        self.stats.outcome.unwrap_or(Outcome::Draw)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.stats.ended = Some(Instant::now());
        self.stats.outcome = Some(outcome);
        match outcome {
            Outcome::Winner(i) => self.log.info(&format!(
                "{} wins after {} cycles",
                self.warriors[i].name, self.stats.total_cycles
            )),
            Outcome::Draw => self
                .log
                .info(&format!("draw after {} cycles", self.stats.total_cycles)),
        }
    }

    fn warrior_index(&self, owner: Owner) -> Option<usize> {
        self.warriors.iter().position(|w| w.color == owner)
    }

    pub fn stats(&self) -> &BattleStats {
        &self.stats
    }

    pub fn warriors(&self) -> &[Warrior] {
        &self.warriors
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }
}

/// Round-robin tournament over a warrior roster.
///
/// Every warrior meets every other; each pairing is fought `rounds` times
/// with the load order alternating so neither side keeps the first move.
pub struct Tournament {
    warriors: Vec<Warrior>,
    rounds: usize,
    config: BattleConfig,
    wins: Vec<usize>,
    draws: usize,
    total_battles: usize,
}

impl Tournament {
    pub fn new(warriors: Vec<Warrior>, rounds: usize, config: BattleConfig) -> Self {
        let wins = vec![0; warriors.len()];
        Tournament {
            warriors,
            rounds,
            config,
            wins,
            draws: 0,
            total_battles: 0,
        }
    }

    /// Fights every pairing to completion and tallies the results.
    pub fn run(&mut self) -> Result<(), MarsError> {
        for i in 0..self.warriors.len() {
            for j in (i + 1)..self.warriors.len() {
                for round in 0..self.rounds {
                    // Alternate who loads first between rounds.
                    let pair = if round % 2 == 0 { [i, j] } else { [j, i] };
                    let roster = vec![
                        self.warriors[pair[0]].clone(),
                        self.warriors[pair[1]].clone(),
                    ];

                    let mut battle = BattleManager::new(self.config, roster)?;
                    match battle.run_to_completion() {
                        Outcome::Winner(slot) => self.wins[pair[slot]] += 1,
                        Outcome::Draw => self.draws += 1,
                    }
                    self.total_battles += 1;
                }
            }
        }
        Ok(())
    }

    /// Warrior indices with their win counts, best first.
    pub fn rankings(&self) -> Vec<(usize, usize)> {
        let mut ranked: Vec<(usize, usize)> = self.wins.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn warriors(&self) -> &[Warrior] {
        &self.warriors
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn total_battles(&self) -> usize {
        self.total_battles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mars::assembler::assemble;
    use crate::mars::isa::Instruction;
    use crate::warrior;

    fn warrior_from(name: &str, source: &str) -> Warrior {
        Warrior::new(name, "test", assemble(source).unwrap())
    }

    fn small_config(core_size: usize, max_cycles: usize) -> BattleConfig {
        BattleConfig {
            core_size,
            max_cycles,
            ..BattleConfig::default()
        }
    }

    #[test]
    fn setup_spaces_warriors_evenly_and_stamps_ownership() {
        let battle = BattleManager::new(
            small_config(100, 1000),
            vec![warrior::imp(), warrior::dwarf()],
        )
        .unwrap();

        let warriors = battle.warriors();
        assert_eq!(warriors[0].start, 0);
        assert_eq!(warriors[1].start, 50);
        assert_eq!(warriors[0].color, Owner::warrior(0));
        assert_eq!(warriors[1].color, Owner::warrior(1));

        let core = battle.vm().core();
        assert_eq!(core.cell(0), warriors[0].code[0]);
        assert_eq!(core.owner_at(0), warriors[0].color);
        for (j, inst) in warriors[1].code.iter().enumerate() {
            assert_eq!(core.cell((50 + j) as i64), *inst);
            assert_eq!(core.owner_at((50 + j) as i64), warriors[1].color);
        }
    }

    #[test]
    fn oversized_warriors_are_rejected() {
        let big = Warrior::new("Big", "test", vec![Instruction::default(); 11]);
        let err = BattleManager::new(small_config(10, 100), vec![big]).unwrap_err();
        assert!(matches!(
            err,
            MarsError::CodeTooLong {
                len: 11,
                core_size: 10,
                ..
            }
        ));
    }

    #[test]
    fn mutual_self_bombers_end_on_their_second_turns() {
        let roster = vec![
            warrior_from("W1", "MOV #0, $0"),
            warrior_from("W2", "MOV #0, $0"),
        ];
        let mut battle = BattleManager::new(small_config(100, 1000), roster).unwrap();

        // Each bombs its own cell on its first turn, then steps onto an empty
        // DAT on its second. W1 moves first, so it also dies first; the
        // cycle-3 tally finds W2 alone and ends the battle before W2's own
        // fatal turn comes up.
        let outcome = battle.run_to_completion();
        assert_eq!(outcome, Outcome::Winner(1));
        assert_eq!(battle.stats().total_cycles, 3);
    }

    #[test]
    fn two_self_copying_imps_draw_at_the_cycle_ceiling() {
        let roster = vec![
            warrior_from("Imp A", "MOV $0, $1"),
            warrior_from("Imp B", "MOV $0, $1"),
        ];
        let mut battle = BattleManager::new(small_config(100, 1000), roster).unwrap();

        assert_eq!(battle.run_to_completion(), Outcome::Draw);
        assert_eq!(battle.stats().total_cycles, 1000);
        assert!(battle.stats().ended.is_some());
    }

    #[test]
    fn dwarf_beats_a_sitting_target() {
        // The target bounces between two adjacent cells until a bomb lands on
        // one of them. It spans both parities, so the dwarf's stride-four
        // bombing run cannot miss forever.
        let roster = vec![
            warrior::dwarf(),
            warrior_from("Pendulum", "JMP $1\nJMP $-1"),
        ];
        let mut battle = BattleManager::new(small_config(100, 10_000), roster).unwrap();

        assert_eq!(battle.run_to_completion(), Outcome::Winner(0));
    }

    #[test]
    fn instructions_are_accounted_to_the_running_warrior() {
        let roster = vec![
            warrior_from("A", "JMP $0"),
            warrior_from("B", "JMP $0"),
        ];
        let mut battle = BattleManager::new(small_config(100, 1000), roster).unwrap();

        for _ in 0..10 {
            battle.run_cycle();
        }
        assert_eq!(battle.stats().instructions_run, vec![5, 5]);
    }

    #[test]
    fn max_process_high_water_mark_tracks_splits() {
        let roster = vec![
            warrior_from("Fork", "SPL $0"),
            warrior_from("Loop", "JMP $0"),
        ];
        let mut battle = BattleManager::new(small_config(100, 500), roster).unwrap();

        while battle.run_cycle() {}
        let stats = battle.stats();
        assert_eq!(stats.max_processes[0], MAX_PROCESSES_PER_WARRIOR);
        assert_eq!(stats.max_processes[1], 1);
    }

    #[test]
    fn alive_process_totals_stay_within_the_cap() {
        let roster = vec![
            warrior_from("Fork A", "SPL $0"),
            warrior_from("Fork B", "SPL $0"),
        ];
        let mut battle = BattleManager::new(small_config(200, 400), roster).unwrap();

        while battle.run_cycle() {
            let total: usize = battle
                .warriors()
                .iter()
                .map(|w| battle.vm().alive_process_count(w.color))
                .sum();
            assert!(total <= 2 * MAX_PROCESSES_PER_WARRIOR);
        }
    }

    #[test]
    fn tournament_tallies_every_battle() {
        let roster = vec![
            warrior::dwarf(),
            warrior_from("Pendulum", "JMP $1\nJMP $-1"),
        ];
        let mut tournament = Tournament::new(roster, 4, small_config(100, 10_000));
        tournament.run().unwrap();

        assert_eq!(tournament.total_battles(), 4);
        // The dwarf bombs the duck from either loading position.
        assert_eq!(tournament.draws(), 0);
        let rankings = tournament.rankings();
        assert_eq!(rankings[0], (0, 4));
        assert_eq!(rankings[1], (1, 0));
    }
}
