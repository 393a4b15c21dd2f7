//! Application entry point and dispatch.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use chunkmem_cli::output::write_report;
use chunkmem_cli::presenter::{CliReportPresenter, JsonReportPresenter, ReportPresenter};
use chunkmem_cli::report::{ArenaSummary, FileEntry, PoolSummary, Report, ScenarioStep};
use chunkmem_cli::ui;
use chunkmem_memory::{Arena, ChunkState, Pool, PoolBlock};

use crate::clock::FrameClock;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::file;

/// Arena resets during a stress run happen every this many operations.
const STRESS_RESET_INTERVAL: u64 = 64;

/// Largest arena request issued by a stress run.
const STRESS_MAX_ARENA_REQUEST: usize = 256;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        chunkmem_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    config.validate()?;

    let mut clock = FrameClock::new();
    let start = clock.now();
    let mut report = Report::default();

    if !config.files.is_empty() {
        load_files(config, &mut report)?;
    }
    if config.scenario || !config.has_work() {
        run_scenario(config, &mut report)?;
    }
    if config.stress > 0 {
        run_stress(config, &mut report)?;
    }
    report.elapsed_secs = clock.elapsed_since(start).as_secs_f64();

    if config.json {
        JsonReportPresenter::print(&report);
    } else {
        CliReportPresenter::new(config.verbose, config.quiet).present(&report);
    }

    if let Some(ref path) = config.output {
        write_report(path, &report).map_err(AppError::from)?;
    }

    if let Some(path) = report.missing.first() {
        return Err(AppError::MissingFile(path.clone()).into());
    }
    Ok(())
}

fn load_files(config: &AppConfig, report: &mut Report) -> Result<(), AppError> {
    let mut arena = Arena::new(config.arena_bytes()?);
    for path in &config.files {
        let label = path.display().to_string();
        let Some(loaded) = file::load_as_string(&mut arena, path) else {
            report.missing.push(label);
            continue;
        };
        if loaded.is_truncated() && !config.quiet {
            ui::print_warning(&format!("short read on {label}, contents discarded"));
        }
        let first_line = loaded
            .text(&arena)
            .ok()
            .and_then(|text| text.lines().next())
            .unwrap_or_default()
            .to_string();
        report.files.push(FileEntry {
            path: label,
            bytes: loaded.len(),
            truncated: loaded.is_truncated(),
            chunk: loaded.block().chunk(),
            offset: loaded.block().offset(),
            first_line,
        });
    }
    report.arena = Some(ArenaSummary::of(&arena));
    arena.destroy();
    Ok(())
}

fn scenario_step(pool: &Pool, action: String, block: PoolBlock) -> ScenarioStep {
    let chunk = pool.chunk_of(&block);
    ScenarioStep {
        action,
        chunk,
        slot: block.slot(),
        chunk_state: pool.chunk_state(chunk).unwrap_or(ChunkState::Full),
        free_chunks: pool.free_chunks().collect(),
    }
}

/// Fill the first chunk, grow once, free the second block and allocate again.
fn run_scenario(config: &AppConfig, report: &mut Report) -> Result<(), AppError> {
    let mut pool = Pool::new(config.pool_capacity, config.elem_size, !config.no_grow);
    let mut blocks = Vec::with_capacity(config.pool_capacity + 1);

    for n in 1..=config.pool_capacity + 1 {
        let Some(block) = pool.alloc() else {
            report.pool = Some(PoolSummary::of(&pool));
            return Err(AppError::PoolExhausted(blocks.len()));
        };
        pool.bytes_mut(&block).fill(u8::try_from(n % 256).unwrap_or(0));
        report
            .scenario
            .push(scenario_step(&pool, format!("alloc #{n}"), block));
        blocks.push(block);
    }

    if let Some(&second) = blocks.get(1) {
        let chunk = pool.chunk_of(&second);
        pool.free(second);
        report.scenario.push(ScenarioStep {
            action: "free #2".into(),
            chunk,
            slot: second.slot(),
            chunk_state: pool.chunk_state(chunk).unwrap_or(ChunkState::HasFree),
            free_chunks: pool.free_chunks().collect(),
        });
        blocks.remove(1);
    }

    let next = blocks.len() + 2;
    let Some(block) = pool.alloc() else {
        report.pool = Some(PoolSummary::of(&pool));
        return Err(AppError::PoolExhausted(blocks.len()));
    };
    report
        .scenario
        .push(scenario_step(&pool, format!("alloc #{next}"), block));
    blocks.push(block);

    report.pool = Some(PoolSummary::of(&pool));
    for block in blocks {
        pool.free(block);
    }
    pool.destroy();
    Ok(())
}

/// Seeded mix of pool allocate/free and arena bump allocations.
fn run_stress(config: &AppConfig, report: &mut Report) -> Result<(), AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut arena = Arena::new(config.arena_bytes()?);
    let mut pool = Pool::new(config.pool_capacity, config.elem_size, !config.no_grow);
    let mut live: Vec<PoolBlock> = Vec::new();

    for op in 0..config.stress {
        match rng.gen_range(0..3u8) {
            0 => {
                if let Some(block) = pool.alloc() {
                    pool.bytes_mut(&block)[0] = rng.gen();
                    live.push(block);
                }
            }
            1 if !live.is_empty() => {
                let victim = rng.gen_range(0..live.len());
                pool.free(live.swap_remove(victim));
            }
            _ => {
                let size = rng.gen_range(1..=STRESS_MAX_ARENA_REQUEST);
                let block = arena.alloc(size);
                arena.bytes_mut(&block)[0] = rng.gen();
            }
        }
        if (op + 1) % STRESS_RESET_INTERVAL == 0 {
            arena.reset();
        }
    }

    tracing::debug!(
        operations = config.stress,
        live = live.len(),
        arena_chunks = arena.chunk_count(),
        pool_chunks = pool.chunk_count(),
        "stress run finished"
    );
    report.operations = config.stress;
    report.arena = Some(ArenaSummary::of(&arena));
    report.pool = Some(PoolSummary::of(&pool));

    for block in live {
        pool.free(block);
    }
    pool.destroy();
    arena.destroy();
    Ok(())
}
