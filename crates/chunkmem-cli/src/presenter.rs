//! CLI report presenter.

use std::time::Duration;

use crate::output::{format_bytes, format_duration, format_number, report_json};
use crate::report::{ArenaSummary, FileEntry, PoolSummary, Report, ScenarioStep};
use crate::ui;

/// Renders a workbench report.
pub trait ReportPresenter {
    /// Present the loaded files.
    fn present_files(&self, files: &[FileEntry], missing: &[String]);

    /// Present a pool scenario trace.
    fn present_scenario(&self, steps: &[ScenarioStep]);

    /// Present allocator summaries and timing.
    fn present_summary(
        &self,
        arena: Option<&ArenaSummary>,
        pool: Option<&PoolSummary>,
        operations: u64,
        elapsed: Duration,
    );

    /// Present an error message.
    fn present_error(&self, error: &str);

    /// Present a whole report.
    fn present(&self, report: &Report) {
        if !report.files.is_empty() || !report.missing.is_empty() {
            self.present_files(&report.files, &report.missing);
        }
        if !report.scenario.is_empty() {
            self.present_scenario(&report.scenario);
        }
        self.present_summary(
            report.arena.as_ref(),
            report.pool.as_ref(),
            report.operations,
            Duration::from_secs_f64(report.elapsed_secs.max(0.0)),
        );
    }
}

/// Human-readable presenter for the terminal.
pub struct CliReportPresenter {
    verbose: bool,
    quiet: bool,
}

impl CliReportPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

impl ReportPresenter for CliReportPresenter {
    fn present_files(&self, files: &[FileEntry], missing: &[String]) {
        for path in missing {
            self.present_error(&format!("cannot open {path}"));
        }
        if self.quiet {
            for file in files {
                println!("{}\t{}", file.bytes, file.path);
            }
            return;
        }

        ui::print_header("Files");
        for file in files {
            let status = if file.truncated { " [SHORT READ]" } else { "" };
            println!(
                "  {:<40} {:>12}  chunk {} @ {}{status}",
                file.path,
                format_bytes(file.bytes),
                file.chunk,
                file.offset
            );
            if self.verbose && !file.first_line.is_empty() {
                println!("    | {}", file.first_line);
            }
        }
    }

    fn present_scenario(&self, steps: &[ScenarioStep]) {
        if self.quiet {
            for step in steps {
                println!("{}\t{}\t{}", step.action, step.chunk, step.slot);
            }
            return;
        }

        ui::print_header("Pool scenario");
        for step in steps {
            println!(
                "  {:<12} chunk {:>2} slot {:>2}  {:<8}  free chunks {:?}",
                step.action,
                step.chunk,
                step.slot,
                format!("{:?}", step.chunk_state),
                step.free_chunks
            );
        }
    }

    fn present_summary(
        &self,
        arena: Option<&ArenaSummary>,
        pool: Option<&PoolSummary>,
        operations: u64,
        elapsed: Duration,
    ) {
        if self.quiet {
            return;
        }

        if let Some(arena) = arena {
            ui::print_header("Arena");
            println!("  Capacity:    {}", format_bytes(arena.capacity));
            println!("  Chunks:      {}", arena.chunks.len());
            println!(
                "  Allocations: {}",
                format_number(arena.stats.allocations)
            );
            println!("  Growths:     {}", arena.stats.chunk_growths);
            println!("  Resets:      {}", arena.stats.resets);
            if self.verbose {
                println!("  Chunk sizes: {:?}", arena.chunks);
                println!("  Padding:     {} B", arena.stats.padding_bytes());
                println!("  Reuses:      {}", arena.stats.chunk_reuses);
            }
        }

        if let Some(pool) = pool {
            ui::print_header("Pool");
            println!("  Element:     {} B", pool.elem_size);
            println!("  Slots:       {}", format_number(pool.capacity() as u64));
            println!("  Live:        {}", format_number(pool.live as u64));
            println!(
                "  Allocations: {}",
                format_number(pool.stats.allocations)
            );
            println!("  Frees:       {}", format_number(pool.stats.frees));
            println!("  Growths:     {}", pool.stats.growths);
            println!("  Exhaustions: {}", pool.stats.exhaustions);
            if self.verbose {
                println!("  Chunk sizes: {:?}", pool.chunks);
                println!(
                    "  Recycled:    {:.1}%",
                    pool.stats.recycle_ratio() * 100.0
                );
            }
        }

        if operations > 0 {
            println!(
                "\n{} operations in {}",
                format_number(operations),
                format_duration(elapsed)
            );
        }
    }

    fn present_error(&self, error: &str) {
        ui::print_error(error);
    }
}

/// Presenter that prints the report as JSON.
pub struct JsonReportPresenter;

impl JsonReportPresenter {
    /// Print `report` as pretty JSON.
    pub fn print(report: &Report) {
        match report_json(report) {
            Ok(json) => println!("{json}"),
            Err(e) => ui::print_error(&format!("cannot encode report: {e}")),
        }
    }
}
