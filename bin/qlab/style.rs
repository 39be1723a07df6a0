//! Terminal styling helpers for qlab output

use console::style;
use quantum_lab::{ExperimentRun, WizardStep};

pub fn icon_success() -> String {
    style("✓").green().to_string()
}

pub fn icon_error() -> String {
    style("✗").red().to_string()
}

pub fn icon_warning() -> String {
    style("⚠").yellow().to_string()
}

pub fn icon_info() -> String {
    style("ℹ").blue().to_string()
}

pub fn print_success(msg: &str) {
    println!("  {} {}", icon_success(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", icon_error(), style(msg).red());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", icon_warning(), style(msg).yellow());
}

pub fn print_info(msg: &str) {
    println!("  {} {}", icon_info(), msg);
}

pub fn print_header(title: &str) {
    println!();
    println!(
        "{} {}",
        style(title).cyan().bold(),
        style("─".repeat(50usize.saturating_sub(title.len()))).cyan()
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!("  {} {}", style(format!("{}:", key)).dim(), value);
}

/// "Step 3/6 · Algorithm Configuration" with a dotted progress trail
pub fn print_step_banner(step: WizardStep) {
    let total = WizardStep::total_steps();
    let trail: String = WizardStep::ALL
        .iter()
        .map(|s| {
            if s.index() < step.index() {
                style("●").green().to_string()
            } else if *s == step {
                style("●").cyan().bold().to_string()
            } else {
                style("○").dim().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    println!();
    println!(
        "  {}  {} {}",
        trail,
        style(format!("Step {}/{}", step.index() + 1, total)).dim(),
        style(step.title()).bold()
    );
    println!("  {}", style("─".repeat(50)).dim());
}

/// Label shown next to every result so mock numbers are never mistaken
/// for computed ones
pub fn source_label(run: &ExperimentRun) -> String {
    if run.is_placeholder() {
        style("PLACEHOLDER DATA").black().on_yellow().bold().to_string()
    } else {
        style("LIVE").black().on_green().bold().to_string()
    }
}

pub fn format_energy(hartree: f64) -> String {
    format!("{:.6} Ha", hartree)
}

/// Boxed note, used for warnings the user must not miss
pub fn print_box(title: &str, lines: &[&str]) {
    let width = lines
        .iter()
        .map(|l| console::measure_text_width(l))
        .chain(std::iter::once(console::measure_text_width(title)))
        .max()
        .unwrap_or(0)
        + 2;

    println!("  {}", style(format!("╭{}╮", "─".repeat(width))).dim());
    println!(
        "  {} {}{} {}",
        style("│").dim(),
        style(title).bold(),
        " ".repeat(width - 2 - console::measure_text_width(title)),
        style("│").dim()
    );
    println!("  {}", style(format!("├{}┤", "─".repeat(width))).dim());
    for line in lines {
        println!(
            "  {} {}{} {}",
            style("│").dim(),
            line,
            " ".repeat(width - 2 - console::measure_text_width(line)),
            style("│").dim()
        );
    }
    println!("  {}", style(format!("╰{}╯", "─".repeat(width))).dim());
}
