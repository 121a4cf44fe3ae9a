//! Terminal output for suite progress

use std::time::Duration;

use console::style;

/// Print a passed step with how long it took
pub fn step_passed(description: &str, elapsed: Duration) {
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        description,
        style(format!("({})", format_elapsed(elapsed))).dim()
    );
}

/// Print a failed step and its error chain
pub fn step_failed(description: &str, message: &str) {
    eprintln!("{} {}: {}", style("✗").red().bold(), description, message);
}

/// Print the suite summary line
pub fn suite_passed(suite: &str, steps: usize, elapsed: Duration) {
    println!(
        "\n{} {} suite passed: {} steps in {}",
        style("✓").green().bold(),
        style(suite).bold(),
        steps,
        format_elapsed(elapsed)
    );
}

/// Print a suite header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a resource discovered or created during a step
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// `1.5s` under a minute, `2m05s` above
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
