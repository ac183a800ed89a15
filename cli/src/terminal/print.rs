use std::time::Duration;

use colored::*;

use hopmap_core::DiscoveredHost;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;

pub fn header(msg: &str) {
    let formatted = format!("⟦ {} ⟧", msg);
    let msg_len = formatted.chars().count();

    let dash_count = TOTAL_WIDTH.saturating_sub(msg_len);
    let left = dash_count / 2;
    let right = dash_count - left;

    println!(
        "{}{}{}",
        "─".repeat(left).color(colors::SEPARATOR),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right).color(colors::SEPARATOR)
    );
}

pub fn fat_separator() {
    println!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR));
}

pub fn status<T: AsRef<str>>(msg: T) {
    println!(
        "{} {}",
        ">".color(colors::SEPARATOR),
        msg.as_ref().color(colors::TEXT_DEFAULT)
    );
}

pub fn centerln(msg: &str) {
    let width = console::measure_text_width(msg);
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(width) / 2);
    println!("{}{}", space, msg);
}

/// Prints the ordered host table plus a summary line.
pub fn results(hosts: &[DiscoveredHost], total_time: Duration) {
    if hosts.is_empty() {
        no_results();
        return;
    }

    println!();
    for (idx, host) in hosts.iter().enumerate() {
        host_line(idx + 1, host);
    }

    let count = format!("{} hosts", hosts.len()).bold().green();
    let elapsed = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    fat_separator();
    centerln(&format!("Discovery complete: {count} in {elapsed}"));
}

fn host_line(idx: usize, host: &DiscoveredHost) {
    let index = format!("[{:>3}]", idx).color(colors::SEPARATOR);
    let addr = format!("{:<15}", host.addr.to_string()).color(colors::ADDR);
    let latency = match host.latency_ms {
        Some(ms) => format!("{:>5} ms", ms).color(colors::ACCENT),
        None => format!("{:>8}", "-").color(colors::SEPARATOR),
    };
    println!(
        "{} {} {}  {}",
        index,
        addr,
        latency,
        host.source.label().color(colors::TEXT_DEFAULT)
    );
}

pub fn no_results() {
    println!();
    centerln(&format!("{}", "zero hosts detected".red().bold()));
    fat_separator();
}
