// console.rs - Terminal rendering for one-shot mode

use colored::*;

use crate::classify::{Classification, InvocationResult, Payload};
use crate::tools::{Backend, ToolId};

pub fn print_banner(title: &str) {
    println!("{}", "═══════════════════════════════════════════════════════════════".cyan().bold());
    println!("{}", format!("  {} - OSINT toolkit", title).white().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════\n".cyan().bold());
}

pub fn print_tool_menu() {
    println!("{}", "Available tools:".cyan().bold());
    for tool in ToolId::ALL {
        let spec = tool.spec();
        let backend = match spec.backend {
            Backend::Process { program, .. } => format!("runs `{}`", program),
            Backend::Library(_) => "built-in".to_string(),
        };
        println!(
            "  {:<16} {:<24} {}",
            tool.as_str().white().bold(),
            spec.label,
            backend.dimmed()
        );
    }
}

pub fn print_warning(warning: &str) {
    println!("{}", format!("[!] {}", warning).yellow().bold());
}

pub fn print_result(result: &InvocationResult) {
    println!();
    match result.classification {
        Classification::Success if result.raw_fallback => {
            println!("{}", format!("[!] {}", result.message).yellow())
        }
        Classification::Success => println!("{}", format!("[+] {}", result.message).green().bold()),
        Classification::Empty => println!("{}", format!("[!] {}", result.message).yellow().bold()),
        Classification::Error => eprintln!("{}", format!("[-] {}", result.message).red().bold()),
    }

    match &result.payload {
        Some(Payload::Json(value)) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!("{}", pretty);
        }
        Some(Payload::Text(text)) => println!("{}", text),
        None => {}
    }

    if let Some(stderr) = &result.stderr {
        eprintln!("{}", "─── stderr ───".red());
        eprintln!("{}", stderr.red());
    }

    println!("{}", format!("    ({} ms)", result.duration_ms).dimmed());
}
