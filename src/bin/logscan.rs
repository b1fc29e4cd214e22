//! Log scanning tool for xpboard run logs.
//!
//! Usage:
//!   logscan <command> <file.jsonl> [options]
//!
//! Commands:
//!   summary <file.jsonl>           - Summarize a log file
//!   filter <file.jsonl> [options]  - Filter logs by domain/level
//!   slice <file.jsonl> <start> <end> - Extract time slice
//!
//! Options:
//!   --domain=<domain>    Filter by domain (auth,api,session,stats,ui,system,profile)
//!   --level=<level>      Minimum level (trace,debug,info,warn,error,fatal)
//!   --event=<event>      Filter by event name(s)
//!   --username=<name>    Filter by username
//!   --json               Output as JSON (default: human-readable)

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct LogEntry {
    ts: String,
    #[allow(dead_code)]
    run_id: String,
    seq: u64,
    lvl: String,
    component: String,
    event: String,
    msg: Option<String>,
    #[serde(default)]
    data: Value,
    // Promoted to top level by the logger when present
    username: Option<String>,
}

#[derive(Debug, Default)]
struct LogStats {
    total_entries: u64,
    by_level: HashMap<String, u64>,
    by_domain: HashMap<String, u64>,
    by_event: HashMap<String, u64>,
    first_ts: Option<String>,
    last_ts: Option<String>,
    first_seq: Option<u64>,
    last_seq: Option<u64>,
    // Session-specific
    sign_ins: u64,
    login_failures: u64,
    profile_loads: u64,
    load_errors: u64,
    session_writes: u64,
    session_clears: u64,
    panel_switches: u64,
    errors: u64,
}

#[derive(Debug, Clone)]
struct FilterConfig {
    domains: Option<Vec<String>>,
    min_level: Option<String>,
    events: Option<Vec<String>>,
    username: Option<String>,
}

fn level_rank(lvl: &str) -> u8 {
    match lvl.to_lowercase().as_str() {
        "trace" => 0,
        "debug" => 1,
        "info" => 2,
        "warn" => 3,
        "error" => 4,
        "fatal" => 5,
        _ => 2,
    }
}

fn parse_log_file(path: &PathBuf) -> impl Iterator<Item = (String, Option<LogEntry>)> {
    let file = File::open(path).expect("Failed to open log file");
    BufReader::new(file).lines().map(|line| {
        let line = line.unwrap_or_default();
        let parsed = serde_json::from_str::<LogEntry>(&line).ok();
        (line, parsed)
    })
}

fn cmd_summary(path: &PathBuf) {
    let mut stats = LogStats::default();

    for (line, entry) in parse_log_file(path) {
        if let Some(e) = entry {
            stats.total_entries += 1;
            *stats.by_level.entry(e.lvl.clone()).or_insert(0) += 1;
            *stats.by_domain.entry(e.component.clone()).or_insert(0) += 1;
            *stats.by_event.entry(e.event.clone()).or_insert(0) += 1;

            if stats.first_ts.is_none() {
                stats.first_ts = Some(e.ts.clone());
                stats.first_seq = Some(e.seq);
            }
            stats.last_ts = Some(e.ts.clone());
            stats.last_seq = Some(e.seq);

            match e.event.as_str() {
                "signin_ok" => stats.sign_ins += 1,
                "login_failed" | "signin_rejected" => stats.login_failures += 1,
                "profile_loaded" => stats.profile_loads += 1,
                "profile_load_failed" => stats.load_errors += 1,
                "session_saved" => stats.session_writes += 1,
                "session_cleared" => stats.session_clears += 1,
                "panel_switched" => stats.panel_switches += 1,
                _ => {}
            }
            if e.lvl == "ERROR" || e.lvl == "FATAL" {
                stats.errors += 1;
            }
        } else if !line.is_empty() {
            eprintln!("Failed to parse: {}", &line[..line.len().min(80)]);
        }
    }

    println!("=== Log Summary ===\n");
    println!("Total entries: {}", stats.total_entries);
    println!(
        "Time range: {} → {}",
        stats.first_ts.as_deref().unwrap_or("?"),
        stats.last_ts.as_deref().unwrap_or("?")
    );
    println!(
        "Sequence range: {} → {}",
        stats.first_seq.unwrap_or(0),
        stats.last_seq.unwrap_or(0)
    );

    println!("\n--- By Level ---");
    let mut levels: Vec<_> = stats.by_level.iter().collect();
    levels.sort_by_key(|(k, _)| level_rank(k));
    for (lvl, count) in levels {
        println!("  {:<8} {:>8}", lvl, count);
    }

    println!("\n--- By Domain ---");
    let mut domains: Vec<_> = stats.by_domain.iter().collect();
    domains.sort_by(|a, b| b.1.cmp(a.1));
    for (domain, count) in domains {
        println!("  {:<12} {:>8}", domain, count);
    }

    println!("\n--- Top Events ---");
    let mut events: Vec<_> = stats.by_event.iter().collect();
    events.sort_by(|a, b| b.1.cmp(a.1));
    for (event, count) in events.iter().take(15) {
        println!("  {:<24} {:>8}", event, count);
    }

    println!("\n--- Session Activity ---");
    println!("  Sign-ins:          {:>8}", stats.sign_ins);
    println!("  Login failures:    {:>8}", stats.login_failures);
    println!("  Profile loads:     {:>8}", stats.profile_loads);
    println!("  Load errors:       {:>8}", stats.load_errors);
    println!("  Session writes:    {:>8}", stats.session_writes);
    println!("  Session clears:    {:>8}", stats.session_clears);
    println!("  Panel switches:    {:>8}", stats.panel_switches);
    println!("  Errors:            {:>8}", stats.errors);
}

fn cmd_filter(path: &PathBuf, config: &FilterConfig, as_json: bool) {
    for (line, entry) in parse_log_file(path) {
        let Some(e) = entry else { continue };

        if let Some(ref min) = config.min_level {
            if level_rank(&e.lvl) < level_rank(min) {
                continue;
            }
        }

        if let Some(ref domains) = config.domains {
            if !domains.iter().any(|d| d == &e.component) {
                continue;
            }
        }

        if let Some(ref events) = config.events {
            if !events.iter().any(|ev| ev == &e.event) {
                continue;
            }
        }

        if let Some(ref name) = config.username {
            let matches = e.username.as_ref() == Some(name)
                || e.data.get("username").and_then(|v| v.as_str()) == Some(name);
            if !matches {
                continue;
            }
        }

        if as_json {
            println!("{}", line);
        } else {
            let msg = e.msg.as_deref().unwrap_or("");
            println!(
                "[{}] {} {} {} {}",
                &e.ts[11..23], // HH:MM:SS.mmm
                e.lvl,
                e.component,
                e.event,
                msg
            );
        }
    }
}

fn cmd_slice(path: &PathBuf, start: &str, end: &str) {
    for (line, entry) in parse_log_file(path) {
        let Some(e) = entry else { continue };
        if e.ts.as_str() >= start && e.ts.as_str() <= end {
            println!("{}", line);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: logscan <command> <file.jsonl> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  summary <file>              Summarize log file statistics");
    eprintln!("  filter <file> [options]     Filter and display log entries");
    eprintln!("  slice <file> <start> <end>  Extract entries in time range");
    eprintln!();
    eprintln!("Filter options:");
    eprintln!("  --domain=<d1,d2,...>   Filter by domain(s)");
    eprintln!("  --level=<level>        Minimum log level");
    eprintln!("  --event=<e1,e2,...>    Filter by event name(s)");
    eprintln!("  --username=<name>      Filter by username");
    eprintln!("  --json                 Output raw JSON lines");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = &args[1];
    let path = PathBuf::from(&args[2]);

    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    match cmd.as_str() {
        "summary" => cmd_summary(&path),
        "filter" => {
            let mut config = FilterConfig {
                domains: None,
                min_level: None,
                events: None,
                username: None,
            };
            let mut as_json = false;

            for arg in &args[3..] {
                if let Some(v) = arg.strip_prefix("--domain=") {
                    config.domains = Some(v.split(',').map(|s| s.trim().to_string()).collect());
                } else if let Some(v) = arg.strip_prefix("--level=") {
                    config.min_level = Some(v.to_string());
                } else if let Some(v) = arg.strip_prefix("--event=") {
                    config.events = Some(v.split(',').map(|s| s.trim().to_string()).collect());
                } else if let Some(v) = arg.strip_prefix("--username=") {
                    config.username = Some(v.to_string());
                } else if arg == "--json" {
                    as_json = true;
                }
            }
            cmd_filter(&path, &config, as_json);
        }
        "slice" => {
            if args.len() < 5 {
                eprintln!("Usage: logscan slice <file> <start_ts> <end_ts>");
                std::process::exit(1);
            }
            cmd_slice(&path, &args[3], &args[4]);
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
}
