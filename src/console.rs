//! Console output: banner, network table, session header and summaries

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;

use wifiprobe::{BruteforceResult, ExhaustReason, Network, Outcome, ProgressSink, ProgressSnapshot};

const SSID_WIDTH: usize = 28;

pub fn print_banner() {
    println!("\n{}", "📡 WiFiProbe v0.1.0".bold().cyan());
    println!(
        "{}\n",
        "WPA/WPA2 online wordlist attack - Educational use only".dimmed()
    );
}

pub fn print_disclaimer() {
    println!("{}", "⚖️  LEGAL DISCLAIMER".bold().yellow());
    println!("{}", "━".repeat(60).yellow());
    println!("This tool attempts to join WiFi networks with guessed passwords.");
    println!("Only use it against networks you own or are explicitly");
    println!("authorized to test. Unauthorized access to computer networks");
    println!("is illegal in most countries.");
    println!("{}", "━".repeat(60).yellow());
}

pub fn print_privilege_warning() {
    eprintln!(
        "\n{}",
        "⚠️  WARNING: Not running with administrator privileges!".yellow()
    );
    #[cfg(unix)]
    eprintln!("   Scanning and joining networks may fail. Try: {}", "sudo wifiprobe".cyan());
    #[cfg(windows)]
    eprintln!("   Scanning and joining networks may fail. Run the terminal as Administrator.");
    eprintln!();
}

fn ssid_cell(ssid: &str) -> String {
    if ssid.chars().count() > SSID_WIDTH {
        ssid.chars().take(SSID_WIDTH).collect()
    } else {
        ssid.to_string()
    }
}

fn security_cell(network: &Network) -> colored::ColoredString {
    let label = format!("{:<12}", network.security.label());
    match network.security {
        wifiprobe::Security::Open => label.green(),
        wifiprobe::Security::Enterprise => label.red(),
        wifiprobe::Security::Unknown => label.dimmed(),
        _ => label.normal(),
    }
}

pub fn print_networks(networks: &[Network]) {
    println!(
        "\n{}",
        format!(
            "{:>3}  {:<width$}  {:<6}  {:<12}  {}",
            "#",
            "SSID",
            "Signal",
            "Security",
            "BSSID",
            width = SSID_WIDTH
        )
        .bold()
    );
    println!("{}", "─".repeat(SSID_WIDTH + 50).dimmed());

    for (idx, network) in networks.iter().enumerate() {
        let bars = "▮".repeat(network.signal_bars());
        println!(
            "{:>3}  {:<width$}  {:<6}  {}  {}",
            (idx + 1).to_string().cyan(),
            ssid_cell(&network.ssid),
            bars.green(),
            security_cell(network),
            network.bssid.dimmed(),
            width = SSID_WIDTH
        );
    }

    println!("\n{}", format!("✓ Found {} networks", networks.len()).green());
}

fn local_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| String::from("unknown"))
}

pub fn print_target_header(target: &Network, wordlist: &Path) {
    println!("\n{}", "🔓 Starting online wordlist attack".bold().cyan());
    println!("  Target:   {}", target.ssid.bold());
    println!("  Security: {}", target.security);
    println!("  Wordlist: {}", wordlist.display().to_string().cyan());
    println!("  Started:  {}", local_timestamp());
    println!("{}", "  Press Ctrl+C to stop".dimmed());
}

pub fn print_summary(result: &BruteforceResult) {
    let duration_secs = result.duration.as_secs_f64();

    println!();
    match &result.outcome {
        Outcome::Succeeded(password) => {
            println!("{} {}", "✓ Password found:".bold().green(), password.bold().cyan());
            println!("\n{}", "Statistics:".bold());
            println!("  Network:  {}", result.ssid);
            println!("  Attempts: {}", result.attempts.to_string().cyan());
            println!("  Duration: {:.2}s", duration_secs);
            if let Some(speed) = result.passwords_per_second() {
                println!("  Speed:    {:.2} passwords/second", speed);
            }
        }
        Outcome::Exhausted(reason) => {
            let why = match reason {
                ExhaustReason::EndOfWordlist => "wordlist exhausted".to_string(),
                ExhaustReason::Ceiling(limit) => format!("attempt limit of {} reached", limit),
                ExhaustReason::Source(e) => format!("wordlist error: {}", e),
            };
            println!("{} ({})", "✗ Password not found".red(), why);
            print_failure_stats(result, duration_secs);

            println!("\n{}", "💡 Tips:".bold().yellow());
            println!("  - Try a larger wordlist (e.g., rockyou.txt)");
            println!("  - Resume a long run later with --resume-from {}", result.attempts);
        }
        Outcome::Aborted => {
            println!("{}", "⏹  Attack stopped by user".yellow());
            print_failure_stats(result, duration_secs);
            println!("  Resume with --resume-from {}", result.attempts);
        }
    }
}

fn print_failure_stats(result: &BruteforceResult, duration_secs: f64) {
    println!("\n{}", "Statistics:".bold());
    println!("  Network:  {}", result.ssid);
    println!("  Attempts: {}", result.attempts.to_string().cyan());
    println!("  Duration: {:.2}s", duration_secs);
}

/// Progress bar when the line count is known, spinner otherwise
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn bar_for(&mut self, snapshot: &ProgressSnapshot) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            if snapshot.total > 0 {
                let pb = ProgressBar::new(snapshot.total);
                if let Ok(style) = ProgressStyle::default_bar().template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                ) {
                    pb.set_style(style.progress_chars("█▓▒░-"));
                }
                pb
            } else {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} lines {msg}")
                {
                    pb.set_style(style);
                }
                pb.enable_steady_tick(Duration::from_millis(120));
                pb
            }
        })
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        let pb = self.bar_for(snapshot);
        pb.set_position(snapshot.attempts);
    }

    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        if let Some(pb) = self.bar.take() {
            pb.set_position(snapshot.attempts);
            pb.finish_with_message(format!("{:?}", snapshot.phase).to_lowercase());
        }
    }
}
