mod cli;
mod console;
mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cli::{Args, AttackArgs, Mode};
use console::ConsoleProgress;
use prompt::Selection;
use wifiprobe::{
    open_system_interface, select_target, spawn_reporter, CancelFlag, ConnectionProber, Network,
    OnlineBruteForcer, ScanConfig, WifiError, WifiScanner, WirelessInterface, Wordlist,
};

/// Check if the application is running with root privileges
#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Administrators can write to the system directory
#[cfg(windows)]
fn is_root() -> bool {
    let root = std::env::var("SystemRoot").unwrap_or_else(|_| String::from("C:\\Windows"));
    let marker = std::path::Path::new(&root).join("wifiprobe-admin-check.tmp");
    match std::fs::write(&marker, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&marker);
            true
        }
        Err(_) => false,
    }
}

#[cfg(not(any(unix, windows)))]
fn is_root() -> bool {
    false
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    console::print_banner();

    match args.mode {
        Some(Mode::List { json, scan_wait_ms }) => {
            let config = ScanConfig {
                scan_wait: std::time::Duration::from_millis(scan_wait_ms),
            };
            handle_list_mode(args.interface.as_deref(), config, json).await?;
        }
        Some(Mode::Attack(attack)) => {
            handle_attack_mode(args.interface.as_deref(), attack).await?;
        }
        None => {
            handle_attack_mode(args.interface.as_deref(), AttackArgs::default()).await?;
        }
    }

    Ok(())
}

fn open_interface(name: Option<&str>) -> Result<Arc<dyn WirelessInterface>> {
    open_system_interface(name).map_err(|e| {
        println!("{}", format!("❌ {}", e).red());
        println!("\n{}", "💡 Troubleshooting:".bold().yellow());
        println!("  - Ensure WiFi is enabled on your device");
        #[cfg(target_os = "linux")]
        println!("  - On Linux, install and start NetworkManager (nmcli)");
        #[cfg(target_os = "windows")]
        println!("  - On Windows, check `netsh wlan show interfaces`");
        #[cfg(target_os = "macos")]
        println!("  - On macOS, check `networksetup -listallhardwareports`");
        anyhow::Error::new(e).context("cannot open a wireless interface")
    })
}

/// Scan off the async runtime; the scanner sleeps through the scan window
async fn scan(scanner: &Arc<WifiScanner>) -> Result<Result<Vec<Network>, WifiError>> {
    let scanner = Arc::clone(scanner);
    tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .context("scan task failed")
}

/// Handle list mode - scan and display WiFi networks
async fn handle_list_mode(interface: Option<&str>, config: ScanConfig, json: bool) -> Result<()> {
    let iface = open_interface(interface)?;
    let scanner = Arc::new(WifiScanner::new(iface, config));

    if !json {
        println!("{}", "Scanning for WiFi networks...".yellow());
    }
    let networks = scan(&scanner).await?.context("failed to scan WiFi networks")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&networks)?);
    } else if networks.is_empty() {
        println!("{}", "No WiFi networks found!".red());
    } else {
        console::print_networks(&networks);
    }

    Ok(())
}

/// Handle attack mode - interactive scan, select, attack loop
async fn handle_attack_mode(interface: Option<&str>, attack: AttackArgs) -> Result<()> {
    console::print_disclaimer();
    let consent = prompt::read_line("Type 'yes' to confirm you are authorized to continue: ")?;
    if !consent.map_or(false, |a| prompt::accepts_disclaimer(&a)) {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }

    if !is_root() {
        console::print_privilege_warning();
    }

    if let Some(path) = &attack.wordlist {
        if !path.is_file() {
            anyhow::bail!("wordlist not found: {}", path.display());
        }
    }

    let iface = open_interface(interface)?;
    let scanner = Arc::new(WifiScanner::new(Arc::clone(&iface), attack.scan_config()));

    // Ctrl+C stops the running attack; outside an attack it exits
    let cancel = CancelFlag::new();
    let attacking = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        let attacking = Arc::clone(&attacking);
        ctrlc::set_handler(move || {
            if attacking.load(Ordering::SeqCst) {
                println!("\n{}", "Stopping after the current attempt...".yellow());
                cancel.cancel();
            } else {
                println!();
                std::process::exit(130);
            }
        })
        .context("failed to install Ctrl+C handler")?;
    }

    loop {
        println!("{}", "Scanning for WiFi networks...".yellow());
        let networks = match scan(&scanner).await? {
            Ok(networks) => networks,
            Err(e) if e.is_recoverable() => {
                println!("{}", format!("❌ {}", e).red());
                if prompt::confirm("Rescan?")? {
                    continue;
                }
                return Ok(());
            }
            Err(e) => return Err(e).context("wireless interface disappeared"),
        };

        if networks.is_empty() {
            println!("{}", "No WiFi networks found!".red());
            if prompt::confirm("Rescan?")? {
                continue;
            }
            return Ok(());
        }
        console::print_networks(&networks);

        let target = match prompt::select_network()? {
            Selection::Quit => return Ok(()),
            Selection::Rescan => continue,
            Selection::Invalid => {
                println!("{}", "Please enter a number, 0 or q".red());
                continue;
            }
            Selection::Rank(rank) => match select_target(&networks, rank) {
                Ok(network) => network.clone(),
                Err(e) => {
                    println!("{}", format!("❌ {}", e).red());
                    continue;
                }
            },
        };

        let wordlist_path = match &attack.wordlist {
            Some(path) => path.clone(),
            None => match prompt::wordlist_path()? {
                Some(path) => path,
                None => return Ok(()),
            },
        };

        if prompt::confirm(&format!("Test against '{}'?", target.ssid))? {
            run_session(&iface, target, Wordlist::new(wordlist_path), &attack, &cancel, &attacking)
                .await?;
        } else {
            println!("{}", "Skipped.".dimmed());
        }

        if !prompt::confirm("\nTest another network?")? {
            return Ok(());
        }
    }
}

/// One attack session: engine on a blocking thread, reporter on the runtime
async fn run_session(
    iface: &Arc<dyn WirelessInterface>,
    target: Network,
    wordlist: Wordlist,
    attack: &AttackArgs,
    cancel: &CancelFlag,
    attacking: &Arc<AtomicBool>,
) -> Result<()> {
    console::print_target_header(&target, wordlist.path());

    let forcer = OnlineBruteForcer::new(target, attack.attack_config());
    let reporter = spawn_reporter(forcer.progress(), attack.reporter_config(), ConsoleProgress::new());
    let mut prober = ConnectionProber::new(Arc::clone(iface), attack.probe_config());

    cancel.reset();
    attacking.store(true, Ordering::SeqCst);
    let session_cancel = cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        forcer.crack_wordlist(&wordlist, &mut prober, &session_cancel)
    })
    .await;
    attacking.store(false, Ordering::SeqCst);

    let outcome = outcome.context("attack task failed")?;
    if let Err(e) = reporter.await {
        log::warn!("Progress reporter failed: {}", e);
    }

    match outcome {
        Ok(result) => console::print_summary(&result),
        Err(e) => println!("{}", format!("❌ {}", e).red()),
    }

    Ok(())
}
