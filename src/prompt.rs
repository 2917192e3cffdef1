//! Interactive prompts on stdin
//!
//! End of input is treated as a request to quit.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Answer to the network selection prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Quit,
    Rescan,
    /// 1-based rank in the listing, not yet range-checked
    Rank(usize),
    Invalid,
}

pub fn parse_selection(input: &str) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Selection::Quit;
    }

    match input.parse::<usize>() {
        Ok(0) => Selection::Rescan,
        Ok(rank) => Selection::Rank(rank),
        Err(_) => Selection::Invalid,
    }
}

/// Answer to the wordlist path prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathAnswer {
    Use(PathBuf),
    Missing(PathBuf),
    Empty,
}

/// Accept a path only if it names an existing regular file
pub fn check_wordlist_path(input: &str) -> PathAnswer {
    let input = input.trim();
    if input.is_empty() {
        return PathAnswer::Empty;
    }

    let path = PathBuf::from(input);
    if Path::new(input).is_file() {
        PathAnswer::Use(path)
    } else {
        PathAnswer::Missing(path)
    }
}

/// `y` or `yes`, case-insensitive; anything else declines
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// The disclaimer needs the full word
pub fn accepts_disclaimer(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Print `message` and read one line; `None` on end of input
pub fn read_line(message: &str) -> io::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn select_network() -> io::Result<Selection> {
    let answer = read_line("\nSelect network number (0 to rescan, q to quit): ")?;
    Ok(answer.map_or(Selection::Quit, |a| parse_selection(&a)))
}

/// Ask until an existing wordlist file is named; `None` on end of input
pub fn wordlist_path() -> io::Result<Option<PathBuf>> {
    loop {
        let Some(answer) = read_line("Path to wordlist file: ")? else {
            return Ok(None);
        };
        match check_wordlist_path(&answer) {
            PathAnswer::Use(path) => return Ok(Some(path)),
            PathAnswer::Missing(path) => println!("No such file: {}", path.display()),
            PathAnswer::Empty => println!("No wordlist given"),
        }
    }
}

pub fn confirm(message: &str) -> io::Result<bool> {
    let answer = read_line(&format!("{} (y/N): ", message))?;
    Ok(answer.map_or(false, |a| is_affirmative(&a)))
}
