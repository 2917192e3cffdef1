/*!
 * Wordlist candidate stream
 *
 * Reads one line at a time, so memory stays bounded regardless of the
 * wordlist size. Invalid UTF-8 bytes are dropped rather than failing the
 * read.
 */

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::WordlistError;

/// One password candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based line number in the wordlist
    pub sequence: u64,
    pub secret: String,
}

/// A newline-delimited wordlist on disk
#[derive(Debug, Clone)]
pub struct Wordlist {
    path: PathBuf,
}

impl Wordlist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File, WordlistError> {
        File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WordlistError::NotFound(self.path.clone()),
            _ => WordlistError::Read {
                path: self.path.clone(),
                line: 0,
                source: e,
            },
        })
    }

    /// Stream candidates, skipping the first `resume_from` lines
    pub fn stream(&self, resume_from: u64) -> Result<Candidates<BufReader<File>>, WordlistError> {
        let file = self.open()?;
        Ok(Candidates::new(BufReader::new(file), &self.path, resume_from))
    }

    /// Number of lines, blank ones included
    pub fn count_lines(&self) -> Result<u64, WordlistError> {
        let file = self.open()?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let mut count = 0u64;
        let mut last = None;

        loop {
            let chunk = reader.fill_buf().map_err(|e| WordlistError::Read {
                path: self.path.clone(),
                line: count,
                source: e,
            })?;
            if chunk.is_empty() {
                break;
            }

            count += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
            last = chunk.last().copied();
            let len = chunk.len();
            reader.consume(len);
        }

        // Final line without a trailing newline
        if matches!(last, Some(b) if b != b'\n') {
            count += 1;
        }

        Ok(count)
    }
}

/// Lazy candidate iterator over any buffered reader
///
/// Yields `Err` at most once, then ends.
pub struct Candidates<R> {
    reader: R,
    source: PathBuf,
    skip: u64,
    line: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> Candidates<R> {
    pub fn new(reader: R, source: impl Into<PathBuf>, resume_from: u64) -> Self {
        Self {
            reader,
            source: source.into(),
            skip: resume_from,
            line: 0,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for Candidates<R> {
    type Item = Result<Candidate, WordlistError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();

            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    if self.line <= self.skip {
                        continue;
                    }

                    let text = decode_ignoring_invalid(&self.buf);
                    let secret = text.trim();
                    if secret.is_empty() {
                        continue;
                    }

                    return Some(Ok(Candidate {
                        sequence: self.line,
                        secret: secret.to_string(),
                    }));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(WordlistError::Read {
                        path: self.source.clone(),
                        line: self.line + 1,
                        source: e,
                    }));
                }
            }
        }

        None
    }
}

/// Decode UTF-8, silently dropping invalid byte sequences
fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    out.push_str(valid);
                }
                match e.error_len() {
                    Some(len) => rest = &after[len..],
                    // Truncated sequence at the end of the line
                    None => break,
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn collect(input: &[u8], resume_from: u64) -> Vec<Candidate> {
        Candidates::new(Cursor::new(input.to_vec()), "mem", resume_from)
            .map(|c| c.unwrap())
            .collect()
    }

    fn temp_wordlist(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "wifiprobe_wordlist_{}_{}.txt",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_blank_lines_skipped_but_numbered() {
        let candidates = collect(b"first\n\n   \nsecond\r\n  third  \n", 0);
        assert_eq!(
            candidates,
            vec![
                Candidate { sequence: 1, secret: "first".to_string() },
                Candidate { sequence: 4, secret: "second".to_string() },
                Candidate { sequence: 5, secret: "third".to_string() },
            ]
        );
    }

    #[test]
    fn test_resume_matches_discarded_prefix() {
        let input = b"alpha\nbravo\ncharlie\ndelta\necho\n";
        let full = collect(input, 0);

        for k in 0..=full.len() {
            let resumed = collect(input, k as u64);
            assert_eq!(resumed, full[k..].to_vec(), "resume_from = {}", k);
        }
    }

    #[test]
    fn test_resume_counts_physical_lines() {
        let candidates = collect(b"one\n\nthree\nfour\n", 2);
        assert_eq!(candidates[0].sequence, 3);
        assert_eq!(candidates[0].secret, "three");
    }

    #[test]
    fn test_no_trailing_newline() {
        let candidates = collect(b"one\ntwo", 0);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].secret, "two");
    }

    #[test]
    fn test_invalid_utf8_bytes_are_dropped() {
        let candidates = collect(b"pass\xffword1\n\xc3\xa9t\xc3\xa9\n\xe2\x82\n", 0);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].secret, "password1");
        assert_eq!(candidates[1].secret, "été");
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
            }
            self.served = true;
            let data = b"good-line\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn test_read_error_surfaces_once_then_ends() {
        let reader = BufReader::new(FailingReader { served: false });
        let mut candidates = Candidates::new(reader, "broken.txt", 0);

        assert_eq!(candidates.next().unwrap().unwrap().secret, "good-line");
        match candidates.next() {
            Some(Err(WordlistError::Read { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected read error, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(candidates.next().is_none());
        assert!(candidates.next().is_none());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let wordlist = Wordlist::new("/nonexistent/wifiprobe/words.txt");
        assert!(matches!(wordlist.stream(0), Err(WordlistError::NotFound(_))));
        assert!(matches!(wordlist.count_lines(), Err(WordlistError::NotFound(_))));
    }

    #[test]
    fn test_count_lines() {
        let path = temp_wordlist("count", b"a\n\nb\nc");
        let wordlist = Wordlist::new(&path);
        assert_eq!(wordlist.count_lines().unwrap(), 4);

        let streamed: Vec<_> = wordlist.stream(0).unwrap().collect();
        assert_eq!(streamed.len(), 3);

        let _ = std::fs::remove_file(&path);

        let empty = temp_wordlist("empty", b"");
        assert_eq!(Wordlist::new(&empty).count_lines().unwrap(), 0);
        let _ = std::fs::remove_file(&empty);
    }
}
