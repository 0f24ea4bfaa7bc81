use std::env;
use std::io::{self, IsTerminal, Write};

const LINE_WIDTH: usize = 80;
const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * 1024 * 1024;

pub(crate) fn progress_enabled() -> bool {
    match env::var("GOT_PROGRESS") {
        Ok(value) => value != "0",
        Err(_) => io::stderr().is_terminal(),
    }
}

fn scale(total: u64) -> (&'static str, u64) {
    if total > GB {
        ("GB", GB)
    } else if total > MB {
        ("MB", MB)
    } else if total > KB {
        ("KB", KB)
    } else {
        ("bytes", 1)
    }
}

/// Renders `<prefix> '<label>' <n>/<total> <unit> (<pct>%)`, keeping the tail
/// of `label` so the line fits in 80 columns.
pub(crate) fn format_transfer_line(
    prefix: &str,
    label: &str,
    transferred: u64,
    total: u64,
) -> String {
    let (unit, divider) = scale(total);
    let scaled_total = (total / divider).to_string();
    let scaled_done = transferred / divider;
    let percent = if total == 0 {
        100
    } else {
        u128::from(transferred) * 100 / u128::from(total)
    };

    // quotes, spaces, slash, parens and a three-digit percentage
    let fixed = prefix.len() + 2 * scaled_total.len() + unit.len() + 13;
    let budget = LINE_WIDTH.saturating_sub(fixed);
    let chars: Vec<char> = label.chars().collect();
    let shown: String = if fixed + chars.len() > LINE_WIDTH {
        chars[chars.len().saturating_sub(budget)..].iter().collect()
    } else {
        label.to_string()
    };
    format!("{prefix} '{shown}' {scaled_done}/{scaled_total} {unit} ({percent}%)")
}

/// Single overwritten stderr line for one upload or download.
pub struct TransferProgress {
    prefix: &'static str,
    label: String,
    total: u64,
    transferred: u64,
    enabled: bool,
    per_megabyte: bool,
    last_bucket: Option<u64>,
    drawn: bool,
}

impl TransferProgress {
    pub fn new(prefix: &'static str, label: &str, total: u64) -> Self {
        Self {
            prefix,
            label: label.to_string(),
            total,
            transferred: 0,
            enabled: progress_enabled(),
            per_megabyte: false,
            last_bucket: None,
            drawn: false,
        }
    }

    /// Only redraw when another whole megabyte has arrived, plus the last update.
    #[must_use]
    pub fn per_megabyte(mut self) -> Self {
        self.per_megabyte = true;
        self
    }

    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    pub fn advance(&mut self, bytes: u64) {
        self.transferred = self.transferred.saturating_add(bytes);
        self.draw();
    }

    pub fn finish(&mut self) {
        if self.transferred < self.total {
            self.transferred = self.total;
        }
        self.draw();
        if self.enabled && self.drawn {
            let mut stderr = io::stderr();
            let _ = stderr.write_all(b"\n");
            let _ = stderr.flush();
            self.drawn = false;
        }
    }

    fn draw(&mut self) {
        if !self.enabled {
            return;
        }
        if self.per_megabyte {
            let bucket = self.transferred / MB;
            let complete = self.transferred >= self.total;
            if self.last_bucket == Some(bucket) && !complete {
                return;
            }
            self.last_bucket = Some(bucket);
        }
        let line = format_transfer_line(self.prefix, &self.label, self.transferred, self.total);
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\r{line}");
        let _ = stderr.flush();
        self.drawn = true;
    }
}
