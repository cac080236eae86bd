use std::io::{self, Stderr, Write};

use log::debug;

/// A single line progress bar, e.g.
///
/// ```text
/// [█████████████████████████░░░░░░░░░░░░░░░░░░░░░░░░░]  50% (2/4) - Starting triangulation...
/// ```
///
/// Output errors are logged and otherwise ignored.
pub struct ConsoleProgressBar<W: Write> {
    out: W,
    bar_length: usize,
    filled: char,
    empty: char,
    last_percentage: Option<usize>,
    /// Characters written since the last line clear.
    line_width: usize,
}

impl ConsoleProgressBar<Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleProgressBar<W> {
    pub const BAR_LENGTH: usize = 50;

    pub fn new(out: W) -> Self {
        Self {
            out,
            bar_length: Self::BAR_LENGTH,
            filled: '█',
            empty: '░',
            last_percentage: None,
            line_width: 0,
        }
    }

    /// Redraws the bar, unless neither the percentage changed nor a message is given.
    pub fn update(&mut self, current: usize, total: usize, message: Option<&str>) {
        if total == 0 {
            return;
        }

        let current = current.min(total);
        let percentage = current * 100 / total;
        let message = message.filter(|message| !message.is_empty());

        if self.last_percentage == Some(percentage) && message.is_none() {
            return;
        }
        self.last_percentage = Some(percentage);

        let filled_length = current * self.bar_length / total;
        let mut line = format!(
            "[{}{}] {:>3}% ({}/{})",
            self.filled.to_string().repeat(filled_length),
            self.empty.to_string().repeat(self.bar_length - filled_length),
            percentage,
            current,
            total
        );
        if let Some(message) = message {
            line.push_str(" - ");
            line.push_str(message);
        }

        self.redraw(&line, false);
    }

    /// Replaces the bar with a check mark line.
    pub fn complete(&mut self, message: Option<&str>) {
        let line = format!("✓ {}", message.unwrap_or("Complete"));
        self.redraw(&line, true);
        self.last_percentage = None;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self, line: &str, newline: bool) {
        if let Err(e) = self.write_line(line, newline) {
            debug!("Cannot draw progress bar: {e}");
        }

        self.line_width = if newline { 0 } else { line.chars().count() };
    }

    fn write_line(&mut self, line: &str, newline: bool) -> io::Result<()> {
        write!(self.out, "\r{}\r{line}", " ".repeat(self.line_width))?;
        if newline {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}
