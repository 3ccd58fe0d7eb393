//! Terminal progress bar.

use std::io::{IsTerminal, Write};

use dispatcher::ProgressReporter;

const BAR_WIDTH: usize = 40;

/// Progress bar drawn on stderr
///
/// Renders `"<failed> failed | [####    ] done/total"`. When stderr is not a
/// terminal only the final line is written.
pub struct TerminalProgress<W: Write + Send> {
    out: W,
    total: u64,
    done: u64,
    failed: u64,
    interactive: bool,
}

impl TerminalProgress<std::io::Stderr> {
    pub fn stderr(total: usize) -> Self {
        let out = std::io::stderr();
        let interactive = out.is_terminal();
        Self::new(out, total, interactive)
    }
}

impl<W: Write + Send> TerminalProgress<W> {
    pub fn new(out: W, total: usize, interactive: bool) -> Self {
        Self {
            out,
            total: total as u64,
            done: 0,
            failed: 0,
            interactive,
        }
    }

    /// Current bar line, without the carriage return
    pub fn line(&self) -> String {
        let filled = if self.total == 0 {
            BAR_WIDTH
        } else {
            ((self.done.min(self.total) * BAR_WIDTH as u64) / self.total) as usize
        };
        format!(
            "{} failed | [{}{}] {}/{}",
            self.failed,
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            self.done,
            self.total
        )
    }

    fn draw(&mut self) {
        // a broken stderr must not end the run
        let _ = write!(self.out, "\r{}", self.line());
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ProgressReporter for TerminalProgress<W> {
    fn advance(&mut self, failed: u64) {
        self.done += 1;
        self.failed = failed;
        if self.interactive {
            self.draw();
        }
    }

    fn finish(&mut self) {
        self.draw();
        let _ = writeln!(self.out);
    }
}
