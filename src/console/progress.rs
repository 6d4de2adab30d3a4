use std::io::{self, Write};
use std::time::Duration;

/// Single-line text progress bar, redrawn in place with a carriage return.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    width: usize,
}

impl ProgressBar {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// `\r[=====     ] [NN%]`
    pub fn render(&self, percent: u32) -> String {
        let percent = percent.min(100);
        let filled = percent as usize * self.width / 100;

        let mut frame = String::with_capacity(self.width + 12);
        frame.push_str("\r[");
        for cell in 0..self.width {
            frame.push(if cell < filled { '=' } else { ' ' });
        }
        frame.push_str(&format!("] [{:02}%]", percent));
        frame
    }

    pub fn draw<W: Write>(&self, out: &mut W, percent: u32) -> io::Result<()> {
        out.write_all(self.render(percent).as_bytes())?;
        out.flush()
    }
}

/// Whole percent of `total` covered by `elapsed`, capped at 100. Reaches 100
/// only once `elapsed >= total`.
pub fn percent_complete(elapsed: Duration, total: Duration) -> u32 {
    if total.is_zero() {
        return 100;
    }
    let percent = elapsed.as_nanos().saturating_mul(100) / total.as_nanos();
    percent.min(100) as u32
}
