use pintop_core::TargetWindowRef;

pub struct TableFormatter {
    index_width: usize,
    app_width: usize,
    title_width: usize,
    pid_width: usize,
    bounds_width: usize,
}

impl TableFormatter {
    pub fn new(windows: &[TargetWindowRef]) -> Self {
        let app_width = windows
            .iter()
            .map(|w| w.process_name.chars().count())
            .max()
            .unwrap_or(12)
            .clamp(3, 30);
        let title_width = windows
            .iter()
            .map(|w| w.title.chars().count())
            .max()
            .unwrap_or(20)
            .clamp(5, 50);

        Self {
            index_width: 3,
            app_width,
            title_width,
            pid_width: 7,
            bounds_width: 21,
        }
    }

    pub fn print_table(&self, windows: &[TargetWindowRef]) {
        println!("{}", self.border('┌', '┬', '┐'));
        println!(
            "{}",
            self.row(["#", "App", "Title", "PID", "Bounds"].map(str::to_string))
        );
        println!("{}", self.border('├', '┼', '┤'));
        for (index, window) in windows.iter().enumerate() {
            let b = window.bounds;
            println!(
                "{}",
                self.row([
                    (index + 1).to_string(),
                    window.process_name.clone(),
                    window.title.clone(),
                    window.pid.to_string(),
                    format!("{}x{} @ {},{}", b.width, b.height, b.x, b.y),
                ])
            );
        }
        println!("{}", self.border('└', '┴', '┘'));
    }

    fn widths(&self) -> [usize; 5] {
        [
            self.index_width,
            self.app_width,
            self.title_width,
            self.pid_width,
            self.bounds_width,
        ]
    }

    fn row(&self, cells: [String; 5]) -> String {
        let cells: Vec<String> = cells
            .iter()
            .zip(self.widths())
            .map(|(cell, width)| truncate(cell, width))
            .collect();
        format!("│ {} │", cells.join(" │ "))
    }

    fn border(&self, left: char, middle: char, right: char) -> String {
        let segments: Vec<String> = self.widths().iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(&middle.to_string()))
    }
}

/// Truncate a string to a maximum display width, adding "..." if truncated.
///
/// Counts characters, not bytes.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        format!("{:<width$}", s, width = max_len)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_len)
    }
}
