use std::io::{self, Write};

use log::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::messages::DetectionEvent;

/// Readings at or below this distance count as a detection.
pub const DETECTION_THRESHOLD_CM: i64 = 10;

/// Character display the status is rendered on.
pub trait Display {
    fn init(&mut self) -> io::Result<()>;
    fn backlight(&mut self) -> io::Result<()>;
    fn set_cursor(&mut self, col: usize, row: usize) -> io::Result<()>;
    fn print(&mut self, text: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Detected,
    Undetected,
}

impl DisplayState {
    pub fn from_distance(distance_cm: i64) -> Self {
        if distance_cm <= DETECTION_THRESHOLD_CM {
            DisplayState::Detected
        } else {
            DisplayState::Undetected
        }
    }

    fn indicator(&self) -> &'static str {
        match self {
            DisplayState::Detected => "> DETECTED",
            DisplayState::Undetected => "> UNDETECTED",
        }
    }
}

/// Character grid mirrored to a writer (stdout by default) on every print.
pub struct TerminalDisplay<W: Write> {
    out: W,
    grid: Vec<Vec<char>>,
    cursor: (usize, usize),
}

impl TerminalDisplay<io::Stdout> {
    pub fn stdout(columns: usize, rows: usize) -> Self {
        Self::new(io::stdout(), columns, rows)
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, columns: usize, rows: usize) -> Self {
        TerminalDisplay {
            out,
            grid: vec![vec![' '; columns]; rows],
            cursor: (0, 0),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.grid.iter().map(|row| row.iter().collect()).collect()
    }

    fn redraw(&mut self) -> io::Result<()> {
        let width = self.grid.first().map_or(0, Vec::len);
        let border = "-".repeat(width);
        writeln!(self.out, "+{border}+")?;
        for line in self.lines() {
            writeln!(self.out, "|{line}|")?;
        }
        writeln!(self.out, "+{border}+")?;
        self.out.flush()
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn init(&mut self) -> io::Result<()> {
        for row in self.grid.iter_mut() {
            row.fill(' ');
        }
        self.cursor = (0, 0);
        Ok(())
    }

    fn backlight(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn set_cursor(&mut self, col: usize, row: usize) -> io::Result<()> {
        if row >= self.grid.len() || col >= self.grid[row].len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cursor ({col}, {row}) is outside the display"),
            ));
        }
        self.cursor = (col, row);
        Ok(())
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        let (mut col, row) = self.cursor;
        let Some(line) = self.grid.get_mut(row) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "display has no rows",
            ));
        };
        // like a character LCD, text past the last column is dropped
        for c in text.chars() {
            if col >= line.len() {
                break;
            }
            line[col] = c;
            col += 1;
        }
        self.cursor = (col, row);
        self.redraw()
    }
}

/// Turns detection events into the two-line status view.
pub struct Presenter<D: Display> {
    display: D,
    columns: usize,
    header: String,
    state: Option<DisplayState>,
}

impl<D: Display> Presenter<D> {
    pub fn new(display: D, config: &DisplayConfig) -> Self {
        Presenter {
            display,
            columns: config.columns(),
            header: config.header(),
            state: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> Option<DisplayState> {
        self.state
    }

    #[cfg(test)]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Powers the display up and shows the boot banner.
    pub fn startup(&mut self) {
        let result = self
            .display
            .init()
            .and_then(|_| self.display.backlight())
            .and_then(|_| self.write_line(0, "> Set up"));
        if let Err(err) = result {
            warn!("Display setup failed: {:?}", err);
        }
    }

    pub fn on_detection_event(&mut self, event: &DetectionEvent) -> DisplayState {
        let state = DisplayState::from_distance(event.distance_cm);
        if state == DisplayState::Detected {
            info!(
                "[{}] [{}]: Detected object at {} cm",
                event.sensor_name, event.sensor_id, event.distance_cm
            );
        } else {
            info!(
                "[{}] [{}]: Nothing within range ({} cm)",
                event.sensor_name, event.sensor_id, event.distance_cm
            );
        }
        if self.state != Some(state) {
            debug!("Display state {:?} -> {:?}", self.state, state);
        }
        self.state = Some(state);
        self.render(state);
        state
    }

    fn render(&mut self, state: DisplayState) {
        let header = self.header.clone();
        let result = self
            .write_line(0, &header)
            .and_then(|_| self.write_line(1, state.indicator()));
        if let Err(err) = result {
            warn!("Failed to render {:?} on display: {:?}", state, err);
        }
    }

    fn write_line(&mut self, row: usize, text: &str) -> io::Result<()> {
        self.display.set_cursor(0, row)?;
        self.display
            .print(&format!("{text:<width$}", width = self.columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(distance_cm: i64) -> DetectionEvent {
        DetectionEvent {
            sensor_name: "S1".to_string(),
            sensor_id: "ID1".to_string(),
            distance_cm,
        }
    }

    fn presenter() -> Presenter<TerminalDisplay<Vec<u8>>> {
        let config = DisplayConfig::default();
        Presenter::new(
            TerminalDisplay::new(Vec::new(), config.columns(), config.rows()),
            &config,
        )
    }

    /// Display whose every operation fails.
    struct BrokenDisplay;

    impl Display for BrokenDisplay {
        fn init(&mut self) -> io::Result<()> {
            Err(io::Error::other("no device"))
        }
        fn backlight(&mut self) -> io::Result<()> {
            Err(io::Error::other("no device"))
        }
        fn set_cursor(&mut self, _col: usize, _row: usize) -> io::Result<()> {
            Err(io::Error::other("no device"))
        }
        fn print(&mut self, _text: &str) -> io::Result<()> {
            Err(io::Error::other("no device"))
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(DisplayState::from_distance(0), DisplayState::Detected);
        assert_eq!(DisplayState::from_distance(10), DisplayState::Detected);
        assert_eq!(DisplayState::from_distance(11), DisplayState::Undetected);
        assert_eq!(DisplayState::from_distance(-3), DisplayState::Detected);
        for d in 12..500 {
            assert_eq!(DisplayState::from_distance(d), DisplayState::Undetected);
        }
    }

    #[test]
    fn test_startup_banner() {
        let mut presenter = presenter();
        presenter.startup();
        assert_eq!(presenter.display().lines()[0], "> Set up        ");
        assert_eq!(presenter.state(), None);
    }

    #[test]
    fn test_renders_detected_then_undetected() {
        let mut presenter = presenter();
        assert_eq!(presenter.on_detection_event(&event(7)), DisplayState::Detected);
        assert_eq!(
            presenter.display().lines(),
            vec![" STATUS         ", "> DETECTED      "]
        );

        assert_eq!(
            presenter.on_detection_event(&event(15)),
            DisplayState::Undetected
        );
        assert_eq!(presenter.display().lines()[1], "> UNDETECTED    ");

        // a shorter indicator must not leave characters from the longer one
        presenter.on_detection_event(&event(10));
        assert_eq!(presenter.display().lines()[1], "> DETECTED      ");
        assert_eq!(presenter.state(), Some(DisplayState::Detected));
    }

    #[test]
    fn test_display_failure_is_swallowed() {
        let mut presenter = Presenter::new(BrokenDisplay, &DisplayConfig::default());
        presenter.startup();
        assert_eq!(
            presenter.on_detection_event(&event(42)),
            DisplayState::Undetected
        );
        assert_eq!(presenter.state(), Some(DisplayState::Undetected));
    }

    #[test]
    fn test_cursor_out_of_range() {
        let mut display = TerminalDisplay::new(Vec::new(), 16, 2);
        assert!(display.set_cursor(0, 2).is_err());
        assert!(display.set_cursor(16, 0).is_err());
        assert!(display.set_cursor(15, 1).is_ok());
    }

    #[test]
    fn test_print_truncates_at_edge() {
        let mut display = TerminalDisplay::new(Vec::new(), 4, 1);
        display.print("abcdef").unwrap();
        assert_eq!(display.lines(), vec!["abcd"]);
    }
}
