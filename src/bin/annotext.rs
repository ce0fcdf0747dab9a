use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use annotext::{
    HighlightRange, HighlightRequest, Interaction, KeywordSearch, RenderResult, RunKind, Theme,
    lines::{LinesOutput, to_lines},
    render_markup,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const USAGE: &str = "Usage: annotext <file> [--highlights <file.json>] [--search <word>]... \
                     [--select <start>..<end>] [--dump]";

struct Options {
    markup_path: PathBuf,
    highlights_path: Option<PathBuf>,
    search: KeywordSearch,
    select: Option<(usize, usize)>,
    dump: bool,
}

fn main() -> Result<()> {
    let Some(options) = parse_args(env::args().skip(1))? else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    run(options)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut markup_path = None;
    let mut highlights_path = None;
    let mut search = KeywordSearch::default();
    let mut select = None;
    let mut dump = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--highlights" => {
                let value = args.next().context("--highlights needs a file")?;
                highlights_path = Some(PathBuf::from(value));
            }
            "--search" => {
                let value = args.next().context("--search needs a keyword")?;
                search = search.with_keyword(value);
            }
            "--select" => {
                let value = args.next().context("--select needs <start>..<end>")?;
                select = Some(parse_selection(&value)?);
            }
            "--dump" => dump = true,
            "-h" | "--help" => return Ok(None),
            _ if arg.starts_with("--") => bail!("unknown option {arg}"),
            _ => markup_path = Some(PathBuf::from(arg)),
        }
    }

    let Some(markup_path) = markup_path else {
        return Ok(None);
    };
    Ok(Some(Options {
        markup_path,
        highlights_path,
        search,
        select,
        dump,
    }))
}

fn parse_selection(value: &str) -> Result<(usize, usize)> {
    let (start, end) = value
        .split_once("..")
        .with_context(|| format!("selection {value:?} is not <start>..<end>"))?;
    let start = start
        .trim()
        .parse()
        .with_context(|| format!("invalid selection start {start:?}"))?;
    let end = end
        .trim()
        .parse()
        .with_context(|| format!("invalid selection end {end:?}"))?;
    Ok((start, end))
}

fn load_highlights(path: &Path) -> Result<Vec<HighlightRange>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse highlights in {}", path.display()))
}

fn run(options: Options) -> Result<()> {
    let source = fs::read_to_string(&options.markup_path)
        .with_context(|| format!("failed to read {}", options.markup_path.display()))?;
    let highlights = match &options.highlights_path {
        Some(path) => load_highlights(path)?,
        None => Vec::new(),
    };
    let search = (!options.search.is_empty()).then_some(&options.search);

    if options.dump {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }

    let theme = Theme::default();
    let result = render_markup(&source, &highlights, search, &theme)
        .with_context(|| format!("failed to parse {}", options.markup_path.display()))?;

    if let Some((start, end)) = options.select {
        let request = HighlightRequest::from_selection(&result.flattened, start, end, None)
            .context("selection is empty")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&request).context("failed to encode request")?
        );
        return Ok(());
    }

    if options.dump {
        dump_runs(&result);
        return Ok(());
    }

    let mut app = App::new(result, theme, options.markup_path);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn dump_runs(result: &RenderResult) {
    let mut offset = 0;
    for run in &result.runs {
        let len = run.char_len();
        let mut flags = Vec::new();
        if run.style.bold {
            flags.push("bold".to_string());
        }
        if run.style.italic {
            flags.push("italic".to_string());
        }
        if run.style.underline {
            flags.push("underline".to_string());
        }
        if let Some(color) = run.style.color {
            flags.push(format!("fg=#{:02X}{:02X}{:02X}", color.r, color.g, color.b));
        }
        if let Some(color) = run.style.background_color {
            flags.push(format!(
                "bg=#{:02X}{:02X}{:02X}{:02X}",
                color.a, color.r, color.g, color.b
            ));
        }
        let interaction = match &run.interaction {
            Some(Interaction::Link { href }) => format!("link {href:?}"),
            Some(Interaction::Highlight { note: Some(note), .. }) => format!("note {note:?}"),
            Some(Interaction::Highlight { note: None, .. }) => "highlight".to_string(),
            None => String::new(),
        };
        let kind = match run.kind {
            RunKind::Text => "text",
            RunKind::LineBreak => "br",
            RunKind::HorizontalRule => "hr",
        };
        println!(
            "{offset:>6}..{:<6} {kind:<4} {:<40} {} {}",
            offset + len,
            format!("{:?}", run.text),
            flags.join(","),
            interaction
        );
        offset += len;
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
        }

        if last_tick.elapsed() >= tick_rate {
            app.prune_status_message();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct App {
    result: RenderResult,
    theme: Theme,
    file_path: PathBuf,
    layout: Option<(usize, LinesOutput)>,
    scroll_top: usize,
    last_view_height: usize,
    focused: Option<usize>,
    should_quit: bool,
    status_message: Option<(String, Instant)>,
}

impl App {
    fn new(result: RenderResult, theme: Theme, file_path: PathBuf) -> Self {
        let status = format!(
            "{} highlights, {} characters",
            result.highlights.len(),
            result.flattened.chars().count()
        );
        Self {
            result,
            theme,
            file_path,
            layout: None,
            scroll_top: 0,
            last_view_height: 1,
            focused: None,
            should_quit: false,
            status_message: Some((status, Instant::now())),
        }
    }

    fn lines_for_width(&mut self, width: usize) -> &LinesOutput {
        if self.layout.as_ref().is_some_and(|(cached, _)| *cached != width) {
            self.layout = None;
            self.focused = None;
        }
        let (_, output) = self
            .layout
            .get_or_insert_with(|| (width, to_lines(&self.result.runs, &self.theme, width)));
        output
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(vertical[0]);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];

        let viewport_height = text_area.height as usize;
        self.last_view_height = viewport_height.max(1);
        let focused = self.focused;
        let output = self.lines_for_width(text_area.width.max(1) as usize);

        let mut lines = output.lines.clone();
        let total_lines = output.total_lines;
        let focus_line = focused.and_then(|idx| output.regions.get(idx)).map(|region| {
            if let Some(line) = lines.get_mut(region.line) {
                for span in line.spans[region.spans.clone()].iter_mut() {
                    span.style = span.style.add_modifier(Modifier::REVERSED);
                }
            }
            region.line
        });

        self.adjust_scroll(total_lines, viewport_height, focus_line);

        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        let mut scrollbar_state = ScrollbarState::new(total_lines).position(self.scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        let status_text = self.status_line(total_lines);
        let status_widget = Paragraph::new(Line::from(Span::styled(status_text, Style::default())))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status_widget, vertical[1]);
    }

    fn status_line(&mut self, total_lines: usize) -> String {
        self.prune_status_message();
        if let Some((message, _)) = &self.status_message {
            return message.clone();
        }
        format!(
            "{} | Lines: {} | Tab next | Enter open | q quit",
            self.file_path.display(),
            total_lines
        )
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn adjust_scroll(&mut self, total_lines: usize, viewport_height: usize, focus: Option<usize>) {
        let viewport = viewport_height.max(1);
        let max_scroll = total_lines.saturating_sub(viewport);
        if let Some(line) = focus {
            if line < self.scroll_top {
                self.scroll_top = line;
            } else if line >= self.scroll_top + viewport {
                self.scroll_top = line.saturating_add(1).saturating_sub(viewport);
            }
        }
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
    }

    fn region_count(&self) -> usize {
        self.layout
            .as_ref()
            .map(|(_, output)| output.regions.len())
            .unwrap_or(0)
    }

    fn cycle_focus(&mut self, forward: bool) {
        let count = self.region_count();
        if count == 0 {
            self.set_status("Nothing to activate".to_string());
            return;
        }
        self.focused = Some(match (self.focused, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(idx), true) => (idx + 1) % count,
            (Some(idx), false) => (idx + count - 1) % count,
        });
    }

    fn activate(&mut self) {
        let Some(interaction) = self.focused.and_then(|idx| {
            self.layout
                .as_ref()
                .and_then(|(_, output)| output.regions.get(idx))
                .map(|region| region.interaction.clone())
        }) else {
            return;
        };
        let message = match interaction {
            Interaction::Link { href } => format!("Link: {href}"),
            Interaction::Highlight {
                text,
                note: Some(note),
            } if !note.is_empty() => format!("Note on {text:?}: {note}"),
            Interaction::Highlight { text, .. } => format!("Highlighted: {text:?}"),
        };
        self.set_status(message);
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return;
        };

        let page = self.last_view_height.saturating_sub(1).max(1);
        match (code, modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => self.should_quit = true,
            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Up, _) => self.scroll_top = self.scroll_top.saturating_sub(1),
            (KeyCode::Down, _) => self.scroll_top = self.scroll_top.saturating_add(1),
            (KeyCode::PageUp, _) => self.scroll_top = self.scroll_top.saturating_sub(page),
            (KeyCode::PageDown, _) => self.scroll_top = self.scroll_top.saturating_add(page),
            (KeyCode::Home, _) => self.scroll_top = 0,
            (KeyCode::End, _) => self.scroll_top = usize::MAX,
            (KeyCode::Tab, _) => self.cycle_focus(true),
            (KeyCode::BackTab, _) => self.cycle_focus(false),
            (KeyCode::Enter, _) => self.activate(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn collects_repeated_search_keywords() {
        let options = parse_args(args(&["doc.html", "--search", "cat", "--search", "mat", "--dump"]))
            .unwrap()
            .unwrap();
        assert_eq!(options.markup_path, PathBuf::from("doc.html"));
        assert_eq!(options.search.keywords, vec!["cat", "mat"]);
        assert!(options.dump);
    }

    #[test]
    fn missing_file_prints_usage() {
        assert!(parse_args(args(&["--dump"])).unwrap().is_none());
        assert!(parse_args(args(&["doc.html", "--bogus"])).is_err());
    }

    #[test]
    fn selection_is_two_offsets() {
        assert_eq!(parse_selection("3..9").unwrap(), (3, 9));
        assert!(parse_selection("3-9").is_err());
        assert!(parse_selection("a..9").is_err());
    }
}
