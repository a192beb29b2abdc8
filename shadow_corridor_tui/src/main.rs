use anyhow::{Context, Result};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use shadow_corridor_core::{
    ArtifactKind, Millis, Position,
    config::Config,
    enemy::EnemyState,
    motion::MovementInput,
    session::{GameEvent, Outcome, Session},
};
use std::{
    collections::HashMap,
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;

/// Radians turned per arrow key press.
const TURN_STEP: f64 = std::f64::consts::FRAC_PI_8;

#[derive(Parser, Debug)]
#[command(version, about = "Top-down terminal driver for the shadow corridor maze", long_about = None)]
struct Args {
    /// JSON file with session tunables; missing fields keep their defaults
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Cells per maze side
    #[arg(long)]
    size: Option<usize>,

    /// World units per cell
    #[arg(long)]
    cell_size: Option<f64>,

    /// Seed for a reproducible maze and enemy behaviour
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the generated maze and exit
    #[arg(long)]
    print: bool,

    /// Write tracing output to this file
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

/// A hallucination still on screen.
struct Apparition {
    position: Position,
    expires_at: Millis,
}

struct App {
    /// The core simulation session.
    session: Session,
    rng: StdRng,
    /// Movement requested since the last tick; terminals report presses, not holds.
    input: MovementInput,
    apparitions: Vec<Apparition>,
    started: Instant,
    last_tick: Instant,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(session: Session, rng: StdRng) -> Self {
        let now = Instant::now();
        App {
            session,
            rng,
            input: MovementInput::default(),
            apparitions: Vec::new(),
            started: now,
            last_tick: now,
            should_quit: false,
        }
    }

    fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        let delta_time = self.last_tick.elapsed().as_secs_f64();
        self.last_tick = Instant::now();
        let now = self.now();

        let input = std::mem::take(&mut self.input);
        for event in self.session.tick(&input, delta_time, now, &mut self.rng) {
            match event {
                GameEvent::Hallucination {
                    position,
                    lifetime_ms,
                } => self.apparitions.push(Apparition {
                    position,
                    expires_at: now + lifetime_ms,
                }),
                GameEvent::GameOver(outcome) => info!(?outcome, "session finished"),
                _ => {}
            }
        }
        self.apparitions.retain(|a| a.expires_at > now);
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c @ ('w' | 'a' | 's' | 'd' | 'W' | 'A' | 'S' | 'D')) => {
                self.input.running |= c.is_ascii_uppercase();
                match c.to_ascii_lowercase() {
                    'w' => self.input.forward = true,
                    's' => self.input.backward = true,
                    'a' => self.input.left = true,
                    _ => self.input.right = true,
                }
            }
            KeyCode::Left => self.session.turn(TURN_STEP),
            KeyCode::Right => self.session.turn(-TURN_STEP),
            KeyCode::Char('f') => {
                self.session.toggle_flashlight();
            }
            KeyCode::Char('e') => {
                let now = self.now();
                self.session.interact(now);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "Config file does not exist: {}",
                    path.display()
                ));
            }
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<Config>(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(size) = args.size {
        config.maze_size = size;
        // Artifacts that no longer fit are dropped rather than rejected.
        config.artifact_cells.retain(|c| c.x < size && c.z < size);
    }
    if let Some(cell_size) = args.cell_size {
        config.cell_size = cell_size;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = Session::new(config, &mut rng)?;

    if args.print {
        print!("{}", session.maze().to_ascii());
        println!(
            "start: {:?}  exit: {:?}",
            session.start_cell(),
            session.exit_cell()
        );
        return Ok(());
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    let mut app = App::new(session, rng);
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal even when the loop failed
    restore_terminal(&mut terminal)?;
    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(33);

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(app.last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.last_tick.elapsed() >= tick_rate {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(frame.area());

    render_map(frame, columns[0], app);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(4),
            Constraint::Length(4),
        ])
        .split(columns[1]);

    let vitals = app.session.player().vitals;
    let health = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Health"))
        .gauge_style(Style::default().fg(Color::Red))
        .ratio((vitals.health() / 100.0).clamp(0.0, 1.0));
    frame.render_widget(health, side[0]);

    let sanity = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Sanity"))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio((vitals.sanity() / 100.0).clamp(0.0, 1.0));
    frame.render_widget(sanity, side[1]);

    render_status(frame, side[2], &app.session);

    let messages: Vec<ListItem> = app
        .session
        .messages()
        .map(|m| ListItem::new(m.to_string()))
        .collect();
    let messages = List::new(messages).block(Block::default().borders(Borders::ALL).title("Messages"));
    frame.render_widget(messages, side[3]);

    let help_text = Paragraph::new(
        "w/a/s/d move (caps: run)  ←/→ turn\nf flashlight  e interact  q/Esc quit",
    )
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, side[4]);
}

/// Renders flashlight, inventory and outcome.
fn render_status(frame: &mut Frame, area: Rect, session: &Session) {
    let flashlight = session.flashlight();
    let collected: Vec<Span> = session
        .inventory()
        .iter()
        .map(|kind| Span::styled(format!("{} ", artifact_name(*kind)), Style::default().fg(Color::Yellow)))
        .collect();
    let mut inventory = vec![Span::raw(format!(
        "Artifacts {}/{}: ",
        session.inventory().len(),
        session.artifacts().len()
    ))];
    inventory.extend(collected);

    let outcome = match session.outcome() {
        Some(Outcome::Died) => Span::styled("YOU DIED", Style::default().fg(Color::Red).bold()),
        Some(Outcome::Escaped) => Span::styled("ESCAPED", Style::default().fg(Color::Green).bold()),
        None if session.goal_reached() => Span::styled("Leaving...", Style::default().fg(Color::Green)),
        None => Span::raw(""),
    };

    let lines = vec![
        Line::from(format!(
            "Flashlight: {} (intensity {:.1}, range {:.0})",
            if flashlight.on { "on" } else { "off" },
            flashlight.intensity,
            flashlight.distance
        )),
        Line::from(format!("Distortion: {:.0}%", session.distortion() * 100.0)),
        Line::from(inventory),
        Line::from(outcome),
    ];
    let status = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn artifact_name(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Key => "key",
        ArtifactKind::Medkit => "medkit",
        ArtifactKind::Battery => "battery",
    }
}

/// Arrow glyph for a yaw where 0 faces up the screen.
fn facing_glyph(yaw: f64) -> &'static str {
    let dx = -yaw.sin();
    let dz = -yaw.cos();
    if dz.abs() >= dx.abs() {
        if dz < 0.0 { "^" } else { "v" }
    } else if dx > 0.0 {
        ">"
    } else {
        "<"
    }
}

/// Renders the maze top-down with entities overlaid on their cells.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let maze = session.maze();
    let passages = maze.passage_map();

    // Map tile of the cell containing a world position.
    let tile_of = |position: Position| {
        maze.cell_at(position)
            .map(|cell| (2 * cell.x + 1, 2 * cell.z + 1))
    };

    let mut overlay: HashMap<(usize, usize), Span<'static>> = HashMap::new();
    if let Some(tile) = tile_of(session.exit_position()) {
        overlay.insert(tile, Span::styled("X", Style::default().fg(Color::Green).bold()));
    }
    for artifact in session.artifacts().iter().filter(|a| !a.collected) {
        if let Some(tile) = tile_of(artifact.position) {
            overlay.insert(tile, Span::styled("a", Style::default().fg(Color::Yellow)));
        }
    }
    for apparition in &app.apparitions {
        if let Some(tile) = tile_of(apparition.position) {
            overlay.insert(tile, Span::styled("?", Style::default().fg(Color::Red)));
        }
    }
    for enemy in session.enemies() {
        let color = match enemy.state {
            EnemyState::Idle => Color::DarkGray,
            EnemyState::Chasing => Color::Red,
            EnemyState::Attacking => Color::Magenta,
        };
        if let Some(tile) = tile_of(enemy.position) {
            overlay.insert(tile, Span::styled("E", Style::default().fg(color).bold()));
        }
    }
    let player = session.player();
    if let Some(tile) = tile_of(player.position) {
        overlay.insert(
            tile,
            Span::styled(facing_glyph(player.facing), Style::default().fg(Color::Cyan).bold()),
        );
    }

    let mut lines: Vec<Line> = Vec::with_capacity(passages.height());
    for gz in 0..passages.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(passages.width());
        for gx in 0..passages.width() {
            if let Some(span) = overlay.remove(&(gx, gz)) {
                spans.push(span);
            } else if passages.get(gx, gz).copied().unwrap_or(false) {
                spans.push(Span::raw(" "));
            } else {
                spans.push(Span::styled("#", Style::default().fg(Color::DarkGray)));
            }
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Shadow Corridor").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
