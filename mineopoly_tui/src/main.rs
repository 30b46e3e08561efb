use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mineopoly_core::{
    GreedyMiner, ItemType, MatchConfig, MatchEngine, MinerStrategy, PlayerSide, Position,
    RandomMiner, TileType,
    environment::{TurnOutcome, generate_board, load_board_from_string},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Opponent {
    Greedy,
    Random,
}

#[derive(Parser, Debug)]
#[command(version, about = "Watch a greedy miner play a round of Mineopoly", long_about = None)]
struct Args {
    /// Map file to load. A random board is generated when omitted.
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// JSON match configuration
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Overrides the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the configured size of generated boards
    #[arg(long)]
    board_size: Option<usize>,

    /// Strategy playing Blue
    #[arg(long, value_enum, default_value_t = Opponent::Random)]
    opponent: Opponent,

    /// Milliseconds between turns
    #[arg(long, default_value_t = 150)]
    tick_ms: u64,

    /// Write debug logs to this file
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

struct App {
    /// The match being played.
    engine: MatchEngine,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Stops automatic turns; `n` still steps.
    paused: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str::<MatchConfig>(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => MatchConfig::default(),
        };
        if let Some(seed) = args.seed {
            config.seed = seed;
        }
        if let Some(board_size) = args.board_size {
            config.board_size = board_size;
        }

        let board = match &args.map {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading map {}", path.display()))?;
                load_board_from_string(&text)?
            }
            None => generate_board(config.board_size, config.seed, config.resource_density)?,
        };

        let blue: Box<dyn MinerStrategy> = match args.opponent {
            Opponent::Greedy => Box::new(GreedyMiner::new()),
            Opponent::Random => Box::new(RandomMiner::new()),
        };
        let engine = MatchEngine::new(board, config, Box::new(GreedyMiner::new()), blue)?;

        Ok(App {
            engine,
            should_quit: false,
            paused: false,
        })
    }

    /// Advances the match by one turn unless it is over.
    fn tick(&mut self) {
        if self.engine.outcome().is_none() {
            self.engine.process_turn();
        }
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let mut app = App::new(&args)?;
    let tick_rate = Duration::from_millis(args.tick_ms);

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, tick_rate);
    restore_terminal(&mut terminal)?;
    result?;

    if let Some(TurnOutcome::RoundOver { winner }) = app.engine.outcome() {
        println!(
            "Round over after {} turns. Red {} - Blue {}. Winner: {}",
            app.engine.turn(),
            app.engine.player(PlayerSide::Red).score,
            app.engine.player(PlayerSide::Blue).score,
            winner.map_or("draw".to_string(), |side| format!("{side:?}")),
        );
    }
    Ok(())
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

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char(' ') => app.paused = !app.paused,
                    KeyCode::Char('n') => app.tick(),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if !app.paused {
                app.tick();
            }
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(frame.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main_layout[0]);

    render_board(frame, body[0], &app.engine);
    render_scoreboard(frame, body[1], &app.engine);

    let status = match app.engine.outcome() {
        Some(TurnOutcome::RoundOver { winner: Some(side) }) => format!("{side:?} wins! "),
        Some(_) => "Draw. ".to_string(),
        None if app.paused => "Paused. ".to_string(),
        None => String::new(),
    };
    let help_text = Paragraph::new(format!(
        "{status}'space' pause, 'n' step, 'q'/'Esc' quit."
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[1]);
}

fn side_color(side: PlayerSide) -> Color {
    match side {
        PlayerSide::Red => Color::Red,
        PlayerSide::Blue => Color::Blue,
    }
}

fn item_color(item: ItemType) -> Color {
    match item {
        ItemType::Ruby => Color::LightRed,
        ItemType::Emerald => Color::Green,
        ItemType::Diamond => Color::Cyan,
    }
}

/// Player names, scores, inventories and prices.
fn render_scoreboard(frame: &mut Frame, area: Rect, engine: &MatchEngine) {
    let mut lines = vec![Line::from(format!(
        "Turn {} / {}",
        engine.turn(),
        engine.config().max_turns
    ))];

    for side in [PlayerSide::Red, PlayerSide::Blue] {
        let player = engine.player(side);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{side:?}: {}", engine.strategy_name(side)),
            Style::default().fg(side_color(side)).bold(),
        )));
        lines.push(Line::from(format!(
            "Score {} / {}",
            player.score,
            engine.config().winning_score
        )));
        let mut carried = vec![Span::raw(format!(
            "Carrying {}/{}: ",
            player.inventory.len(),
            engine.config().max_inventory_size
        ))];
        carried.extend(
            player
                .inventory
                .iter()
                .map(|item| Span::styled("*", Style::default().fg(item_color(*item)))),
        );
        lines.push(Line::from(carried));
    }

    lines.push(Line::from(""));
    lines.push(Line::from("Prices"));
    for item in ItemType::ALL {
        lines.push(Line::from(Span::styled(
            format!("  {item:?}: {}", engine.economy().price(item)),
            Style::default().fg(item_color(item)),
        )));
    }

    let scoreboard =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Scoreboard"));
    frame.render_widget(scoreboard, area);
}

/// Draws the board with the top row first, since `y` grows upward.
fn render_board(frame: &mut Frame, area: Rect, engine: &MatchEngine) {
    let board = engine.board();
    let items = engine.items();
    let mut lines: Vec<Line> = Vec::with_capacity(board.height());

    for y in (0..board.height()).rev() {
        let mut spans: Vec<Span> = Vec::with_capacity(board.width());
        for x in 0..board.width() {
            let position = Position { x, y };
            let player_here = [PlayerSide::Red, PlayerSide::Blue]
                .into_iter()
                .find(|side| engine.player(*side).position == position);

            let span = if let Some(side) = player_here {
                Span::styled("@ ", Style::default().fg(side_color(side)).bold())
            } else if let Some(item) = items.get(&position).and_then(|ground| ground.last()) {
                Span::styled("* ", Style::default().fg(item_color(*item)))
            } else {
                match board[position] {
                    TileType::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
                    TileType::RedMarket => Span::styled("M ", Style::default().fg(Color::Red)),
                    TileType::BlueMarket => Span::styled("M ", Style::default().fg(Color::Blue)),
                    TileType::ResourceRuby => {
                        Span::styled("r ", Style::default().fg(item_color(ItemType::Ruby)))
                    }
                    TileType::ResourceEmerald => {
                        Span::styled("e ", Style::default().fg(item_color(ItemType::Emerald)))
                    }
                    TileType::ResourceDiamond => {
                        Span::styled("d ", Style::default().fg(item_color(ItemType::Diamond)))
                    }
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let board_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Mineopoly").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(board_paragraph, area);
}
