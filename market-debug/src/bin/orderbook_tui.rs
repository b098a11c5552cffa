//! Real-Time Orderbook Terminal UI
//!
//! Live visualization of a single symbol's order book, driven by a
//! synthetic feed standing in for the real market-data source (out of this
//! crate's scope):
//! - Live orderbook ladder (top 5 levels per side)
//! - Imbalance / spread metrics
//! - Update counters and latency
//!
//! ## Usage
//!
//! ```bash
//! market-debug orderbook-tui --symbol AAPL
//! ```
//!
//! ## Keyboard Controls
//!
//! - `q` or `Esc` - Quit
//! - `p` - Pause/Resume updates
//! - `m` - Toggle metrics panel
//! - `r` - Reset tick counter

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use market_core::{BookManager, Price, Quantity, Side, Symbol, Timestamp};
use rand::Rng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "orderbook-tui")]
#[command(about = "Live terminal view of a synthetic order book", long_about = None)]
struct Args {
    /// Symbol to simulate
    #[arg(short, long, default_value = "AAPL")]
    symbol: String,
}

fn main() -> Result<()> {
    market_core::logging::init_tracing("warn", false);
    let args = Args::parse();
    info!(symbol = %args.symbol, "starting orderbook tui");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &args.symbol);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

struct App {
    manager: BookManager,
    symbol: Symbol,
    paused: bool,
    tick_count: u64,
    mid: f64,
    show_metrics: bool,
}

impl App {
    fn new(symbol: &str) -> Self {
        let manager = BookManager::new();
        let symbol = Symbol::new(symbol);
        manager.get_or_create(symbol);
        App { manager, symbol, paused: false, tick_count: 0, mid: 150.00, show_metrics: true }
    }

    /// Advances the synthetic feed by one tick: a random walk on the mid
    /// price, a fresh depth ladder and an occasional trade print.
    fn tick(&mut self, rng: &mut impl Rng) {
        if self.paused {
            return;
        }

        self.mid += rng.gen_range(-0.05..=0.05);
        if self.mid < 1.0 {
            self.mid = 1.0;
        }
        let ts = Timestamp::from_nanos(self.tick_count * 1_000_000);

        let book = self.manager.get(self.symbol).expect("book seeded in new()");
        book.apply_quote(
            ts,
            Price::from_f64(self.mid - 0.01),
            Price::from_f64(self.mid + 0.01),
            Quantity::new(800 + rng.gen_range(0..400)),
            Quantity::new(600 + rng.gen_range(0..400)),
        );

        for i in 1..6u64 {
            book.apply_add(
                Price::from_f64(self.mid - 0.01 * (i + 1) as f64),
                Quantity::new(200 + rng.gen_range(0..300)),
                Side::Buy,
                ts,
            );
            book.apply_add(
                Price::from_f64(self.mid + 0.01 * (i + 1) as f64),
                Quantity::new(200 + rng.gen_range(0..300)),
                Side::Sell,
                ts,
            );
        }

        if rng.gen_bool(0.3) {
            let _ = book.apply_trade(ts, Price::from_f64(self.mid), Quantity::new(rng.gen_range(10..200)));
        }

        self.tick_count += 1;
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, symbol: &str) -> Result<()> {
    let mut app = App::new(symbol);
    let mut rng = rand::thread_rng();
    let tick_rate = Duration::from_millis(100); // 10 FPS
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, &app))?;

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('p') => app.paused = !app.paused,
                    KeyCode::Char('m') => app.show_metrics = !app.show_metrics,
                    KeyCode::Char('r') => app.tick_count = 0,
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick(&mut rng);
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Orderbook
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], app);
    render_orderbook(f, chunks[1], app);
    render_footer(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let book = app.manager.get(app.symbol).expect("book seeded in App::new");
    let mid = book.mid_price();
    let spread = book.spread();

    let status = if app.paused { "PAUSED" } else { "LIVE" };
    let status_color = if app.paused { Color::Yellow } else { Color::Green };

    let title = Line::from(vec![
        Span::styled(
            "MARKET-CORE ORDERBOOK VIEWER",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | {} | ", app.symbol)),
        Span::styled(status, Style::default().fg(status_color).add_modifier(Modifier::BOLD)),
    ]);

    let info = Line::from(vec![
        Span::raw("Updates: "),
        Span::styled(format!("{}", book.update_count()), Style::default().fg(Color::White)),
        Span::raw(" | Mid: $"),
        Span::styled(format!("{:.4}", mid.to_f64()), Style::default().fg(Color::Yellow)),
        Span::raw(" | Spread: "),
        Span::styled(format!("${:.4}", spread.to_f64()), Style::default().fg(Color::Magenta)),
    ]);

    let block = Block::default().borders(Borders::ALL).style(Style::default().fg(Color::White));
    let paragraph = Paragraph::new(vec![title, info]).block(block).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_orderbook(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    render_ladder(f, chunks[0], app);
    if app.show_metrics {
        render_metrics(f, chunks[1], app);
    }
}

fn render_ladder(f: &mut Frame, area: Rect, app: &App) {
    let book = app.manager.get(app.symbol).expect("book seeded in App::new");
    let asks = book.top_n_asks(5);
    let bids = book.top_n_bids(5);

    let max_size =
        asks.iter().chain(bids.iter()).map(|l| l.total_quantity.raw()).max().unwrap_or(1);

    let mut items = Vec::new();

    for level in asks.iter().rev() {
        let bar = create_bar(level.total_quantity.raw(), max_size, 20);
        items.push(ListItem::new(Line::from(vec![
            Span::styled("ASK ", Style::default().fg(Color::Red)),
            Span::styled(
                format!("{:>10.4}", level.price.to_f64()),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(bar, Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::styled(format!("{}", level.total_quantity), Style::default().fg(Color::White)),
        ])));
    }

    let mid_line = Line::from(vec![
        Span::raw("─────"),
        Span::styled(
            format!(" MID: ${:.4} ", book.mid_price().to_f64()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("─────"),
    ]);
    items.push(ListItem::new(mid_line));

    for level in &bids {
        let bar = create_bar(level.total_quantity.raw(), max_size, 20);
        items.push(ListItem::new(Line::from(vec![
            Span::styled("BID ", Style::default().fg(Color::Green)),
            Span::styled(
                format!("{:>10.4}", level.price.to_f64()),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(bar, Style::default().fg(Color::Green)),
            Span::raw("  "),
            Span::styled(format!("{}", level.total_quantity), Style::default().fg(Color::White)),
        ])));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title("Orderbook Ladder (Top 5 Levels)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(list, area);
}

fn render_metrics(f: &mut Frame, area: Rect, app: &App) {
    let book = app.manager.get(app.symbol).expect("book seeded in App::new");
    let imbalance = book.imbalance();
    let stats = book.get_statistics();

    let imbalance_text = if imbalance > 0.1 {
        "Buy Pressure ↑"
    } else if imbalance < -0.1 {
        "Sell Pressure ↓"
    } else {
        "Balanced"
    };
    let imbalance_color = if imbalance > 0.1 {
        Color::Green
    } else if imbalance < -0.1 {
        Color::Red
    } else {
        Color::Yellow
    };

    let text = vec![
        Line::from(vec![Span::styled("IMBALANCE", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))]),
        Line::from(vec![Span::styled(imbalance_text, Style::default().fg(imbalance_color))]),
        Line::from(vec![
            Span::raw("Value: "),
            Span::styled(format!("{:+.3}", imbalance), Style::default().fg(imbalance_color)),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("STATISTICS", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))]),
        Line::from(vec![
            Span::raw("Last: "),
            Span::styled(format!("${:.4}", stats.last_price.to_f64()), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("High: "),
            Span::styled(format!("${:.4}", stats.high.to_f64()), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Low: "),
            Span::styled(format!("${:.4}", stats.low.to_f64()), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Volume: "),
            Span::styled(format!("{}", stats.total_volume), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Trades: "),
            Span::styled(format!("{}", stats.trade_count), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Volatility: "),
            Span::styled(format!("{:.6}", stats.volatility), Style::default().fg(Color::White)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("Ticks: "),
            Span::styled(format!("{}", app.tick_count), Style::default().fg(Color::White)),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Metrics")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect, _app: &App) {
    let controls = Line::from(vec![
        Span::styled("Controls: ", Style::default().fg(Color::Cyan)),
        Span::raw("[Q]uit "),
        Span::raw("[P]ause "),
        Span::raw("[M]etrics "),
        Span::raw("[R]eset"),
    ]);

    let paragraph = Paragraph::new(controls).block(Block::default().borders(Borders::ALL)).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn create_bar(size: u64, max_size: u64, width: usize) -> String {
    if max_size == 0 {
        return " ".repeat(width);
    }
    let filled = ((size as f64 / max_size as f64) * width as f64) as usize;
    let filled = filled.min(width);
    let mut bar = String::with_capacity(width);
    for i in 0..width {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}
