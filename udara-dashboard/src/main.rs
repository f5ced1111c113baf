use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use udara_core::{Pollutant, Predictor};
use udara_io::history::{daily_means, load_history, within_window, write_daily_path, year_window};
use udara_io::readings::filter_city;
use udara_io::ReadingsTable;

mod config;
mod metrics;
mod tui;

use config::{Args, Command};
use metrics::CategorySummary;
use tui::TuiAgent;

pub enum DashboardEvent {
    Input(KeyCode),
    Resize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let predictor = args.model.build_predictor()?;

    if let Some((city, reading)) = args.command.manual_reading() {
        let category = predictor.predict_reading(&reading);
        println!("Kota: {}", city);
        for p in Pollutant::ALL {
            println!("  {:<6} {}", p.column(), reading[p.index()]);
        }
        println!("Kategori: {} ({})", category.localized(), category);
        return Ok(());
    }

    match &args.command {
        Command::Batch { input, output, city, tui } => {
            let table = ReadingsTable::from_path(input)?;
            let features = table.features()?;
            let labels = predictor.predict_all(&features);
            table.write_labeled_path(output, &labels)?;

            let (title, summary) = match city {
                Some(city) => {
                    let (f, l) = filter_city(&table, &features, &labels, city);
                    if f.is_empty() {
                        bail!("No rows for city '{}' in {}", city, input.display());
                    }
                    (format!(" UDARA | {} ", city), CategorySummary::from_rows(&f, &l))
                }
                None => (" UDARA | ALL CITIES ".to_string(), CategorySummary::from_rows(&features, &labels)),
            };
            show(title, &summary, *tui)
        }
        Command::History { input, output, province, year, tui } => {
            let summary = run_history(&predictor, input, output, province, *year)?;
            show(format!(" UDARA | {} {} ", province, year), &summary, *tui)
        }
        Command::Predict { .. } => Ok(()),
    }
}

fn run_history(
    predictor: &Predictor,
    input: &std::path::Path,
    output: &std::path::Path,
    province: &str,
    year: i32,
) -> Result<CategorySummary> {
    let samples = load_history(input)?;
    let samples = within_window(&samples, year_window(year)?);
    let days = daily_means(&samples)?;
    if days.is_empty() {
        bail!("No samples for {} in {}", province, year);
    }

    let features: Vec<_> = days.iter().map(|d| d.features).collect();
    let labels = predictor.predict_all(&features);
    write_daily_path(output, province, &days, &labels)?;
    info!("Classified {} days for {} ({})", days.len(), province, year);
    Ok(CategorySummary::from_rows(&features, &labels))
}

fn show(title: String, summary: &CategorySummary, tui: bool) -> Result<()> {
    if tui {
        run_tui(title, summary)
    } else {
        print!("{}", summary.render());
        Ok(())
    }
}

fn run_tui(title: String, summary: &CategorySummary) -> Result<()> {
    ctrlc::set_handler(move || {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
        std::process::exit(0);
    })
    .context("Error setting Ctrl-C handler")?;

    let (tx, rx) = mpsc::channel();

    // Input thread
    thread::spawn(move || loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => {
                let forwarded = match event::read() {
                    Ok(CEvent::Key(key)) => tx.send(DashboardEvent::Input(key.code)),
                    Ok(CEvent::Resize(_, _)) => tx.send(DashboardEvent::Resize),
                    Ok(_) => Ok(()),
                    Err(_) => break,
                };
                if forwarded.is_err() {
                    break;
                }
            }
            Ok(false) => {}
            Err(_) => break,
        }
    });

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut agent = TuiAgent::new(title);

    'main_loop: loop {
        terminal.draw(|f| agent.draw(f, summary))?;

        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(DashboardEvent::Input(KeyCode::Char('q'))) | Ok(DashboardEvent::Input(KeyCode::Esc)) => {
                break 'main_loop;
            }
            Ok(DashboardEvent::Input(KeyCode::Tab)) | Ok(DashboardEvent::Input(KeyCode::Right)) => {
                agent.page = agent.page.next();
            }
            Ok(DashboardEvent::Input(KeyCode::BackTab)) | Ok(DashboardEvent::Input(KeyCode::Left)) => {
                agent.page = agent.page.prev();
            }
            Ok(DashboardEvent::Resize) => {
                terminal.autoresize()?;
            }
            Ok(_) => {}
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break 'main_loop,
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}
