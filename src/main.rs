mod app;
mod cli;
mod config;
mod error;
mod gateway;
mod input;
mod model;
mod port;
mod status;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use config::{ConfigFile, Settings};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use error::ControlError;
use futures::StreamExt;
use gateway::{ControlGateway, HttpTransport};
use model::StatusReport;
use port::{ActionKind, ActionReport};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use status::StatusTicket;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
type SharedGateway = Arc<ControlGateway<HttpTransport>>;

/// Completed backend work handed back to the event loop.
#[derive(Debug)]
enum ControlEvent {
    Action(ActionReport),
    Status {
        ticket: StatusTicket,
        result: Result<StatusReport, ControlError>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let file = ConfigFile::discover()?;
    let settings = Settings::resolve(&args, file);
    match &settings.config_source {
        Some(source) => info!("loaded config from {source}"),
        None => debug!("no config file found, using defaults"),
    }

    let transport = HttpTransport::new(&settings.server, settings.timeout)?;
    info!("using backend {}", transport.base_url());
    let gateway = Arc::new(ControlGateway::new(transport));

    let mut app = App::new(settings.server, settings.namespaces, settings.image);
    run(&mut app, gateway).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // The terminal owns stdout/stderr while the deck is running.
    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::sink).try_init(),
    };

    Ok(())
}

async fn run(app: &mut App, gateway: SharedGateway) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, gateway: SharedGateway) -> Result<()> {
    let mut reader = EventStream::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ControlEvent>();

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(command, &gateway, &event_tx);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_message(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_message("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(ControlEvent::Action(report)) => {
                        debug!("{} finished for '{}'", report.kind.label(), report.namespace);
                        app.finish_action(report);
                    }
                    Some(ControlEvent::Status { ticket, result }) => {
                        if !app.finish_status(&ticket, result) {
                            debug!("status reply for '{}' was superseded", ticket.namespace);
                        }
                    }
                    None => {
                        warn!("control event channel closed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Starts the backend call for a command; the reply comes back through `events`.
fn execute_app_command(
    command: AppCommand,
    gateway: &SharedGateway,
    events: &mpsc::UnboundedSender<ControlEvent>,
) {
    let gateway = Arc::clone(gateway);
    let events = events.clone();
    match command {
        AppCommand::None => {}
        AppCommand::CreateNamespace { name } => {
            tokio::spawn(async move {
                let outcome = gateway.create_namespace(&name).await;
                send_event(
                    &events,
                    ControlEvent::Action(ActionReport {
                        kind: ActionKind::CreateNamespace,
                        namespace: name,
                        outcome,
                    }),
                );
            });
        }
        AppCommand::DeployApp(request) => {
            tokio::spawn(async move {
                let outcome = gateway.deploy_app(&request).await;
                send_event(
                    &events,
                    ControlEvent::Action(ActionReport {
                        kind: ActionKind::DeployApp,
                        namespace: request.namespace().to_string(),
                        outcome,
                    }),
                );
            });
        }
        AppCommand::DestroyNamespace { namespace } => {
            tokio::spawn(async move {
                let outcome = gateway.destroy_namespace(&namespace).await;
                send_event(
                    &events,
                    ControlEvent::Action(ActionReport {
                        kind: ActionKind::DestroyNamespace,
                        namespace,
                        outcome,
                    }),
                );
            });
        }
        AppCommand::CheckStatus(ticket) => {
            tokio::spawn(async move {
                let result = gateway.check_status(&ticket.namespace).await;
                send_event(&events, ControlEvent::Status { ticket, result });
            });
        }
    }
}

fn send_event(events: &mpsc::UnboundedSender<ControlEvent>, event: ControlEvent) {
    if events.send(event).is_err() {
        debug!("event loop already stopped, dropping backend reply");
    }
}
