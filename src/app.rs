use crate::audio::{NullBackend, PlaybackBackend, RodioBackend};
use crate::core::{PlayerEvent, PlayerSession};
use crate::folder::LocalFolders;
use crate::handle_store::{HandleStore, JsonHandleStore, MemoryHandleStore};
use crate::model::FolderHandle;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct AppStartupOptions {
    pub folder: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    EnterCommand,
    Quit,
}

pub fn build_session() -> PlayerSession {
    let backend: Box<dyn PlaybackBackend> = match RodioBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(err) => {
            log::warn!("audio output unavailable, continuing silent: {err:#}");
            Box::new(NullBackend)
        }
    };
    let store: Box<dyn HandleStore> = match JsonHandleStore::at_default_location() {
        Ok(store) => Box::new(store),
        Err(err) => {
            log::warn!("{err}");
            Box::new(MemoryHandleStore::failing())
        }
    };
    PlayerSession::new(backend, Box::new(LocalFolders), store)
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let mut session = build_session();
    session.restore_last_folder();
    if let Some(folder) = options.folder {
        let _ = session.pick_folder(Some(FolderHandle::new(folder)));
    }
    if !options.files.is_empty() {
        session.add_paths(&options.files);
    }
    run(session)
}

fn run(mut session: PlayerSession) -> Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_draw = Instant::now();

    let result: Result<()> = loop {
        session.tick(Instant::now());

        if session.dirty || last_draw.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                crate::ui::draw(
                    frame,
                    &session,
                    command_mode.then_some(command_buffer.as_str()),
                )
            })?;
            session.dirty = false;
            last_draw = Instant::now();
        }

        if !event::poll(Duration::from_millis(20))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    session.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(&mut session, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    session.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    session.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match handle_key(&mut session, key) {
            KeyOutcome::Continue => {}
            KeyOutcome::EnterCommand => {
                command_mode = true;
                session.dirty = true;
            }
            KeyOutcome::Quit => break Ok(()),
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    log::info!("mediadeck session ended");
    result
}

fn handle_key(session: &mut PlayerSession, key: KeyEvent) -> KeyOutcome {
    let selected = session.selected;
    let event = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return KeyOutcome::Quit;
        }
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Char(':') => return KeyOutcome::EnterCommand,
        KeyCode::Down => {
            session.select_next();
            return KeyOutcome::Continue;
        }
        KeyCode::Up => {
            session.select_prev();
            return KeyOutcome::Continue;
        }
        KeyCode::Enter => PlayerEvent::Play(selected),
        KeyCode::Char(' ') => PlayerEvent::Pause(selected),
        KeyCode::Char('s') => PlayerEvent::Stop(selected),
        KeyCode::Left | KeyCode::Char('<') => PlayerEvent::Scrub {
            index: selected,
            forward: false,
        },
        KeyCode::Right | KeyCode::Char('>') => PlayerEvent::Scrub {
            index: selected,
            forward: true,
        },
        KeyCode::Char('K') => PlayerEvent::MoveUp(selected),
        KeyCode::Char('J') => PlayerEvent::MoveDown(selected),
        KeyCode::Char('b') => PlayerEvent::ToggleFade(selected),
        KeyCode::Char('x') | KeyCode::Delete => PlayerEvent::Delete(selected),
        KeyCode::Char('1') => PlayerEvent::ToggleSinglePlay,
        KeyCode::Char('l') => PlayerEvent::ToggleLoop,
        KeyCode::Char('d') => PlayerEvent::ToggleTheme,
        _ => return KeyOutcome::Continue,
    };
    session.dispatch(event);
    KeyOutcome::Continue
}

fn run_command(session: &mut PlayerSession, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        session.set_status("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => session.set_status(
            "Commands: open <folder> | add <file>[;<file>...] | help",
        ),
        "open" => {
            let picked = (!rest.is_empty()).then(|| FolderHandle::new(rest));
            let _ = session.pick_folder(picked);
        }
        "add" => {
            let paths: Vec<PathBuf> = rest
                .split(';')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(PathBuf::from)
                .collect();
            if paths.is_empty() {
                session.set_status("Usage: add <file>[;<file>...]");
            } else {
                session.add_paths(&paths);
            }
        }
        _ => session.set_status("Unknown command. Use :help"),
    }
}
