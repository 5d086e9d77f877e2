use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};
use tracing::{info, warn};

use kaiwa::app::{App, AppScreen, PendingAction, Services, StudyTab};
use kaiwa::config::{Config, MeaningLanguage};
use kaiwa::event::{AppEvent, EventHandler};
use kaiwa::logging;
use kaiwa::ui;
use kaiwa::ui::components::confirm_dialog::ConfirmDialog;
use kaiwa::ui::components::history_list::HistoryList;
use kaiwa::ui::components::menu::MenuAction;
use kaiwa::ui::components::saved_list::SavedList;
use kaiwa::ui::components::study_view::{StudyView, VersionList};
use kaiwa::ui::layout::{AppLayout, pack_hint_lines};
use kaiwa::ui::line_input::{InputResult, LineInput};

#[derive(Parser)]
#[command(
    name = "kaiwa",
    version,
    about = "Scenario study guides for conversational Japanese practice"
)]
struct Cli {
    #[arg(short, long, help = "Sign in with this account id")]
    user: Option<String>,

    #[arg(long, help = "Email of the signed-in account")]
    email: Option<String>,

    #[arg(short, long, value_name = "LINK_OR_ID", help = "Open a shared scenario link")]
    open: Option<String>,

    #[arg(
        short,
        long,
        value_name = "SCENARIO",
        help = "Generate (or reuse) a scenario and print its study sheet"
    )]
    print: Option<String>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Meaning language (english, chinese)")]
    language: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    });
    if let Some(name) = cli.language.as_deref() {
        match MeaningLanguage::from_name(name) {
            Some(language) => config.meaning_language = language,
            None => eprintln!(
                "kaiwa: unknown language {name:?}, keeping {}",
                config.meaning_language.as_str()
            ),
        }
    }
    if let Some(theme) = cli.theme.clone() {
        config.theme = theme;
    }

    let services = Services::from_config(&config);
    let account = cli.user.clone().or_else(|| config.account_id.clone());
    let email = cli.email.clone().or_else(|| config.account_email.clone());

    if let Some(name) = cli.print.as_deref() {
        let mut app = App::new(config, services);
        if let Some(uid) = account.as_deref() {
            app.sign_in(uid, email.as_deref());
        }
        println!("{}", app.print_scenario(name)?);
        return Ok(());
    }

    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(config, services).with_events(events.sender());
    if let Some(uid) = account.as_deref() {
        app.sign_in(uid, email.as_deref());
    }
    if let Some(link) = cli.open.as_deref() {
        app.open_shared(link);
    }
    info!(identity = %app.identity().display_name(), "starting ui");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Generated { ticket, result } => app.on_generated(ticket, result),
            AppEvent::Spoken(result) => app.on_spoken(result),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Confirmation dialog takes priority
    if app.pending_action.is_some() {
        match key.code {
            KeyCode::Char('y') => app.confirm_pending(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_pending(),
            _ => {}
        }
        return;
    }

    app.status = None;
    match app.screen {
        AppScreen::Home => handle_home_key(app, key),
        AppScreen::Input => handle_input_key(app, key),
        AppScreen::Loading => {
            if key.code == KeyCode::Esc {
                app.cancel_loading();
            }
        }
        AppScreen::Study => handle_study_key(app, key),
        AppScreen::History => handle_history_key(app, key),
        AppScreen::Saved => handle_saved_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
        AppScreen::GenerationFailed => match key.code {
            KeyCode::Char('r') | KeyCode::Enter => app.retry_failed(),
            KeyCode::Esc | KeyCode::Char('q') => {
                app.failure = None;
                app.go_home();
            }
            _ => {}
        },
        AppScreen::QuotaExceeded => handle_quota_key(app, key),
        AppScreen::OpenShared => handle_share_prompt_key(app, key),
    }
}

fn run_menu_action(app: &mut App, action: MenuAction) {
    match action {
        MenuAction::NewScenario => app.open_input(),
        MenuAction::History => app.go_to_history(),
        MenuAction::Saved => app.go_to_saved(),
        MenuAction::OpenShared => app.open_share_prompt(),
        MenuAction::Settings => app.go_to_settings(),
        MenuAction::Quit => app.should_quit = true,
    }
}

fn handle_home_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            if let Some(action) = app.menu.selected_action() {
                run_menu_action(app, action);
            }
        }
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                run_menu_action(app, action);
            }
        }
        _ => {}
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match app.input.handle(key) {
        InputResult::Submit => {
            let name = app.input.value().to_string();
            app.request_scenario(&name);
        }
        InputResult::Cancel => app.go_home(),
        InputResult::Continue => {}
    }
}

fn handle_share_prompt_key(app: &mut App, key: KeyEvent) {
    match app.input.handle(key) {
        InputResult::Submit => {
            let link = app.input.value().to_string();
            app.open_shared(&link);
        }
        InputResult::Cancel => app.go_home(),
        InputResult::Continue => {}
    }
}

fn handle_quota_key(app: &mut App, key: KeyEvent) {
    match app.input.handle(key) {
        InputResult::Submit => {
            let api_key = app.input.value().to_string();
            app.input = LineInput::new("").masked();
            app.submit_api_key(&api_key);
        }
        InputResult::Cancel => app.dismiss_quota(),
        InputResult::Continue => {}
    }
}

fn handle_study_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        KeyCode::Char('1') => app.set_study_tab(StudyTab::Vocabulary),
        KeyCode::Char('2') => app.set_study_tab(StudyTab::Expressions),
        KeyCode::Char('3') => app.set_study_tab(StudyTab::Dialogue),
        KeyCode::Tab => app.set_study_tab(app.study_tab.next()),
        KeyCode::BackTab => app.set_study_tab(app.study_tab.prev()),
        KeyCode::Down | KeyCode::Char('j') => app.study_move(true),
        KeyCode::Up | KeyCode::Char('k') => app.study_move(false),
        KeyCode::Char(']') | KeyCode::Right => app.cycle_version(true),
        KeyCode::Char('[') | KeyCode::Left => app.cycle_version(false),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('p') => app.speak_selected(),
        KeyCode::Char('f') => app.toggle_selected_saved(),
        KeyCode::Char('r') => app.regenerate(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete_version(),
        KeyCode::Char('s') => app.share_active(),
        KeyCode::Char('e') => app.export_active(),
        KeyCode::Char('n') => app.toggle_notation(),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        KeyCode::Down | KeyCode::Char('j') => app.history_move(true),
        KeyCode::Up | KeyCode::Char('k') => app.history_move(false),
        KeyCode::Enter => app.open_selected_history(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete_selected_history(),
        _ => {}
    }
}

fn handle_saved_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        KeyCode::Down | KeyCode::Char('j') => app.saved_move(true),
        KeyCode::Up | KeyCode::Char('k') => app.saved_move(false),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('p') => app.speak_selected_saved(),
        KeyCode::Char('x') | KeyCode::Char('f') | KeyCode::Delete => app.remove_selected_saved(),
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.leave_settings(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.settings_selected = app.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.settings_selected + 1 < App::SETTINGS_ROWS {
                app.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.settings_cycle(true),
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle(false),
        _ => {}
    }
}

// ---- rendering ------------------------------------------------------------

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Home => render_home(frame, app),
        AppScreen::Input => render_prompt(
            frame,
            app,
            " New scenario ",
            "Describe a real-life situation, e.g. \"ordering at an izakaya\"",
            &["[Enter] Generate", "[Tab] Suggest", "[Esc] Back"],
        ),
        AppScreen::OpenShared => render_prompt(
            frame,
            app,
            " Open shared link ",
            "Paste a share link or its id",
            &["[Enter] Open", "[Esc] Back"],
        ),
        AppScreen::QuotaExceeded => render_quota(frame, app),
        AppScreen::Loading => render_loading(frame, app),
        AppScreen::Study => render_study(frame, app),
        AppScreen::History => render_list_screen(frame, app, true),
        AppScreen::Saved => render_list_screen(frame, app, false),
        AppScreen::Settings => render_settings(frame, app),
        AppScreen::GenerationFailed => render_failure(frame, app),
    }

    if let Some(action) = &app.pending_action {
        let message = match action {
            PendingAction::DeleteVersion => {
                let n = app.versions.active_version().map_or(1, |v| v + 1);
                format!("Delete version {n} of this scenario?")
            }
            PendingAction::DeleteScenario(id) => format!("Delete \"{id}\" and all its versions?"),
        };
        frame.render_widget(ConfirmDialog::new(message, app.theme), area);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect, info: &str) {
    let colors = &app.theme.colors;
    let who = format!(" {} ", app.identity().display_name());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " kaiwa ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{info} "),
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
        Span::styled(who, Style::default().fg(colors.accent()).bg(colors.header_bg())),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;
    let mut lines: Vec<Line> = Vec::new();
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            format!(" {status}"),
            Style::default().fg(colors.warning()),
        )));
    }
    for hint in pack_hint_lines(hints, usize::from(area.width)) {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(colors.muted()))));
    }
    Paragraph::new(lines).render(area, frame.buffer_mut());
}

fn footer_height(app: &App, hints: &[&str], width: u16) -> u16 {
    let hint_lines = pack_hint_lines(hints, usize::from(width)).len();
    (hint_lines + usize::from(app.status.is_some())) as u16
}

fn render_home(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = ["[n] New", "[h] History", "[f] Saved", "[o] Open link", "[c] Settings", "[q] Quit"];
    let layout = AppLayout::new(area, footer_height(app, &hints, area.width));

    let collection = app.versions.collection();
    let info = format!(
        "| {} scenarios | {} saved",
        collection.history.len(),
        collection.favorites.len()
    );
    render_header(frame, app, layout.header, &info);

    let menu_area = ui::layout::centered_rect(60, 80, layout.main);
    frame.render_widget(&app.menu, menu_area);

    render_footer(frame, app, layout.footer, &hints);
}

fn render_prompt(frame: &mut ratatui::Frame, app: &App, title: &str, help: &str, hints: &[&str]) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let layout = AppLayout::new(area, footer_height(app, hints, area.width));
    render_header(frame, app, layout.header, "");

    let popup = ui::layout::centered_rect(60, 30, layout.main);
    let block = Block::bordered()
        .title(title.to_string())
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(popup);
    block.render(popup, frame.buffer_mut());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    Paragraph::new(Line::from(Span::styled(
        format!(" {help}"),
        Style::default().fg(colors.muted()),
    )))
    .wrap(Wrap { trim: false })
    .render(rows[0], frame.buffer_mut());
    render_input_line(frame, app, rows[1]);

    render_footer(frame, app, layout.footer, hints);
}

fn render_input_line(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let text = app.input.display();
    let cursor = app.input.cursor();
    let before: String = text.chars().take(cursor).collect();
    let at: String = text.chars().nth(cursor).map_or(" ".to_string(), String::from);
    let after: String = text.chars().skip(cursor + 1).collect();
    Paragraph::new(Line::from(vec![
        Span::styled(" > ", Style::default().fg(colors.accent())),
        Span::styled(before, Style::default().fg(colors.fg())),
        Span::styled(at, Style::default().fg(colors.bg()).bg(colors.fg())),
        Span::styled(after, Style::default().fg(colors.fg())),
    ]))
    .render(area, frame.buffer_mut());
}

fn render_quota(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let hints = ["[Enter] Use key", "[Esc] Back"];
    let layout = AppLayout::new(area, footer_height(app, &hints, area.width));
    render_header(frame, app, layout.header, "| daily limit reached");

    let popup = ui::layout::centered_rect(60, 40, layout.main);
    let block = Block::bordered()
        .title(" Daily limit reached ")
        .border_style(Style::default().fg(colors.warning()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(popup);
    block.render(popup, frame.buffer_mut());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    let used = app
        .quota_notice
        .map(|(used, limit)| format!(" You have used {used} of {limit} free generations today."))
        .unwrap_or_default();
    Paragraph::new(vec![
        Line::from(Span::styled(used, Style::default().fg(colors.fg()))),
        Line::from(""),
        Line::from(Span::styled(
            " Enter your own Gemini API key to keep generating this session:",
            Style::default().fg(colors.muted()),
        )),
    ])
    .wrap(Wrap { trim: false })
    .render(rows[0], frame.buffer_mut());
    render_input_line(frame, app, rows[1]);

    render_footer(frame, app, layout.footer, &hints);
}

fn render_loading(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let hints = ["[Esc] Cancel"];
    let layout = AppLayout::new(area, footer_height(app, &hints, area.width));
    render_header(frame, app, layout.header, "");

    let scenario = app
        .pending
        .as_ref()
        .map(|p| p.ticket.scenario_id.as_str())
        .unwrap_or_default();
    let popup = ui::layout::centered_rect(50, 20, layout.main);
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Writing a study guide for \"{scenario}\"..."),
            Style::default().fg(colors.fg()),
        )),
    ])
    .block(
        Block::bordered()
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg())),
    )
    .render(popup, frame.buffer_mut());

    render_footer(frame, app, layout.footer, &hints);
}

fn render_failure(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let hints = ["[r] Retry", "[Esc] Home"];
    let layout = AppLayout::new(area, footer_height(app, &hints, area.width));
    render_header(frame, app, layout.header, "");

    let (scenario, message) = app
        .failure
        .as_ref()
        .map(|f| (f.scenario_id.as_str(), f.message.as_str()))
        .unwrap_or_default();
    let popup = ui::layout::centered_rect(60, 30, layout.main);
    Paragraph::new(vec![
        Line::from(Span::styled(
            format!(" Could not generate \"{scenario}\"."),
            Style::default().fg(colors.fg()),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" {message}"), Style::default().fg(colors.error()))),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::bordered()
            .title(" Generation failed ")
            .border_style(Style::default().fg(colors.error()))
            .style(Style::default().bg(colors.bg())),
    )
    .render(popup, frame.buffer_mut());

    render_footer(frame, app, layout.footer, &hints);
}

fn render_study(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = [
        "[1-3/Tab] Section",
        "[j/k] Move",
        "[Enter] Speak",
        "[f] Save",
        "[[/]] Version",
        "[r] Regenerate",
        "[x] Delete version",
        "[s] Share",
        "[e] Export",
        "[n] Notation",
        "[Esc] Home",
    ];
    let layout = AppLayout::new(area, footer_height(app, &hints, area.width));

    let (Some(item), Some(content), Some(active)) = (
        app.versions.active_item(),
        app.active_content(),
        app.versions.active_version(),
    ) else {
        render_header(frame, app, layout.header, "");
        render_footer(frame, app, layout.footer, &hints);
        return;
    };

    let mut info = format!(
        "| v{}/{} | {}",
        active + 1,
        item.versions.len(),
        app.preferences.notation.label()
    );
    if app.speaking {
        info.push_str(" | speaking");
    }
    render_header(frame, app, layout.header, &info);

    let view = StudyView::new(
        content,
        app.versions.collection(),
        app.study_tab,
        app.study_selected,
        app.preferences.notation,
        app.theme,
    );
    frame.render_widget(view, layout.main);

    if let Some(sidebar) = layout.sidebar {
        frame.render_widget(
            VersionList {
                item,
                active,
                theme: app.theme,
            },
            sidebar,
        );
    }

    render_footer(frame, app, layout.footer, &hints);
}

fn render_list_screen(frame: &mut ratatui::Frame, app: &App, history: bool) {
    let area = frame.area();
    let hints: &[&str] = if history {
        &["[j/k] Move", "[Enter] Open", "[x] Delete", "[Esc] Back"]
    } else {
        &["[j/k] Move", "[Enter] Speak", "[x] Remove", "[Esc] Back"]
    };
    let layout = AppLayout::new(area, footer_height(app, hints, area.width));
    render_header(frame, app, layout.header, "");

    let collection = app.versions.collection();
    if history {
        frame.render_widget(
            HistoryList::new(&collection.history, app.history_selected, app.theme),
            layout.main,
        );
    } else {
        frame.render_widget(
            SavedList::new(
                &collection.favorites,
                app.saved_selected,
                app.preferences.notation,
                app.theme,
            ),
            layout.main,
        );
    }

    render_footer(frame, app, layout.footer, hints);
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(60, 80, area);
    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let account = if app.identity().is_guest() {
        "guest (Enter to sign in)".to_string()
    } else {
        format!("{} (Enter to sign out)", app.identity().display_name())
    };
    let fields: Vec<(&str, String)> = vec![
        ("Reading notation", app.preferences.notation.label().to_string()),
        ("Voice", app.preferences.voice_engine.label().to_string()),
        ("Meaning language", app.config.meaning_language.as_str().to_string()),
        ("Theme", app.config.theme.clone()),
        ("Account", account),
    ];

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(fields.len() as u16 * 3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    Paragraph::new(Line::from(Span::styled(
        "  Use arrows to navigate, Enter/Right to change, ESC to save & exit",
        Style::default().fg(colors.muted()),
    )))
    .render(layout[0], frame.buffer_mut());

    let field_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(fields.iter().map(|_| Constraint::Length(3)).collect::<Vec<_>>())
        .split(layout[1]);

    for (i, ((label, value), row)) in fields.iter().zip(field_layout.iter()).enumerate() {
        let is_selected = i == app.settings_selected;
        let indicator = if is_selected { " > " } else { "   " };
        let label_style = Style::default()
            .fg(if is_selected { colors.accent() } else { colors.fg() })
            .add_modifier(if is_selected { Modifier::BOLD } else { Modifier::empty() });
        let value_style = Style::default().fg(if is_selected {
            colors.saved()
        } else {
            colors.muted()
        });

        Paragraph::new(vec![
            Line::from(Span::styled(format!("{indicator}{label}:"), label_style)),
            Line::from(Span::styled(format!("  < {value} >"), value_style)),
        ])
        .render(*row, frame.buffer_mut());
    }

    let mut footer = vec![Line::from(Span::styled(
        "  [ESC] Save & back  [Enter/arrows] Change value",
        Style::default().fg(colors.accent()),
    ))];
    if let Some(status) = &app.status {
        footer.push(Line::from(Span::styled(
            format!("  {status}"),
            Style::default().fg(colors.warning()),
        )));
    }
    Paragraph::new(footer).render(layout[3], frame.buffer_mut());
}
