use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{
    Component, DataResource, EventContext, EventKind, HandlerResponse, RenderContext,
};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle, TextInput, TextInputProps, TextInputStyle,
};

use crate::action::Action;
use crate::sprite;
use crate::state::{AppState, PokemonRecord, PokemonStat, Screen, DETAIL_EMPTY, GRID_COLS, GRID_ROWS};

const BG_BASE: Color = Color::Rgb(16, 14, 20);
const BG_PANEL: Color = Color::Rgb(28, 24, 34);
const BG_CARD: Color = Color::Rgb(36, 32, 44);
const BG_HIGHLIGHT: Color = Color::Rgb(96, 36, 48);
const TEXT_MAIN: Color = Color::Rgb(238, 234, 228);
const TEXT_DIM: Color = Color::Rgb(164, 158, 170);
const ACCENT_RED: Color = Color::Rgb(222, 82, 82);
const ACCENT_YELLOW: Color = Color::Rgb(240, 196, 90);
const CELL_ASPECT: f32 = 2.0;

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

pub struct BrowseUi {
    search_input: TextInput,
    status_bar: StatusBar,
}

impl BrowseUi {
    pub fn new() -> Self {
        Self {
            search_input: TextInput::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<crate::BrowseComponentId>,
    ) {
        render_app(
            frame,
            area,
            state,
            render_ctx,
            event_ctx,
            &mut self.search_input,
            &mut self.status_bar,
        );
    }

    pub fn handle_home_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_home_event(event, state)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        if let EventKind::Key(key) = event {
            if key.code == crossterm::event::KeyCode::Esc {
                return handler_response(vec![Action::NavigateBack]);
            }
        }
        let props = TextInputProps {
            value: &state.search.query,
            placeholder: "Enter Pokémon name or ID...",
            is_focused: true,
            style: search_input_style(),
            on_change: Action::SearchQueryChange,
            on_submit: Action::SearchSubmit,
            on_cursor_move: Some(|_| Action::Render),
        };
        let actions: Vec<_> = self
            .search_input
            .handle_event(event, props)
            .into_iter()
            .collect();
        handler_response(actions)
    }

    pub fn handle_explorer_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_explorer_event(event, state)
    }

    pub fn handle_filter_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_filter_event(event, state)
    }

    pub fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_detail_event(event, state)
    }
}

impl Default for BrowseUi {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_app(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    _render_ctx: RenderContext,
    event_ctx: &mut EventContext<crate::BrowseComponentId>,
    search_input: &mut TextInput,
    status_bar: &mut StatusBar,
) {
    sprite::clear_overlay();
    let base = Block::default().style(Style::default().bg(BG_BASE));
    frame.render_widget(base, area);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(area);

    match state.screen {
        Screen::Home => render_home(frame, layout[0], state, event_ctx),
        Screen::Search => render_search(frame, layout[0], state, event_ctx, search_input),
        Screen::Explorer => render_explorer(frame, layout[0], state, event_ctx),
        Screen::Detail => render_detail(frame, layout[0], state, event_ctx),
    }
    render_footer(frame, layout[1], state, status_bar);
}

// ============================================================================
// Event handlers
// ============================================================================

pub fn handle_home_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Up | crossterm::event::KeyCode::Char('k') => {
                vec![Action::HomeMove(-1)]
            }
            crossterm::event::KeyCode::Down | crossterm::event::KeyCode::Char('j') => {
                vec![Action::HomeMove(1)]
            }
            crossterm::event::KeyCode::Enter => vec![Action::HomeConfirm],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_explorer_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Left | crossterm::event::KeyCode::Char('h') => {
                vec![Action::SelectionMove(-1)]
            }
            crossterm::event::KeyCode::Right | crossterm::event::KeyCode::Char('l') => {
                vec![Action::SelectionMove(1)]
            }
            crossterm::event::KeyCode::Up | crossterm::event::KeyCode::Char('k') => {
                vec![Action::SelectionMove(-(GRID_COLS as i16))]
            }
            crossterm::event::KeyCode::Down | crossterm::event::KeyCode::Char('j') => {
                vec![Action::SelectionMove(GRID_COLS as i16)]
            }
            crossterm::event::KeyCode::Enter => vec![Action::OpenSelected],
            crossterm::event::KeyCode::Char('n') | crossterm::event::KeyCode::PageDown => {
                vec![Action::PageNext]
            }
            crossterm::event::KeyCode::Char('p') | crossterm::event::KeyCode::PageUp => {
                vec![Action::PagePrev]
            }
            crossterm::event::KeyCode::Char('/') => vec![Action::FilterStart],
            crossterm::event::KeyCode::Char(']') => vec![Action::TypeFilterNext],
            crossterm::event::KeyCode::Char('[') => vec![Action::TypeFilterPrev],
            crossterm::event::KeyCode::Char('c') => vec![Action::TypeFilterClear],
            crossterm::event::KeyCode::Char('s') => vec![Action::SortNext],
            crossterm::event::KeyCode::Char('S') => vec![Action::SortPrev],
            crossterm::event::KeyCode::Esc => vec![Action::NavigateBack],
            _ => vec![],
        },
        EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 6) as i16)],
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_filter_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Esc => vec![Action::FilterCancel],
            crossterm::event::KeyCode::Enter => vec![Action::FilterSubmit],
            crossterm::event::KeyCode::Backspace => vec![Action::FilterBackspace],
            crossterm::event::KeyCode::Char(ch) => vec![Action::FilterInput(ch)],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_detail_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Esc | crossterm::event::KeyCode::Backspace => {
                vec![Action::NavigateBack]
            }
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

// ============================================================================
// Home screen
// ============================================================================

fn render_home(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<crate::BrowseComponentId>,
) {
    event_ctx.set_component_area(crate::BrowseComponentId::Home, area);
    let panel = centered(area, 44, 12);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("POKEBROWSE")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_RED));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let menu = ["Pokémon Search", "Pokémon Explorer"];
    let mut lines = vec![
        Line::from(Span::styled(
            "A Pokémon catalog browser",
            Style::default().fg(TEXT_DIM),
        )),
        Line::from(" "),
    ];
    for (index, label) in menu.iter().enumerate() {
        let style = if index == state.home.selected {
            Style::default()
                .bg(BG_HIGHLIGHT)
                .fg(TEXT_MAIN)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MAIN)
        };
        let marker = if index == state.home.selected { ">" } else { " " };
        lines.push(Line::from(Span::styled(
            format!(" {marker} {label} "),
            style,
        )));
    }
    lines.push(Line::from(" "));
    lines.push(Line::from(Span::styled(
        "Enter to open, q to quit",
        Style::default().fg(TEXT_DIM),
    )));

    let paragraph = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

// ============================================================================
// Search screen
// ============================================================================

fn search_input_style() -> TextInputStyle {
    TextInputStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: Some(BG_CARD),
            fg: Some(TEXT_MAIN),
        },
        placeholder_style: None,
        cursor_style: None,
    }
}

fn render_search(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<crate::BrowseComponentId>,
    search_input: &mut TextInput,
) {
    event_ctx.set_component_area(crate::BrowseComponentId::Search, area);
    let panel = centered(area, 52, 20);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("POKEMON SEARCH")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_RED));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(4)])
        .split(inner);

    let input_props = TextInputProps {
        value: &state.search.query,
        placeholder: "Enter Pokémon name or ID...",
        is_focused: true,
        style: search_input_style(),
        on_change: Action::SearchQueryChange,
        on_submit: Action::SearchSubmit,
        on_cursor_move: Some(|_| Action::Render),
    };
    search_input.render(frame, layout[0], input_props);

    match &state.search.result {
        DataResource::Empty => {
            let hint = Paragraph::new("Type a name or id and press Enter.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM));
            frame.render_widget(hint, layout[2]);
        }
        DataResource::Loading => {
            let loading = Paragraph::new(format!("{} Searching...", spinner(state.tick)))
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM));
            frame.render_widget(loading, layout[2]);
        }
        DataResource::Failed(message) => {
            let error = Paragraph::new(message.as_str())
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(ACCENT_RED));
            frame.render_widget(error, layout[2]);
        }
        DataResource::Loaded(summary) => {
            let result_layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(layout[2]);
            let name = Paragraph::new(summary.name.to_ascii_uppercase())
                .alignment(Alignment::Center)
                .style(
                    Style::default()
                        .fg(ACCENT_YELLOW)
                        .add_modifier(Modifier::BOLD),
                );
            frame.render_widget(name, result_layout[0]);

            render_sprite_slot(frame, result_layout[1], state, &summary.name);

            let tags = type_tag_line(&summary.types);
            frame.render_widget(
                Paragraph::new(tags).alignment(Alignment::Center),
                result_layout[2],
            );
        }
    }
}

// ============================================================================
// Explorer screen
// ============================================================================

fn render_explorer(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<crate::BrowseComponentId>,
) {
    event_ctx.set_component_area(crate::BrowseComponentId::Explorer, area);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    render_explorer_header(frame, layout[0], state, event_ctx);
    render_explorer_grid(frame, layout[1], state);
    render_explorer_pager(frame, layout[2], state);
}

fn render_explorer_header(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<crate::BrowseComponentId>,
) {
    if state.explorer.query_active {
        event_ctx.set_component_area(crate::BrowseComponentId::ExplorerFilter, area);
    }
    let explorer = &state.explorer;
    let query = if explorer.query_active {
        format!("/{}_", explorer.query)
    } else if explorer.query.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", explorer.query)
    };
    let type_label = explorer
        .type_filter
        .as_deref()
        .map(format_name)
        .unwrap_or_else(|| "Filter by type".to_string());

    let header = Line::from(vec![
        Span::styled(
            "POKEMON EXPLORER",
            Style::default()
                .fg(ACCENT_YELLOW)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  Search: "),
        Span::styled(query, Style::default().fg(ACCENT_YELLOW)),
        Span::raw("  |  Type: "),
        Span::styled(type_label, Style::default().fg(ACCENT_YELLOW)),
        Span::raw("  |  Sort: "),
        Span::styled(explorer.sort.label(), Style::default().fg(ACCENT_YELLOW)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(if explorer.query_active {
            ACCENT_YELLOW
        } else {
            TEXT_DIM
        }));
    frame.render_widget(Paragraph::new(header).block(block), area);
}

fn render_explorer_grid(frame: &mut Frame, area: Rect, state: &AppState) {
    match &state.explorer.entries {
        DataResource::Empty | DataResource::Loading => {
            let loading = Paragraph::new(format!("{} Loading...", spinner(state.tick)))
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM));
            frame.render_widget(loading, area);
        }
        DataResource::Failed(message) => {
            let error = Paragraph::new(message.as_str())
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(ACCENT_RED));
            frame.render_widget(error, area);
        }
        DataResource::Loaded(_) => {
            let visible = state.explorer.visible_records();
            if visible.is_empty() {
                let empty = Paragraph::new("No Pokémon match the current filters.")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(TEXT_DIM));
                frame.render_widget(empty, area);
                return;
            }

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Ratio(1, GRID_ROWS as u32); GRID_ROWS])
                .split(area);
            for (row_index, row_area) in rows.iter().enumerate() {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints(vec![Constraint::Ratio(1, GRID_COLS as u32); GRID_COLS])
                    .split(*row_area);
                for (col_index, card_area) in cols.iter().enumerate() {
                    let slot = row_index * GRID_COLS + col_index;
                    if let Some(record) = visible.get(slot) {
                        render_card(frame, *card_area, record, slot == state.explorer.selected);
                    }
                }
            }
        }
    }
}

fn render_card(frame: &mut Frame, area: Rect, record: &PokemonRecord, selected: bool) {
    let (border, bg) = if selected {
        (
            Style::default().fg(ACCENT_YELLOW).add_modifier(Modifier::BOLD),
            BG_HIGHLIGHT,
        )
    } else {
        (Style::default().fg(TEXT_DIM), BG_CARD)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(bg).fg(TEXT_MAIN))
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled(
            format!("#{:03}", record.id),
            Style::default().fg(TEXT_DIM),
        )),
        Line::from(Span::styled(
            format_name(&record.name),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        )),
        type_tag_line(&record.types),
        Line::from(Span::styled(
            format!("EXP {}", record.base_experience),
            Style::default().fg(TEXT_DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(lines)).alignment(Alignment::Center),
        inner,
    );
}

fn render_explorer_pager(frame: &mut Frame, area: Rect, state: &AppState) {
    let explorer = &state.explorer;
    let prev_style = if explorer.prev_page_enabled() {
        Style::default().fg(TEXT_MAIN)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    let next_style = if explorer.next_page_enabled() {
        Style::default().fg(TEXT_MAIN)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    let line = Line::from(vec![
        Span::styled("[p] Previous", prev_style),
        Span::styled(
            format!("   Page {} of {}   ", explorer.page, explorer.max_pages),
            Style::default().fg(ACCENT_YELLOW),
        ),
        Span::styled("Next [n]", next_style),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

// ============================================================================
// Detail screen
// ============================================================================

fn render_detail(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<crate::BrowseComponentId>,
) {
    event_ctx.set_component_area(crate::BrowseComponentId::Detail, area);
    let title = state
        .detail
        .name
        .as_deref()
        .map(|name| format_name(name).to_ascii_uppercase())
        .unwrap_or_else(|| "POKEMON".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_RED));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &state.detail.record {
        DataResource::Loading => {
            let loading = Paragraph::new(format!("{} Loading...", spinner(state.tick)))
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM));
            frame.render_widget(loading, inner);
        }
        DataResource::Failed(message) => {
            let error = Paragraph::new(message.as_str())
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(ACCENT_RED));
            frame.render_widget(error, inner);
        }
        DataResource::Empty => {
            let empty = Paragraph::new(DETAIL_EMPTY)
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM));
            frame.render_widget(empty, inner);
        }
        DataResource::Loaded(record) => {
            let layout = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
                .split(inner);
            render_sprite_slot(frame, layout[0], state, &record.name);
            frame.render_widget(
                Paragraph::new(detail_text(record)).wrap(Wrap { trim: true }),
                layout[1],
            );
        }
    }
}

fn detail_text(record: &PokemonRecord) -> Text<'static> {
    let section = Style::default()
        .fg(ACCENT_YELLOW)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}  #{:03}", record.name.to_ascii_uppercase(), record.id),
            Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Base Experience: {}", record.base_experience)),
        Line::from(format!(
            "Height: {}  Weight: {}",
            record.height, record.weight
        )),
        Line::from(" "),
        Line::from(Span::styled("Types", section)),
        type_tag_line(&record.types),
        Line::from(" "),
        Line::from(Span::styled("Abilities", section)),
    ];
    if record.abilities.is_empty() {
        lines.push(Line::from(Span::styled(
            "--",
            Style::default().fg(TEXT_DIM),
        )));
    } else {
        for ability in &record.abilities {
            lines.push(Line::from(format!("- {}", format_name(ability))));
        }
    }
    lines.push(Line::from(" "));
    lines.push(Line::from(Span::styled("Stats", section)));
    for stat in &record.stats {
        lines.push(Line::from(render_stat(stat)));
    }
    Text::from(lines)
}

// ============================================================================
// Shared widgets
// ============================================================================

fn render_sprite_slot(frame: &mut Frame, area: Rect, state: &AppState, name: &str) {
    if let Some(sprite) = state.sprite_for(name) {
        let (cols, rows) = sprite_fit(sprite, area.width, area.height);
        if let Ok(sequence) = sprite::kitty_sequence(sprite, cols, rows) {
            let offset_x = area.x.saturating_add(area.width.saturating_sub(cols) / 2);
            let offset_y = area.y.saturating_add(area.height.saturating_sub(rows) / 2);
            sprite::place_overlay(offset_x, offset_y, sequence);
            return;
        }
    }

    let content = if state.sprite_loading {
        "[loading sprite]"
    } else {
        "[no sprite]"
    };
    let placeholder = Paragraph::new(content)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_DIM));
    frame.render_widget(placeholder, area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = status_text(state);
    let status_span = Span::styled(status, Style::default().fg(ACCENT_YELLOW));
    let status_items = [StatusBarItem::span(status_span)];
    let hints = status_hints(state);

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: None,
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_YELLOW)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&hints).with_separator("  "),
        center: StatusBarSection::empty(),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_text(state: &AppState) -> String {
    let text = if state.explorer.entries.is_loading() {
        "Loading Pokémon..."
    } else if state.search.result.is_loading() {
        "Searching..."
    } else if state.detail.record.is_loading() {
        "Loading details..."
    } else if state.sprite_loading {
        "Loading sprite..."
    } else {
        return String::new();
    };
    format!("{} {}", spinner(state.tick), text)
}

fn status_hints(state: &AppState) -> Vec<StatusBarHint<'static>> {
    match state.screen {
        Screen::Home => vec![
            StatusBarHint::new("j/k", "Move"),
            StatusBarHint::new("Enter", "Open"),
            StatusBarHint::new("q", "Quit"),
        ],
        Screen::Search => vec![
            StatusBarHint::new("Enter", "Search"),
            StatusBarHint::new("Esc", "Back"),
        ],
        Screen::Explorer => {
            if state.explorer.query_active {
                vec![
                    StatusBarHint::new("Enter", "Apply"),
                    StatusBarHint::new("Esc", "Cancel"),
                    StatusBarHint::new("Bksp", "Delete"),
                ]
            } else {
                vec![
                    StatusBarHint::new("Arrows", "Move"),
                    StatusBarHint::new("Enter", "Open"),
                    StatusBarHint::new("/", "Search"),
                    StatusBarHint::new("[ ]", "Type"),
                    StatusBarHint::new("c", "Clear"),
                    StatusBarHint::new("s/S", "Sort"),
                    StatusBarHint::new("n/p", "Page"),
                    StatusBarHint::new("Esc", "Back"),
                    StatusBarHint::new("q", "Quit"),
                ]
            }
        }
        Screen::Detail => vec![
            StatusBarHint::new("Esc", "Back"),
            StatusBarHint::new("q", "Quit"),
        ],
    }
}

fn type_tag_line(types: &[String]) -> Line<'static> {
    if types.is_empty() {
        return Line::from(Span::styled("--", Style::default().fg(TEXT_DIM)));
    }
    let mut spans = Vec::new();
    for (index, name) in types.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!(" {} ", name),
            Style::default()
                .bg(type_color(name))
                .fg(Color::Rgb(20, 20, 24))
                .add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn type_color(name: &str) -> Color {
    match name {
        "fire" => Color::Rgb(240, 128, 48),
        "water" => Color::Rgb(104, 144, 240),
        "grass" => Color::Rgb(120, 200, 80),
        "electric" => Color::Rgb(248, 208, 48),
        "psychic" => Color::Rgb(248, 88, 136),
        "ice" => Color::Rgb(152, 216, 216),
        "dragon" => Color::Rgb(112, 56, 248),
        "dark" => Color::Rgb(112, 88, 72),
        "fairy" => Color::Rgb(238, 153, 172),
        "fighting" => Color::Rgb(192, 48, 40),
        "flying" => Color::Rgb(168, 144, 240),
        "poison" => Color::Rgb(160, 64, 160),
        "ground" => Color::Rgb(224, 192, 104),
        "rock" => Color::Rgb(184, 160, 56),
        "bug" => Color::Rgb(168, 184, 32),
        "ghost" => Color::Rgb(112, 88, 152),
        "steel" => Color::Rgb(184, 184, 208),
        "normal" => Color::Rgb(168, 168, 120),
        _ => Color::Rgb(164, 158, 170),
    }
}

fn render_stat(stat: &PokemonStat) -> String {
    let label = shorten_stat(&stat.name);
    let bar_len = (stat.value as usize / 10).clamp(1, 20);
    let bar = "#".repeat(bar_len);
    format!("{label:>4} {value:>3} {bar}", value = stat.value)
}

fn shorten_stat(name: &str) -> String {
    match name {
        "hp" => " HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SAT".to_string(),
        "special-defense" => "SDF".to_string(),
        "speed" => "SPD".to_string(),
        _ => name.to_ascii_uppercase(),
    }
}

fn format_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => "".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn spinner(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick as usize) % SPINNER_FRAMES.len()]
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn sprite_fit(sprite: &sprite::SpriteData, max_cols: u16, max_rows: u16) -> (u16, u16) {
    if max_cols == 0 || max_rows == 0 || sprite.height == 0 {
        return (max_cols, max_rows);
    }
    let image_ratio = sprite.width as f32 / sprite.height as f32;
    let max_cols_f = max_cols as f32;
    let max_rows_f = max_rows as f32;
    let cols_for_max_rows = image_ratio * max_rows_f * CELL_ASPECT;
    if cols_for_max_rows <= max_cols_f {
        let cols = cols_for_max_rows.max(1.0).round() as u16;
        return (cols.max(1), max_rows.max(1));
    }
    let rows_for_max_cols = max_cols_f / (image_ratio * CELL_ASPECT);
    let rows = rows_for_max_cols.max(1.0).round() as u16;
    (max_cols.max(1), rows.min(max_rows).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_dispatch::testing::*;

    #[test]
    fn test_explorer_page_keys() {
        let state = AppState::default();
        let response = handle_explorer_event(&EventKind::Key(key("n")), &state);
        assert_eq!(response.actions, vec![Action::PageNext]);
        let response = handle_explorer_event(&EventKind::Key(key("p")), &state);
        assert_eq!(response.actions, vec![Action::PagePrev]);
    }

    #[test]
    fn test_explorer_filter_keys() {
        let state = AppState::default();
        let response = handle_explorer_event(&EventKind::Key(key("/")), &state);
        assert_eq!(response.actions, vec![Action::FilterStart]);
        let response = handle_explorer_event(&EventKind::Key(key("]")), &state);
        assert_eq!(response.actions, vec![Action::TypeFilterNext]);
        let response = handle_explorer_event(&EventKind::Key(key("s")), &state);
        assert_eq!(response.actions, vec![Action::SortNext]);
    }

    #[test]
    fn test_filter_mode_captures_text() {
        let state = AppState::default();
        let response = handle_filter_event(&EventKind::Key(key("c")), &state);
        assert_eq!(response.actions, vec![Action::FilterInput('c')]);
    }

    #[test]
    fn test_home_menu_keys() {
        let state = AppState::default();
        let response = handle_home_event(&EventKind::Key(key("j")), &state);
        assert_eq!(response.actions, vec![Action::HomeMove(1)]);
    }

    #[test]
    fn test_format_name_capitalizes_parts() {
        assert_eq!(format_name("charmander"), "Charmander");
        assert_eq!(format_name("mr-mime"), "Mr Mime");
    }

    #[test]
    fn test_sprite_fit_respects_bounds() {
        let sprite = sprite::SpriteData {
            payload: String::new(),
            width: 96,
            height: 96,
        };
        let (cols, rows) = sprite_fit(&sprite, 20, 8);
        assert!(cols <= 20);
        assert!(rows <= 8);
        assert!(cols >= 1 && rows >= 1);
    }
}
