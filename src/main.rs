mod action;
mod api;
mod effect;
mod reducer;
mod sprite;
mod state;
mod ui;

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use crate::action::Action;
use crate::effect::Effect;
use crate::reducer::reducer;
use crate::sprite::SpriteBackend;
use crate::state::{AppState, Screen};

#[derive(Parser, Debug)]
#[command(name = "pokebrowse")]
#[command(about = "Browse the PokeAPI catalog from the terminal")]
struct Args {
    /// Screen to open on launch
    #[arg(long, value_enum, default_value = "home")]
    start: StartScreen,

    /// Open the detail screen for this Pokemon directly
    #[arg(long)]
    pokemon: Option<String>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StartScreen {
    Home,
    Search,
    Explorer,
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum BrowseComponentId {
    Home,
    Search,
    Explorer,
    ExplorerFilter,
    Detail,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum BrowseContext {
    Home,
    Search,
    Explorer,
    ExplorerFilter,
    Detail,
}

impl EventRoutingState<BrowseComponentId, BrowseContext> for AppState {
    fn focused(&self) -> Option<BrowseComponentId> {
        if self.screen == Screen::Explorer && self.explorer.query_active {
            return Some(BrowseComponentId::ExplorerFilter);
        }
        Some(match self.screen {
            Screen::Home => BrowseComponentId::Home,
            Screen::Search => BrowseComponentId::Search,
            Screen::Explorer => BrowseComponentId::Explorer,
            Screen::Detail => BrowseComponentId::Detail,
        })
    }

    fn modal(&self) -> Option<BrowseComponentId> {
        if self.screen == Screen::Explorer && self.explorer.query_active {
            Some(BrowseComponentId::ExplorerFilter)
        } else {
            None
        }
    }

    fn binding_context(&self, id: BrowseComponentId) -> BrowseContext {
        match id {
            BrowseComponentId::Home => BrowseContext::Home,
            BrowseComponentId::Search => BrowseContext::Search,
            BrowseComponentId::Explorer => BrowseContext::Explorer,
            BrowseComponentId::ExplorerFilter => BrowseContext::ExplorerFilter,
            BrowseComponentId::Detail => BrowseContext::Detail,
        }
    }

    fn default_context(&self) -> BrowseContext {
        BrowseContext::Home
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        start,
        pokemon,
        debug: debug_args,
    } = Args::parse();
    let debug = DebugSession::new(debug_args);

    let state = debug
        .load_state_or_else_async(move || async move {
            let screen = match (&pokemon, start) {
                (Some(_), _) => Screen::Detail,
                (None, StartScreen::Home) => Screen::Home,
                (None, StartScreen::Search) => Screen::Search,
                (None, StartScreen::Explorer) => Screen::Explorer,
            };
            Ok::<AppState, io::Error>(AppState::new(screen, pokemon))
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = SpriteBackend::new(stdout, sprite::overlay_slot());
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(ui::BrowseUi::new()));
    let mut bus: EventBus<AppState, Action, BrowseComponentId, BrowseContext> = EventBus::new();
    let keybindings: Keybindings<BrowseContext> = Keybindings::new();

    let ui_home = Rc::clone(&ui);
    bus.register(BrowseComponentId::Home, move |event, state| {
        ui_home.borrow_mut().handle_home_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(BrowseComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    let ui_explorer = Rc::clone(&ui);
    bus.register(BrowseComponentId::Explorer, move |event, state| {
        ui_explorer
            .borrow_mut()
            .handle_explorer_event(&event.kind, state)
    });

    let ui_filter = Rc::clone(&ui);
    bus.register(BrowseComponentId::ExplorerFilter, move |event, state| {
        ui_filter
            .borrow_mut()
            .handle_filter_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(BrowseComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    bus.register_global(|event, _state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char('q') => HandlerResponse::action(Action::Quit),
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(120), || Action::Tick);
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            handle_effect,
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>) {
    match effect {
        Effect::LoadPage { page, seq } => {
            ctx.tasks().spawn(TaskKey::new("page"), async move {
                match api::fetch_page(page).await {
                    Ok(page) => Action::ExplorerPageDidLoad { seq, page },
                    Err(_) => Action::ExplorerPageDidError { seq },
                }
            });
        }
        Effect::LoadTypeCatalog => {
            ctx.tasks().spawn(TaskKey::new("types"), async {
                match api::fetch_filter_types().await {
                    Ok(types) => Action::TypesDidLoad(types),
                    Err(_) => Action::TypesDidError,
                }
            });
        }
        Effect::LoadTypePage { name, seq } => {
            ctx.tasks().spawn(TaskKey::new("type_page"), async move {
                match api::fetch_type_page(&name).await {
                    Ok(records) => Action::TypePageDidLoad { seq, records },
                    Err(_) => Action::TypePageDidError { seq },
                }
            });
        }
        Effect::Lookup { query, seq } => {
            ctx.tasks().spawn(TaskKey::new("lookup"), async move {
                match api::fetch_pokemon(&query).await {
                    Ok(record) => Action::SearchDidLoad {
                        seq,
                        summary: record.summary(),
                    },
                    Err(_) => Action::SearchDidError { seq },
                }
            });
        }
        Effect::LoadDetail { name, seq } => {
            ctx.tasks().spawn(TaskKey::new("detail"), async move {
                match api::fetch_pokemon(&name).await {
                    Ok(record) => Action::DetailDidLoad { seq, record },
                    Err(_) => Action::DetailDidError { seq },
                }
            });
        }
        Effect::LoadSprite { name, url } => {
            let key = format!("sprite_{name}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match api::fetch_bytes(&url).await {
                    Ok(bytes) => match sprite::decode_sprite(&bytes) {
                        Ok(sprite) => Action::SpriteDidLoad { name, sprite },
                        Err(_) => Action::SpriteDidError { name },
                    },
                    Err(_) => Action::SpriteDidError { name },
                }
            });
        }
    }
}
