use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::effect::Effect;
use crate::state::{
    max_pages, AppState, Screen, DETAIL_ERROR, HOME_MENU_LEN, LIST_ERROR, LOOKUP_ERROR,
    TYPES_ERROR, TYPE_PAGE_ERROR,
};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => match state.screen {
            Screen::Explorer => begin_page_load(state),
            Screen::Detail => begin_detail_load(state),
            Screen::Home | Screen::Search => DispatchResult::changed(),
        },

        // ===== Navigation =====
        Action::NavigateBack => match state.screen {
            Screen::Detail => enter_explorer(state),
            Screen::Search | Screen::Explorer => {
                state.screen = Screen::Home;
                DispatchResult::changed()
            }
            Screen::Home => DispatchResult::unchanged(),
        },

        Action::HomeMove(delta) => {
            let len = HOME_MENU_LEN as i16;
            let next = (state.home.selected as i16 + delta).clamp(0, len - 1) as usize;
            if next == state.home.selected {
                return DispatchResult::unchanged();
            }
            state.home.selected = next;
            DispatchResult::changed()
        }

        Action::HomeConfirm => match state.home.selected {
            0 => enter_search(state),
            _ => enter_explorer(state),
        },

        // ===== Search screen =====
        Action::SearchQueryChange(query) => {
            state.search.query = query;
            DispatchResult::changed()
        }

        Action::SearchSubmit(query) => {
            let query = query.trim().to_lowercase();
            if query.is_empty() {
                return DispatchResult::unchanged();
            }
            state.search.result = DataResource::Loading;
            state.search.seq += 1;
            DispatchResult::changed_with(Effect::Lookup {
                query,
                seq: state.search.seq,
            })
        }

        Action::SearchDidLoad { seq, summary } => {
            if seq != state.search.seq {
                return DispatchResult::unchanged();
            }
            let sprite_effect =
                sprite_follow_up(state, &summary.name, summary.sprite_front_default.clone());
            state.search.result = DataResource::Loaded(summary);
            match sprite_effect {
                Some(effect) => DispatchResult::changed_with(effect),
                None => DispatchResult::changed(),
            }
        }

        Action::SearchDidError { seq } => {
            if seq != state.search.seq {
                return DispatchResult::unchanged();
            }
            state.search.result = DataResource::Failed(LOOKUP_ERROR.to_string());
            DispatchResult::changed()
        }

        // ===== Explorer: page lifecycle =====
        Action::ExplorerPageDidLoad { seq, page } => {
            if seq != state.explorer.seq {
                return DispatchResult::unchanged();
            }
            let explorer = &mut state.explorer;
            explorer.max_pages = max_pages(page.total_count);
            explorer.page = explorer.page.min(explorer.max_pages);
            explorer.entries = DataResource::Loaded(page.records);
            explorer.rebuild_visible();
            explorer.selected = 0;
            DispatchResult::changed()
        }

        Action::ExplorerPageDidError { seq } => {
            if seq != state.explorer.seq {
                return DispatchResult::unchanged();
            }
            state.explorer.entries = DataResource::Failed(LIST_ERROR.to_string());
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::TypesDidLoad(types) => {
            state.explorer.types = types;
            DispatchResult::changed()
        }

        Action::TypesDidError => {
            state.explorer.entries = DataResource::Failed(TYPES_ERROR.to_string());
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::TypePageDidLoad { seq, records } => {
            if seq != state.explorer.seq {
                return DispatchResult::unchanged();
            }
            let explorer = &mut state.explorer;
            explorer.entries = DataResource::Loaded(records);
            explorer.max_pages = 1;
            explorer.page = 1;
            explorer.rebuild_visible();
            explorer.selected = 0;
            DispatchResult::changed()
        }

        Action::TypePageDidError { seq } => {
            if seq != state.explorer.seq {
                return DispatchResult::unchanged();
            }
            state.explorer.entries = DataResource::Failed(TYPE_PAGE_ERROR.to_string());
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        // ===== Explorer: pagination =====
        Action::PageNext => change_page(state, 1),
        Action::PagePrev => change_page(state, -1),

        // ===== Explorer: selection =====
        Action::SelectionMove(delta) => {
            let explorer = &mut state.explorer;
            let mut index = explorer.selected as i16 + delta;
            if index < 0 {
                index = 0;
            }
            if !explorer.set_selected(index as usize) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed()
        }

        Action::OpenSelected => {
            let Some(name) = state
                .explorer
                .selected_record()
                .map(|record| record.name.clone())
            else {
                return DispatchResult::unchanged();
            };
            enter_detail(state, name)
        }

        // ===== Explorer: text query =====
        Action::FilterStart => {
            state.explorer.query_active = true;
            state.explorer.query.clear();
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::FilterCancel => {
            if !state.explorer.query_active && state.explorer.query.is_empty() {
                return DispatchResult::unchanged();
            }
            state.explorer.query_active = false;
            state.explorer.query.clear();
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::FilterSubmit => {
            state.explorer.query_active = false;
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::FilterInput(ch) => {
            state.explorer.query.push(ch);
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::FilterBackspace => {
            state.explorer.query.pop();
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        // ===== Explorer: type filter =====
        Action::TypeFilterNext => cycle_type_filter(state, 1),
        Action::TypeFilterPrev => cycle_type_filter(state, -1),

        Action::TypeFilterClear => {
            if state.explorer.type_filter.is_none() {
                return DispatchResult::unchanged();
            }
            state.explorer.type_filter = None;
            begin_page_load(state)
        }

        // ===== Explorer: sort =====
        Action::SortNext => {
            state.explorer.sort = state.explorer.sort.next();
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        Action::SortPrev => {
            state.explorer.sort = state.explorer.sort.prev();
            state.explorer.rebuild_visible();
            DispatchResult::changed()
        }

        // ===== Detail screen =====
        Action::DetailDidLoad { seq, record } => {
            if seq != state.detail.seq {
                return DispatchResult::unchanged();
            }
            let sprite_effect =
                sprite_follow_up(state, &record.name, record.sprite_front_default.clone());
            state.detail.record = DataResource::Loaded(record);
            match sprite_effect {
                Some(effect) => DispatchResult::changed_with(effect),
                None => DispatchResult::changed(),
            }
        }

        Action::DetailDidError { seq } => {
            if seq != state.detail.seq {
                return DispatchResult::unchanged();
            }
            state.detail.record = DataResource::Failed(DETAIL_ERROR.to_string());
            DispatchResult::changed()
        }

        // ===== Sprites =====
        Action::SpriteDidLoad { name, sprite } => {
            if state.sprite_name.as_deref() != Some(&name) {
                return DispatchResult::unchanged();
            }
            state.sprite = Some(sprite);
            state.sprite_loading = false;
            DispatchResult::changed()
        }

        Action::SpriteDidError { name } => {
            if state.sprite_name.as_deref() != Some(&name) {
                return DispatchResult::unchanged();
            }
            state.sprite = None;
            state.sprite_loading = false;
            DispatchResult::changed()
        }

        // ===== Global =====
        Action::Render => DispatchResult::changed(),

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size == (width, height) {
                return DispatchResult::unchanged();
            }
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::Tick => {
            if state.loading_active() {
                state.tick = state.tick.wrapping_add(1);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

// Screen entry resets view state but keeps the sequence counter running, so
// responses from a previous visit can never match a fresh request.
fn enter_search(state: &mut AppState) -> DispatchResult<Effect> {
    state.screen = Screen::Search;
    state.search = crate::state::SearchViewState {
        seq: state.search.seq,
        ..Default::default()
    };
    DispatchResult::changed()
}

fn enter_explorer(state: &mut AppState) -> DispatchResult<Effect> {
    state.screen = Screen::Explorer;
    state.explorer = crate::state::ExplorerState {
        seq: state.explorer.seq,
        ..Default::default()
    };
    begin_page_load(state)
}

fn enter_detail(state: &mut AppState, name: String) -> DispatchResult<Effect> {
    state.screen = Screen::Detail;
    state.detail = crate::state::DetailViewState {
        name: Some(name),
        seq: state.detail.seq,
        ..Default::default()
    };
    begin_detail_load(state)
}

/// Starts the page fetch and the type catalog fetch together, as one view
/// load. The type catalog repopulates on every page change.
fn begin_page_load(state: &mut AppState) -> DispatchResult<Effect> {
    let explorer = &mut state.explorer;
    explorer.entries = DataResource::Loading;
    explorer.visible.clear();
    explorer.selected = 0;
    explorer.seq += 1;
    DispatchResult::changed_with_many(vec![
        Effect::LoadPage {
            page: explorer.page,
            seq: explorer.seq,
        },
        Effect::LoadTypeCatalog,
    ])
}

fn begin_detail_load(state: &mut AppState) -> DispatchResult<Effect> {
    let Some(name) = state.detail.name.clone() else {
        state.detail.record = DataResource::Empty;
        return DispatchResult::changed();
    };
    state.detail.record = DataResource::Loading;
    state.detail.seq += 1;
    DispatchResult::changed_with(Effect::LoadDetail {
        name,
        seq: state.detail.seq,
    })
}

fn change_page(state: &mut AppState, delta: i64) -> DispatchResult<Effect> {
    let explorer = &state.explorer;
    // Pagination is disabled while a type filter is active.
    if explorer.type_filter.is_some() {
        return DispatchResult::unchanged();
    }
    let next = (explorer.page as i64 + delta).clamp(1, explorer.max_pages.max(1) as i64) as usize;
    if next == explorer.page {
        return DispatchResult::unchanged();
    }
    state.explorer.page = next;
    begin_page_load(state)
}

fn cycle_type_filter(state: &mut AppState, step: i16) -> DispatchResult<Effect> {
    if state.explorer.types.is_empty() {
        return DispatchResult::unchanged();
    }

    // Position 0 is "no filter"; 1..=len map onto the type list.
    let list_len = state.explorer.types.len() as i16;
    let current = state
        .explorer
        .type_filter
        .as_ref()
        .and_then(|name| state.explorer.types.iter().position(|t| t == name))
        .map(|index| index as i16 + 1)
        .unwrap_or(0);
    let mut next = current + step;
    if next < 0 {
        next = list_len;
    } else if next > list_len {
        next = 0;
    }

    if next == 0 {
        if state.explorer.type_filter.is_none() {
            return DispatchResult::unchanged();
        }
        state.explorer.type_filter = None;
        return begin_page_load(state);
    }

    let selected = state.explorer.types[(next - 1) as usize].clone();
    let explorer = &mut state.explorer;
    explorer.type_filter = Some(selected.clone());
    explorer.entries = DataResource::Loading;
    explorer.visible.clear();
    explorer.selected = 0;
    explorer.seq += 1;
    DispatchResult::changed_with(Effect::LoadTypePage {
        name: selected,
        seq: explorer.seq,
    })
}

fn sprite_follow_up(state: &mut AppState, name: &str, url: Option<String>) -> Option<Effect> {
    let Some(url) = url else {
        state.sprite_name = None;
        state.sprite = None;
        state.sprite_loading = false;
        return None;
    };
    if state.sprite_name.as_deref() == Some(name) {
        return None;
    }
    state.sprite_name = Some(name.to_string());
    state.sprite = None;
    state.sprite_loading = true;
    Some(Effect::LoadSprite {
        name: name.to_string(),
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PageData, PokemonRecord, PokemonSummary, SortOrder};

    fn record(name: &str, types: &[&str], base_experience: u16) -> PokemonRecord {
        PokemonRecord {
            id: 0,
            name: name.to_string(),
            base_experience,
            height: 7,
            weight: 69,
            types: types.iter().map(|t| t.to_string()).collect(),
            abilities: vec!["overgrow".to_string()],
            stats: Vec::new(),
            sprite_front_default: None,
        }
    }

    fn explorer_state() -> AppState {
        let mut state = AppState::new(Screen::Explorer, None);
        let result = reducer(&mut state, Action::Init);
        assert!(result.changed);
        state
    }

    fn loaded_explorer_state(records: Vec<PokemonRecord>, total_count: u32) -> AppState {
        let mut state = explorer_state();
        let seq = state.explorer.seq;
        reducer(
            &mut state,
            Action::ExplorerPageDidLoad {
                seq,
                page: PageData {
                    total_count,
                    records,
                },
            },
        );
        state
    }

    #[test]
    fn test_init_explorer_starts_page_and_type_loads() {
        let mut state = AppState::new(Screen::Explorer, None);
        let result = reducer(&mut state, Action::Init);

        assert!(state.explorer.entries.is_loading());
        assert_eq!(result.effects.len(), 2);
        assert_eq!(
            result.effects[0],
            Effect::LoadPage {
                page: 1,
                seq: state.explorer.seq
            }
        );
        assert_eq!(result.effects[1], Effect::LoadTypeCatalog);
    }

    #[test]
    fn test_page_load_derives_max_pages() {
        let state = loaded_explorer_state(vec![record("bulbasaur", &["grass"], 64)], 1302);
        assert_eq!(state.explorer.max_pages, 73);
        assert!(state.explorer.entries.is_loaded());
    }

    #[test]
    fn test_stale_page_response_is_dropped() {
        let mut state = explorer_state();
        let stale = state.explorer.seq;
        // A newer load supersedes the in-flight one.
        reducer(&mut state, Action::PageNext);
        let result = reducer(
            &mut state,
            Action::ExplorerPageDidLoad {
                seq: stale,
                page: PageData {
                    total_count: 1302,
                    records: vec![record("bulbasaur", &["grass"], 64)],
                },
            },
        );
        assert!(!result.changed);
        assert!(state.explorer.entries.is_loading());
    }

    #[test]
    fn test_page_next_clamped_and_refetches() {
        let mut state = loaded_explorer_state(Vec::new(), 1302);
        assert_eq!(state.explorer.page, 1);

        // Previous is a no-op at page 1.
        let result = reducer(&mut state, Action::PagePrev);
        assert!(!result.changed);

        let result = reducer(&mut state, Action::PageNext);
        assert!(result.changed);
        assert_eq!(state.explorer.page, 2);
        assert!(state.explorer.entries.is_loading());
        assert!(matches!(result.effects[0], Effect::LoadPage { page: 2, .. }));

        // Next is a no-op at the last page.
        state.explorer.page = 73;
        state.explorer.entries = DataResource::Loaded(Vec::new());
        let result = reducer(&mut state, Action::PageNext);
        assert!(!result.changed);
        assert_eq!(state.explorer.page, 73);
    }

    #[test]
    fn test_type_filter_replaces_set_and_disables_pagination() {
        let mut state = loaded_explorer_state(vec![record("bulbasaur", &["grass"], 64)], 1302);
        reducer(&mut state, Action::TypesDidLoad(vec!["fire".to_string()]));

        let result = reducer(&mut state, Action::TypeFilterNext);
        assert_eq!(state.explorer.type_filter.as_deref(), Some("fire"));
        assert!(state.explorer.entries.is_loading());
        assert!(matches!(
            result.effects[0],
            Effect::LoadTypePage { ref name, .. } if name == "fire"
        ));

        let seq = state.explorer.seq;
        reducer(
            &mut state,
            Action::TypePageDidLoad {
                seq,
                records: vec![
                    record("charmander", &["fire"], 62),
                    record("vulpix", &["fire"], 60),
                ],
            },
        );
        assert_eq!(state.explorer.max_pages, 1);
        assert_eq!(state.explorer.page, 1);
        assert_eq!(state.explorer.visible.len(), 2);

        // Pagination is disabled while the filter is active.
        assert!(!reducer(&mut state, Action::PageNext).changed);
        assert!(!reducer(&mut state, Action::PagePrev).changed);
    }

    #[test]
    fn test_clearing_type_filter_reverts_to_paginated_fetch() {
        let mut state = loaded_explorer_state(Vec::new(), 1302);
        reducer(&mut state, Action::TypesDidLoad(vec!["fire".to_string()]));
        reducer(&mut state, Action::TypeFilterNext);

        let result = reducer(&mut state, Action::TypeFilterClear);
        assert!(state.explorer.type_filter.is_none());
        assert!(matches!(result.effects[0], Effect::LoadPage { .. }));
    }

    #[test]
    fn test_type_cycle_wraps_back_to_no_filter() {
        let mut state = loaded_explorer_state(Vec::new(), 1302);
        reducer(&mut state, Action::TypesDidLoad(vec!["fire".to_string()]));
        reducer(&mut state, Action::TypeFilterNext);
        let result = reducer(&mut state, Action::TypeFilterNext);
        assert!(state.explorer.type_filter.is_none());
        assert!(matches!(result.effects[0], Effect::LoadPage { .. }));
    }

    #[test]
    fn test_query_keystrokes_reapply_filter() {
        let mut state = loaded_explorer_state(
            vec![
                record("charmander", &["fire"], 62),
                record("squirtle", &["water"], 63),
            ],
            36,
        );
        reducer(&mut state, Action::FilterStart);
        for ch in "char".chars() {
            reducer(&mut state, Action::FilterInput(ch));
        }
        assert_eq!(state.explorer.visible.len(), 1);
        assert_eq!(
            state.explorer.selected_record().map(|r| r.name.as_str()),
            Some("charmander")
        );

        reducer(&mut state, Action::FilterCancel);
        assert_eq!(state.explorer.visible.len(), 2);
    }

    #[test]
    fn test_sort_cycle_reorders_visible() {
        let mut state = loaded_explorer_state(
            vec![
                record("pidgey", &["normal"], 64),
                record("charmander", &["fire"], 62),
                record("alakazam", &["psychic"], 198),
            ],
            3,
        );
        state.explorer.sort = SortOrder::NameDesc;
        state.explorer.rebuild_visible();
        reducer(&mut state, Action::SortNext);
        assert_eq!(state.explorer.sort, SortOrder::ExperienceAsc);
        let experience: Vec<_> = state
            .explorer
            .visible_records()
            .iter()
            .map(|r| r.base_experience)
            .collect();
        assert_eq!(experience, vec![62, 64, 198]);
    }

    #[test]
    fn test_open_selected_enters_detail_with_name() {
        let mut state = loaded_explorer_state(vec![record("bulbasaur", &["grass"], 64)], 1);
        let result = reducer(&mut state, Action::OpenSelected);

        assert_eq!(state.screen, Screen::Detail);
        assert_eq!(state.detail.name.as_deref(), Some("bulbasaur"));
        assert!(state.detail.record.is_loading());
        assert!(matches!(
            result.effects[0],
            Effect::LoadDetail { ref name, .. } if name == "bulbasaur"
        ));
    }

    #[test]
    fn test_detail_load_and_error_states() {
        let mut state = AppState::new(Screen::Detail, Some("pikachu".to_string()));
        reducer(&mut state, Action::Init);
        let seq = state.detail.seq;

        let mut loaded = record("pikachu", &["electric"], 112);
        loaded.sprite_front_default = Some("https://example.test/pikachu.png".to_string());
        reducer(
            &mut state,
            Action::DetailDidLoad {
                seq,
                record: loaded,
            },
        );
        assert!(state.detail.record.is_loaded());
        assert!(state.sprite_loading);
        assert_eq!(state.sprite_name.as_deref(), Some("pikachu"));

        let mut state = AppState::new(Screen::Detail, Some("pikachu".to_string()));
        reducer(&mut state, Action::Init);
        let seq = state.detail.seq;
        reducer(&mut state, Action::DetailDidError { seq });
        assert!(matches!(
            &state.detail.record,
            DataResource::Failed(message) if message == DETAIL_ERROR
        ));
    }

    #[test]
    fn test_stale_detail_response_is_dropped() {
        let mut state = AppState::new(Screen::Detail, Some("pikachu".to_string()));
        reducer(&mut state, Action::Init);
        let stale = state.detail.seq;
        state.detail.seq += 1;

        let result = reducer(
            &mut state,
            Action::DetailDidLoad {
                seq: stale,
                record: record("pikachu", &["electric"], 112),
            },
        );
        assert!(!result.changed);
        assert!(state.detail.record.is_loading());
    }

    #[test]
    fn test_search_submit_lowercases_and_ignores_empty() {
        let mut state = AppState::new(Screen::Search, None);
        assert!(!reducer(&mut state, Action::SearchSubmit("   ".to_string())).changed);

        let result = reducer(&mut state, Action::SearchSubmit("Pikachu".to_string()));
        assert!(state.search.result.is_loading());
        assert_eq!(
            result.effects[0],
            Effect::Lookup {
                query: "pikachu".to_string(),
                seq: state.search.seq
            }
        );
    }

    #[test]
    fn test_search_error_uses_fixed_message() {
        let mut state = AppState::new(Screen::Search, None);
        reducer(&mut state, Action::SearchSubmit("doesnotexist123".to_string()));
        let seq = state.search.seq;
        reducer(&mut state, Action::SearchDidError { seq });
        assert!(matches!(
            &state.search.result,
            DataResource::Failed(message) if message == LOOKUP_ERROR
        ));
    }

    #[test]
    fn test_search_latest_submit_wins() {
        let mut state = AppState::new(Screen::Search, None);
        reducer(&mut state, Action::SearchSubmit("pikachu".to_string()));
        let first = state.search.seq;
        reducer(&mut state, Action::SearchSubmit("eevee".to_string()));

        // The slow earlier response resolves after the newer one was issued.
        let result = reducer(
            &mut state,
            Action::SearchDidLoad {
                seq: first,
                summary: PokemonSummary {
                    name: "pikachu".to_string(),
                    sprite_front_default: None,
                    types: vec!["electric".to_string()],
                },
            },
        );
        assert!(!result.changed);
        assert!(state.search.result.is_loading());
    }

    #[test]
    fn test_navigate_back_from_detail_remounts_explorer() {
        let mut state = loaded_explorer_state(vec![record("bulbasaur", &["grass"], 64)], 1);
        reducer(&mut state, Action::OpenSelected);
        let result = reducer(&mut state, Action::NavigateBack);

        assert_eq!(state.screen, Screen::Explorer);
        assert!(state.explorer.entries.is_loading());
        assert!(matches!(result.effects[0], Effect::LoadPage { page: 1, .. }));
    }

    #[test]
    fn test_types_failure_fails_the_view() {
        let mut state = explorer_state();
        reducer(&mut state, Action::TypesDidError);
        assert!(matches!(
            &state.explorer.entries,
            DataResource::Failed(message) if message == TYPES_ERROR
        ));
    }

    #[test]
    fn test_sprite_result_for_other_entity_is_ignored() {
        let mut state = AppState::new(Screen::Detail, Some("pikachu".to_string()));
        state.sprite_name = Some("pikachu".to_string());
        state.sprite_loading = true;

        let result = reducer(
            &mut state,
            Action::SpriteDidError {
                name: "eevee".to_string(),
            },
        );
        assert!(!result.changed);
        assert!(state.sprite_loading);
    }

    #[test]
    fn test_tick_only_renders_while_loading() {
        let mut state = AppState::new(Screen::Home, None);
        assert!(!reducer(&mut state, Action::Tick).changed);

        state.search.result = DataResource::Loading;
        assert!(reducer(&mut state, Action::Tick).changed);
        assert_eq!(state.tick, 1);
    }
}
