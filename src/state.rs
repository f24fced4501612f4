use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::sprite::SpriteData;

/// Entities per explorer page, mirroring the catalog list window.
pub const PAGE_LIMIT: usize = 18;

pub const GRID_COLS: usize = 6;
pub const GRID_ROWS: usize = 3;

pub const LIST_ERROR: &str = "Failed to fetch Pokémon list.";
pub const TYPES_ERROR: &str = "Failed to fetch Pokémon types.";
pub const TYPE_PAGE_ERROR: &str = "Failed to fetch Pokémon by type.";
pub const LOOKUP_ERROR: &str =
    "Pokémon not found. Please try another name or ID (ID starts from \"1\" onwards).";
pub const DETAIL_ERROR: &str = "Failed to fetch Pokémon details.";
pub const DETAIL_EMPTY: &str = "No Pokémon found.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Home,
    Search,
    Explorer,
    Detail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub name: String,
    pub value: u16,
}

/// Full record for one catalog entity, as the API reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonRecord {
    pub id: u16,
    pub name: String,
    pub base_experience: u16,
    pub height: u16,
    pub weight: u16,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub stats: Vec<PokemonStat>,
    pub sprite_front_default: Option<String>,
}

impl PokemonRecord {
    pub fn summary(&self) -> PokemonSummary {
        PokemonSummary {
            name: self.name.clone(),
            sprite_front_default: self.sprite_front_default.clone(),
            types: self.types.clone(),
        }
    }
}

/// The search screen's projection of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonSummary {
    pub name: String,
    pub sprite_front_default: Option<String>,
    pub types: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub total_count: u32,
    pub records: Vec<PokemonRecord>,
}

pub fn max_pages(total_count: u32) -> usize {
    ((total_count as usize + PAGE_LIMIT - 1) / PAGE_LIMIT).max(1)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    None,
    NameAsc,
    NameDesc,
    ExperienceAsc,
    ExperienceDesc,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            SortOrder::None => SortOrder::NameAsc,
            SortOrder::NameAsc => SortOrder::NameDesc,
            SortOrder::NameDesc => SortOrder::ExperienceAsc,
            SortOrder::ExperienceAsc => SortOrder::ExperienceDesc,
            SortOrder::ExperienceDesc => SortOrder::None,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SortOrder::None => SortOrder::ExperienceDesc,
            SortOrder::NameAsc => SortOrder::None,
            SortOrder::NameDesc => SortOrder::NameAsc,
            SortOrder::ExperienceAsc => SortOrder::NameDesc,
            SortOrder::ExperienceDesc => SortOrder::ExperienceAsc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::None => "Sort by",
            SortOrder::NameAsc => "Name (A-Z)",
            SortOrder::NameDesc => "Name (Z-A)",
            SortOrder::ExperienceAsc => "Base Experience (Low-High)",
            SortOrder::ExperienceDesc => "Base Experience (High-Low)",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HomeState {
    pub selected: usize,
}

pub const HOME_MENU_LEN: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchViewState {
    pub query: String,
    pub result: DataResource<PokemonSummary>,
    pub seq: u64,
}

impl Default for SearchViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            result: DataResource::Empty,
            seq: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplorerState {
    pub page: usize,
    pub max_pages: usize,
    /// Authoritative fetched set for the current page or type filter.
    pub entries: DataResource<Vec<PokemonRecord>>,
    /// Indices into the fetched set after query, type and sort are applied.
    pub visible: Vec<usize>,
    pub selected: usize,
    pub query: String,
    pub query_active: bool,
    pub types: Vec<String>,
    pub type_filter: Option<String>,
    pub sort: SortOrder,
    pub seq: u64,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self {
            page: 1,
            max_pages: 1,
            entries: DataResource::Empty,
            visible: Vec::new(),
            selected: 0,
            query: String::new(),
            query_active: false,
            types: Vec::new(),
            type_filter: None,
            sort: SortOrder::None,
            seq: 0,
        }
    }
}

impl ExplorerState {
    /// Reapplies query, type and sort against the fetched set, in that order.
    pub fn rebuild_visible(&mut self) {
        let Some(records) = self.entries.data() else {
            self.visible.clear();
            self.selected = 0;
            return;
        };
        let query = self.query.trim().to_lowercase();
        let mut visible: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                let matches_query =
                    query.is_empty() || record.name.to_lowercase().contains(&query);
                let matches_type = match self.type_filter.as_deref() {
                    Some(type_name) => record.types.iter().any(|name| name == type_name),
                    None => true,
                };
                matches_query && matches_type
            })
            .map(|(index, _)| index)
            .collect();
        match self.sort {
            SortOrder::None => {}
            SortOrder::NameAsc => visible.sort_by(|a, b| records[*a].name.cmp(&records[*b].name)),
            SortOrder::NameDesc => visible.sort_by(|a, b| records[*b].name.cmp(&records[*a].name)),
            SortOrder::ExperienceAsc => {
                visible.sort_by_key(|index| records[*index].base_experience)
            }
            SortOrder::ExperienceDesc => {
                visible.sort_by_key(|index| std::cmp::Reverse(records[*index].base_experience))
            }
        }
        self.visible = visible;
        if self.selected >= self.visible.len() {
            self.selected = 0;
        }
    }

    pub fn selected_record(&self) -> Option<&PokemonRecord> {
        let records = self.entries.data()?;
        self.visible
            .get(self.selected)
            .and_then(|index| records.get(*index))
    }

    pub fn visible_records(&self) -> Vec<&PokemonRecord> {
        let Some(records) = self.entries.data() else {
            return Vec::new();
        };
        self.visible
            .iter()
            .filter_map(|index| records.get(*index))
            .collect()
    }

    pub fn set_selected(&mut self, index: usize) -> bool {
        if self.visible.is_empty() {
            self.selected = 0;
            return false;
        }
        let bounded = index.min(self.visible.len() - 1);
        if bounded != self.selected {
            self.selected = bounded;
            return true;
        }
        false
    }

    pub fn prev_page_enabled(&self) -> bool {
        self.type_filter.is_none() && self.page > 1
    }

    pub fn next_page_enabled(&self) -> bool {
        self.type_filter.is_none() && self.page < self.max_pages
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetailViewState {
    /// Route parameter: the name this screen was opened with.
    pub name: Option<String>,
    pub record: DataResource<PokemonRecord>,
    pub seq: u64,
}

impl Default for DetailViewState {
    fn default() -> Self {
        Self {
            name: None,
            record: DataResource::Empty,
            seq: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub screen: Screen,
    pub home: HomeState,
    pub search: SearchViewState,
    pub explorer: ExplorerState,
    pub detail: DetailViewState,

    pub sprite_name: Option<String>,
    pub sprite: Option<SpriteData>,
    pub sprite_loading: bool,

    pub terminal_size: (u16, u16),
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Screen::Home, None)
    }
}

impl AppState {
    pub fn new(screen: Screen, detail_name: Option<String>) -> Self {
        Self {
            screen,
            home: HomeState::default(),
            search: SearchViewState::default(),
            explorer: ExplorerState::default(),
            detail: DetailViewState {
                name: detail_name,
                ..DetailViewState::default()
            },
            sprite_name: None,
            sprite: None,
            sprite_loading: false,
            terminal_size: (80, 24),
            tick: 0,
        }
    }

    pub fn loading_active(&self) -> bool {
        self.search.result.is_loading()
            || self.explorer.entries.is_loading()
            || self.detail.record.is_loading()
            || self.sprite_loading
    }

    pub fn sprite_for(&self, name: &str) -> Option<&SpriteData> {
        if self.sprite_name.as_deref() == Some(name) {
            self.sprite.as_ref()
        } else {
            None
        }
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Screen")
                .entry("screen", ron_string(&self.screen))
                .entry("page", ron_string(&self.explorer.page))
                .entry("max_pages", ron_string(&self.explorer.max_pages))
                .entry("detail", ron_string(&self.detail.name)),
            DebugSection::new("Filters")
                .entry("query", ron_string(&self.explorer.query))
                .entry("query_active", ron_string(&self.explorer.query_active))
                .entry("type", ron_string(&self.explorer.type_filter))
                .entry("sort", ron_string(&self.explorer.sort))
                .entry("visible", ron_string(&self.explorer.visible.len())),
            DebugSection::new("Status")
                .entry("search_loading", ron_string(&self.search.result.is_loading()))
                .entry(
                    "explorer_loading",
                    ron_string(&self.explorer.entries.is_loading()),
                )
                .entry("detail_loading", ron_string(&self.detail.record.is_loading()))
                .entry("sprite_loading", ron_string(&self.sprite_loading)),
        ]
    }
}
