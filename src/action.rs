use serde::{Deserialize, Serialize};

use crate::sprite::SpriteData;
use crate::state::{PageData, PokemonRecord, PokemonSummary};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,

    NavigateBack,
    HomeMove(i16),
    HomeConfirm,

    SearchQueryChange(String),
    SearchSubmit(String),
    SearchDidLoad { seq: u64, summary: PokemonSummary },
    SearchDidError { seq: u64 },

    ExplorerPageDidLoad { seq: u64, page: PageData },
    ExplorerPageDidError { seq: u64 },
    TypesDidLoad(Vec<String>),
    TypesDidError,
    TypePageDidLoad { seq: u64, records: Vec<PokemonRecord> },
    TypePageDidError { seq: u64 },
    PageNext,
    PagePrev,
    SelectionMove(i16),
    OpenSelected,

    FilterStart,
    FilterCancel,
    FilterSubmit,
    FilterInput(char),
    FilterBackspace,
    TypeFilterNext,
    TypeFilterPrev,
    TypeFilterClear,
    SortNext,
    SortPrev,

    DetailDidLoad { seq: u64, record: PokemonRecord },
    DetailDidError { seq: u64 },

    SpriteDidLoad { name: String, sprite: SpriteData },
    SpriteDidError { name: String },

    Render,
    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
