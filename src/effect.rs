#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadPage { page: usize, seq: u64 },
    LoadTypeCatalog,
    LoadTypePage { name: String, seq: u64 },
    Lookup { query: String, seq: u64 },
    LoadDetail { name: String, seq: u64 },
    LoadSprite { name: String, url: String },
}
