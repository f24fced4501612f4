use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::state::{PageData, PokemonRecord, PokemonStat, PAGE_LIMIT};

const API_BASE: &str = "https://pokeapi.co/api/v2";
const FAN_OUT_CONCURRENCY: usize = 12;

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct PagedListResponse {
    count: u32,
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypeListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypeDetailResponse {
    pokemon: Vec<TypePokemonEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypePokemonEntry {
    pokemon: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u16,
    name: String,
    base_experience: Option<u16>,
    height: u16,
    weight: u16,
    types: Vec<PokemonTypeSlot>,
    abilities: Vec<PokemonAbilitySlot>,
    stats: Vec<PokemonStatSlot>,
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonAbilitySlot {
    ability: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

/// Fetch one full record by name or numeric id.
pub async fn fetch_pokemon(query: &str) -> Result<PokemonRecord, String> {
    let url = format!("{API_BASE}/pokemon/{query}");
    let response: PokemonResponse = fetch_json(&url).await?;
    Ok(record_from_response(response))
}

/// Fetch one page of the catalog: the list window plus one detail fetch per
/// listed entity, joined before returning. Record order follows the list.
pub async fn fetch_page(page: usize) -> Result<PageData, String> {
    let offset = page.saturating_sub(1) * PAGE_LIMIT;
    let url = format!("{API_BASE}/pokemon?limit={PAGE_LIMIT}&offset={offset}");
    let response: PagedListResponse = fetch_json(&url).await?;
    let names: Vec<String> = response
        .results
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    let records = fetch_records(names).await?;
    Ok(PageData {
        total_count: response.count,
        records,
    })
}

/// Fetch the type catalog and keep only types with at least one member.
pub async fn fetch_filter_types() -> Result<Vec<String>, String> {
    let url = format!("{API_BASE}/type");
    let response: TypeListResponse = fetch_json(&url).await?;
    if response.results.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(FAN_OUT_CONCURRENCY));
    let mut join_set = JoinSet::new();
    for (index, entry) in response.results.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| "type probe cancelled".to_string())?;
            let detail: TypeDetailResponse = fetch_json(&entry.url).await?;
            Ok::<(usize, String, bool), String>((index, entry.name, !detail.pokemon.is_empty()))
        });
    }

    let mut slots: Vec<Option<(String, bool)>> = vec![None; join_set.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok((index, name, populated))) => slots[index] = Some((name, populated)),
            Ok(Err(error)) => {
                join_set.abort_all();
                return Err(error);
            }
            Err(error) => {
                join_set.abort_all();
                return Err(error.to_string());
            }
        }
    }

    Ok(slots
        .into_iter()
        .flatten()
        .filter(|(_, populated)| *populated)
        .map(|(name, _)| name)
        .collect())
}

/// Fetch the type-scoped entity set: the first page-worth of members of the
/// given type, with one detail fetch per member.
pub async fn fetch_type_page(name: &str) -> Result<Vec<PokemonRecord>, String> {
    let url = format!("{API_BASE}/type/{name}");
    let response: TypeDetailResponse = fetch_json(&url).await?;
    let names: Vec<String> = response
        .pokemon
        .into_iter()
        .take(PAGE_LIMIT)
        .map(|entry| entry.pokemon.name)
        .collect();
    fetch_records(names).await
}

pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let response = http_client()
        .get(url)
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let response = response.error_for_status().map_err(|err| err.to_string())?;
    let bytes = response
        .bytes()
        .await
        .map_err(|err| err.to_string())?
        .to_vec();
    Ok(bytes)
}

/// Concurrent detail fan-out. Input order is preserved in the output; the
/// first failure aborts the remaining fetches and fails the whole batch.
async fn fetch_records(names: Vec<String>) -> Result<Vec<PokemonRecord>, String> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(FAN_OUT_CONCURRENCY));
    let mut join_set = JoinSet::new();
    for (index, name) in names.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| "detail fan-out cancelled".to_string())?;
            let record = fetch_pokemon(&name).await?;
            Ok::<(usize, PokemonRecord), String>((index, record))
        });
    }

    let mut slots: Vec<Option<PokemonRecord>> = vec![None; join_set.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok((index, record))) => slots[index] = Some(record),
            Ok(Err(error)) => {
                join_set.abort_all();
                return Err(error);
            }
            Err(error) => {
                join_set.abort_all();
                return Err(error.to_string());
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

fn record_from_response(response: PokemonResponse) -> PokemonRecord {
    let types = response
        .types
        .into_iter()
        .map(|slot| slot.type_info.name)
        .collect();
    let abilities = response
        .abilities
        .into_iter()
        .map(|slot| slot.ability.name)
        .collect();
    let stats = response
        .stats
        .into_iter()
        .map(|slot| PokemonStat {
            name: slot.stat.name,
            value: slot.base_stat,
        })
        .collect();
    PokemonRecord {
        id: response.id,
        name: response.name,
        base_experience: response.base_experience.unwrap_or_default(),
        height: response.height,
        weight: response.weight,
        types,
        abilities,
        stats,
        sprite_front_default: pointer_string(&response.sprites, "/front_default"),
    }
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

async fn fetch_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, String> {
    let response = http_client()
        .get(url)
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let response = response.error_for_status().map_err(|err| err.to_string())?;
    response.json().await.map_err(|err| err.to_string())
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_response_maps_slots() {
        let raw = serde_json::json!({
            "id": 25,
            "name": "pikachu",
            "base_experience": 112,
            "height": 4,
            "weight": 60,
            "types": [
                {"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}
            ],
            "abilities": [
                {"ability": {"name": "static", "url": "https://pokeapi.co/api/v2/ability/9/"}}
            ],
            "stats": [
                {"base_stat": 35, "stat": {"name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/"}},
                {"base_stat": 90, "stat": {"name": "speed", "url": "https://pokeapi.co/api/v2/stat/6/"}}
            ],
            "sprites": {"front_default": "https://example.test/pikachu.png"}
        });
        let response: PokemonResponse = serde_json::from_value(raw).expect("response parses");
        let record = record_from_response(response);

        assert_eq!(record.name, "pikachu");
        assert_eq!(record.base_experience, 112);
        assert_eq!(record.types, vec!["electric"]);
        assert_eq!(record.abilities, vec!["static"]);
        assert_eq!(record.stats.len(), 2);
        assert_eq!(record.stats[0].name, "hp");
        assert_eq!(record.stats[0].value, 35);
        assert_eq!(
            record.sprite_front_default.as_deref(),
            Some("https://example.test/pikachu.png")
        );
    }

    #[test]
    fn test_record_from_response_tolerates_missing_fields() {
        let raw = serde_json::json!({
            "id": 1,
            "name": "bulbasaur",
            "base_experience": null,
            "height": 7,
            "weight": 69,
            "types": [],
            "abilities": [],
            "stats": [],
            "sprites": {"front_default": null}
        });
        let response: PokemonResponse = serde_json::from_value(raw).expect("response parses");
        let record = record_from_response(response);

        assert_eq!(record.base_experience, 0);
        assert!(record.sprite_front_default.is_none());
    }
}
