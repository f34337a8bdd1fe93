//! Immutable in-memory player table with the lookup indexes the game needs.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::Path,
};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::dao::{
    models::PlayerEntity,
    players::{DataLoadError, read_player_file},
};

/// Number of clubs and countries kept in the prompt vocabulary.
pub const VOCABULARY_SIZE: usize = 20;

/// Normalised key used for every case-insensitive comparison.
pub fn name_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Playing positions that can appear in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DF")]
    Defender,
    #[serde(rename = "MF")]
    Midfielder,
    #[serde(rename = "FW")]
    Forward,
}

impl Position {
    /// Two-letter code used in the dataset.
    pub fn code(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DF",
            Position::Midfielder => "MF",
            Position::Forward => "FW",
        }
    }

    /// Parse an exact dataset code. Anything else is not a prompt position.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "GK" => Some(Position::Goalkeeper),
            "DF" => Some(Position::Defender),
            "MF" => Some(Position::Midfielder),
            "FW" => Some(Position::Forward),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One player of the dataset, with normalised lookup keys computed at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Canonical display name.
    pub name: String,
    /// Nationality as written in the dataset.
    pub country: String,
    /// Clubs in dataset order, without duplicates.
    pub clubs: Vec<String>,
    /// Raw position tokens in dataset order, including codes outside GK/DF/MF/FW.
    pub positions: Vec<String>,
    /// Career appearance count.
    pub appearances: u32,
    country_key: String,
    club_keys: HashSet<String>,
    position_keys: HashSet<String>,
}

/// Diagnostic projection of a player attached to guess outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerInfo {
    pub name: String,
    pub country: String,
    pub clubs: String,
    pub position: String,
    pub apps: u32,
}

impl fmt::Display for PlayerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}\nCountry: {}\nClubs: {}\nPosition: {}\nApps: {}",
            self.name, self.country, self.clubs, self.position, self.apps
        )
    }
}

impl PlayerRecord {
    pub fn new<C, P>(
        name: impl Into<String>,
        country: impl Into<String>,
        clubs: C,
        positions: P,
        appearances: u32,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let country = country.into().trim().to_owned();

        let mut club_keys = HashSet::new();
        let clubs = clubs
            .into_iter()
            .map(|club| club.as_ref().trim().to_owned())
            .filter(|club| !club.is_empty() && club_keys.insert(name_key(club)))
            .collect();

        let mut position_keys = HashSet::new();
        let positions = positions
            .into_iter()
            .map(|position| position.as_ref().trim().to_owned())
            .filter(|position| !position.is_empty() && position_keys.insert(name_key(position)))
            .collect();

        Self {
            name: name.into().trim().to_owned(),
            country_key: name_key(&country),
            country,
            clubs,
            positions,
            appearances,
            club_keys,
            position_keys,
        }
    }

    /// Case-insensitive club membership.
    pub fn played_for(&self, club: &str) -> bool {
        self.club_keys.contains(&name_key(club))
    }

    /// Case-insensitive nationality check.
    pub fn is_from(&self, country: &str) -> bool {
        self.country_key == name_key(country)
    }

    /// Case-insensitive position check against every raw token.
    pub fn plays(&self, position: Position) -> bool {
        self.position_keys.contains(&name_key(position.code()))
    }

    /// Positions of this player that are valid prompt positions.
    pub fn prompt_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions
            .iter()
            .filter_map(|token| Position::from_code(token))
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            name: self.name.clone(),
            country: self.country.clone(),
            clubs: self.clubs.join(", "),
            position: self.positions.join(", "),
            apps: self.appearances,
        }
    }
}

impl From<PlayerEntity> for PlayerRecord {
    fn from(value: PlayerEntity) -> Self {
        PlayerRecord::new(
            value.name,
            value.country,
            value.clubs.split(','),
            value.position.split(','),
            value.apps,
        )
    }
}

/// Values prompts are drawn from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    /// Most frequent clubs, sorted alphabetically.
    pub clubs: Vec<String>,
    /// Most frequent countries, sorted alphabetically.
    pub countries: Vec<String>,
    /// Valid positions present in the data, sorted by code.
    pub positions: Vec<Position>,
}

impl Vocabulary {
    fn build(players: &[PlayerRecord]) -> Self {
        // Each club of a multi-club career counts on its own, not the joined club list.
        let clubs = top_by_frequency(
            players.iter().flat_map(|player| player.clubs.iter()),
            VOCABULARY_SIZE,
        );
        let countries = top_by_frequency(
            players
                .iter()
                .map(|player| &player.country)
                .filter(|country| !country.is_empty()),
            VOCABULARY_SIZE,
        );

        let mut positions = players
            .iter()
            .flat_map(PlayerRecord::prompt_positions)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        positions.sort_by_key(|position| position.code());

        Self {
            clubs,
            countries,
            positions,
        }
    }
}

/// Keep the `limit` most frequent values (ties keep first-seen order), then sort them.
fn top_by_frequency<'a>(values: impl Iterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_default() += 1;
    }

    let mut ranked = counts.into_iter().collect::<Vec<_>>();
    // Stable sort keeps encounter order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut top = ranked
        .into_iter()
        .take(limit)
        .map(|(value, _)| value.to_owned())
        .collect::<Vec<_>>();
    top.sort();
    top
}

/// Read-only player table shared by every session.
#[derive(Debug, Clone, Default)]
pub struct PlayerDatabase {
    players: Vec<PlayerRecord>,
    by_name: HashMap<String, Vec<usize>>,
    vocabulary: Vocabulary,
}

impl PlayerDatabase {
    /// Database without players; prompts cannot be generated from it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let players = records.into_iter().collect::<Vec<_>>();

        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, player) in players.iter().enumerate() {
            by_name.entry(name_key(&player.name)).or_default().push(index);
        }

        let vocabulary = Vocabulary::build(&players);
        Self {
            players,
            by_name,
            vocabulary,
        }
    }

    /// Load the dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let rows = read_player_file(path)?;
        Ok(Self::from_records(rows.into_iter().map(PlayerRecord::from)))
    }

    /// Load the dataset, degrading to an empty database when the file is missing or malformed.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(database) => {
                info!(
                    path = %path.display(),
                    players = database.len(),
                    clubs = database.vocabulary.clubs.len(),
                    countries = database.vocabulary.countries.len(),
                    "loaded player data"
                );
                database
            }
            Err(err) => {
                warn!(error = %err, "player data unavailable; starting with an empty database");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// First player whose name matches exactly, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&PlayerRecord> {
        self.find_all_by_name(name).next()
    }

    /// Every player sharing the given name, in dataset order.
    pub fn find_all_by_name(&self, name: &str) -> impl Iterator<Item = &PlayerRecord> {
        self.by_name
            .get(&name_key(name))
            .into_iter()
            .flatten()
            .map(|&index| &self.players[index])
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Names containing `query` (case-insensitive) that are not in `excluded`, in dataset order.
    pub fn search(&self, query: &str, excluded: &NameSet, limit: usize) -> Vec<String> {
        let query = name_key(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        self.players
            .iter()
            .filter(|player| {
                let key = name_key(&player.name);
                key.contains(&query) && !excluded.contains(&player.name) && seen.insert(key)
            })
            .take(limit)
            .map(|player| player.name.clone())
            .collect()
    }
}

/// Case-insensitive set of player names that remembers insertion order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    keys: HashSet<String>,
    names: Vec<String>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name`, returning `false` when an equal name (ignoring case) is already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if !self.keys.insert(name_key(name)) {
            return false;
        }
        self.names.push(name.trim().to_owned());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&name_key(name))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
