//! Challenges a guess must satisfy and the random source that draws them.

use std::fmt;

use rand::{Rng, seq::IndexedRandom};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::players::{PlayerRecord, Position, Vocabulary};

/// Constraint the guessed player must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    /// A player of the given position who appeared for the club.
    Club { club: String, position: Position },
    /// A player of the given position from the country.
    CountryPosition { country: String, position: Position },
    /// A player from the country who appeared for the club.
    CountryClub { country: String, club: String },
}

impl Prompt {
    /// Position required by the prompt, if it carries one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Prompt::Club { position, .. } | Prompt::CountryPosition { position, .. } => {
                Some(*position)
            }
            Prompt::CountryClub { .. } => None,
        }
    }

    /// Whether `player` satisfies the prompt.
    pub fn admits(&self, player: &PlayerRecord) -> bool {
        if let Some(position) = self.position() {
            if !player.plays(position) {
                return false;
            }
        }

        match self {
            Prompt::Club { club, .. } => player.played_for(club),
            Prompt::CountryPosition { country, .. } => player.is_from(country),
            // No matching rule exists for country+club prompts: every guess fails.
            Prompt::CountryClub { .. } => false,
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Club { club, position } => write!(f, "{position} who played for {club}"),
            Prompt::CountryPosition { country, position } => write!(f, "{position} from {country}"),
            Prompt::CountryClub { country, club } => {
                write!(f, "player from {country} who played for {club}")
            }
        }
    }
}

/// Draw a prompt from the vocabulary.
///
/// Half of the prompts are club + position; the rest split evenly between country + position
/// and country + club. Repeats are allowed. Returns `None` when the vocabulary lacks the values
/// the drawn prompt kind needs.
pub fn generate<R: Rng + ?Sized>(vocabulary: &Vocabulary, rng: &mut R) -> Option<Prompt> {
    if rng.random_bool(0.5) {
        let position = *vocabulary.positions.choose(rng)?;
        let club = vocabulary.clubs.choose(rng)?.clone();
        return Some(Prompt::Club { club, position });
    }

    if rng.random_bool(0.5) {
        let position = *vocabulary.positions.choose(rng)?;
        let country = vocabulary.countries.choose(rng)?.clone();
        Some(Prompt::CountryPosition { country, position })
    } else {
        let country = vocabulary.countries.choose(rng)?.clone();
        let club = vocabulary.clubs.choose(rng)?.clone();
        Some(Prompt::CountryClub { country, club })
    }
}

/// Source of fresh prompts for a session, injectable so sessions can be driven deterministically.
pub trait PromptSource: Send {
    fn next_prompt(&mut self, vocabulary: &Vocabulary) -> Option<Prompt>;
}

/// [`PromptSource`] backed by a random number generator.
#[derive(Debug, Clone)]
pub struct RandomPrompts<R> {
    rng: R,
}

impl<R> RandomPrompts<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> PromptSource for RandomPrompts<R> {
    fn next_prompt(&mut self, vocabulary: &Vocabulary) -> Option<Prompt> {
        generate(vocabulary, &mut self.rng)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::players::tests::sample_database;

    /// Hands out a fixed sequence of prompts, repeating the last one when exhausted.
    pub(crate) struct ScriptedPrompts {
        queue: VecDeque<Prompt>,
        last: Option<Prompt>,
    }

    impl ScriptedPrompts {
        pub(crate) fn new(prompts: impl IntoIterator<Item = Prompt>) -> Self {
            Self {
                queue: prompts.into_iter().collect(),
                last: None,
            }
        }
    }

    impl PromptSource for ScriptedPrompts {
        fn next_prompt(&mut self, _vocabulary: &Vocabulary) -> Option<Prompt> {
            if let Some(next) = self.queue.pop_front() {
                self.last = Some(next);
            }
            self.last.clone()
        }
    }

    pub(crate) fn arsenal_forward() -> Prompt {
        Prompt::Club {
            club: "Arsenal".into(),
            position: Position::Forward,
        }
    }

    #[test]
    fn generated_prompts_only_use_vocabulary_values() {
        let database = sample_database();
        let vocabulary = database.vocabulary();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            match generate(vocabulary, &mut rng).unwrap() {
                Prompt::Club { club, position } => {
                    assert!(vocabulary.clubs.contains(&club));
                    assert!(vocabulary.positions.contains(&position));
                }
                Prompt::CountryPosition { country, position } => {
                    assert!(vocabulary.countries.contains(&country));
                    assert!(vocabulary.positions.contains(&position));
                }
                Prompt::CountryClub { country, club } => {
                    assert!(vocabulary.countries.contains(&country));
                    assert!(vocabulary.clubs.contains(&club));
                }
            }
        }
    }

    #[test]
    fn every_prompt_kind_is_drawn_with_roughly_the_documented_weights() {
        let database = sample_database();
        let mut rng = StdRng::seed_from_u64(42);
        let (mut club, mut country_position, mut country_club) = (0, 0, 0);

        for _ in 0..4000 {
            match generate(database.vocabulary(), &mut rng).unwrap() {
                Prompt::Club { .. } => club += 1,
                Prompt::CountryPosition { .. } => country_position += 1,
                Prompt::CountryClub { .. } => country_club += 1,
            }
        }

        assert!((1800..2200).contains(&club), "{club}");
        assert!((800..1200).contains(&country_position), "{country_position}");
        assert!((800..1200).contains(&country_club), "{country_club}");
    }

    #[test]
    fn empty_vocabulary_yields_no_prompt() {
        let mut prompts = RandomPrompts::new(StdRng::seed_from_u64(1));
        for _ in 0..20 {
            assert!(prompts.next_prompt(&Vocabulary::default()).is_none());
        }
    }

    #[test]
    fn club_prompt_requires_club_and_position() {
        let database = sample_database();
        let prompt = arsenal_forward();

        assert!(prompt.admits(database.find_by_name("Thierry Henry").unwrap()));
        assert!(prompt.admits(database.find_by_name("cesc fabregas").unwrap()));
        assert!(!prompt.admits(database.find_by_name("Ashley Cole").unwrap()));
        assert!(!prompt.admits(database.find_by_name("Frank Lampard").unwrap()));
    }

    #[test]
    fn country_position_prompt_ignores_club() {
        let database = sample_database();
        let prompt = Prompt::CountryPosition {
            country: "ENG ENG".into(),
            position: Position::Midfielder,
        };

        assert!(prompt.admits(database.find_by_name("Frank Lampard").unwrap()));
        assert!(prompt.admits(database.find_by_name("Danny Welbeck").unwrap()));
        assert!(!prompt.admits(database.find_by_name("Cesc Fabregas").unwrap()));
    }

    #[test]
    fn country_club_prompt_admits_nobody() {
        let database = sample_database();
        let prompt = Prompt::CountryClub {
            country: "fr FRA".into(),
            club: "Arsenal".into(),
        };

        assert!(!prompt.admits(database.find_by_name("Thierry Henry").unwrap()));
        assert_eq!(prompt.position(), None);
    }
}
