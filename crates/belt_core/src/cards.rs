//! Deck, hand, shop and card behavior.
//!
//! Catalog cards are data only. Behavior is looked up by card id in a
//! [`CardHandlerRegistry`], so the state never carries executable code and
//! can be serialized as-is.

use std::collections::BTreeMap;
use std::fmt;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{AsteroidId, AsteroidType, CardInstanceId, IdAllocator};
use crate::config::GameConfig;
use crate::data::{CardData, Catalog};
use crate::error::{ActionError, ActionResult, EntityKind};
use crate::state::GameState;

/// One physical card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardInstance {
    /// Identifier of this copy.
    pub id: CardInstanceId,
    /// Catalog card id.
    pub card_id: String,
}

/// A card offered in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopCard {
    /// The card.
    pub card: CardInstance,
    /// Price in credits.
    pub price: u64,
}

/// A mining operation started by playing a mining card.
///
/// Identified by the id of the card that started it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveMiningOperation {
    /// The deployed card.
    pub card: CardInstance,
    /// Asteroid being mined.
    pub asteroid_id: AsteroidId,
    /// Mining power applied each turn.
    pub mining_power: u32,
    /// Turns the operation has run.
    pub turns_active: u32,
}

/// Context handed to a card handler.
#[derive(Debug, Clone, Copy)]
pub struct CardPlay<'a> {
    /// The card being played.
    pub instance: &'a CardInstance,
    /// Its catalog definition.
    pub definition: &'a CardData,
    /// Target asteroid, for mining cards.
    pub target: Option<AsteroidId>,
}

/// Where a played card goes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardDisposition {
    /// Into the discard pile.
    Discard,
    /// Stays in play (an active mining operation holds it).
    Deployed,
}

/// Behavior of one card id.
pub type CardHandler = fn(&mut GameState, &CardPlay<'_>) -> ActionResult<CardDisposition>;

/// Card id → handler table.
#[derive(Clone, Default)]
pub struct CardHandlerRegistry {
    handlers: BTreeMap<String, CardHandler>,
}

impl fmt::Debug for CardHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl CardHandlerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers for every built-in card.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("basic-mining-laser", start_mining_operation);
        registry.register("advanced-mining-laser", start_mining_operation);
        registry.register("s-type-converter", unlock_s_type);
        registry.register("m-type-converter", unlock_m_type);
        registry
    }

    /// Register or replace a handler.
    pub fn register(&mut self, card_id: impl Into<String>, handler: CardHandler) {
        self.handlers.insert(card_id.into(), handler);
    }

    /// Handler for a card id.
    #[must_use]
    pub fn get(&self, card_id: &str) -> Option<CardHandler> {
        self.handlers.get(card_id).copied()
    }

    /// Catalog cards with no handler.
    #[must_use]
    pub fn unhandled<'a>(&self, catalog: &'a Catalog) -> Vec<&'a str> {
        catalog
            .cards
            .iter()
            .filter(|c| !self.handlers.contains_key(&c.id))
            .map(|c| c.id.as_str())
            .collect()
    }
}

fn start_mining_operation(state: &mut GameState, play: &CardPlay<'_>) -> ActionResult<CardDisposition> {
    let target = play
        .target
        .ok_or_else(|| ActionError::unmet("mining cards need a target asteroid"))?;
    let asteroid = state.require_asteroid(target)?;
    if asteroid.is_depleted() {
        return Err(ActionError::unmet(format!("asteroid {target} is exhausted")));
    }
    if let Some(required) = play.definition.asteroid_type_requirement {
        if required != asteroid.asteroid_type {
            return Err(ActionError::unmet(format!(
                "{} only works on {required}-type asteroids",
                play.definition.name
            )));
        }
    }
    let asteroid_type = asteroid.asteroid_type;
    let player = state.require_corporation(state.player_id)?;
    if !player.equipped_mining_types.contains(&asteroid_type) {
        return Err(ActionError::unmet(format!(
            "{asteroid_type}-type mining is not equipped"
        )));
    }
    let mining_power = play
        .definition
        .mining_power
        .ok_or_else(|| ActionError::unmet(format!("{} has no mining power", play.definition.id)))?;

    state.active_mining_operations.push(ActiveMiningOperation {
        card: play.instance.clone(),
        asteroid_id: target,
        mining_power,
        turns_active: 0,
    });
    Ok(CardDisposition::Deployed)
}

fn unlock_mining_type(state: &mut GameState, asteroid_type: AsteroidType) -> ActionResult<CardDisposition> {
    state
        .player_mut()?
        .equipped_mining_types
        .insert(asteroid_type);
    Ok(CardDisposition::Discard)
}

fn unlock_s_type(state: &mut GameState, _play: &CardPlay<'_>) -> ActionResult<CardDisposition> {
    unlock_mining_type(state, AsteroidType::S)
}

fn unlock_m_type(state: &mut GameState, _play: &CardPlay<'_>) -> ActionResult<CardDisposition> {
    unlock_mining_type(state, AsteroidType::M)
}

/// `copies` of every catalog card, shuffled.
pub fn build_starting_deck<R: Rng + ?Sized>(
    catalog: &Catalog,
    copies: usize,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Vec<CardInstance> {
    let mut deck = Vec::with_capacity(catalog.cards.len() * copies);
    for _ in 0..copies {
        for card in &catalog.cards {
            deck.push(CardInstance {
                id: ids.allocate(),
                card_id: card.id.clone(),
            });
        }
    }
    deck.shuffle(rng);
    deck
}

/// A fresh shop: `shop_size` random catalog cards at random prices.
pub fn deal_shop<R: Rng + ?Sized>(
    catalog: &Catalog,
    config: &GameConfig,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Vec<ShopCard> {
    let (low, high) = config.shop_price_range;
    (0..config.shop_size)
        .filter_map(|_| {
            let card = catalog.cards.choose(rng)?;
            Some(ShopCard {
                card: CardInstance {
                    id: ids.allocate(),
                    card_id: card.id.clone(),
                },
                price: rng.random_range(low..high.max(low + 1)),
            })
        })
        .collect()
}

/// Draw the top card. An empty deck is refilled from the shuffled discard
/// pile; with both empty there is nothing to draw.
pub fn draw_card<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) -> ActionResult {
    if state.deck.is_empty() {
        if state.discard_pile.is_empty() {
            return Err(ActionError::unmet("deck and discard pile are empty"));
        }
        state.deck = std::mem::take(&mut state.discard_pile);
        state.deck.shuffle(rng);
    }
    let card = state.deck.remove(0);
    state.hand.push(card);
    Ok(())
}

/// Play a card from the hand.
pub fn play_card(
    state: &mut GameState,
    catalog: &Catalog,
    handlers: &CardHandlerRegistry,
    card_id: CardInstanceId,
    target: Option<AsteroidId>,
) -> ActionResult {
    let index = state
        .hand
        .iter()
        .position(|c| c.id == card_id)
        .ok_or_else(|| ActionError::missing(EntityKind::Card, card_id))?;
    let instance = state.hand[index].clone();
    let definition = catalog
        .card(&instance.card_id)
        .ok_or_else(|| ActionError::missing(EntityKind::CatalogEntry, &instance.card_id))?;
    if state.energy < definition.cost {
        return Err(ActionError::unmet(format!(
            "{} needs {} energy, {} left",
            definition.name, definition.cost, state.energy
        )));
    }
    let handler = handlers
        .get(&definition.id)
        .ok_or_else(|| ActionError::unmet(format!("no behavior for card '{}'", definition.id)))?;

    let play = CardPlay {
        instance: &instance,
        definition,
        target,
    };
    let disposition = handler(state, &play)?;

    state.hand.remove(index);
    state.energy -= definition.cost;
    if disposition == CardDisposition::Discard {
        state.discard_pile.push(instance);
    }
    Ok(())
}

/// Buy a card from the shop; it goes to the discard pile.
pub fn purchase_card(state: &mut GameState, card_id: CardInstanceId) -> ActionResult {
    let index = state
        .shop
        .iter()
        .position(|s| s.card.id == card_id)
        .ok_or_else(|| ActionError::missing(EntityKind::Card, card_id))?;
    let price = state.shop[index].price;
    state.player_mut()?.spend(price)?;
    let bought = state.shop.remove(index);
    state.discard_pile.push(bought.card);
    Ok(())
}

/// Replace the shop's offer.
pub fn refresh_shop<R: Rng + ?Sized>(
    state: &mut GameState,
    catalog: &Catalog,
    config: &GameConfig,
    rng: &mut R,
) -> ActionResult {
    state.shop = deal_shop(catalog, config, &mut state.ids, rng);
    Ok(())
}

/// End a mining operation and discard its card.
pub fn recall_mining_operation(state: &mut GameState, card_id: CardInstanceId) -> ActionResult {
    let index = state
        .active_mining_operations
        .iter()
        .position(|op| op.card.id == card_id)
        .ok_or_else(|| ActionError::missing(EntityKind::Card, card_id))?;
    let operation = state.active_mining_operations.remove(index);
    state.discard_pile.push(operation.card);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::new_game;
    use crate::rng::seeded_rng;

    fn game() -> GameState {
        new_game(&GameConfig::default(), &Catalog::standard(), &mut seeded_rng(21))
    }

    fn put_in_hand(state: &mut GameState, card_id: &str) -> CardInstanceId {
        let id = state.ids.allocate();
        state.hand.push(CardInstance {
            id,
            card_id: card_id.to_string(),
        });
        id
    }

    fn c_type_target(state: &GameState) -> AsteroidId {
        state
            .asteroids
            .iter()
            .find(|a| a.asteroid_type == AsteroidType::C)
            .map(|a| a.id)
            .unwrap()
    }

    #[test]
    fn test_standard_handlers_cover_catalog() {
        let registry = CardHandlerRegistry::standard();
        assert!(registry.unhandled(&Catalog::standard()).is_empty());
    }

    #[test]
    fn test_starting_deck_has_copies_of_each_card() {
        let catalog = Catalog::standard();
        let deck = build_starting_deck(&catalog, 3, &mut IdAllocator::new(), &mut seeded_rng(1));
        assert_eq!(deck.len(), 12);
        for card in &catalog.cards {
            assert_eq!(deck.iter().filter(|c| c.card_id == card.id).count(), 3);
        }
    }

    #[test]
    fn test_draw_reshuffles_discard() {
        let mut state = game();
        let mut rng = seeded_rng(2);
        state.discard_pile = std::mem::take(&mut state.deck);
        let pile = state.discard_pile.len();
        let hand = state.hand.len();

        draw_card(&mut state, &mut rng).unwrap();
        assert_eq!(state.hand.len(), hand + 1);
        assert_eq!(state.deck.len(), pile - 1);
        assert!(state.discard_pile.is_empty());

        state.deck.clear();
        assert!(draw_card(&mut state, &mut rng).is_err());
    }

    #[test]
    fn test_mining_card_starts_operation() {
        let mut state = game();
        let target = c_type_target(&state);
        let card = put_in_hand(&mut state, "basic-mining-laser");

        play_card(
            &mut state,
            &Catalog::standard(),
            &CardHandlerRegistry::standard(),
            card,
            Some(target),
        )
        .unwrap();

        assert_eq!(state.energy, 2);
        assert!(state.hand.iter().all(|c| c.id != card));
        assert_eq!(state.active_mining_operations.len(), 1);
        assert_eq!(state.active_mining_operations[0].mining_power, 50);

        recall_mining_operation(&mut state, card).unwrap();
        assert!(state.active_mining_operations.is_empty());
        assert!(state.discard_pile.iter().any(|c| c.id == card));
    }

    #[test]
    fn test_mining_card_needs_target_and_energy() {
        let mut state = game();
        let card = put_in_hand(&mut state, "basic-mining-laser");
        let catalog = Catalog::standard();
        let handlers = CardHandlerRegistry::standard();

        let err = play_card(&mut state, &catalog, &handlers, card, None).unwrap_err();
        assert!(matches!(err, ActionError::PreconditionUnmet(_)));

        state.energy = 0;
        let target = c_type_target(&state);
        let err = play_card(&mut state, &catalog, &handlers, card, Some(target)).unwrap_err();
        assert!(matches!(err, ActionError::PreconditionUnmet(_)));
    }

    #[test]
    fn test_converter_unlocks_type_and_discards() {
        let mut state = game();
        let card = put_in_hand(&mut state, "s-type-converter");
        play_card(
            &mut state,
            &Catalog::standard(),
            &CardHandlerRegistry::standard(),
            card,
            None,
        )
        .unwrap();
        assert!(state.player().equipped_mining_types.contains(&AsteroidType::S));
        assert_eq!(state.energy, 0);
        assert_eq!(state.discard_pile.last().map(|c| c.id), Some(card));
    }

    #[test]
    fn test_purchase_card_charges_price() {
        let mut state = game();
        let offer = state.shop[0].clone();
        purchase_card(&mut state, offer.card.id).unwrap();
        assert_eq!(state.player().credits, 200 - offer.price);
        assert_eq!(state.discard_pile.last(), Some(&offer.card));
        assert_eq!(state.shop.len(), 2);
    }
}
