//! AI decision making.
//!
//! Two layers: a per-ship combat heuristic used for every ship not given an
//! explicit order, and a per-corporation strategy picked once per turn for
//! every AI corporation from its personality.

use crate::combat::CombatAction;
use crate::components::{AgreementId, CorporationId, DiplomaticStatus};
use crate::config::GameConfig;
use crate::diplomacy::{should_break_agreement, AgreementTerms, DiplomaticAction};
use crate::fleet::Ship;
use crate::math::{fraction_above, fraction_below, Fixed};
use crate::state::{Corporation, GameState};

/// Pick a combat action for a ship from its hull and loadout.
///
/// Badly damaged ships retreat, damaged ships defend, and healthy ships
/// lean toward whichever of weapons or shields clearly dominates.
#[must_use]
pub fn choose_combat_action(ship: &Ship) -> CombatAction {
    let (health, max) = (ship.health, ship.max_health);
    if max <= Fixed::ZERO {
        return CombatAction::Defend;
    }
    if fraction_below(health, max, 1, 5) {
        return CombatAction::Retreat;
    }
    if fraction_below(health, max, 2, 5) {
        return CombatAction::Defend;
    }

    let attack = u64::from(ship.weapon_power());
    let defense = u64::from(ship.shield_power());
    if attack * 2 > defense * 3 {
        CombatAction::Attack
    } else if defense * 2 > attack * 3 {
        CombatAction::Defend
    } else if fraction_above(health, max, 7, 10) {
        CombatAction::Attack
    } else {
        CombatAction::Defend
    }
}

/// A corporation's move for the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategicDecision {
    /// Offer an agreement.
    Propose {
        /// Target corporation.
        target: CorporationId,
        /// Agreement kind.
        action: DiplomaticAction,
        /// Offered terms.
        terms: AgreementTerms,
    },
    /// Break an agreement for profit.
    BreakAgreement {
        /// Agreement to break.
        agreement: AgreementId,
    },
    /// Nothing this turn.
    Idle,
}

fn proposal_terms(corp: &Corporation, action: DiplomaticAction, config: &GameConfig) -> AgreementTerms {
    AgreementTerms {
        penalty: corp.credits.saturating_mul(u64::from(config.ai_proposal_penalty_percent)) / 100,
        duration: Some(config.agreement_duration),
        turns_to_act: (action == DiplomaticAction::JointCombat)
            .then_some(config.joint_combat_turns_to_act),
    }
}

fn first_with_status(
    state: &GameState,
    corp: &Corporation,
    status: DiplomaticStatus,
) -> Option<CorporationId> {
    state
        .corporations
        .keys()
        .copied()
        .find(|&other| other != corp.id && corp.status_with(other) == status)
}

/// Choose one strategic move, trying rules in a fixed priority order. A
/// rule whose target does not exist falls through to the next.
///
/// 1. Damaged and cooperative: offer peace to someone at war.
/// 2. Wealthy, aggressive and strongest: offer joint combat to the weakest
///    weaker corporation not at war with us.
/// 3. Greedy and not wealthy: offer non-aggression to someone hostile.
/// 4. Break the first agreement that pays to break.
#[must_use]
pub fn decide_strategy(state: &GameState, corp_id: CorporationId, config: &GameConfig) -> StrategicDecision {
    let Some(corp) = state.corporation(corp_id) else {
        return StrategicDecision::Idle;
    };
    let Some(personality) = corp.personality.filter(|_| !corp.is_player) else {
        return StrategicDecision::Idle;
    };
    let propose = |target, action| StrategicDecision::Propose {
        target,
        action,
        terms: proposal_terms(corp, action, config),
    };

    if corp.health < corp.max_health && personality.cooperation > 0.7 {
        if let Some(target) = first_with_status(state, corp, DiplomaticStatus::War) {
            return propose(target, DiplomaticAction::Peace);
        }
    }

    let strength = corp.strength();
    if corp.credits > config.ai_wealth_threshold && personality.aggression > 0.7 {
        let strongest = state
            .corporations
            .values()
            .all(|other| other.id == corp.id || strength >= other.strength());
        if strongest {
            let weakest = state
                .corporations
                .values()
                .filter(|other| {
                    other.id != corp.id
                        && other.strength() < strength
                        && corp.status_with(other.id) != DiplomaticStatus::War
                })
                .min_by_key(|other| (other.strength(), other.id));
            if let Some(target) = weakest {
                return propose(target.id, DiplomaticAction::JointCombat);
            }
        }
    }

    if personality.greed > 0.7 && corp.credits <= config.ai_wealth_threshold {
        if let Some(target) = first_with_status(state, corp, DiplomaticStatus::Hostile) {
            return propose(target, DiplomaticAction::NonAggression);
        }
    }

    for agreement in corp.active_agreements() {
        let partner = agreement
            .partner_of(corp.id)
            .and_then(|id| state.corporation(id));
        if let Some(partner) = partner {
            if should_break_agreement(corp, partner, agreement) {
                return StrategicDecision::BreakAgreement {
                    agreement: agreement.id,
                };
            }
        }
    }

    StrategicDecision::Idle
}
