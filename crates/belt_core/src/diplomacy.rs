//! Diplomacy: proposals, agreements and the status ladder.
//!
//! Relations move along friendly → neutral → hostile → war. Successful
//! agreements move them up according to the agreement type; rejected
//! proposals and broken agreements move both sides exactly one step down.
//! War is only left through a peace agreement.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{AgreementId, CorporationId, DiplomaticStatus, Personality, ProposalId};
use crate::error::{ActionError, ActionResult, EntityKind};
use crate::rng::chance;
use crate::state::{Corporation, GameState};

/// Kind of diplomatic arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiplomaticAction {
    /// Promise not to attack each other.
    NonAggression,
    /// Fight a common enemy together.
    JointCombat,
    /// End a war.
    Peace,
}

impl DiplomaticAction {
    /// Penalty range multiplier as `(numerator, denominator)`.
    const fn penalty_factor(self) -> (u64, u64) {
        match self {
            Self::NonAggression => (1, 1),
            Self::JointCombat => (3, 2),
            Self::Peace => (2, 1),
        }
    }
}

/// Terms of a proposal or agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AgreementTerms {
    /// Credits a party pays the other for breaking the agreement.
    pub penalty: u64,
    /// Turns the agreement lasts; `None` for open-ended.
    #[serde(default)]
    pub duration: Option<u32>,
    /// Turns a joint-combat partner has to act.
    #[serde(default)]
    pub turns_to_act: Option<u32>,
}

/// Lifecycle of an agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    /// In force.
    Active,
    /// Broken by one party.
    Broken,
    /// Ran its full duration.
    Completed,
}

/// A committed arrangement between exactly two corporations. Both parties
/// hold a copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiplomaticAgreement {
    /// Identifier shared by both copies.
    pub id: AgreementId,
    /// Kind of agreement.
    pub kind: DiplomaticAction,
    /// The two parties, proposer first.
    pub parties: [CorporationId; 2],
    /// Terms.
    pub terms: AgreementTerms,
    /// Lifecycle status.
    pub status: AgreementStatus,
    /// Turn the agreement was made.
    pub created_at: u32,
}

impl DiplomaticAgreement {
    /// The party that is not `me`.
    #[must_use]
    pub fn partner_of(&self, me: CorporationId) -> Option<CorporationId> {
        match self.parties {
            [a, b] if a == me => Some(b),
            [a, b] if b == me => Some(a),
            _ => None,
        }
    }
}

/// A pending, one-way offer awaiting the target's answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiplomaticProposal {
    /// Identifier.
    pub id: ProposalId,
    /// Proposing corporation.
    pub from: CorporationId,
    /// Target corporation.
    pub to: CorporationId,
    /// What is proposed.
    pub action: DiplomaticAction,
    /// Proposed terms.
    pub terms: AgreementTerms,
    /// Turn the proposal was made.
    pub created_at: u32,
}

/// What happened to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Waiting for the player's answer.
    Pending(ProposalId),
    /// Accepted; the agreement is in force.
    Accepted(AgreementId),
    /// Refused; relations degraded.
    Rejected,
}

const NEUTRAL_PERSONALITY: Personality = Personality {
    aggression: 0.5,
    cooperation: 0.5,
    greed: 0.5,
};

/// `min(numerator / denominator, 1)`, treating a zero denominator as a
/// full ratio when the numerator is positive.
fn capped_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return if numerator > 0 { 1.0 } else { 0.0 };
    }
    (numerator as f64 / denominator as f64).min(1.0)
}

/// Probability that `target` accepts the proposal, from its personality.
#[must_use]
pub fn acceptance_probability(
    proposer: &Corporation,
    target: &Corporation,
    action: DiplomaticAction,
    terms: &AgreementTerms,
) -> f64 {
    let p = target.personality.unwrap_or(NEUTRAL_PERSONALITY);
    let penalty_ratio = capped_ratio(terms.penalty, target.credits);

    let probability = match action {
        DiplomaticAction::NonAggression => {
            p.cooperation * 0.7 + (1.0 - p.aggression) * 0.3 + penalty_ratio * 0.3
        }
        DiplomaticAction::JointCombat => {
            let strength_ratio = if target.strength() == 0 {
                1.0
            } else {
                capped_ratio(proposer.strength(), target.strength())
            };
            p.aggression * 0.4 + p.cooperation * 0.4 + strength_ratio * 0.2
        }
        DiplomaticAction::Peace => {
            (1.0 - p.aggression) * 0.4
                + target.war_exhaustion() * 0.3
                + p.greed * penalty_ratio * 0.3
        }
    };
    probability.clamp(0.0, 1.0)
}

/// Roll whether an AI target accepts.
pub fn evaluate_proposal<R: Rng + ?Sized>(
    proposer: &Corporation,
    target: &Corporation,
    action: DiplomaticAction,
    terms: &AgreementTerms,
    rng: &mut R,
) -> bool {
    chance(rng, acceptance_probability(proposer, target, action, terms))
}

/// Status both parties move to when an agreement is made.
#[must_use]
pub fn status_after_agreement(current: DiplomaticStatus, action: DiplomaticAction) -> DiplomaticStatus {
    match action {
        DiplomaticAction::Peace => DiplomaticStatus::Neutral,
        DiplomaticAction::NonAggression if current == DiplomaticStatus::War => DiplomaticStatus::War,
        DiplomaticAction::NonAggression => DiplomaticStatus::Neutral,
        DiplomaticAction::JointCombat => DiplomaticStatus::Friendly,
    }
}

/// Reasonable penalty bounds for a proposal: 10% to 30% of the smaller
/// treasury, scaled up for joint-combat (×1.5) and peace (×2).
#[must_use]
pub fn penalty_range(proposer: &Corporation, target: &Corporation, action: DiplomaticAction) -> (u64, u64) {
    let base = proposer.credits.min(target.credits);
    let (num, den) = action.penalty_factor();
    let scale = |percent: u64| base.saturating_mul(percent).saturating_mul(num) / (100 * den);
    (scale(10), scale(30))
}

/// Whether an AI should break an agreement: much stronger than its
/// partner, very aggressive and able to pay the penalty twice over.
#[must_use]
pub fn should_break_agreement(
    breaker: &Corporation,
    partner: &Corporation,
    agreement: &DiplomaticAgreement,
) -> bool {
    let Some(personality) = breaker.personality else {
        return false;
    };
    agreement.status == AgreementStatus::Active
        && breaker.strength() > partner.strength().saturating_mul(2)
        && personality.aggression > 0.8
        && breaker.credits > agreement.terms.penalty.saturating_mul(2)
}

fn degrade_relations(state: &mut GameState, a: CorporationId, b: CorporationId) {
    if let Some(corp) = state.corporations.get_mut(&a) {
        let next = corp.status_with(b).degraded();
        corp.set_status(b, next);
    }
    if let Some(corp) = state.corporations.get_mut(&b) {
        let next = corp.status_with(a).degraded();
        corp.set_status(a, next);
    }
}

fn form_agreement(
    state: &mut GameState,
    from: CorporationId,
    to: CorporationId,
    action: DiplomaticAction,
    terms: AgreementTerms,
) -> ActionResult<AgreementId> {
    let current = state.require_corporation(from)?.status_with(to);
    state.require_corporation(to)?;
    let status = status_after_agreement(current, action);
    let agreement = DiplomaticAgreement {
        id: state.ids.allocate(),
        kind: action,
        parties: [from, to],
        terms,
        status: AgreementStatus::Active,
        created_at: state.turn,
    };
    let id = agreement.id;

    for (me, other) in [(from, to), (to, from)] {
        let corp = state.require_corporation_mut(me)?;
        corp.set_status(other, status);
        corp.agreements.push(agreement.clone());
    }
    Ok(id)
}

/// Make a proposal.
///
/// Proposals to the player are queued for an explicit answer. Proposals to
/// AI corporations are decided on the spot.
pub fn propose<R: Rng + ?Sized>(
    state: &mut GameState,
    from: CorporationId,
    to: CorporationId,
    action: DiplomaticAction,
    terms: AgreementTerms,
    rng: &mut R,
) -> ActionResult<ProposalOutcome> {
    if from == to {
        return Err(ActionError::unmet("a corporation cannot propose to itself"));
    }
    let proposer = state.require_corporation(from)?;
    let target = state.require_corporation(to)?;

    if target.is_player {
        let duplicate = state
            .diplomatic_proposals
            .iter()
            .any(|p| p.from == from && p.to == to && p.action == action);
        if duplicate {
            return Err(ActionError::unmet("an identical proposal is already pending"));
        }
        let proposal = DiplomaticProposal {
            id: state.ids.allocate(),
            from,
            to,
            action,
            terms,
            created_at: state.turn,
        };
        let id = proposal.id;
        state.diplomatic_proposals.push(proposal);
        return Ok(ProposalOutcome::Pending(id));
    }

    if evaluate_proposal(proposer, target, action, &terms, rng) {
        let id = form_agreement(state, from, to, action, terms)?;
        tracing::debug!(%from, %to, ?action, agreement = %id, "Proposal accepted");
        Ok(ProposalOutcome::Accepted(id))
    } else {
        degrade_relations(state, from, to);
        tracing::debug!(%from, %to, ?action, "Proposal rejected");
        Ok(ProposalOutcome::Rejected)
    }
}

fn take_proposal(state: &mut GameState, id: ProposalId) -> ActionResult<DiplomaticProposal> {
    let index = state
        .diplomatic_proposals
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| ActionError::missing(EntityKind::Proposal, id))?;
    Ok(state.diplomatic_proposals.remove(index))
}

/// Accept a pending proposal, turning it into an agreement.
pub fn accept_proposal(state: &mut GameState, id: ProposalId) -> ActionResult<AgreementId> {
    let proposal = take_proposal(state, id)?;
    form_agreement(state, proposal.from, proposal.to, proposal.action, proposal.terms)
}

/// Reject a pending proposal; relations degrade one step.
pub fn reject_proposal(state: &mut GameState, id: ProposalId) -> ActionResult {
    let proposal = take_proposal(state, id)?;
    state.require_corporation(proposal.from)?;
    degrade_relations(state, proposal.from, proposal.to);
    Ok(())
}

/// Break an active agreement. The breaker pays the penalty to the partner;
/// diplomatic status is left as it was.
pub fn break_agreement(state: &mut GameState, breaker: CorporationId, id: AgreementId) -> ActionResult {
    let corp = state.require_corporation(breaker)?;
    let agreement = corp
        .agreements
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| ActionError::missing(EntityKind::Agreement, id))?;
    if agreement.status != AgreementStatus::Active {
        return Err(ActionError::unmet(format!("agreement {id} is not active")));
    }
    let penalty = agreement.terms.penalty;
    let partner = agreement
        .partner_of(breaker)
        .ok_or_else(|| ActionError::missing(EntityKind::Agreement, id))?;
    state.require_corporation(partner)?;

    state.require_corporation_mut(breaker)?.spend(penalty)?;
    state.require_corporation_mut(partner)?.earn(penalty);
    for party in [breaker, partner] {
        if let Some(copy) = state
            .corporations
            .get_mut(&party)
            .and_then(|c| c.agreement_mut(id))
        {
            copy.status = AgreementStatus::Broken;
        }
    }
    tracing::info!(%breaker, %partner, agreement = %id, penalty, "Agreement broken");
    Ok(())
}

/// Complete every active agreement whose duration has run out.
pub fn expire_agreements(state: &mut GameState) -> Vec<AgreementId> {
    let turn = state.turn;
    let mut expired = Vec::new();
    for corp in state.corporations.values_mut() {
        for agreement in &mut corp.agreements {
            let Some(duration) = agreement.terms.duration else {
                continue;
            };
            if agreement.status == AgreementStatus::Active
                && turn >= agreement.created_at.saturating_add(duration)
            {
                agreement.status = AgreementStatus::Completed;
                if !expired.contains(&agreement.id) {
                    expired.push(agreement.id);
                }
            }
        }
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::data::Catalog;
    use crate::factories::new_game;
    use crate::rng::seeded_rng;

    fn game() -> (GameState, CorporationId, CorporationId) {
        let config = GameConfig::default().with_ai_corporations(2);
        let state = new_game(&config, &Catalog::standard(), &mut seeded_rng(13));
        let ai = state.ai_corporation_ids();
        (state, ai[0], ai[1])
    }

    fn set_personality(state: &mut GameState, id: CorporationId, a: f64, c: f64, g: f64) {
        state.corporations.get_mut(&id).unwrap().personality = Some(Personality::new(a, c, g));
    }

    #[test]
    fn test_non_aggression_probability() {
        let (mut state, a, b) = game();
        set_personality(&mut state, b, 0.0, 1.0, 0.0);
        let terms = AgreementTerms {
            penalty: 400,
            ..Default::default()
        };
        let p = acceptance_probability(&state.corporations[&a], &state.corporations[&b], DiplomaticAction::NonAggression, &terms);
        // 0.7 + 0.3 + 0.3 clamps to 1.
        assert!((p - 1.0).abs() < 1e-9);

        set_personality(&mut state, b, 1.0, 0.0, 0.0);
        let p = acceptance_probability(
            &state.corporations[&a],
            &state.corporations[&b],
            DiplomaticAction::NonAggression,
            &AgreementTerms::default(),
        );
        assert!(p.abs() < 1e-9);
    }

    #[test]
    fn test_zero_credit_target_takes_full_penalty_bonus() {
        let (mut state, a, b) = game();
        set_personality(&mut state, b, 1.0, 0.0, 0.0);
        state.corporations.get_mut(&b).unwrap().credits = 0;
        let terms = AgreementTerms {
            penalty: 10,
            ..Default::default()
        };
        let p = acceptance_probability(&state.corporations[&a], &state.corporations[&b], DiplomaticAction::NonAggression, &terms);
        assert!((p - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_peace_uses_war_exhaustion() {
        let (mut state, a, b) = game();
        set_personality(&mut state, b, 1.0, 0.0, 0.0);
        let target = state.corporations.get_mut(&b).unwrap();
        target.health = target.max_health / 2;
        let p = acceptance_probability(
            &state.corporations[&a],
            &state.corporations[&b],
            DiplomaticAction::Peace,
            &AgreementTerms::default(),
        );
        assert!((p - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_proposal_to_player_is_pending() {
        let (mut state, a, _) = game();
        let player = state.player_id;
        let outcome = propose(
            &mut state,
            a,
            player,
            DiplomaticAction::Peace,
            AgreementTerms::default(),
            &mut seeded_rng(1),
        )
        .unwrap();
        assert!(matches!(outcome, ProposalOutcome::Pending(_)));
        assert_eq!(state.diplomatic_proposals.len(), 1);

        // A second identical proposal is refused.
        assert!(propose(
            &mut state,
            a,
            player,
            DiplomaticAction::Peace,
            AgreementTerms::default(),
            &mut seeded_rng(1),
        )
        .is_err());
    }

    #[test]
    fn test_accept_creates_agreement_for_both() {
        let (mut state, a, _) = game();
        let player = state.player_id;
        let ProposalOutcome::Pending(id) = propose(
            &mut state,
            a,
            player,
            DiplomaticAction::JointCombat,
            AgreementTerms::default(),
            &mut seeded_rng(1),
        )
        .unwrap() else {
            panic!("expected a pending proposal");
        };

        let agreement = accept_proposal(&mut state, id).unwrap();
        assert!(state.diplomatic_proposals.is_empty());
        for corp in [a, player] {
            let corp = &state.corporations[&corp];
            assert_eq!(corp.agreements.len(), 1);
            assert_eq!(corp.agreements[0].id, agreement);
            assert_eq!(corp.agreements[0].status, AgreementStatus::Active);
        }
        assert_eq!(state.corporations[&a].status_with(player), DiplomaticStatus::Friendly);
        assert_eq!(state.player().status_with(a), DiplomaticStatus::Friendly);
    }

    #[test]
    fn test_reject_degrades_exactly_one_step() {
        let (mut state, a, _) = game();
        let player = state.player_id;
        for (start, expected) in [
            (DiplomaticStatus::Friendly, DiplomaticStatus::Neutral),
            (DiplomaticStatus::Neutral, DiplomaticStatus::Hostile),
            (DiplomaticStatus::Hostile, DiplomaticStatus::War),
            (DiplomaticStatus::War, DiplomaticStatus::War),
        ] {
            state.corporations.get_mut(&a).unwrap().set_status(player, start);
            state.corporations.get_mut(&player).unwrap().set_status(a, start);
            let ProposalOutcome::Pending(id) = propose(
                &mut state,
                a,
                player,
                DiplomaticAction::NonAggression,
                AgreementTerms::default(),
                &mut seeded_rng(1),
            )
            .unwrap() else {
                panic!("expected a pending proposal");
            };
            reject_proposal(&mut state, id).unwrap();
            assert_eq!(state.corporations[&a].status_with(player), expected);
            assert_eq!(state.player().status_with(a), expected);
        }
    }

    #[test]
    fn test_non_aggression_does_not_end_war() {
        assert_eq!(
            status_after_agreement(DiplomaticStatus::War, DiplomaticAction::NonAggression),
            DiplomaticStatus::War
        );
        assert_eq!(
            status_after_agreement(DiplomaticStatus::War, DiplomaticAction::Peace),
            DiplomaticStatus::Neutral
        );
        assert_eq!(
            status_after_agreement(DiplomaticStatus::Hostile, DiplomaticAction::NonAggression),
            DiplomaticStatus::Neutral
        );
    }

    #[test]
    fn test_ai_target_decides_immediately() {
        let (mut state, a, b) = game();
        set_personality(&mut state, b, 0.0, 1.0, 1.0);
        let outcome = propose(
            &mut state,
            a,
            b,
            DiplomaticAction::NonAggression,
            AgreementTerms::default(),
            &mut seeded_rng(3),
        )
        .unwrap();
        assert!(matches!(outcome, ProposalOutcome::Accepted(_)));

        set_personality(&mut state, b, 1.0, 0.0, 0.0);
        let outcome = propose(
            &mut state,
            a,
            b,
            DiplomaticAction::NonAggression,
            AgreementTerms::default(),
            &mut seeded_rng(3),
        )
        .unwrap();
        assert_eq!(outcome, ProposalOutcome::Rejected);
        assert_eq!(state.corporations[&a].status_with(b), DiplomaticStatus::Hostile);
    }

    #[test]
    fn test_break_agreement_transfers_penalty() {
        let (mut state, a, b) = game();
        set_personality(&mut state, b, 0.0, 1.0, 1.0);
        let terms = AgreementTerms {
            penalty: 40,
            duration: None,
            turns_to_act: None,
        };
        let ProposalOutcome::Accepted(id) = propose(&mut state, a, b, DiplomaticAction::NonAggression, terms, &mut seeded_rng(3)).unwrap() else {
            panic!("expected acceptance");
        };
        let status = state.corporations[&a].status_with(b);

        break_agreement(&mut state, a, id).unwrap();
        assert_eq!(state.corporations[&a].status_with(b), status);
        assert_eq!(state.corporations[&b].status_with(a), status);
        assert_eq!(state.corporations[&a].credits, 160);
        assert_eq!(state.corporations[&b].credits, 240);
        assert_eq!(state.corporations[&a].agreements[0].status, AgreementStatus::Broken);
        assert_eq!(state.corporations[&b].agreements[0].status, AgreementStatus::Broken);
        assert!(break_agreement(&mut state, a, id).is_err());
    }

    #[test]
    fn test_penalty_range_scales_by_action() {
        let (state, a, b) = game();
        let (ca, cb) = (&state.corporations[&a], &state.corporations[&b]);
        assert_eq!(penalty_range(ca, cb, DiplomaticAction::NonAggression), (20, 60));
        assert_eq!(penalty_range(ca, cb, DiplomaticAction::JointCombat), (30, 90));
        assert_eq!(penalty_range(ca, cb, DiplomaticAction::Peace), (40, 120));
    }

    #[test]
    fn test_agreements_expire_after_duration() {
        let (mut state, a, b) = game();
        set_personality(&mut state, b, 0.0, 1.0, 1.0);
        let terms = AgreementTerms {
            penalty: 0,
            duration: Some(2),
            turns_to_act: None,
        };
        propose(&mut state, a, b, DiplomaticAction::NonAggression, terms, &mut seeded_rng(3)).unwrap();

        state.turn += 1;
        assert!(expire_agreements(&mut state).is_empty());
        state.turn += 1;
        assert_eq!(expire_agreements(&mut state).len(), 1);
        assert_eq!(state.corporations[&a].agreements[0].status, AgreementStatus::Completed);
        assert_eq!(state.corporations[&b].agreements[0].status, AgreementStatus::Completed);
    }
}
