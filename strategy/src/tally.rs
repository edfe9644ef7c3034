use azorius::math::{ppm_of, PPM_DENOMINATOR};
use azorius::strategy::StrategyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    No,
    Yes,
    Abstain,
}

/// Tally and voting window of one proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVotes {
    pub voting_start_block: u64,
    pub voting_end_block: u64,
    pub no_votes: u128,
    pub yes_votes: u128,
    pub abstain_votes: u128,
}

impl ProposalVotes {
    pub(crate) fn new(voting_start_block: u64, voting_end_block: u64) -> Self {
        Self {
            voting_start_block,
            voting_end_block,
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, vote_type: VoteType, weight: u128) {
        let bucket = match vote_type {
            VoteType::No => &mut self.no_votes,
            VoteType::Yes => &mut self.yes_votes,
            VoteType::Abstain => &mut self.abstain_votes,
        };
        *bucket = bucket.saturating_add(weight);
    }

    /// Votes counting towards quorum
    pub fn quorum_votes_cast(&self) -> u128 {
        self.yes_votes.saturating_add(self.abstain_votes)
    }

    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.voting_end_block
    }
}

pub(crate) fn validate_quorum_numerator(numerator: u128) -> Result<(), StrategyError> {
    if numerator > PPM_DENOMINATOR {
        return Err(StrategyError::InvalidQuorumNumerator(numerator));
    }
    Ok(())
}

pub(crate) fn validate_basis_numerator(numerator: u128) -> Result<(), StrategyError> {
    if !(PPM_DENOMINATOR / 2..=PPM_DENOMINATOR).contains(&numerator) {
        return Err(StrategyError::InvalidBasisNumerator(numerator));
    }
    Ok(())
}

/// Whether the yes votes reach `basis_numerator` parts per million of all
/// yes and no votes
pub fn meets_basis(yes_votes: u128, no_votes: u128, basis_numerator: u128) -> bool {
    match ppm_of(yes_votes.saturating_add(no_votes), basis_numerator) {
        Ok(threshold) => yes_votes >= threshold,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;
    use test_strategy::proptest;

    #[test]
    fn record_fills_buckets() {
        let mut votes = ProposalVotes::new(1, 11);
        votes.record(VoteType::Yes, 5);
        votes.record(VoteType::No, 3);
        votes.record(VoteType::Abstain, 2);
        votes.record(VoteType::Yes, 1);

        assert_eq!(votes.yes_votes, 6);
        assert_eq!(votes.no_votes, 3);
        assert_eq!(votes.abstain_votes, 2);
        assert_eq!(votes.quorum_votes_cast(), 8);
    }

    #[test]
    fn basis_bounds() {
        assert!(validate_basis_numerator(499_999).is_err());
        assert!(validate_basis_numerator(500_000).is_ok());
        assert!(validate_basis_numerator(1_000_000).is_ok());
        assert!(validate_basis_numerator(1_000_001).is_err());
        assert!(validate_quorum_numerator(0).is_ok());
        assert!(validate_quorum_numerator(1_000_001).is_err());
    }

    #[test]
    fn basis_at_half() {
        assert!(meets_basis(500, 0, 500_000));
        assert!(meets_basis(500, 500, 500_000));
        assert!(!meets_basis(499, 501, 500_000));
    }

    #[proptest]
    fn unanimous_yes_always_meets_basis(
        yes: u64,
        #[strategy(500_000u128..=1_000_000)] basis: u128,
    ) {
        prop_assert!(meets_basis(yes as u128, 0, basis));
    }

    #[proptest]
    fn more_no_never_helps(
        yes: u32,
        no: u32,
        extra: u32,
        #[strategy(500_000u128..=1_000_000)] basis: u128,
    ) {
        let (yes, no, extra) = (yes as u128, no as u128, extra as u128);
        if meets_basis(yes, no + extra, basis) {
            prop_assert!(meets_basis(yes, no, basis));
        }
    }
}
