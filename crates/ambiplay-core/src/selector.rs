//! Picks the one media session worth showing.

use crate::SessionCandidate;

/// Select the session to observe.
///
/// The first playing or buffering candidate wins; otherwise the first
/// candidate in directory order. There is no stickiness toward a previously
/// bound session, so identical input always yields the same choice.
pub fn select<S>(candidates: Vec<SessionCandidate<S>>) -> Option<SessionCandidate<S>> {
    let index = candidates
        .iter()
        .position(|candidate| candidate.status.is_selection_preferred())
        .unwrap_or(0);
    candidates.into_iter().nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaybackStatus::{self, *};

    fn candidates(statuses: &[PlaybackStatus]) -> Vec<SessionCandidate<usize>> {
        statuses
            .iter()
            .enumerate()
            .map(|(index, status)| SessionCandidate::new(index, *status))
            .collect()
    }

    fn selected(statuses: &[PlaybackStatus]) -> Option<usize> {
        select(candidates(statuses)).map(|candidate| candidate.session)
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert_eq!(selected(&[]), None);
    }

    #[test]
    fn first_playing_or_buffering_wins_regardless_of_position() {
        assert_eq!(selected(&[Paused, Stopped, Playing]), Some(2));
        assert_eq!(selected(&[Idle, Buffering, Playing]), Some(1));
        assert_eq!(selected(&[Playing, Buffering]), Some(0));
        assert_eq!(selected(&[Unknown, Paused, Paused, Paused, Buffering]), Some(4));
    }

    #[test]
    fn falls_back_to_first_candidate_in_order() {
        assert_eq!(selected(&[Paused, Stopped]), Some(0));
        assert_eq!(selected(&[Unknown]), Some(0));
        assert_eq!(selected(&[Stopped, Idle, Paused]), Some(0));
    }

    #[test]
    fn selection_is_deterministic() {
        let statuses = [Paused, Buffering, Playing, Stopped];
        let first = selected(&statuses);
        for _ in 0..8 {
            assert_eq!(selected(&statuses), first);
        }
    }
}
