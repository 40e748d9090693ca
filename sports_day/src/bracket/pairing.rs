//! Bracket topology: pairing teams into matches and judging round completion.
//!
//! Nothing here touches the database; [`BracketManager`](super::BracketManager)
//! feeds rows in and writes the resulting pairings back.

use super::models::Match;
use crate::errors::{TournamentError, TournamentResult};
use crate::team::TeamId;

/// One match to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub match_number: i32,
    pub team1: TeamId,
    pub team2: Option<TeamId>,
}

impl Pairing {
    /// The team that advances without playing, if this pairing is a bye.
    pub fn bye_winner(&self) -> Option<TeamId> {
        match self.team2 {
            None => Some(self.team1),
            Some(_) => None,
        }
    }
}

/// Pair teams in the order given: 1v2, 3v4, ...
///
/// An odd count leaves the last team alone in a bye. Match numbers run
/// 1..=ceil(n/2).
pub fn pair_teams(teams: &[TeamId]) -> Vec<Pairing> {
    teams
        .chunks(2)
        .zip(1..)
        .map(|(pair, match_number)| Pairing {
            match_number,
            team1: pair[0],
            team2: pair.get(1).copied(),
        })
        .collect()
}

/// State of one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundProgress {
    /// No matches exist for the round
    Empty,
    /// Some matches are still undecided
    InProgress { completed: usize, total: usize },
    /// Every match is decided and the winners move on, in match order
    Complete { winners: Vec<TeamId> },
    /// The round was a single decided match
    Final { champion: TeamId },
}

/// Judge a round from its matches, ordered by match number.
///
/// A completed match without a winner means the table was edited by hand
/// and is reported as [`TournamentError::Inconsistent`].
pub fn assess_round(matches: &[Match]) -> TournamentResult<RoundProgress> {
    if matches.is_empty() {
        return Ok(RoundProgress::Empty);
    }

    let completed = matches.iter().filter(|m| m.is_completed).count();
    if completed < matches.len() {
        return Ok(RoundProgress::InProgress {
            completed,
            total: matches.len(),
        });
    }

    let winners = matches
        .iter()
        .map(|m| {
            m.winner_id.ok_or_else(|| {
                TournamentError::Inconsistent(format!(
                    "match {} is completed without a winner",
                    m.id
                ))
            })
        })
        .collect::<TournamentResult<Vec<TeamId>>>()?;

    match winners.as_slice() {
        [champion] => Ok(RoundProgress::Final {
            champion: *champion,
        }),
        _ => Ok(RoundProgress::Complete { winners }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sport::Sport;
    use proptest::prelude::*;

    fn decided(id: i64, number: i32, t1: TeamId, t2: Option<TeamId>, winner: TeamId) -> Match {
        Match {
            id,
            sport: Sport::Cricket,
            round: 1,
            match_number: number,
            team1_id: Some(t1),
            team2_id: t2,
            winner_id: Some(winner),
            is_completed: true,
        }
    }

    #[test]
    fn test_pair_five_teams() {
        let pairings = pair_teams(&[10, 11, 12, 13, 14]);
        assert_eq!(
            pairings,
            vec![
                Pairing { match_number: 1, team1: 10, team2: Some(11) },
                Pairing { match_number: 2, team1: 12, team2: Some(13) },
                Pairing { match_number: 3, team1: 14, team2: None },
            ]
        );
        assert_eq!(pairings[2].bye_winner(), Some(14));
        assert_eq!(pairings[0].bye_winner(), None);
    }

    #[test]
    fn test_pair_two_teams() {
        let pairings = pair_teams(&[1, 2]);
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings[0].team2, Some(2));
    }

    #[test]
    fn test_pair_single_and_none() {
        assert!(pair_teams(&[]).is_empty());
        assert_eq!(pair_teams(&[7])[0].bye_winner(), Some(7));
    }

    #[test]
    fn test_assess_empty_round() {
        assert_eq!(assess_round(&[]).unwrap(), RoundProgress::Empty);
    }

    #[test]
    fn test_assess_round_in_progress() {
        let mut open = decided(2, 2, 3, Some(4), 3);
        open.winner_id = None;
        open.is_completed = false;
        let matches = vec![decided(1, 1, 1, Some(2), 1), open];

        assert_eq!(
            assess_round(&matches).unwrap(),
            RoundProgress::InProgress { completed: 1, total: 2 }
        );
    }

    #[test]
    fn test_assess_complete_round_keeps_match_order() {
        let matches = vec![
            decided(1, 1, 1, Some(2), 1),
            decided(2, 2, 3, Some(4), 3),
            decided(3, 3, 5, None, 5),
        ];
        assert_eq!(
            assess_round(&matches).unwrap(),
            RoundProgress::Complete { winners: vec![1, 3, 5] }
        );
    }

    #[test]
    fn test_assess_final() {
        let matches = vec![decided(9, 1, 1, Some(5), 5)];
        assert_eq!(assess_round(&matches).unwrap(), RoundProgress::Final { champion: 5 });
    }

    #[test]
    fn test_assess_completed_without_winner_is_inconsistent() {
        let mut broken = decided(4, 1, 1, Some(2), 1);
        broken.winner_id = None;
        assert!(matches!(
            assess_round(&[broken]),
            Err(TournamentError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_cricket_scenario_second_round() {
        // A..E = 1..5; A and C win, E had a bye.
        let round1 = vec![
            decided(1, 1, 1, Some(2), 1),
            decided(2, 2, 3, Some(4), 3),
            decided(3, 3, 5, None, 5),
        ];
        let RoundProgress::Complete { winners } = assess_round(&round1).unwrap() else {
            panic!("round 1 should be complete");
        };
        let round2 = pair_teams(&winners);
        assert_eq!(
            round2,
            vec![
                Pairing { match_number: 1, team1: 1, team2: Some(3) },
                Pairing { match_number: 2, team1: 5, team2: None },
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_pairing_shape(n in 2usize..200) {
            let teams: Vec<TeamId> = (1..=n as i64).collect();
            let pairings = pair_teams(&teams);

            prop_assert_eq!(pairings.len(), n.div_ceil(2));
            for (i, p) in pairings.iter().enumerate() {
                prop_assert_eq!(p.match_number, i as i32 + 1);
            }
            let byes = pairings.iter().filter(|p| p.bye_winner().is_some()).count();
            prop_assert_eq!(byes, n % 2);
            if n % 2 == 1 {
                prop_assert!(pairings.last().unwrap().team2.is_none());
            }
        }

        #[test]
        fn prop_pairing_uses_every_team_once(n in 0usize..200) {
            let teams: Vec<TeamId> = (100..100 + n as i64).collect();
            let placed: Vec<TeamId> = pair_teams(&teams)
                .iter()
                .flat_map(|p| std::iter::once(p.team1).chain(p.team2))
                .collect();
            prop_assert_eq!(placed, teams);
        }

        #[test]
        fn prop_pairing_is_deterministic(teams in prop::collection::vec(1i64..10_000, 2..64)) {
            prop_assert_eq!(pair_teams(&teams), pair_teams(&teams));
        }

        #[test]
        fn prop_tournament_ends_with_one_champion(n in 2usize..100) {
            let mut teams: Vec<TeamId> = (1..=n as i64).collect();
            let mut rounds = 0;
            let mut next_id = 1;
            loop {
                rounds += 1;
                let matches: Vec<Match> = pair_teams(&teams)
                    .into_iter()
                    .map(|p| {
                        next_id += 1;
                        decided(next_id, p.match_number, p.team1, p.team2, p.team1)
                    })
                    .collect();
                match assess_round(&matches).unwrap() {
                    RoundProgress::Final { champion } => {
                        prop_assert_eq!(champion, 1);
                        break;
                    }
                    RoundProgress::Complete { winners } => {
                        prop_assert_eq!(winners.len(), teams.len().div_ceil(2));
                        teams = winners;
                    }
                    other => prop_assert!(false, "unexpected progress {:?}", other),
                }
            }
            let expected = (n as f64).log2().ceil() as i32;
            prop_assert_eq!(rounds, expected);
        }
    }
}
