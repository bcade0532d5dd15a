//! Heuristic evaluation of non-terminal positions at the depth limit.

use crate::core::Utility;
use crate::game::Game;

/// Estimates a reward vector for a position the search will not expand.
///
/// No general evaluator exists for arbitrary N-player games, so one is
/// supplied per game. Closures `Fn(&G, &G::State) -> Utility` implement this.
pub trait Evaluator<G: Game>: Send + Sync {
    fn evaluate(&self, game: &G, state: &G::State) -> Utility;
}

impl<G, F> Evaluator<G> for F
where
    G: Game,
    F: Fn(&G, &G::State) -> Utility + Send + Sync,
{
    fn evaluate(&self, game: &G, state: &G::State) -> Utility {
        self(game, state)
    }
}

/// Scores every position with the same value for each player.
#[derive(Clone, Copy, Debug)]
pub struct ConstantEvaluator(pub f64);

impl<G: Game> Evaluator<G> for ConstantEvaluator {
    fn evaluate(&self, game: &G, _state: &G::State) -> Utility {
        Utility::with_value(game.player_count(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{TreeGame, TreeSpec};

    #[test]
    fn test_closure_and_constant() {
        let game = TreeGame::new(
            2,
            TreeSpec::scored(&[3.0, 1.0], vec![TreeSpec::leaf(&[0.0, 0.0])]),
        )
        .unwrap();
        let root = game.initial_state();

        let heuristic = |g: &TreeGame, s: &crate::games::TreeState| g.heuristic(s);
        assert_eq!(heuristic.evaluate(&game, &root).as_slice(), &[3.0, 1.0]);
        assert_eq!(
            Evaluator::<TreeGame>::evaluate(&ConstantEvaluator(0.5), &game, &root).as_slice(),
            &[0.5, 0.5]
        );
    }
}
