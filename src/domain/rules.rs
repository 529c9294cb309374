/// Game rules: input parsing, bet limits and flip resolution.
///
/// Everything here is pure: no rendering, no clock, no session. The state
/// machine calls these and turns the answers into transitions.

use crate::domain::coin::CoinSide;

/// Parse a strictly positive integer. Anything else (text, zero, negatives,
/// overflow) is `None`.
pub fn parse_positive_int(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok().filter(|v| *v > 0)
}

/// Classification of a yes/no style answer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Answer {
    Positive,
    Negative,
    Other,
}

pub fn classify_answer(input: &str, positive: &[String], negative: &[String]) -> Answer {
    let word = input.trim().to_lowercase();
    if negative.iter().any(|p| *p == word) {
        Answer::Negative
    } else if positive.iter().any(|p| *p == word) {
        Answer::Positive
    } else {
        Answer::Other
    }
}

/// Largest bet allowed. In loan mode the player may go down to the
/// (negative) debt threshold. Saturates: balances come from the save file.
pub fn max_bet(balance: i64, loan_mode: bool, debt_threshold: i64) -> i64 {
    balance.saturating_sub(if loan_mode { debt_threshold } else { 0 })
}

pub fn is_valid_bet(bet: i64, balance: i64, loan_mode: bool, debt_threshold: i64) -> bool {
    bet > 0 && bet <= max_bet(balance, loan_mode, debt_threshold)
}

/// Starting balances up to this amount get the "poor player" greeting.
pub const POOR_PLAYER_LIMIT: i64 = 1000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BalanceTier {
    Poor,
    Rich,
}

pub fn balance_tier(balance: i64) -> BalanceTier {
    if balance <= POOR_PLAYER_LIMIT { BalanceTier::Poor } else { BalanceTier::Rich }
}

/// What a finished coin flip means for the session.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlipOutcome {
    /// Correct guess and the mode's goal is reached.
    GoalReached,
    /// Correct guess, keep playing.
    Doubled,
    /// Wrong guess, still solvent (or above the debt threshold).
    Lost,
    /// Wrong guess in loan mode and the debt threshold is hit.
    Bankrupt,
    /// Wrong guess, out of money, loans not yet enabled.
    OutOfMoney,
}

/// Inputs to a flip resolution. `balance` has the bet already deducted.
#[derive(Clone, Copy, Debug)]
pub struct FlipContext {
    pub balance: i64,
    pub bet: i64,
    pub loan_mode: bool,
    pub debt_threshold: i64,
    pub goal: i64,
}

/// Resolve a flip: returns the new balance and the outcome.
pub fn resolve_flip(ctx: FlipContext, prediction: CoinSide, result: CoinSide) -> (i64, FlipOutcome) {
    if prediction == result {
        let balance = ctx.balance.saturating_add(ctx.bet.saturating_mul(2));
        let outcome = if balance >= ctx.goal { FlipOutcome::GoalReached } else { FlipOutcome::Doubled };
        return (balance, outcome);
    }

    let outcome = match (ctx.loan_mode, ctx.balance) {
        (true, b) if b > ctx.debt_threshold => FlipOutcome::Lost,
        (true, _) => FlipOutcome::Bankrupt,
        (false, b) if b > 0 => FlipOutcome::Lost,
        (false, _) => FlipOutcome::OutOfMoney,
    };
    (ctx.balance, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(balance: i64, bet: i64, loan_mode: bool) -> FlipContext {
        FlipContext { balance, bet, loan_mode, debt_threshold: -3000, goal: 4000 }
    }

    #[test]
    fn positive_int_parsing() {
        assert_eq!(parse_positive_int("500"), Some(500));
        assert_eq!(parse_positive_int(" 42 "), Some(42));
        assert_eq!(parse_positive_int("0"), None);
        assert_eq!(parse_positive_int("-5"), None);
        assert_eq!(parse_positive_int("12abc"), None);
        assert_eq!(parse_positive_int("99999999999999999999999"), None);
        assert_eq!(parse_positive_int(""), None);
    }

    #[test]
    fn answers_are_case_insensitive() {
        let pos = vec!["yes".to_string(), "y".to_string()];
        let neg = vec!["no".to_string(), "quit".to_string()];
        assert_eq!(classify_answer("YES", &pos, &neg), Answer::Positive);
        assert_eq!(classify_answer(" Quit", &pos, &neg), Answer::Negative);
        assert_eq!(classify_answer("maybe", &pos, &neg), Answer::Other);
    }

    #[test]
    fn bet_limits_without_loans() {
        for bet in -5..=1005 {
            let valid = is_valid_bet(bet, 1000, false, -3000);
            assert_eq!(valid, bet > 0 && bet <= 1000, "bet {bet}");
        }
    }

    #[test]
    fn bet_limits_with_loans() {
        assert!(is_valid_bet(3500, 500, true, -3000));
        assert!(!is_valid_bet(3501, 500, true, -3000));
        // Already in debt: only the remaining headroom may be bet.
        assert!(is_valid_bet(1000, -2000, true, -3000));
        assert!(!is_valid_bet(1001, -2000, true, -3000));
        assert!(!is_valid_bet(0, -2000, true, -3000));
    }

    #[test]
    fn huge_balances_saturate() {
        assert_eq!(max_bet(i64::MAX, true, -3000), i64::MAX);
        assert!(is_valid_bet(100, i64::MAX, true, -3000));
        assert!(!is_valid_bet(100, i64::MIN, true, 3000));

        let (balance, outcome) = resolve_flip(ctx(i64::MAX - 100, i64::MAX, false), CoinSide::Heads, CoinSide::Heads);
        assert_eq!(balance, i64::MAX);
        assert_eq!(outcome, FlipOutcome::GoalReached);
    }

    #[test]
    fn tiers() {
        assert_eq!(balance_tier(1), BalanceTier::Poor);
        assert_eq!(balance_tier(1000), BalanceTier::Poor);
        assert_eq!(balance_tier(1001), BalanceTier::Rich);
    }

    #[test]
    fn correct_guess_doubles_bet() {
        let (balance, outcome) = resolve_flip(ctx(500, 500, false), CoinSide::Heads, CoinSide::Heads);
        assert_eq!(balance, 1500);
        assert_eq!(outcome, FlipOutcome::Doubled);
    }

    #[test]
    fn correct_guess_reaching_goal_wins() {
        let (balance, outcome) = resolve_flip(ctx(2000, 1000, false), CoinSide::Tails, CoinSide::Tails);
        assert_eq!(balance, 4000);
        assert_eq!(outcome, FlipOutcome::GoalReached);
    }

    #[test]
    fn wrong_guess_branches() {
        let r = |b, loan| resolve_flip(ctx(b, 100, loan), CoinSide::Heads, CoinSide::Tails).1;
        assert_eq!(r(100, false), FlipOutcome::Lost);
        assert_eq!(r(0, false), FlipOutcome::OutOfMoney);
        assert_eq!(r(-2999, true), FlipOutcome::Lost);
        assert_eq!(r(-3000, true), FlipOutcome::Bankrupt);
        assert_eq!(r(-3100, true), FlipOutcome::Bankrupt);
    }
}
