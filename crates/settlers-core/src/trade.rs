//! Bank trading at a fixed 3:1 ratio.
//!
//! [`plan_trades`] answers "can this bundle pay for that cost if it trades
//! with the bank first, and which trades?". It is a greedy feasibility check,
//! not a search for the cheapest set of trades.

use crate::board::Resource;
use crate::player::ResourceBundle;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Units given to the bank per trade
pub const TRADE_COST: u32 = 3;

/// Units received from the bank per trade
pub const TRADE_YIELD: u32 = 1;

/// One bank trade: three `input` for one `output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeExchange {
    pub input: Resource,
    pub output: Resource,
}

impl TradeExchange {
    pub const fn new(input: Resource, output: Resource) -> Self {
        Self { input, output }
    }

    /// What the bank takes
    pub fn cost(&self) -> ResourceBundle {
        ResourceBundle::single(self.input, TRADE_COST)
    }

    /// What the bank gives back
    pub fn item(&self) -> ResourceBundle {
        ResourceBundle::single(self.output, TRADE_YIELD)
    }

    /// Perform the trade on `bundle`; false (bundle untouched) if it can't pay
    pub fn charge(&self, bundle: &mut ResourceBundle) -> bool {
        if self.input == self.output || !bundle.try_subtract(&self.cost()) {
            return false;
        }
        bundle.add_bundle(&self.item());
        true
    }
}

/// Work out which trades let `source` cover `cost`.
///
/// Returns `Some(vec![])` if no trade is needed, `Some(trades)` if the greedy
/// pass finds enough surplus, and `None` if it does not. Resources are tried
/// in ascending order of how much `cost` needs them (slot order on ties), and a
/// resource is only traded down while it still covers its own share of `cost`.
pub fn plan_trades(source: &ResourceBundle, cost: &ResourceBundle) -> Option<Vec<TradeExchange>> {
    if source.can_afford(cost) {
        return Some(Vec::new());
    }

    let missing = source.missing(cost);
    let mut total_missing = missing.total();

    let mut order = Resource::ALL.to_vec();
    order.sort_by_key(|r| cost.get(*r));

    let mut trades = [0u32; 5];
    for resource in order {
        if missing.get(resource) > 0 {
            continue;
        }
        let held = source.get(resource);
        let available = held / TRADE_COST;
        let needed = cost.get(resource);
        let slot = &mut trades[resource.index()];

        while total_missing > 0 && *slot < available {
            let remaining = held - (*slot + 1) * TRADE_COST;
            if needed > remaining {
                break;
            }
            *slot += 1;
            total_missing -= 1;
        }
    }

    if total_missing > 0 {
        debug!(%source, %cost, "No bank trade covers the cost");
        return None;
    }

    // One output unit per missing unit, in slot order
    let outputs = Resource::ALL
        .iter()
        .flat_map(|&r| std::iter::repeat(r).take(missing.get(r) as usize));
    let inputs = Resource::ALL
        .iter()
        .flat_map(|&r| std::iter::repeat(r).take(trades[r.index()] as usize));

    Some(
        inputs
            .zip(outputs)
            .map(|(input, output)| TradeExchange::new(input, output))
            .collect(),
    )
}

/// Perform every trade or none of them
pub fn apply_trades(bundle: &mut ResourceBundle, trades: &[TradeExchange]) -> bool {
    let mut working = *bundle;
    for trade in trades {
        if !trade.charge(&mut working) {
            return false;
        }
    }
    *bundle = working;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::costs;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_trade_when_affordable() {
        let source = ResourceBundle::with_amounts(1, 1, 0, 0, 0);
        assert_eq!(plan_trades(&source, &costs::road()), Some(vec![]));
    }

    #[test]
    fn test_single_trade_from_surplus() {
        let source = ResourceBundle::with_amounts(6, 0, 0, 0, 0);
        let cost = ResourceBundle::single(Resource::Grain, 1);
        assert_eq!(
            plan_trades(&source, &cost),
            Some(vec![TradeExchange::new(Resource::Wood, Resource::Grain)])
        );
    }

    #[test]
    fn test_not_enough_for_one_trade() {
        let source = ResourceBundle::with_amounts(2, 0, 0, 0, 0);
        let cost = ResourceBundle::single(Resource::Grain, 1);
        assert_eq!(plan_trades(&source, &cost), None);
    }

    #[test]
    fn test_keeps_what_the_cost_itself_needs() {
        // 4 wood, road needs 1 wood + 1 clay: trading 3 wood leaves exactly 1
        let source = ResourceBundle::with_amounts(4, 0, 0, 0, 0);
        assert_eq!(
            plan_trades(&source, &costs::road()),
            Some(vec![TradeExchange::new(Resource::Wood, Resource::Clay)])
        );

        // 3 wood would leave nothing for the road itself
        let source = ResourceBundle::with_amounts(3, 0, 0, 0, 0);
        assert_eq!(plan_trades(&source, &costs::road()), None);
    }

    #[test]
    fn test_trades_spread_over_missing_resources() {
        let source = ResourceBundle::with_amounts(0, 0, 0, 6, 9);
        let cost = ResourceBundle::with_amounts(1, 1, 0, 1, 1);
        let trades = plan_trades(&source, &cost).unwrap();

        assert_eq!(trades.len(), 2);
        let outputs: Vec<Resource> = trades.iter().map(|t| t.output).collect();
        assert_eq!(outputs, vec![Resource::Wood, Resource::Clay]);

        let mut bundle = source;
        assert!(apply_trades(&mut bundle, &trades));
        assert!(bundle.can_afford(&cost));
    }

    #[test]
    fn test_apply_trades_is_all_or_nothing() {
        let mut bundle = ResourceBundle::with_amounts(4, 0, 0, 0, 0);
        let trades = [
            TradeExchange::new(Resource::Wood, Resource::Grain),
            TradeExchange::new(Resource::Wood, Resource::Sheep),
        ];
        assert!(!apply_trades(&mut bundle, &trades));
        assert_eq!(bundle, ResourceBundle::with_amounts(4, 0, 0, 0, 0));
    }

    #[test]
    fn test_exchange_charge() {
        let mut bundle = ResourceBundle::with_amounts(0, 0, 3, 0, 0);
        let trade = TradeExchange::new(Resource::Stone, Resource::Sheep);
        assert!(trade.charge(&mut bundle));
        assert_eq!(bundle, ResourceBundle::single(Resource::Sheep, 1));
        assert!(!trade.charge(&mut bundle));
        assert!(!TradeExchange::new(Resource::Sheep, Resource::Sheep).charge(&mut bundle));
    }
}
