//! Deal Aggregator
//!
//! Folds the raw fill history of one account into one position per
//! terminal position id. Pure: no I/O, same input gives the same output.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::{Deal, DealType, Direction, Position, PositionState};
use crate::error::{Result, SyncError};

/// Group items by key. Groups come out in key order; items keep their
/// relative input order inside a group.
pub fn group_by_key<T, K, I, F>(items: I, mut key: F) -> BTreeMap<K, Vec<T>>
where
    I: IntoIterator<Item = T>,
    K: Ord,
    F: FnMut(&T) -> K,
{
    items.into_iter().fold(BTreeMap::new(), |mut groups, item| {
        groups.entry(key(&item)).or_insert_with(Vec::new).push(item);
        groups
    })
}

/// Build positions from the deal history of one account.
///
/// Non-trading operations (position id 0) are dropped. A trading deal that
/// is neither a buy nor a sell opening a position is a [`SyncError::MalformedDeal`].
pub fn aggregate_deals<I>(deals: I, account_id: Uuid, user_id: Uuid) -> Result<Vec<Position>>
where
    I: IntoIterator<Item = Deal>,
{
    let groups = group_by_key(deals.into_iter().filter(Deal::is_trading), |d| d.position_id);

    groups
        .into_iter()
        .map(|(position_id, group)| fold_position(position_id, group, account_id, user_id))
        .collect()
}

fn fold_position(
    position_id: u64,
    mut group: Vec<Deal>,
    account_id: Uuid,
    user_id: Uuid,
) -> Result<Position> {
    // Stable: deals with equal timestamps keep their terminal order
    group.sort_by_key(|d| d.time);

    let (Some(entry), Some(exit)) = (group.first(), group.last()) else {
        return Err(SyncError::Validation(format!(
            "position {position_id} has no deals"
        )));
    };

    let direction = match entry.deal_type {
        DealType::Buy => Direction::Long,
        DealType::Sell => Direction::Short,
        DealType::NonTrading(code) => {
            return Err(SyncError::MalformedDeal {
                ticket: entry.ticket,
                reason: format!(
                    "position {position_id} opens with non-trading deal type {code}"
                ),
            })
        }
    };

    let state = if exit.entry.is_closing() {
        PositionState::Closed {
            exit_price: exit.price,
            net_pnl: group.iter().map(Deal::net_result).sum::<Decimal>(),
        }
    } else {
        PositionState::Open
    };

    Ok(Position {
        account_id,
        external_position_id: position_id,
        user_id,
        symbol: entry.symbol.clone(),
        direction,
        entry_price: entry.price,
        size: entry.volume,
        state,
        opened_at: entry.time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DealEntry, PositionStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn deal(ticket: u64, position_id: u64, secs: i64, deal_type: DealType, entry: DealEntry) -> Deal {
        Deal {
            ticket,
            position_id,
            time: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            symbol: "XAUUSD".to_string(),
            deal_type,
            entry,
            price: dec!(100),
            volume: dec!(1),
            profit: Decimal::ZERO,
            swap: Decimal::ZERO,
            commission: Decimal::ZERO,
        }
    }

    #[test]
    fn test_group_by_key_keeps_input_order() {
        let groups = group_by_key(vec![(2, 'a'), (1, 'b'), (2, 'c')], |(k, _)| *k);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&2], vec![(2, 'a'), (2, 'c')]);
        assert_eq!(groups[&1], vec![(1, 'b')]);
    }

    #[test]
    fn test_buy_open_sell_close() {
        let open = deal(1, 7, 0, DealType::Buy, DealEntry::In);
        let mut close = deal(2, 7, 60, DealType::Sell, DealEntry::Out);
        close.price = dec!(110);
        close.profit = dec!(10);
        close.swap = dec!(-1);
        close.commission = dec!(-2);

        let positions = aggregate_deals(vec![open, close], Uuid::nil(), Uuid::nil()).unwrap();
        assert_eq!(positions.len(), 1);

        let pos = &positions[0];
        assert_eq!(pos.external_position_id, 7);
        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.entry_price, dec!(100));
        assert_eq!(pos.exit_price(), Some(dec!(110)));
        assert_eq!(pos.net_pnl(), Some(dec!(7)));
        assert_eq!(pos.status(), PositionStatus::Closed);
    }

    #[test]
    fn test_out_of_order_input_sorted_by_time() {
        let mut close = deal(2, 9, 60, DealType::Buy, DealEntry::Out);
        close.price = dec!(95);
        let mut open = deal(1, 9, 0, DealType::Sell, DealEntry::In);
        open.price = dec!(101);

        let positions = aggregate_deals(vec![close, open], Uuid::nil(), Uuid::nil()).unwrap();
        let pos = &positions[0];
        assert_eq!(pos.direction, Direction::Short);
        assert_eq!(pos.entry_price, dec!(101));
        assert_eq!(pos.exit_price(), Some(dec!(95)));
        assert_eq!(pos.opened_at, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn test_equal_timestamps_keep_terminal_order() {
        let open = deal(1, 3, 0, DealType::Buy, DealEntry::In);
        let close = deal(2, 3, 0, DealType::Sell, DealEntry::Out);

        let positions = aggregate_deals(vec![open, close], Uuid::nil(), Uuid::nil()).unwrap();
        assert_eq!(positions[0].direction, Direction::Long);
        assert_eq!(positions[0].status(), PositionStatus::Closed);
    }

    #[test]
    fn test_partial_close_stays_open() {
        let open = deal(1, 4, 0, DealType::Buy, DealEntry::In);
        let mut partial = deal(2, 4, 30, DealType::Sell, DealEntry::Out);
        partial.volume = dec!(0.5);
        let add = deal(3, 4, 60, DealType::Buy, DealEntry::In);

        let positions = aggregate_deals(vec![open, partial, add], Uuid::nil(), Uuid::nil()).unwrap();
        assert_eq!(positions[0].status(), PositionStatus::Open);
        assert_eq!(positions[0].net_pnl(), None);
        assert_eq!(positions[0].size, dec!(1));
    }

    #[test]
    fn test_non_trading_deals_dropped() {
        let balance = deal(1, 0, 0, DealType::NonTrading(2), DealEntry::In);
        let positions = aggregate_deals(vec![balance], Uuid::nil(), Uuid::nil()).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_non_trading_type_on_position_is_malformed() {
        let odd = deal(5, 11, 0, DealType::NonTrading(6), DealEntry::In);
        let err = aggregate_deals(vec![odd], Uuid::nil(), Uuid::nil()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedDeal { ticket: 5, .. }));
    }

    #[test]
    fn test_empty_history() {
        let positions = aggregate_deals(Vec::new(), Uuid::nil(), Uuid::nil()).unwrap();
        assert!(positions.is_empty());
    }
}
