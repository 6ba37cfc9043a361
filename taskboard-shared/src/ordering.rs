//! Dense-rank ordering
//!
//! Columns within a board and cards within a column carry an `order` that is a
//! zero-based, gap-free rank: for N siblings the orders are exactly `{0..N-1}`.
//! Every mutation that moves a sibling is expressed as a single [`RangeShift`]
//! over the other siblings followed by a write of the moved item's new order.
//!
//! The storage backends execute the shifts (an `UPDATE ... BETWEEN` in
//! PostgreSQL, an in-place pass in memory), so the arithmetic lives here once.
//!
//! ```text
//! reorder 1 -> 3     [A0 B1 C2 D3]  shift (2..=3, -1)  [A0 C1 D2 B3]
//! reorder 3 -> 0     [A0 B1 C2 D3]  shift (0..=2, +1)  [D0 A1 B2 C3]
//! remove at 1        [A0 B1 C2]     shift (2..,  -1)   [A0 C1]
//! insert at 1        [A0 B1]        shift (1..,  +1)   [A0 X1 B2]
//! ```

/// Shift applied to every sibling whose order falls in `lower..=upper`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeShift {
    /// Lowest affected order (inclusive)
    pub lower: i32,

    /// Highest affected order (inclusive)
    pub upper: i32,

    /// Amount added to each affected order (+1 or -1)
    pub delta: i32,
}

impl RangeShift {
    /// Whether a sibling at `order` is moved by this shift
    pub fn contains(&self, order: i32) -> bool {
        order >= self.lower && order <= self.upper
    }

    /// Returns the order a sibling ends up at after the shift
    pub fn apply(&self, order: i32) -> i32 {
        if self.contains(order) {
            order + self.delta
        } else {
            order
        }
    }
}

/// Computes the shift for moving one sibling from `old` to `new`
///
/// Returns `None` when the positions are equal, in which case nothing may be
/// written at all.
///
/// - Moving down (`new > old`): siblings in `old+1..=new` move up one slot.
/// - Moving up (`new < old`): siblings in `new..=old-1` move down one slot.
pub fn reorder_shift(old: i32, new: i32) -> Option<RangeShift> {
    use std::cmp::Ordering;

    match new.cmp(&old) {
        Ordering::Equal => None,
        Ordering::Greater => Some(RangeShift {
            lower: old + 1,
            upper: new,
            delta: -1,
        }),
        Ordering::Less => Some(RangeShift {
            lower: new,
            upper: old - 1,
            delta: 1,
        }),
    }
}

/// Shift that closes the hole left by removing the sibling at `removed`
pub fn close_gap(removed: i32) -> RangeShift {
    RangeShift {
        lower: removed.saturating_add(1),
        upper: i32::MAX,
        delta: -1,
    }
}

/// Shift that frees slot `at` for an incoming sibling
pub fn open_gap(at: i32) -> RangeShift {
    RangeShift {
        lower: at,
        upper: i32::MAX - 1,
        delta: 1,
    }
}

/// Order for a newly appended sibling given the current maximum
pub fn next_order(max: Option<i32>) -> i32 {
    max.map_or(0, |m| m + 1)
}

/// Clamps a requested slot into `0..=upper`
///
/// For a reorder among N siblings `upper` is `N - 1`; for an insertion into a
/// list of M siblings it is `M`.
pub fn clamp_order(requested: i32, upper: i32) -> i32 {
    requested.clamp(0, upper.max(0))
}

/// Checks that `orders` is exactly `{0..N-1}`
pub fn is_dense<I>(orders: I) -> bool
where
    I: IntoIterator<Item = i32>,
{
    let mut orders: Vec<i32> = orders.into_iter().collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, &order)| order == index as i32)
}
