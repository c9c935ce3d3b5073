//! Bid increment and anti-snipe rules.

use {
    chrono::{DateTime, Duration, Utc},
    model::Credits,
};

/// A new bid must top the standing bid by at least 5%, rounded up so that a
/// raise is never free on small amounts.
pub fn minimum_raise(current_bid: Credits) -> Credits {
    (current_bid * 105 + 99) / 100
}

/// The new deadline after a bid lands at `now`. Bids placed with strictly
/// less than five minutes remaining push the deadline out by one minute;
/// repeated late bids keep extending it, there is no cap.
pub fn extend_deadline(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (ends_at - now < Duration::minutes(5)).then(|| ends_at + Duration::minutes(1))
}

/// Whether a bid counts as a snipe for the bid history: placed with less
/// than a minute left on the pre-extension deadline.
pub fn is_snipe(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    ends_at - now < Duration::seconds(60)
}
