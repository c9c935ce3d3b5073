//! The pure marketplace rules: fee schedules, bid increments and the
//! anti-snipe deadline extension. Kept free of I/O so the storage layer can
//! apply them inside its transactions and the tests can pin the boundaries
//! exactly.

pub mod bidding;
pub mod fees;
