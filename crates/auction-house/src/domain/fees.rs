//! The credit fee schedule for the card market.

use {bigdecimal::BigDecimal, model::Credits};

/// Flat fee debited from the seller when a listing is created. Featured
/// listings pay double for the placement at the top of the browse view.
pub fn listing_fee(is_featured: bool) -> Credits {
    if is_featured { 10 } else { 5 }
}

/// Half the listing fee is returned when a seller cancels an unbid listing.
/// The refund can be fractional (2.5 for a standard listing), so it is paid
/// out through the ledger as a decimal amount.
pub fn cancellation_refund(is_featured: bool) -> BigDecimal {
    BigDecimal::from(listing_fee(is_featured)) / 2
}

/// The market's cut of a completed sale: 10% of the final price, waived
/// entirely for sales at or below 100 credits. Integer division truncates,
/// the house never rounds up.
pub fn sale_fee(final_price: Credits) -> Credits {
    if final_price > 100 {
        final_price / 10
    } else {
        0
    }
}

/// What the seller actually receives for a completed sale.
pub fn seller_proceeds(final_price: Credits) -> Credits {
    final_price - sale_fee(final_price)
}
