//! The fixed-layout record producers push during benchmark runs.

/// Buy/sell marker.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Bid side.
    Buy,
    /// Ask side.
    Sell,
}

/// Order lifecycle state.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderState {
    /// Freshly placed.
    New,
    /// Partially filled.
    Partial,
    /// Completely filled.
    Filled,
    /// Cancelled before completion.
    Cancelled,
}

/// One order-book event.
///
/// Fixed layout, trivially copyable: no heap indirection may hide on the
/// hot path, so the instrument is a fixed byte tag rather than a string.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderEvent {
    /// Monotonic id stamped by the producer; wraps harmlessly.
    pub order_id: u64,
    /// Instrument tag, space padded.
    pub instrument: [u8; 8],
    /// Buy or sell.
    pub side: Side,
    /// Lifecycle state.
    pub state: OrderState,
    /// Quantity in lots.
    pub quantity: i64,
    /// Price in ticks.
    pub price: i64,
    /// Event timestamp, nanoseconds.
    pub timestamp_ns: i64,
}

impl OrderEvent {
    /// A benchmark event carrying the producer's wrapping sequence counter.
    #[inline]
    pub fn stamped(order_id: u64) -> Self {
        Self {
            order_id,
            instrument: *b"AAPL    ",
            side: Side::Buy,
            state: OrderState::New,
            quantity: 100,
            price: 100,
            timestamp_ns: 1_000_000_000_000_000_000,
        }
    }
}
