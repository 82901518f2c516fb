pub mod bps;
pub mod price;
pub mod tick_range;

pub use bps::Bps;
pub use price::Price;
pub use tick_range::TickRange;
