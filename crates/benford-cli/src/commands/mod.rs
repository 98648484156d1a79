pub mod analysis;
pub mod expected;
