pub mod expected;

pub use expected::{expected, expected_for, ExpectedRow, ExpectedTable};
