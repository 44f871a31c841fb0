pub mod keys;
pub mod page_input;

pub use keys::{KeyDisposition, NavKey, is_press};
pub use page_input::{InputOutcome, PageNumberInput};
