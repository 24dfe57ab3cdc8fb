pub mod cell;
pub mod key;
pub mod selection;
