pub mod board;
pub mod card;
pub mod cell;
pub mod layout;
