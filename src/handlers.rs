/// Page size of every list view.
pub const PAGE_SIZE: u64 = 5;

pub mod auth;
pub mod cars;
pub mod drivers;
pub mod health;
pub mod index;
pub mod manufacturers;
