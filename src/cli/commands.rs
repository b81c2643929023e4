pub mod create_driver;
pub mod initdb;
pub mod serve;

pub use create_driver::create_driver;
pub use initdb::init_database;
pub use serve::serve;
