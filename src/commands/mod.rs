pub mod exchange;

pub use exchange::exchange_keys;
