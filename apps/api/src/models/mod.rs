pub mod connection;
pub mod matching;
pub mod profile;
