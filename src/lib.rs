pub mod logger;
pub mod viewfinder;
