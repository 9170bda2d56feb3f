/// Chittagong Stock Exchange
pub mod cse;
/// Dhaka Stock Exchange
pub mod dse;
/// Shared table extraction and normalization primitives
pub mod table;
