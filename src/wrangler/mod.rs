pub mod dialect;
pub mod duplicates;
pub mod fsutil;
pub mod manifest;
pub mod paths;
pub mod planner;
pub mod probe;
pub mod run;
pub mod standardize;
