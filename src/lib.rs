pub mod assembler;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod gerrit;
pub mod model;
pub mod orchestrator;
pub mod redmine;
pub mod render;
pub mod report;
#[cfg(test)]
pub mod test_helpers;
pub mod wiki_table;
