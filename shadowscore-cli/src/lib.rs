//! Command-line front end for shadowscore.

pub mod check;
pub mod cli;
pub mod hints;
pub mod output;
pub mod sample;
pub mod score;
