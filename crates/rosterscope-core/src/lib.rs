// Shared configuration layer for the rosterscope workspace.

pub mod config;
