// src/services/mod.rs

pub mod attempts;
pub mod error;
pub mod evaluator;
pub mod grading;
pub mod locks;
pub mod question_bank;
pub mod roster;
