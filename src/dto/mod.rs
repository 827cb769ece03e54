//! Request, response and broadcast payload types.

pub mod common;
pub mod field;
pub mod health;
pub mod judging;
pub mod sse;
pub mod team;
