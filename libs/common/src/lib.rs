//! Common library for the GIF converter
//!
//! This crate provides the functionality the converter service builds on:
//! configuration loading, error types, and typed invocation of the
//! external media tools.

pub mod config;
pub mod error;
pub mod process;
