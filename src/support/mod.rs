// Copyright 2025 Cowboy AI, LLC.

//! Small helpers shared by the mapping chain and the state manager

pub mod data_accessor;
pub mod dot;
pub mod enumeration;
pub mod strings;

pub use data_accessor::{DataAccessor, Record, RequestInput, Source};
pub use enumeration::{EnumHelper, Enumeration};
