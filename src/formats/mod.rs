//! Container format parsers

pub mod macho;
