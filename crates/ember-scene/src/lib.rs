//! Tokenizer and parser for the line-based **light-source scene format**.
//!
//! This crate is intentionally dependency-free so scene files can be checked by
//! tools that never open a window or touch the GPU.
//!
//! # Format
//!
//! One light per source. Each non-blank line is a statement; words are separated by
//! whitespace and keywords are case-insensitive. A line whose first word starts with
//! `#` is a comment:
//!
//! ```text
//! # warm key light; w defaults to 1
//! position     = 0 4 2
//! color        = 1 0.8 0.6
//! coefficients = 1 0.09 0.032
//! ```
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`error`] | `ParseError` |
//! | [`lexer`] | `Token`, `tokenize_line` |
//! | [`light`] | `LightSource` |
//! | [`parser`] | `parse_light`, `LightSet` |
//!
//! # Quick start
//!
//! ```rust
//! use ember_scene::parse_light;
//!
//! let light = parse_light("POSITION = 1 2 3\ncolor = 1 0 0").unwrap();
//! assert_eq!(light.position, [1.0, 2.0, 3.0, 1.0]);
//! assert_eq!(light.color, [1.0, 0.0, 0.0]);
//! ```

pub mod error;
pub mod lexer;
pub mod light;
pub mod parser;

pub use error::ParseError;
pub use lexer::{Token, tokenize_line};
pub use light::LightSource;
pub use parser::{LightSet, parse_light};
