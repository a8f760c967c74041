//! Tagbridge Parser
//!
//! Interprets documentation annotations as a declarative route table.
//!
//! # Overview
//!
//! A source unit is a file whose doc comments declare HTTP-callable methods:
//!
//! ```text
//! //! User management
//! //! @module Users
//!
//! /// Create a user
//! /// @apiRoute post /users
//! /// @param {String} email Contact address
//! /// @param {String} [nickname] Display name
//! /// @param _user Authenticated caller
//! /// @apiReturns {Object} the created user
//! pub async fn create() {}
//! ```
//!
//! # Architecture
//!
//! ```text
//! source text → CommentParser → DocRecords → interpret() → RouteDescriptors
//!                                          → build_controller() → ControllerDescriptor
//! ```
//!
//! - [`DocCommentParser`] is the default extractor for Rust doc comments. Any
//!   other [`CommentParser`] implementation can feed the interpreter.
//! - [`interpret`] turns one record into a route or a [`Rejection`].
//! - [`classify_param`] decides a parameter's source and optionality.
//! - [`build_controller`] groups one unit's routes under its module name.
//!
//! # Example Usage
//!
//! ```
//! use tagbridge_parser::{parse_unit, DocCommentParser};
//!
//! let source = "//! @module Items\n\n/// @apiRoute GET /items\n/// @apiReturns {Array} all items\npub fn list() {}\n";
//! let controller = parse_unit(&DocCommentParser::new(), source).unwrap();
//! assert_eq!(controller.name, "Items");
//! assert_eq!(controller.methods[0].path, "/items");
//! ```

#![warn(missing_docs)]

mod builder;
mod classifier;
mod comments;
mod error;
mod interpreter;

pub use builder::{build_controller, parse_unit};
pub use classifier::classify_param;
pub use comments::DocCommentParser;
pub use error::ParseError;
pub use interpreter::{interpret, parse_returns, parse_route, Interpretation, Rejection};

pub use tagbridge_domain::CommentParser;
