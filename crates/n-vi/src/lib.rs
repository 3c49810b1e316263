//! # n-vi: modal key interpreter for n-modal
//!
//! Feed it one symbolic key at a time (`"d"`, `"Escape"`, `"Ctrl+v"`) and it
//! edits a [`Document`] the way Vim's Normal, Insert, Visual, Replace and
//! command-line modes would:
//!
//! - **[`interpreter`]**: `Interpreter`, the mode state machine and entry point
//! - **[`normal`]**: Normal/Visual command grammar (counts, operators, motions)
//! - **[`motion`]** / **[`word`]**: cursor motions and word classification
//! - **[`edit`]**: line-array edits: delete, yank, paste, join, shift, blocks
//! - **[`register`]**, **[`marks`]**, **[`jumplist`]**, **[`macros`]**: session state
//! - **[`search`]** / **[`substitute`]**: `/` `?` `n` `*` and `:s`
//! - **[`ex`]** / **[`options`]**: `:` commands and `:set`
//! - **[`document`]** / **[`host`]** / **[`buffer`]**: the collaborators
//! - **[`config`]**: TOML configuration
//!
//! ```
//! use n_vi::{BufferDocument, Interpreter, NullHost};
//!
//! let mut doc = BufferDocument::from_text("one\ntwo\nthree");
//! let mut vi = Interpreter::new();
//! for key in ["j", "d", "d"] {
//!     vi.handle_key(&mut doc, &mut NullHost, key);
//! }
//! assert_eq!(doc.text(), "one\nthree");
//! ```

pub mod buffer;
pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod ex;
pub mod host;
pub mod interpreter;
pub mod jumplist;
pub mod key;
pub mod macros;
pub mod marks;
pub mod mode;
pub mod motion;
pub mod normal;
pub mod options;
pub mod position;
pub mod register;
pub mod search;
pub mod substitute;
pub mod word;

pub use config::Config;
pub use document::{BufferDocument, Document};
pub use error::ExError;
pub use host::{Host, NullHost, PromptKind, PromptReply};
pub use interpreter::Interpreter;
pub use mode::{Mode, VisualKind};
pub use position::{Position, Range};
