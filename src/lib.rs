//! Seedkit resolves placeholders in JSON seed datasets.
//!
//! A dataset maps table names to arrays of records. String leaves starting
//! with the foreign-key leader (default `->`) are replaced with values drawn
//! from other tables, with `random`, `next` (without replacement, per
//! record) and `curr` sampling modes, dotted-path field extraction and
//! `where`-filtered reduced views. Leaves starting with the expression
//! leader (default `=>`) are evaluated in a small safe expression language
//! against the current record, a caller-supplied context and the whole
//! dataset.
//!
//! ## Components
//!
//! * `walker` - depth-first leaf traversal with in-place replacement
//! * `ordering` - per-record field classification and resolution order
//! * `registry` - per-table sampling state and session reset
//! * `foreign_key` - placeholder parsing and dotted-path extraction
//! * `expression` - parser and interpreter for expression placeholders
//! * `hashing` - opt-in Argon2 password-hash context function
//! * `seeder` - orchestration over tables and records
//!
//! ```no_run
//! use seedkit::{seed, SeedOptions};
//! use serde_json::json;
//!
//! let mut data = json!({
//!     "users": [{ "id": 1, "name": "ada" }, { "id": 2, "name": "lin" }],
//!     "posts": [
//!         { "_id": 1, "userId": "->users:next", "title": "=>concat(\"post \", to_string(ctx.index))" }
//!     ]
//! });
//! let data = data.as_object_mut().unwrap();
//! seed(data, SeedOptions::new()).unwrap();
//! ```

pub mod error;
pub mod expression;
pub mod foreign_key;
pub mod hashing;
pub mod ordering;
pub mod registry;
pub mod seeder;
pub mod walker;

pub use error::{SeedError, SeedResult};
pub use expression::interpreter::ContextFunction;
pub use hashing::{hash_password, hash_password_fn};
pub use seeder::{seed, Dataset, SeedOptions};
