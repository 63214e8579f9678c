//! Actions taken on the duplicates an operation finds.
//!
//! - [`confirm`]: the typed-keyword prompt guarding removal
//! - [`delete`]: permanent or trash removal, one file or a batch
//!
//! ```no_run
//! use dataforge::actions::{confirm_removal, delete_batch, DeleteConfig};
//! use std::io;
//! use std::path::PathBuf;
//!
//! let duplicates = vec![PathBuf::from("/photos/copy.jpg")];
//! let accepted = vec!["delete".to_string()];
//! if confirm_removal(false, io::stdin().lock(), io::stdout(), &accepted).unwrap() {
//!     let result = delete_batch(&duplicates, &DeleteConfig::trash(), None);
//!     println!("{}", result.summary());
//! }
//! ```

pub mod confirm;
pub mod delete;

pub use confirm::{confirm_removal, CONFIRM_PROMPT};
pub use delete::{
    delete_batch, delete_to_trash, permanent_delete, BatchDeleteResult, DeleteConfig, DeleteError,
    DeleteResult,
};
