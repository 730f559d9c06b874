/*!
 * Content store access.
 *
 * - `model`: typed nodes, locales and update payloads
 * - `store`: the `ContentStore` collaborator trait
 * - `rest`: JSON REST implementation of the store
 * - `memory`: in-process store for tests and dry runs
 * - `walker`: traversal of a document and the components it references
 * - `extractor`: translation units from nodes
 */

pub use self::extractor::NodeExtractor;
pub use self::memory::MemoryStore;
pub use self::model::{ContentNode, DocumentRef, Locale, LocaleSet};
pub use self::rest::RestContentStore;
pub use self::store::ContentStore;
pub use self::walker::{ContentTree, ContentTreeWalker};

pub mod extractor;
pub mod memory;
pub mod model;
pub mod rest;
pub mod store;
pub mod walker;
