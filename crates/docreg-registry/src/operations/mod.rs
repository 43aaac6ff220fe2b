pub mod add_document;
pub mod delete_document;
pub mod read_document;

pub use add_document::{AddDocumentOperation, AddDocumentRequest, AddDocumentResult};
pub use delete_document::{DeleteDocumentOperation, DeleteDocumentRequest};
pub use read_document::{ReadDocumentOperation, StoredDocument};
