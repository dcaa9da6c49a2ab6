//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Helpers that must run inside a
//! caller's transaction take `&mut PgConnection` instead.

pub mod article_repo;
pub mod article_version_repo;
pub mod document_repo;
pub mod search_index_repo;
pub mod search_repo;
pub mod structure_node_repo;
pub mod sync_repo;
pub mod tag_repo;

pub use article_repo::ArticleRepo;
pub use article_version_repo::ArticleVersionRepo;
pub use document_repo::DocumentRepo;
pub use search_index_repo::SearchIndexRepo;
pub use search_repo::SearchRepo;
pub use structure_node_repo::StructureNodeRepo;
pub use sync_repo::SyncRepo;
pub use tag_repo::TagRepo;
