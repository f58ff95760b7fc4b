//! Elasticsearch integration: schema analysis and query translation
//!
//! [`SchemaAnalyzer`] derives translator options from an index definition;
//! [`translate`] lowers a parsed query tree into the JSON body Elasticsearch
//! accepts as its `query` field.
//!
//! ```rust
//! use luceq::elasticsearch::{translate, EsQueryOptions};
//!
//! let tree = luceq::parse("title:fox AND published:[2020 TO *]").unwrap();
//! let options = EsQueryOptions::new()
//!     .with_not_analyzed_fields(["published"]);
//! let query = translate(&tree, &options).unwrap();
//! assert!(query["bool"]["must"].is_array());
//! ```

pub mod schema;
pub mod translator;
pub mod tree;

pub use schema::SchemaAnalyzer;
pub use translator::{translate, ElasticsearchQueryBuilder, EsQueryOptions};
