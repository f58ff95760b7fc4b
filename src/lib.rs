//! luceq — parse, transform and translate Lucene query syntax
//!
//! This crate parses search expressions written in the Lucene query
//! mini-language (the syntax Solr and Elasticsearch accept for human-entered
//! queries) into a tree that can be inspected, rewritten and reprinted
//! losslessly, then translated into the JSON form of the Elasticsearch
//! query DSL.
//!
//! ```rust
//! use luceq::{parse, elasticsearch::{translate, EsQueryOptions}};
//!
//! let tree = parse(r#"author.last_name:Smith OR author.age:[25 TO 34]"#).unwrap();
//! assert_eq!(tree.to_string(), r#"author.last_name:Smith OR author.age:[25 TO 34]"#);
//!
//! let options = EsQueryOptions::new().with_not_analyzed_fields(["author.age"]);
//! let query = translate(&tree, &options).unwrap();
//! assert!(query["bool"]["should"].is_array());
//! ```

pub mod check;
pub mod elasticsearch;
pub mod error;
pub mod naming;
pub mod parser;
pub mod tree;
pub mod utils;
pub mod visitor;

pub use error::{LuceqError, Result};
pub use parser::{parse, QueryParser};
pub use tree::{BoolOperator, Node, NodeKind, Span};
pub use utils::{auto_head_tail, UnknownOperationResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
