pub mod analyzer;
pub mod dates;
pub mod error;
pub mod graph;
pub mod parser;
pub mod preprocess;
pub mod resolver;
pub mod statement;
pub mod types;

// Re-export main types and functions
pub use analyzer::{analyze, analyze_with_provider};
pub use error::{AnnotationError, ParseError, ParseErrorKind, Position, ResolveError};
pub use graph::{GraphBuilder, StreamInfoProvider};
pub use parser::parse_statement;
pub use preprocess::{preprocess, PreprocessOptions};
pub use resolver::{resolve, resolve_declare, try_resolve, ScopeResolver};
pub use statement::split_statements;

// Re-export types explicitly
pub use types::{
    // Issue codes
    issue_codes,
    // Request types
    AnalysisOptions,
    AnalyzeRequest,
    // Response types
    AnalyzeResult,
    ConditionalMode,
    DeclareMap,
    Edge,
    Issue,
    IssueCount,
    Node,
    NodeType,
    ScriptKind,
    Severity,
    SourcePrefix,
    StatementKind,
    StatementRecord,
    Summary,
    Value,
};
