// Library interface for marshall-gen
// Pipeline: schema_parser -> lookup -> mapping_compiler -> mapping_writer

pub mod error;
pub mod lookup;
pub mod mapping;
pub mod mapping_compiler;
pub mod mapping_loader;
pub mod mapping_writer;
pub mod primitive_registry;
pub mod schema;
pub mod schema_loader;
pub mod schema_parser;
pub mod type_resolver;

pub use error::{CompileError, ValidationCode, ValidationError};
pub use mapping::{MappingFile, MappingNode};
pub use mapping_compiler::{CompileOptions, compile, compile_with};
pub use schema::{Struct, StructMember};
pub use schema_parser::parse_schema;
