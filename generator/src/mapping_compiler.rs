// Mapping compiler: flattens a target struct into a size table and property tree
//
// Invariants:
// M1: sizes are appended in depth-first, member order; each leaf indexes its own entry
// M2: an interior node's index is taken before its first descendant leaf is appended
// M3: a struct is never expanded while already on the current expansion path
// M4: no root-to-leaf path holds more than MAX_NESTING_DEPTH interior nodes

use crate::error::{CompileError, ValidationCode, ValidationError};
use crate::lookup;
use crate::mapping::{MAX_NESTING_DEPTH, MappingFile, MappingNode};
use crate::primitive_registry::{self, PrimitiveRegistry, PrimitiveType};
use crate::schema::{Struct, StructMember};
use crate::type_resolver::{self, Resolved};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Attach member names to nodes. Diagnostic only.
    pub debug_names: bool,
}

/// Compile the struct named `target_name` against the process-wide primitive registry.
pub fn compile(structs: &[Struct], target_name: &str) -> Result<MappingFile, CompileError> {
    compile_with(primitive_registry::global(), structs, target_name, CompileOptions::default())
}

pub fn compile_with(
    registry: &PrimitiveRegistry,
    structs: &[Struct],
    target_name: &str,
    options: CompileOptions,
) -> Result<MappingFile, CompileError> {
    let target = lookup::find_struct(structs, target_name)?;
    compile_struct(registry, structs, target, options)
}

pub fn compile_struct(
    registry: &PrimitiveRegistry,
    structs: &[Struct],
    target: &Struct,
    options: CompileOptions,
) -> Result<MappingFile, CompileError> {
    let mut compiler = MappingCompiler {
        registry,
        structs,
        options,
        sizes: Vec::new(),
        path: Vec::new(),
        depth: 0,
    };
    let properties = compiler.expand(target)?;

    log::debug!(
        "compiled {}: {} sizes, {} top-level properties",
        target.name,
        compiler.sizes.len(),
        properties.len()
    );
    Ok(MappingFile {
        sizes: compiler.sizes,
        properties,
    })
}

struct MappingCompiler<'a> {
    registry: &'a PrimitiveRegistry,
    structs: &'a [Struct],
    options: CompileOptions,
    sizes: Vec<u8>,
    path: Vec<&'a str>,
    // Interior nodes above the one being built
    depth: usize,
}

impl<'a> MappingCompiler<'a> {
    fn expand(&mut self, owner: &'a Struct) -> Result<Vec<MappingNode>, CompileError> {
        self.path.push(&owner.name);
        log::debug!("expanding {}", self.path.join(" -> "));

        let mut nodes = Vec::with_capacity(owner.members.len());
        for member in &owner.members {
            let node = match type_resolver::resolve(&member.type_name, self.structs, self.registry) {
                Resolved::Primitive(primitive) => self.leaf(owner, member, primitive)?,
                Resolved::KnownStruct(nested) => self.struct_member(owner, member, nested)?,
                Resolved::Unresolved => {
                    return Err(validation_error(
                        ValidationCode::UnresolvedType,
                        owner,
                        member,
                        "not a primitive nor a declared struct".to_string(),
                    ));
                }
            };
            nodes.push(node);
        }
        check_child_count(owner, nodes.len())?;

        self.path.pop();
        Ok(nodes)
    }

    fn leaf(
        &mut self,
        owner: &Struct,
        member: &StructMember,
        primitive: &PrimitiveType,
    ) -> Result<MappingNode, CompileError> {
        let size = type_resolver::resolved_size(primitive, member.repeat())
            .and_then(|size| u8::try_from(size).ok())
            .ok_or_else(|| {
                validation_error(
                    ValidationCode::SizeOverflow,
                    owner,
                    member,
                    format!(
                        "{} x {} bytes exceeds the 255 byte limit of a size entry",
                        member.repeat(),
                        primitive.size
                    ),
                )
            })?;

        let index = self.next_index(owner, member)?;
        self.sizes.push(size);
        log::trace!("leaf {}.{} -> #{} ({} bytes)", owner.name, member.name, index, size);

        Ok(MappingNode::leaf(index, self.debug_name(&member.name)))
    }

    fn struct_member(
        &mut self,
        owner: &Struct,
        member: &StructMember,
        nested: &'a Struct,
    ) -> Result<MappingNode, CompileError> {
        if self.path.contains(&nested.name.as_str()) {
            let cycle = format!("{} -> {}", self.path.join(" -> "), nested.name);
            return Err(validation_error(
                ValidationCode::Cycle,
                owner,
                member,
                format!("cyclic struct definition {}", cycle),
            ));
        }
        if nested.members.is_empty() {
            return Err(validation_error(
                ValidationCode::EmptyStruct,
                owner,
                member,
                format!("struct {} has no members to map", nested.name),
            ));
        }

        let repeat = member.repeat();
        if repeat == 1 {
            return self.interior(owner, member, nested, self.debug_name(&member.name));
        }

        // Arrays of structs: one interior element per repetition
        check_child_count(owner, repeat as usize)?;
        self.check_depth(owner, member)?;
        let index = self.next_index(owner, member)?;
        let mut elements = Vec::with_capacity(repeat as usize);
        self.depth += 1;
        for i in 0..repeat {
            let name = self.debug_name(&format!("{}[{}]", member.name, i));
            elements.push(self.interior(owner, member, nested, name)?);
        }
        self.depth -= 1;
        Ok(MappingNode::interior(index, self.debug_name(&member.name), elements))
    }

    fn interior(
        &mut self,
        owner: &Struct,
        member: &StructMember,
        nested: &'a Struct,
        debug_name: Option<String>,
    ) -> Result<MappingNode, CompileError> {
        self.check_depth(owner, member)?;
        let index = self.next_index(owner, member)?;
        self.depth += 1;
        let children = self.expand(nested)?;
        self.depth -= 1;
        Ok(MappingNode::interior(index, debug_name, children))
    }

    fn check_depth(&self, owner: &Struct, member: &StructMember) -> Result<(), CompileError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(validation_error(
                ValidationCode::TooDeep,
                owner,
                member,
                format!("struct nesting exceeds {} levels", MAX_NESTING_DEPTH),
            ));
        }
        Ok(())
    }

    // Index the next appended size entry will occupy
    fn next_index(&self, owner: &Struct, member: &StructMember) -> Result<u16, CompileError> {
        u16::try_from(self.sizes.len())
            .ok()
            .filter(|index| *index < u16::MAX)
            .ok_or_else(|| {
                validation_error(
                    ValidationCode::IndexOverflow,
                    owner,
                    member,
                    format!("mapping exceeds {} size entries", u16::MAX),
                )
            })
    }

    fn debug_name(&self, name: &str) -> Option<String> {
        self.options.debug_names.then(|| name.to_string())
    }
}

fn check_child_count(owner: &Struct, count: usize) -> Result<(), CompileError> {
    if count > usize::from(u16::MAX) {
        return Err(CompileError::Validation(ValidationError {
            code: ValidationCode::IndexOverflow,
            struct_name: owner.name.clone(),
            member: String::new(),
            type_name: owner.name.clone(),
            line: owner.line,
            message: format!("{} children exceed the {} child limit", count, u16::MAX),
        }));
    }
    Ok(())
}

fn validation_error(code: ValidationCode, owner: &Struct, member: &StructMember, message: String) -> CompileError {
    CompileError::Validation(ValidationError {
        code,
        struct_name: owner.name.clone(),
        member: member.name.clone(),
        type_name: member.type_name.clone(),
        line: member.line,
        message,
    })
}
