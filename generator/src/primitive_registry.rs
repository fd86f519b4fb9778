// Primitive type registry: builtin byte sizes plus optional registry files
// Registry files use the block format:
//
//   // comment
//   prim vec2h
//     size 4
//   end

use std::collections::HashMap;
use std::fs;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveType {
    pub name: String,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct PrimitiveRegistry {
    pub entries: HashMap<String, PrimitiveType>,
}

// Sizes follow the 64-bit Odin target the schemas are written for
const BUILTIN_PRIMITIVES: &[(&str, u32)] = &[
    ("bool", 1),
    ("b8", 1),
    ("b16", 2),
    ("b32", 4),
    ("b64", 8),
    ("byte", 1),
    ("u8", 1),
    ("i8", 1),
    ("u16", 2),
    ("i16", 2),
    ("u32", 4),
    ("i32", 4),
    ("u64", 8),
    ("i64", 8),
    ("u128", 16),
    ("i128", 16),
    ("int", 8),
    ("uint", 8),
    ("uintptr", 8),
    ("rune", 4),
    ("f16", 2),
    ("f32", 4),
    ("f64", 8),
];

static GLOBAL_REGISTRY: OnceLock<PrimitiveRegistry> = OnceLock::new();

/// Install the process-wide registry. Only the first call succeeds, and
/// it must happen before anything calls [`global`].
pub fn install(registry: PrimitiveRegistry) -> Result<(), String> {
    GLOBAL_REGISTRY
        .set(registry)
        .map_err(|_| "Primitive registry was already initialized".to_string())
}

/// The process-wide registry; falls back to the builtins if nothing was
/// installed.
pub fn global() -> &'static PrimitiveRegistry {
    GLOBAL_REGISTRY.get_or_init(PrimitiveRegistry::builtin)
}

impl PrimitiveRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, size) in BUILTIN_PRIMITIVES {
            registry.entries.insert(
                name.to_string(),
                PrimitiveType {
                    name: name.to_string(),
                    size: *size,
                },
            );
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&PrimitiveType> {
        self.entries.get(name)
    }

    // Load and parse a single registry file
    pub fn load_from_file(&mut self, file_path: &str) -> Result<(), String> {
        let content = fs::read_to_string(file_path)
            .map_err(|e| format!("Failed to read primitive registry {}: {}", file_path, e))?;

        self.parse_registry_content(&content, file_path)
    }

    // Load multiple registry files in order
    pub fn load_from_files(&mut self, file_paths: &[&str]) -> Result<(), String> {
        for path in file_paths {
            self.load_from_file(path)?;
        }
        Ok(())
    }

    pub fn parse_registry_content(&mut self, content: &str, file_path: &str) -> Result<(), String> {
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].trim();

            if line.is_empty() || line.starts_with("//") {
                i += 1;
                continue;
            }

            let Some(rest) = line.strip_prefix("prim ") else {
                return Err(format!("Unexpected line in {}:{}: {}", file_path, i + 1, line));
            };
            let name = rest.trim().to_string();
            let header_line = i + 1;
            i += 1;

            let mut size = None;
            let mut closed = false;

            while i < lines.len() {
                let field_line = lines[i].trim();
                i += 1;

                if field_line.is_empty() || field_line.starts_with("//") {
                    continue;
                }
                if field_line == "end" {
                    closed = true;
                    break;
                }

                if let Some(size_str) = field_line.strip_prefix("size ") {
                    let size_str = size_str.trim();
                    let parsed = size_str
                        .parse::<u32>()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or_else(|| format!("Invalid size in {}:{}: {}", file_path, i, size_str))?;
                    size = Some(parsed);
                } else {
                    return Err(format!("Unexpected line in {}:{}: {}", file_path, i, field_line));
                }
            }

            if !closed {
                return Err(format!(
                    "Missing 'end' for primitive '{}' declared at {}:{}",
                    name, file_path, header_line
                ));
            }
            let size = size.ok_or_else(|| {
                format!("Missing 'size' field for primitive '{}' in {}", name, file_path)
            })?;

            if self.entries.contains_key(&name) {
                return Err(format!("Duplicate primitive name '{}' in {}", name, file_path));
            }

            log::debug!("registered primitive {} ({} bytes) from {}", name, size, file_path);
            self.entries.insert(name.clone(), PrimitiveType { name, size });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_expected_sizes() {
        let registry = PrimitiveRegistry::builtin();
        assert_eq!(registry.get("u8").map(|p| p.size), Some(1));
        assert_eq!(registry.get("u16").map(|p| p.size), Some(2));
        assert_eq!(registry.get("f64").map(|p| p.size), Some(8));
        assert_eq!(registry.get("rune").map(|p| p.size), Some(4));
        assert!(registry.get("Player").is_none());
    }

    #[test]
    fn parses_prim_blocks() {
        let mut registry = PrimitiveRegistry::builtin();
        let src = "// handles\nprim vec2h\n  size 4\nend\n\nprim quat\n  // packed\n  size 16\nend\n";
        registry.parse_registry_content(src, "extra.mrprim").unwrap();
        assert_eq!(registry.get("vec2h").unwrap().size, 4);
        assert_eq!(registry.get("quat").unwrap().size, 16);
    }

    #[test]
    fn rejects_duplicate_of_builtin() {
        let mut registry = PrimitiveRegistry::builtin();
        let err = registry
            .parse_registry_content("prim u8\n  size 2\nend\n", "dup.mrprim")
            .unwrap_err();
        assert!(err.contains("Duplicate primitive name 'u8'"), "{}", err);
    }

    #[test]
    fn rejects_zero_and_missing_size() {
        let mut registry = PrimitiveRegistry::empty();
        let err = registry
            .parse_registry_content("prim a\n  size 0\nend\n", "r.mrprim")
            .unwrap_err();
        assert!(err.contains("Invalid size"), "{}", err);

        let err = registry
            .parse_registry_content("prim b\nend\n", "r.mrprim")
            .unwrap_err();
        assert!(err.contains("Missing 'size'"), "{}", err);
    }

    #[test]
    fn rejects_unterminated_block_and_stray_lines() {
        let mut registry = PrimitiveRegistry::empty();
        let err = registry
            .parse_registry_content("prim a\n  size 1\n", "r.mrprim")
            .unwrap_err();
        assert!(err.contains("Missing 'end'"), "{}", err);

        let err = registry
            .parse_registry_content("fn a\n", "r.mrprim")
            .unwrap_err();
        assert!(err.contains("Unexpected line in r.mrprim:1"), "{}", err);
    }
}
