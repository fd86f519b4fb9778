// Schema parser for struct declarations
// Parses: `Name :: struct {` headers and `field : type[count],` members
// Does NOT parse: procedures, unions, enums, nested literals or any other declarations

use crate::schema::{Struct, StructMember};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static STRUCT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*::\s*struct\s*\{").expect("struct header pattern"));

static FIELD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s*:\s*(\w+)(?:\[(\d+)\])?\s*,").expect("field declaration pattern")
});

// Fields inside a single-line body are split on commas first, so no trailing comma
static INLINE_FIELD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s*:\s*(\w+)(?:\[(\d+)\])?$").expect("inline field declaration pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub text: String,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Parse error in {}:{}", self.file, self.line)?;
        writeln!(f, "    {}", self.text)?;
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    file: &'a str,
}

/// Parse schema text into its struct declarations, in source order.
pub fn parse_schema(source: &str) -> Result<Vec<Struct>, ParseError> {
    parse_schema_with_file(source, "<schema>")
}

pub fn parse_schema_with_file(source: &str, file: &str) -> Result<Vec<Struct>, ParseError> {
    let mut parser = Parser {
        lines: source.lines().collect(),
        pos: 0,
        file,
    };
    parser.parse_structs()
}

impl<'a> Parser<'a> {
    fn parse_structs(&mut self) -> Result<Vec<Struct>, ParseError> {
        let mut structs: Vec<Struct> = Vec::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            let Some(header) = STRUCT_HEADER.captures(line) else {
                self.pos += 1;
                continue;
            };

            let line_no = self.pos + 1;
            let mut current = Struct::new(&header[1]);
            current.line = line_no;

            if structs.iter().any(|s| s.name == current.name) {
                return Err(self.error(line_no, line, format!("Duplicate struct '{}'", current.name)));
            }

            let header_end = header.get(0).map_or(line.len(), |m| m.end());
            let rest = &line[header_end..];
            self.pos += 1;

            match rest.find('}') {
                Some(close) => {
                    self.parse_inline_body(&rest[..close], &mut current, line_no, line)?;
                }
                None => {
                    if self.parse_inline_body(rest, &mut current, line_no, line)? {
                        self.parse_body(&mut current)?;
                    }
                }
            }

            log::debug!("parsed struct {} ({} members)", current.name, current.members.len());
            for member in &current.members {
                log::debug!("\t{} : {}{}", member.name, member.type_name, format_count(member.count));
            }
            structs.push(current);
        }

        Ok(structs)
    }

    // Multi-line body: consume field lines until the first line that isn't one
    fn parse_body(&mut self, current: &mut Struct) -> Result<(), ParseError> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            let Some(caps) = FIELD_DECL.captures(line) else {
                if !line.starts_with('}') {
                    log::warn!(
                        "{}:{}: body of struct '{}' ends at unrecognized line '{}' ({} members kept)",
                        self.file,
                        self.pos + 1,
                        current.name,
                        line,
                        current.members.len()
                    );
                }
                // Not consumed: the line may open the next struct
                return Ok(());
            };
            self.add_member(current, &caps, self.pos + 1, line)?;
            self.pos += 1;
        }

        log::warn!("{}: struct '{}' is not closed before end of file", self.file, current.name);
        Ok(())
    }

    // Returns false when a malformed field ended the body early
    fn parse_inline_body(
        &self,
        body: &str,
        current: &mut Struct,
        line_no: usize,
        line: &str,
    ) -> Result<bool, ParseError> {
        for part in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some(caps) = INLINE_FIELD_DECL.captures(part) else {
                log::warn!(
                    "{}:{}: body of struct '{}' ends at unrecognized field '{}'",
                    self.file,
                    line_no,
                    current.name,
                    part
                );
                return Ok(false);
            };
            self.add_member(current, &caps, line_no, line)?;
        }
        Ok(true)
    }

    fn add_member(
        &self,
        current: &mut Struct,
        caps: &Captures<'_>,
        line_no: usize,
        line: &str,
    ) -> Result<(), ParseError> {
        let name = &caps[1];
        let type_name = &caps[2];

        let count = match caps.get(3) {
            Some(raw) => match raw.as_str().parse::<u32>() {
                Ok(0) => {
                    return Err(self.error(line_no, line, format!("Repeat count of '{}' must be at least 1", name)));
                }
                Ok(n) => Some(n),
                Err(_) => {
                    return Err(self.error(
                        line_no,
                        line,
                        format!("Repeat count '{}' of '{}' is too large", raw.as_str(), name),
                    ));
                }
            },
            None => None,
        };

        if current.member(name).is_some() {
            return Err(self.error(
                line_no,
                line,
                format!("Duplicate member '{}' in struct '{}'", name, current.name),
            ));
        }

        let mut member = StructMember::new(name, type_name, count);
        member.line = line_no;
        current.add_member(member);
        Ok(())
    }

    fn error(&self, line_no: usize, text: &str, message: String) -> ParseError {
        ParseError {
            file: self.file.to_string(),
            line: line_no,
            text: text.to_string(),
            message,
        }
    }
}

fn format_count(count: Option<u32>) -> String {
    count.map(|c| format!("[{}]", c)).unwrap_or_default()
}
