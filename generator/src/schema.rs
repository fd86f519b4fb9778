// Parsed schema model: structs and their ordered members

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMember {
    pub name: String,
    pub type_name: String,
    /// Bracketed repeat count; `None` when the declaration had no brackets.
    pub count: Option<u32>,
    pub line: usize,
}

impl StructMember {
    pub fn new(name: &str, type_name: &str, count: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            count,
            line: 0,
        }
    }

    /// Effective repeat count. An omitted count and `[1]` are the same.
    pub fn repeat(&self) -> u32 {
        self.count.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub name: String,
    pub members: Vec<StructMember>,
    pub line: usize,
}

impl Struct {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            line: 0,
        }
    }

    #[cfg(test)]
    pub fn with_members(name: &str, members: Vec<StructMember>) -> Self {
        Self {
            name: name.to_string(),
            members,
            line: 0,
        }
    }

    pub fn add_member(&mut self, member: StructMember) {
        self.members.push(member);
    }

    pub fn member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

impl std::fmt::Display for Struct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} :: struct {{", self.name)?;
        for member in &self.members {
            match member.count {
                Some(count) => writeln!(f, "    {} : {}[{}],", member.name, member.type_name, count)?,
                None => writeln!(f, "    {} : {},", member.name, member.type_name)?,
            }
        }
        write!(f, "}}")
    }
}
