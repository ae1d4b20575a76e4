use std::collections::HashMap;
use std::sync::Arc;

/// A compiled user program.
///
/// Compilation happens outside the sandbox; the evaluator interprets
/// `source` however it likes. The sandbox only needs the name to resolve
/// nested calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub source: String,
}

impl Program {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// The root program and the programs compiled alongside it.
///
/// Nested calls can only reach programs in this set.
#[derive(Debug, Clone)]
pub struct ProgramSet {
    root: Arc<Program>,
    associated: HashMap<String, Arc<Program>>,
}

impl ProgramSet {
    pub fn new(root: Program) -> Self {
        Self {
            root: Arc::new(root),
            associated: HashMap::new(),
        }
    }

    /// Adds a program; a later program with the same name replaces the earlier one.
    pub fn with(mut self, program: Program) -> Self {
        self.associated
            .insert(program.name.clone(), Arc::new(program));
        self
    }

    pub fn root(&self) -> Arc<Program> {
        Arc::clone(&self.root)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Program>> {
        if let Some(program) = self.associated.get(name) {
            return Some(Arc::clone(program));
        }
        (self.root.name == name).then(|| Arc::clone(&self.root))
    }

    pub fn len(&self) -> usize {
        self.associated.len() + usize::from(!self.associated.contains_key(&self.root.name))
    }
}
