//! Lexical scopes and the local variables declared in them.
//!
//! A method's debug information describes its locals as a tree of [`LexicalScope`]s: every
//! scope covers an IL range, declares zero or more variables and nests child scopes inside
//! that range. A variable is visible exactly over the range of the scope declaring it.
//!
//! # Key Components
//!
//! - [`LexicalScope`] - One node of the scope tree
//! - [`ScopeVariable`] - A variable as declared in a scope
//! - [`LocalVariableAttributes`] - Attribute bits of a declared variable
//! - [`LocalVariable`] - A variable flattened out of the tree, with its type and live range
//! - [`LocalScopeRow`] - One flat row of the Portable PDB LocalScope table
//! - [`collect_locals`] - Flattens a scope tree into [`LocalVariable`]s
//!
//! # Traversal
//!
//! Scope trees can nest deeply in generated code (state machines, long `using` chains), so
//! every traversal in this module uses an explicit stack instead of recursion.
//!
//! # Examples
//!
//! ```rust
//! use pdbscope::metadata::localscope::{collect_locals, LexicalScope, ScopeVariable};
//!
//! let root = LexicalScope::new(0, 100)
//!     .with_variable(ScopeVariable::new(0, "x"))
//!     .with_child(LexicalScope::new(10, 50).with_variable(ScopeVariable::new(1, "y")));
//!
//! let locals = collect_locals(&root, |_slot| None);
//! assert_eq!(locals.len(), 2);
//! ```

use bitflags::bitflags;

use crate::{metadata::sequencepoints::IlRange, Result};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Attribute flags of a local variable (Portable PDB LocalVariable.Attributes)
    pub struct LocalVariableAttributes: u16 {
        /// Variable is hidden from the debugger; compilers set it on their own temporaries
        const DEBUGGER_HIDDEN = 0x0001;
    }
}

impl LocalVariableAttributes {
    /// Interprets the raw attribute field as stored in the symbols.
    ///
    /// Unknown bits are retained so the raw value survives a round trip.
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }

    /// `true` if the variable was introduced by the compiler.
    ///
    /// Only bit 0 carries this information; the other accessors symbol readers offer for it
    /// are not implemented consistently across platforms.
    #[must_use]
    pub fn is_compiler_generated(self) -> bool {
        self.contains(Self::DEBUGGER_HIDDEN)
    }
}

/// A variable as declared in a [`LexicalScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeVariable {
    /// Slot index in the method's local signature
    pub index: u16,
    /// Display name
    pub name: String,
    /// Raw attribute flags
    pub attributes: LocalVariableAttributes,
}

impl ScopeVariable {
    /// A user variable in slot `index`.
    #[must_use]
    pub fn new(index: u16, name: impl Into<String>) -> Self {
        ScopeVariable {
            index,
            name: name.into(),
            attributes: LocalVariableAttributes::empty(),
        }
    }

    /// Sets the attribute flags.
    #[must_use]
    pub fn with_attributes(mut self, attributes: LocalVariableAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A node in a method's scope tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalScope {
    /// First IL offset covered by the scope
    pub start_offset: u32,
    /// First IL offset after the scope
    pub end_offset: u32,
    /// Variables declared directly in this scope
    pub variables: Vec<ScopeVariable>,
    /// Nested scopes, ordered by offset
    pub children: Vec<LexicalScope>,
}

impl LexicalScope {
    /// An empty scope over `[start_offset, end_offset)`.
    #[must_use]
    pub fn new(start_offset: u32, end_offset: u32) -> Self {
        LexicalScope {
            start_offset,
            end_offset,
            variables: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds a declared variable.
    #[must_use]
    pub fn with_variable(mut self, variable: ScopeVariable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Adds a child scope.
    #[must_use]
    pub fn with_child(mut self, child: LexicalScope) -> Self {
        self.children.push(child);
        self
    }

    /// The IL range of this scope.
    #[must_use]
    pub fn range(&self) -> IlRange {
        IlRange::new(self.start_offset, self.end_offset)
    }

    /// Iterates over this scope and all its descendants, each exactly once.
    ///
    /// The order is depth-first; siblings are visited last to first.
    #[must_use]
    pub fn iter(&self) -> ScopeIter<'_> {
        ScopeIter { stack: vec![self] }
    }

    /// Builds the scope tree from the flat LocalScope rows of one method.
    ///
    /// Rows may come in any order; nesting is derived from range containment. If the rows
    /// do not consist of a single scope spanning the whole method body, a root over
    /// `[0, code_size)` is synthesised to hold them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if two scopes overlap without one containing the
    /// other, or if a scope's end offset overflows.
    pub fn from_rows(code_size: u32, rows: &[LocalScopeRow]) -> Result<LexicalScope> {
        struct Node {
            start: u32,
            end: u32,
            variables: Vec<ScopeVariable>,
            children: Vec<usize>,
        }

        let mut sorted: Vec<&LocalScopeRow> = rows.iter().collect();
        sorted.sort_by(|a, b| {
            a.start_offset
                .cmp(&b.start_offset)
                .then(b.length.cmp(&a.length))
        });

        let mut nodes: Vec<Node> = Vec::with_capacity(sorted.len());
        let mut top_level = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for row in sorted {
            let start = row.start_offset;
            let Some(end) = start.checked_add(row.length) else {
                return Err(malformed_error!(
                    "LocalScope end offset overflows - 0x{:x} + 0x{:x}",
                    start,
                    row.length
                ));
            };

            while let Some(&top) = open.last() {
                let parent = &nodes[top];
                if start >= parent.end {
                    open.pop();
                    continue;
                }
                if end > parent.end {
                    return Err(malformed_error!(
                        "LocalScope [0x{:x}, 0x{:x}) overlaps [0x{:x}, 0x{:x})",
                        start,
                        end,
                        parent.start,
                        parent.end
                    ));
                }
                break;
            }

            let index = nodes.len();
            nodes.push(Node {
                start,
                end,
                variables: row.variables.clone(),
                children: Vec::new(),
            });

            match open.last() {
                Some(&parent) => nodes[parent].children.push(index),
                None => top_level.push(index),
            }
            open.push(index);
        }

        // Children always have larger indices than their parent, so building from the back
        // guarantees every child is finished before it is attached.
        let mut built: Vec<Option<LexicalScope>> = vec![None; nodes.len()];
        for index in (0..nodes.len()).rev() {
            let node = &nodes[index];
            let children = node
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();

            built[index] = Some(LexicalScope {
                start_offset: node.start,
                end_offset: node.end,
                variables: node.variables.clone(),
                children,
            });
        }

        if let [single] = top_level.as_slice() {
            let node = &nodes[*single];
            if node.start == 0 && node.end >= code_size {
                if let Some(root) = built[*single].take() {
                    return Ok(root);
                }
            }
        }

        let mut root = LexicalScope::new(0, code_size);
        root.children = top_level
            .iter()
            .filter_map(|&index| built[index].take())
            .collect();
        Ok(root)
    }
}

impl Drop for LexicalScope {
    // Detaches descendants onto a work list so drop depth stays constant for any nesting.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut scope) = pending.pop() {
            pending.append(&mut scope.children);
        }
    }
}

/// Depth-first iterator over a scope tree, see [`LexicalScope::iter`].
pub struct ScopeIter<'a> {
    stack: Vec<&'a LexicalScope>,
}

impl<'a> Iterator for ScopeIter<'a> {
    type Item = &'a LexicalScope;

    fn next(&mut self) -> Option<Self::Item> {
        let scope = self.stack.pop()?;
        self.stack.extend(scope.children.iter());
        Some(scope)
    }
}

/// One row of the Portable PDB LocalScope table with its variable list resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalScopeRow {
    /// First IL offset of the scope
    pub start_offset: u32,
    /// Length of the scope in IL bytes
    pub length: u32,
    /// Variables declared in the scope
    pub variables: Vec<ScopeVariable>,
}

impl LocalScopeRow {
    /// A row over `[start_offset, start_offset + length)` without variables.
    #[must_use]
    pub fn new(start_offset: u32, length: u32) -> Self {
        LocalScopeRow {
            start_offset,
            length,
            variables: Vec::new(),
        }
    }

    /// Adds a declared variable.
    #[must_use]
    pub fn with_variable(mut self, variable: ScopeVariable) -> Self {
        self.variables.push(variable);
        self
    }
}

/// A local variable together with the IL ranges it is visible in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    /// Slot index in the method's local signature
    pub index: u16,
    /// Declared type, if the compiled method could provide it
    pub type_name: Option<String>,
    /// Display name
    pub name: String,
    /// `true` for compiler-introduced temporaries
    pub is_compiler_generated: bool,
    /// Ranges over which the variable is visible
    pub il_ranges: Vec<IlRange>,
}

impl LocalVariable {
    /// `true` if the variable is visible at `offset`.
    #[must_use]
    pub fn is_visible_at(&self, offset: u32) -> bool {
        self.il_ranges.iter().any(|range| range.contains(offset))
    }
}

/// Flattens a scope tree into its local variables.
///
/// Every variable receives the range of the scope that declares it, and its type from
/// `type_of`, which is called with the variable's slot index.
pub fn collect_locals<F>(root: &LexicalScope, type_of: F) -> Vec<LocalVariable>
where
    F: Fn(u16) -> Option<String>,
{
    let mut locals = Vec::new();

    for scope in root.iter() {
        let range = scope.range();
        for variable in &scope.variables {
            locals.push(LocalVariable {
                index: variable.index,
                type_name: type_of(variable.index),
                name: variable.name.clone(),
                is_compiler_generated: variable.attributes.is_compiler_generated(),
                il_ranges: vec![range],
            });
        }
    }

    locals
}
