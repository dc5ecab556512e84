//! Loaded modules and their methods.
//!
//! [`LoadedModule`] is a [`DebugModule`] backed by plain data: the path of the binary, its
//! symbol store and, per method, the IL body size and the type names of the local signature.
//! [`LoadedMethod`] ties a MethodDef token to its module.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::token::Token,
    symbols::{CompiledMethod, DebugModule, SymbolStore},
};

/// Body information of one method.
#[derive(Debug, Clone, Default)]
struct MethodBody {
    code_size: u32,
    local_types: Vec<String>,
}

/// A binary loaded into the debuggee.
pub struct LoadedModule {
    binary_path: String,
    symbols: Option<Box<dyn SymbolStore>>,
    methods: SkipMap<Token, MethodBody>,
}

impl LoadedModule {
    /// A module at `binary_path` without symbols.
    #[must_use]
    pub fn new(binary_path: impl Into<String>) -> Self {
        LoadedModule {
            binary_path: binary_path.into(),
            symbols: None,
            methods: SkipMap::new(),
        }
    }

    /// Attaches the module's debug symbols.
    #[must_use]
    pub fn with_symbols(mut self, symbols: impl SymbolStore + 'static) -> Self {
        self.symbols = Some(Box::new(symbols));
        self
    }

    /// Registers a method body of `code_size` bytes.
    pub fn add_method(&self, method: Token, code_size: u32) {
        self.add_method_with_locals(method, code_size, Vec::new());
    }

    /// Registers a method body together with the type names of its local signature, by slot.
    pub fn add_method_with_locals(&self, method: Token, code_size: u32, local_types: Vec<String>) {
        self.methods.insert(
            method,
            MethodBody {
                code_size,
                local_types,
            },
        );
    }
}

impl DebugModule for LoadedModule {
    fn binary_path(&self) -> &str {
        &self.binary_path
    }

    fn symbols(&self) -> Option<&dyn SymbolStore> {
        self.symbols.as_deref()
    }

    fn code_size(&self, method: Token) -> Option<u32> {
        self.methods.get(&method).map(|entry| entry.value().code_size)
    }

    fn local_variable_type(&self, method: Token, slot: u16) -> Option<String> {
        let entry = self.methods.get(&method)?;
        entry.value().local_types.get(usize::from(slot)).cloned()
    }
}

/// A method of a [`DebugModule`].
#[derive(Clone)]
pub struct LoadedMethod {
    module: Arc<dyn DebugModule>,
    token: Token,
}

impl LoadedMethod {
    /// The method `token` of `module`.
    pub fn new<M: DebugModule + 'static>(module: Arc<M>, token: Token) -> Self {
        LoadedMethod { module, token }
    }
}

impl CompiledMethod for LoadedMethod {
    fn token(&self) -> Token {
        self.token
    }

    fn module(&self) -> &dyn DebugModule {
        self.module.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::MemorySymbolStore;

    #[test]
    fn module_without_symbols() {
        let module = LoadedModule::new("/bin/App.dll");
        assert_eq!(module.binary_path(), "/bin/App.dll");
        assert!(module.symbols().is_none());
        assert_eq!(module.code_size(Token::method_def(1)), None);
    }

    #[test]
    fn method_body_information() {
        let module = Arc::new(LoadedModule::new("/bin/App.dll").with_symbols(MemorySymbolStore::new()));
        module.add_method_with_locals(
            Token::method_def(3),
            42,
            vec!["int".to_string(), "string".to_string()],
        );

        let method = LoadedMethod::new(module.clone(), Token::method_def(3));
        assert_eq!(method.token(), Token::method_def(3));
        assert_eq!(method.code_size(), 42);
        assert_eq!(method.local_variable_type(1).as_deref(), Some("string"));
        assert_eq!(method.local_variable_type(2), None);
        assert!(method.module().symbols().is_some());

        let unknown = LoadedMethod::new(module, Token::method_def(4));
        assert_eq!(unknown.code_size(), 0);
    }
}
