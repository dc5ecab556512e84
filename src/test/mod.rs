//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::{
    metadata::{
        document::Document,
        localscope::{LocalScopeRow, LocalVariableAttributes, ScopeVariable},
        sequencepoints::SequencePointRecord,
        token::Token,
    },
    symbols::{LoadedModule, MemorySymbolStore, MethodSymbols},
};

// Helper function to create a visible single-line record, columns 9 to 30
pub fn record(il_offset: u32, document: u32, line: u32) -> SequencePointRecord {
    SequencePointRecord {
        il_offset,
        document,
        start_line: line,
        start_col: 9,
        end_line: line,
        end_col: 30,
        is_hidden: false,
    }
}

// Two documents below /src/App and two methods:
//   0x06000001 Program.cs  IL 0: line 5, IL 10: hidden, IL 20: line 7
//                          scopes [0,30) x, CS$0; [10,20) y
//   0x06000002 Program.cs  IL 0: line 12; Helper.cs IL 8: line 3
pub fn two_method_store() -> MemorySymbolStore {
    let store = MemorySymbolStore::new();
    store.add_document(Document::new(Token::document(1), "/src/App/Program.cs"));
    store.add_document(Document::new(Token::document(2), "/src/App/Helper.cs"));

    store.add_method(
        Token::method_def(1),
        MethodSymbols::new(vec![
            record(0, 1, 5),
            SequencePointRecord::hidden(10, 1),
            record(20, 1, 7),
        ])
        .with_scope(
            LocalScopeRow::new(0, 30)
                .with_variable(ScopeVariable::new(0, "x"))
                .with_variable(
                    ScopeVariable::new(2, "CS$0")
                        .with_attributes(LocalVariableAttributes::DEBUGGER_HIDDEN),
                ),
        )
        .with_scope(LocalScopeRow::new(10, 10).with_variable(ScopeVariable::new(1, "y"))),
    );

    store.add_method(
        Token::method_def(2),
        MethodSymbols::new(vec![record(0, 1, 12), record(8, 2, 3)]),
    );

    store
}

// The module at /src/App/bin/App.dll carrying `two_method_store`
pub fn two_method_module() -> Arc<LoadedModule> {
    let module = LoadedModule::new("/src/App/bin/App.dll").with_symbols(two_method_store());
    module.add_method_with_locals(
        Token::method_def(1),
        30,
        vec!["int".to_string(), "string".to_string(), "bool".to_string()],
    );
    module.add_method(Token::method_def(2), 16);
    Arc::new(module)
}
