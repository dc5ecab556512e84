//! Integration tests for symbol resolution.
//!
//! These tests populate symbol stores the way a Portable PDB reader would, from encoded
//! sequence point and document name blobs, and resolve through the public API only.

use std::{fs, path::PathBuf, sync::Arc, thread};

use pdbscope::{
    metadata::document::{is_compiler_temporary, parse_document_name},
    prelude::*,
};

// LocalSignature 0
// IL 0x00: line 5, col 9-13
// IL 0x0A: hidden
// IL 0x14: line 7, col 9-13
const THREE_POINT_BLOB: [u8; 14] = [
    0x00, 0x00, 0x00, 0x04, 0x05, 0x09, 0x0A, 0x00, 0x00, 0x0A, 0x00, 0x04, 0x04, 0x00,
];

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pdbscope-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn blob_module(binary_path: &str, document: &str) -> Arc<LoadedModule> {
    let store = MemorySymbolStore::new();
    store.add_document(Document::new(Token::document(1), document));
    store.add_method(
        Token::method_def(1),
        MethodSymbols::from_blob(THREE_POINT_BLOB.to_vec(), 1),
    );

    let module = LoadedModule::new(binary_path).with_symbols(store);
    module.add_method(Token::method_def(1), 30);
    Arc::new(module)
}

#[test]
fn hidden_range_has_no_fallback() {
    let module = blob_module("/src/App/bin/App.dll", "/src/App/Program.cs");
    let method = LoadedMethod::new(module, Token::method_def(1));
    let resolver = PdbSymbolSource::new(MemoryFiles::new());

    assert!(resolver.has_symbols(&method));
    assert!(resolver.find_by_offset(&method, 15).is_none());

    let ignored = resolver.ignored_ranges(&method).unwrap();
    assert_eq!(ignored, vec![IlRange::new(10, 20)]);

    let first = resolver.find_by_offset(&method, 3).unwrap();
    assert_eq!((first.start_line, first.start_col, first.end_col), (5, 9, 13));
    assert_eq!(first.il_ranges, vec![IlRange::new(0, 10)]);

    let last = resolver.find_by_offset(&method, 29).unwrap();
    assert_eq!(last.start_line, 7);
    assert_eq!(last.il_ranges, vec![IlRange::new(20, 30)]);
}

#[test]
fn locals_of_nested_scopes() {
    let store = MemorySymbolStore::new();
    store.add_method(
        Token::method_def(1),
        MethodSymbols::new(Vec::new())
            .with_scope(LocalScopeRow::new(0, 100).with_variable(ScopeVariable::new(0, "x")))
            .with_scope(LocalScopeRow::new(10, 40).with_variable(ScopeVariable::new(1, "y"))),
    );

    let module = LoadedModule::new("/bin/App.dll").with_symbols(store);
    module.add_method_with_locals(
        Token::method_def(1),
        100,
        vec!["int".to_string(), "string".to_string()],
    );
    let method = LoadedMethod::new(Arc::new(module), Token::method_def(1));

    let mut locals = PdbSymbolSource::new(MemoryFiles::new())
        .local_variables(&method)
        .unwrap();
    locals.sort_by_key(|local| local.index);

    assert_eq!(locals.len(), 2);
    assert_eq!(locals[0].name, "x");
    assert_eq!(locals[0].il_ranges, vec![IlRange::new(0, 100)]);
    assert_eq!(locals[0].type_name.as_deref(), Some("int"));
    assert_eq!(locals[1].name, "y");
    assert_eq!(locals[1].il_ranges, vec![IlRange::new(10, 50)]);
    assert!(locals[1].is_visible_at(49));
    assert!(!locals[1].is_visible_at(50));
    assert!(!locals[1].is_compiler_generated);
}

#[test]
fn relocation_on_disk() {
    let dir = scratch_dir("relocate");
    let source = dir.join("App").join("src");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("Program.cs"), "class Program {}").unwrap();

    let binary = dir.join("App").join("bin").join("App.dll");
    let module = blob_module(
        binary.to_str().unwrap(),
        r"C:\agent\_work\App\src\Program.cs",
    );
    let method = LoadedMethod::new(module, Token::method_def(1));

    let point = PdbSymbolSource::disk().find_by_offset(&method, 0).unwrap();
    assert!(point.located);
    assert_eq!(PathBuf::from(&point.filename), source.join("Program.cs"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn stale_source_rejected_by_checksum() {
    let dir = scratch_dir("checksum");
    let source = dir.join("App");
    fs::create_dir_all(source.join("bin")).unwrap();
    fs::write(source.join("Program.cs"), b"class Program { static void Main() {} }").unwrap();

    let store = MemorySymbolStore::new();
    store.add_document(
        Document::new(Token::document(1), r"C:\build\App\Program.cs").with_checksum(
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha1.digest(b"class Program {}").unwrap(),
        ),
    );
    store.add_method(
        Token::method_def(1),
        MethodSymbols::from_blob(THREE_POINT_BLOB.to_vec(), 1),
    );
    let binary = source.join("bin").join("App.dll");
    let module = LoadedModule::new(binary.to_str().unwrap()).with_symbols(store);
    module.add_method(Token::method_def(1), 30);
    let method = LoadedMethod::new(Arc::new(module), Token::method_def(1));

    let point = PdbSymbolSource::disk().find_by_offset(&method, 0).unwrap();
    assert!(point.located);

    let strict = PdbSymbolSource::with_config(DiskFiles, ResolverConfig::strict());
    let point = strict.find_by_offset(&method, 0).unwrap();
    assert!(!point.located);
    assert_eq!(point.filename, r"C:\build\App\Program.cs");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn relative_document_next_to_binary() {
    let dir = scratch_dir("relative");
    let contents = b"class Program {}";
    fs::write(dir.join("Program.cs"), contents).unwrap();

    let digest = HashAlgorithm::Md5.digest(contents).unwrap();
    let store = MemorySymbolStore::new();
    store.add_document(
        Document::new(Token::document(1), "./Program.cs").with_checksum(HashAlgorithm::Md5, digest),
    );
    store.add_method(
        Token::method_def(1),
        MethodSymbols::from_blob(THREE_POINT_BLOB.to_vec(), 1),
    );
    let module = LoadedModule::new(dir.join("App.dll").to_str().unwrap()).with_symbols(store);
    module.add_method(Token::method_def(1), 30);
    let method = LoadedMethod::new(Arc::new(module), Token::method_def(1));

    let strict = PdbSymbolSource::with_config(DiskFiles, ResolverConfig::strict());
    let point = strict.find_by_offset(&method, 0).unwrap();
    assert!(point.located);
    assert_eq!(PathBuf::from(&point.filename), dir.join("Program.cs"));

    fs::write(dir.join("Program.cs"), b"class Program { int changed; }").unwrap();
    assert!(!strict.find_by_offset(&method, 0).unwrap().located);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn breakpoint_by_location() {
    let module = blob_module("/src/App/bin/App.dll", "/src/App/Program.cs");
    let resolver = PdbSymbolSource::new(MemoryFiles::new());

    // line 6 has no code and snaps to line 7 for the method lookup
    let point = resolver
        .find_by_location(&*module, "/src/app/PROGRAM.cs", 6, 0)
        .unwrap();
    assert_eq!(point.method, Token::method_def(1));
    assert_eq!(point.start_line, 7);
    assert_eq!(point.il_offset(), 20);

    let point = resolver
        .find_by_location(&*module, "/src/App/Program.cs", 5, 11)
        .unwrap();
    assert_eq!(point.il_offset(), 0);

    assert!(resolver
        .find_by_location(&*module, "/src/App/Other.cs", 5, 0)
        .is_none());
}

#[test]
fn malformed_methods_leave_healthy_ones_resolvable() {
    let store = MemorySymbolStore::new();
    store.add_document(Document::new(Token::document(1), "/src/App/Program.cs"));
    store.add_method(Token::method_def(1), MethodSymbols::from_blob(vec![0x00, 0xFF], 1));
    store.add_method(
        Token::method_def(2),
        MethodSymbols::from_blob(THREE_POINT_BLOB.to_vec(), 1)
            .with_scope(LocalScopeRow::new(0, 30).with_variable(ScopeVariable::new(0, "x"))),
    );
    // truncated after the first record's IL delta
    store.add_method(Token::method_def(3), MethodSymbols::from_blob(vec![0x00, 0x00], 1));
    // scopes overlapping without nesting
    store.add_method(
        Token::method_def(4),
        MethodSymbols::new(Vec::new())
            .with_scope(LocalScopeRow::new(0, 10))
            .with_scope(LocalScopeRow::new(5, 10)),
    );

    let module = LoadedModule::new("/src/App/bin/App.dll").with_symbols(store);
    for row in 1..=4 {
        module.add_method_with_locals(Token::method_def(row), 30, vec!["int".to_string()]);
    }
    let module = Arc::new(module);
    let resolver = PdbSymbolSource::new(MemoryFiles::new());
    let method = |row| LoadedMethod::new(module.clone(), Token::method_def(row));

    let healthy = method(2);
    assert_eq!(resolver.find_by_offset(&healthy, 25).unwrap().start_line, 7);
    assert_eq!(
        resolver.ignored_ranges(&healthy).unwrap(),
        vec![IlRange::new(10, 20)]
    );
    assert_eq!(resolver.local_variables(&healthy).unwrap()[0].name, "x");

    let point = resolver
        .find_by_location(&*module, "/src/App/Program.cs", 6, 0)
        .unwrap();
    assert_eq!(point.method, Token::method_def(2));
    assert_eq!(point.start_line, 7);

    for row in [1, 3] {
        assert!(resolver.has_symbols(&method(row)));
        assert!(resolver.find_by_offset(&method(row), 0).is_none());
        assert!(resolver.ignored_ranges(&method(row)).is_none());
    }
    assert!(resolver.local_variables(&method(4)).is_none());
}

#[test]
fn decoded_document_names() {
    let heap: [&[u8]; 5] = [b"", b"C:", b"agent", b"App", b"Program.cs"];
    let blob = [b'\\', 0x01, 0x02, 0x03, 0x04];
    let name = parse_document_name(&blob, |index| Ok(heap[index as usize])).unwrap();
    assert_eq!(name, r"C:\agent\App\Program.cs");

    let store = MemorySymbolStore::new();
    let document = store.add_document(
        Document::new(Token::document(1), name).with_language(Language::CSHARP_GUID),
    );
    assert_eq!(document.language_kind(), Language::CSharp);
    assert_eq!(document.file_name(), "Program.cs");
    assert!(!is_compiler_temporary(&document.name));
}

#[test]
fn relocation_candidates() {
    let candidates: Vec<String> =
        relocate("/home/dev/App/bin/App.dll", "/build/App/src/Program.cs").collect();
    assert_eq!(candidates[0], "/build/App/src/Program.cs");
    assert_eq!(candidates[1], "/home/dev/App/src/Program.cs");

    let candidates: Vec<String> = relocate("/a/b/c/App.dll", r".\Program.cs").collect();
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[2], "/a/Program.cs");
}

#[test]
fn concurrent_queries() {
    let module = blob_module("/src/App/bin/App.dll", "/src/App/Program.cs");
    let resolver = Arc::new(PdbSymbolSource::new(MemoryFiles::new()));

    let handles: Vec<_> = (0..4u32)
        .map(|worker| {
            let resolver = resolver.clone();
            let method = LoadedMethod::new(module.clone(), Token::method_def(1));
            thread::spawn(move || {
                for offset in 0..30 {
                    let point = resolver.find_by_offset(&method, offset);
                    if (10..20).contains(&offset) {
                        assert!(point.is_none(), "worker {worker} offset {offset}");
                    } else {
                        assert!(point.is_some(), "worker {worker} offset {offset}");
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
