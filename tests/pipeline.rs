//! End-to-end runs of the dump pipeline against in-memory modules.

use std::{
    fs,
    path::{Path, PathBuf},
};

use typedump::{
    diagnostics::DiagnosticCategory, Accessibility, Dumper, Error, FieldDescriptor, Filters,
    LoadedModule, MetadataProvider, MethodDescriptor, MethodModifier, ParamDescriptor, Result,
    RunTotals, Token, TypeDescriptor, TypeName, TypeSelector,
};

struct InMemory {
    types: Vec<TypeDescriptor>,
    failures: Vec<&'static str>,
}

impl InMemory {
    fn new(types: Vec<TypeDescriptor>) -> Self {
        InMemory {
            types,
            failures: Vec::new(),
        }
    }
}

impl MetadataProvider for InMemory {
    fn load(&self, _path: &Path) -> Result<LoadedModule> {
        let module = LoadedModule::new("Assembly-CSharp", self.types.clone());
        for failure in &self.failures {
            module.diagnostics.error(DiagnosticCategory::Type, *failure);
        }
        Ok(module)
    }
}

fn module_file(dir: &Path) -> PathBuf {
    let path = dir.join("Assembly-CSharp.dll");
    fs::write(&path, b"MZ").unwrap();
    path
}

fn player() -> TypeDescriptor {
    let mut ty = TypeDescriptor::new("Player", "Game.Player", Token::new(0x0200_0002));

    let mut moving = MethodDescriptor::new(
        "Move",
        Token::new(0x0600_0002),
        TypeName::primitive("Void"),
    );
    moving.modifier = MethodModifier::Virtual;
    let mut steps = ParamDescriptor::new("steps", TypeName::by_ref(TypeName::primitive("Int32")));
    steps.is_out = true;
    steps.is_ref = true;
    moving.params = vec![
        ParamDescriptor::new("speed", TypeName::primitive("Single")),
        steps,
    ];
    ty.methods.push(moving);

    let mut items = MethodDescriptor::new(
        "GetItems",
        Token::new(0x0600_0003),
        TypeName::generic("List`1", vec![TypeName::primitive("Int32")]),
    );
    items.is_static = true;
    items.params = vec![ParamDescriptor::new(
        "limit",
        TypeName::nullable(TypeName::primitive("Int32")),
    )];
    ty.methods.push(items);

    ty.methods.push(MethodDescriptor::new(
        "get_Health",
        Token::new(0x0600_0004),
        TypeName::primitive("Int32"),
    ));

    let mut name = FieldDescriptor::new(
        "Name",
        Token::new(0x0400_0001),
        TypeName::primitive("String"),
    );
    name.is_static = true;
    name.is_read_only = true;
    ty.fields.push(name);

    let mut state = FieldDescriptor::new(
        "state",
        Token::new(0x0400_0002),
        TypeName::nested(TypeName::plain("Player"), "State"),
    );
    state.access = Accessibility::Private;
    ty.fields.push(state);

    ty
}

fn with_method(name: &str, full_name: &str, method: &str) -> TypeDescriptor {
    let mut ty = TypeDescriptor::new(name, full_name, Token::new(0x0200_0003));
    ty.methods.push(MethodDescriptor::new(
        method,
        Token::new(0x0600_0010),
        TypeName::primitive("Void"),
    ));
    ty
}

#[test]
fn page_layout() {
    let dir = tempfile::tempdir().unwrap();
    let module = module_file(dir.path());
    let out = dir.path().join("Parsed").join("Game");

    let summary = Dumper::new(InMemory::new(vec![player()]), &out)
        .run(&module, &Filters::default())
        .unwrap();
    assert_eq!(
        summary.totals,
        RunTotals {
            methods: 2,
            classes: 1
        }
    );

    let page = fs::read_to_string(out.join("Player.txt")).unwrap();
    assert_eq!(
        page,
        "Class: Game.Player\n\
         Token: 0x2000002\n\
         \n\
         Methods:\n\
         =======\n\
         Method: public virtual void Move(float speed, out int steps), Token: 0x6000002\n\
         Method: public static List<int> GetItems(int? limit), Token: 0x6000003\n\
         \n\
         Fields:\n\
         =====\n\
         public static readonly string Name, Token: 0x4000001\n\
         private Player.State state, Token: 0x4000002\n"
    );
}

#[test]
fn framework_and_generated_types_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let module = module_file(dir.path());
    let out = dir.path().join("out");

    let types = vec![
        with_method("Enemy", "Game.Enemy", "Attack"),
        with_method("Behaviour", "UnityEngine.Behaviour", "Awake"),
        with_method("<>c__DisplayClass1_0", "Game.Enemy+<>c__DisplayClass1_0", "Run"),
    ];
    let summary = Dumper::new(InMemory::new(types), &out)
        .run(&module, &Filters::default())
        .unwrap();

    assert_eq!(
        summary.totals,
        RunTotals {
            methods: 1,
            classes: 1
        }
    );
    let files = fs::read_dir(&out).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn field_only_types_get_a_page() {
    let dir = tempfile::tempdir().unwrap();
    let module = module_file(dir.path());
    let out = dir.path().join("out");

    let mut config = TypeDescriptor::new("Config", "Game.Config", Token::new(0x0200_0004));
    let mut volume = FieldDescriptor::new(
        "Volume",
        Token::new(0x0400_0003),
        TypeName::primitive("Single"),
    );
    volume.is_constant = true;
    config.fields.push(volume);

    let summary = Dumper::new(InMemory::new(vec![config]), &out)
        .run(&module, &Filters::default())
        .unwrap();

    assert_eq!(
        summary.totals,
        RunTotals {
            methods: 0,
            classes: 1
        }
    );
    let page = fs::read_to_string(out.join("Config.txt")).unwrap();
    assert!(page.contains("public const float Volume, Token: 0x4000003"));
}

#[test]
fn colliding_names_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let module = module_file(dir.path());
    let out = dir.path().join("out");

    let types = vec![
        with_method("Item", "Game.Item", "Use"),
        with_method("Item", "Game.Shop.Item", "Buy"),
    ];
    let summary = Dumper::new(InMemory::new(types), &out)
        .run(&module, &Filters::default())
        .unwrap();

    assert_eq!(summary.totals.classes, 2);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 1);

    let page = fs::read_to_string(out.join("Item.txt")).unwrap();
    assert!(page.starts_with("Class: Game.Item\n") || page.starts_with("Class: Game.Shop.Item\n"));
}

#[test]
fn failed_write_keeps_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let module = module_file(dir.path());
    let out = dir.path().join("out");
    // A directory where the page file should go
    fs::create_dir_all(out.join("Enemy.txt")).unwrap();

    let types = vec![player(), with_method("Enemy", "Game.Enemy", "Attack")];
    let summary = Dumper::new(InMemory::new(types), &out)
        .run(&module, &Filters::default())
        .unwrap();

    assert_eq!(
        summary.totals,
        RunTotals {
            methods: 3,
            classes: 2
        }
    );
    assert_eq!(summary.pages_written, 1);
    assert_eq!(summary.failed_writes.len(), 1);
    assert_eq!(summary.failed_writes[0].path, out.join("Enemy.txt"));
    assert!(out.join("Player.txt").is_file());
}

#[test]
fn partial_loads_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let module = module_file(dir.path());
    let out = dir.path().join("out");

    let provider = InMemory {
        types: vec![player()],
        failures: vec!["Failed to resolve type - Game.Broken"],
    };
    let summary = Dumper::new(provider, &out)
        .run(&module, &Filters::default())
        .unwrap();

    assert_eq!(summary.diagnostics.error_count(), 1);
    assert_eq!(summary.pages_written, 1);
}

#[test]
fn missing_module() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let result = Dumper::new(InMemory::new(vec![player()]), &out)
        .run(&dir.path().join("Missing.dll"), &Filters::default());

    assert!(matches!(result, Err(Error::ModuleNotFound(_))));
    assert!(!out.exists());
}

#[test]
fn class_filter_is_idempotent() {
    let filters = Filters::new(Some("Play"), None);
    let types = vec![
        player(),
        with_method("Enemy", "Game.Enemy", "Attack"),
        with_method("Playground", "Game.Playground", "Reset"),
    ];

    let once = types
        .iter()
        .filter(|ty| TypeSelector::accepts(ty, &filters))
        .cloned()
        .collect::<Vec<_>>();
    let twice = once
        .iter()
        .filter(|ty| TypeSelector::accepts(ty, &filters))
        .cloned()
        .collect::<Vec<_>>();

    assert_eq!(once.len(), 2);
    assert_eq!(once, twice);
}
