use ember_compile::{compile_program, CompileOptions, SourceFile};
use ember_diag::{ErrorKind, Errors};
use ember_lexer::TokenKind;

fn compile(source: &str) -> (ember_compile::Compiler, Errors) {
    let sources = vec![SourceFile::new("main.ember", source)];
    let mut errors = Errors::new();
    let compiler = compile_program(&sources, CompileOptions::default(), &mut errors);
    (compiler, errors)
}

#[test]
fn hello_actor_compiles_clean_through_every_pass() {
    let (compiler, errors) = compile(
        "actor Main\n  new create(env: Env) =>\n    env.out\n  end\nend\n\
         class ref Env\n  var out: String\nend\n\
         class ref String end\n",
    );
    assert!(!errors.has_errors(), "{:?}", errors.iter().collect::<Vec<_>>());

    let package = compiler.arena.child(compiler.root, 0);
    let main = compiler
        .arena
        .children(package)
        .iter()
        .copied()
        .find(|&e| compiler.arena.kind(e) == TokenKind::Actor)
        .expect("an actor entity");
    let members = ember_ast::entity::entity_members(&compiler.arena, main);
    assert_eq!(members.len(), 1);
    assert_eq!(compiler.arena.kind(members[0]), TokenKind::New);
    assert_eq!(ember_ast::entity::method_params(&compiler.arena, members[0]).len(), 1);
}

#[test]
fn self_referential_type_alias_is_rejected() {
    let (_compiler, errors) = compile("type A is (U32 | A)\nprimitive val U32 end\n");
    assert_eq!(errors.of_kind(ErrorKind::RecursiveAlias).count(), 1);
}

#[test]
fn writing_a_field_through_a_box_receiver_is_a_capability_violation() {
    let (_compiler, errors) = compile(
        "class ref C\n  var x: U32 = 0\n  fun box bad() =>\n    x = 1\n  end\nend\nprimitive val U32 end\n",
    );
    assert_eq!(errors.of_kind(ErrorKind::CapMismatch).count(), 1);
}

#[test]
fn trait_method_body_is_imported_into_an_implementing_class() {
    let (compiler, errors) = compile(
        "trait ref T\n  fun f(): U32 => 1\nend\nclass ref C is T end\nprimitive val U32 end\n",
    );
    assert!(!errors.has_errors(), "{:?}", errors.iter().collect::<Vec<_>>());

    let package = compiler.arena.child(compiler.root, 0);
    let c = compiler
        .arena
        .children(package)
        .iter()
        .copied()
        .find(|&e| {
            compiler.arena.kind(e) == TokenKind::ClassKw
        })
        .expect("class C");
    let members = ember_ast::entity::entity_members(&compiler.arena, c);
    assert!(members
        .iter()
        .any(|&m| ember_ast::entity::is_method_kind(compiler.arena.kind(m))));
}

#[test]
fn default_body_imported_from_two_unrelated_traits_is_ambiguous() {
    let (_compiler, errors) = compile(
        "trait ref A\n  fun f(): U32 => 1\nend\ntrait ref B\n  fun f(): U32 => 2\nend\n\
         class ref C is (A & B) end\nprimitive val U32 end\n",
    );
    assert_eq!(errors.of_kind(ErrorKind::AmbiguousDefault).count(), 1);
}

#[test]
fn an_integer_literal_is_unified_through_a_function_call() {
    let (_compiler, errors) = compile(
        "class ref C\n  fun f(x: U8): U8 => x\n  fun g(): U8 => f(255)\nend\nprimitive val U8 end\n",
    );
    assert!(!errors.has_errors(), "{:?}", errors.iter().collect::<Vec<_>>());
}
