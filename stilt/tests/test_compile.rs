//! Tests on the compiled bytecode itself: emission shapes, jump
//! resolution, determinism and the dump format.
use stilt::{compile_with_keywords, lang::KeywordTable, prelude::*};

fn ops(program: &Program) -> Vec<(Op, i32)> {
    program
        .code()
        .iter()
        .map(|instr| (instr.op, instr.arg1))
        .collect()
}

/// Check that `expected` appears within `actual` in order, allowing
/// other instructions in between.
fn assert_subsequence(actual: &[(Op, i32)], expected: &[(Op, i32)]) {
    let mut rest = actual;
    for needle in expected {
        match rest.iter().position(|probe| probe == needle) {
            Some(at) => rest = &rest[at + 1..],
            None => panic!("missing {needle:?} (in order) in {actual:?}"),
        }
    }
}

#[test]
fn test_arithmetic_bytecode_shape() {
    let program = compile("main { print(1 + 2 * 3); }").unwrap();
    assert_subsequence(
        &ops(&program),
        &[
            (Op::PushInt, 1),
            (Op::PushInt, 2),
            (Op::PushInt, 3),
            (Op::Mul, 0),
            (Op::Add, 0),
            (Op::Print, 0),
            (Op::Halt, 0),
        ],
    );
}

#[test]
fn test_program_starts_with_jump_to_main() {
    let program = compile("main { }").unwrap();
    assert_eq!(ops(&program), vec![(Op::Jump, 1), (Op::Halt, 0)]);
}

#[test]
fn test_assignment_defers_no_load() {
    // `x = 5` must compile to a store alone; the deferred lvalue never
    // becomes a load.
    let program = compile("main { int x; x = 5; }").unwrap();
    assert_eq!(
        ops(&program),
        vec![
            (Op::Jump, 1),
            (Op::PushInt, 5),
            (Op::StoreVar, 0),
            (Op::Halt, 0),
        ]
    );
}

#[test]
fn test_rvalue_use_emits_load() {
    let program = compile("main { int x; x = 1; x; }").unwrap();
    assert_eq!(
        ops(&program),
        vec![
            (Op::Jump, 1),
            (Op::PushInt, 1),
            (Op::StoreVar, 0),
            (Op::LoadVar, 0),
            (Op::Halt, 0),
        ]
    );
}

#[test]
fn test_while_layout() {
    let program = compile("main { while (false) { print(1); } }").unwrap();
    assert_eq!(
        ops(&program),
        vec![
            (Op::Jump, 1),
            (Op::PushBool, 0),     // 1: condition
            (Op::JumpIfFalse, 6),  // 2: exit
            (Op::PushInt, 1),      // 3: body
            (Op::Print, 0),        // 4
            (Op::Jump, 1),         // 5: back to the condition
            (Op::Halt, 0),         // 6
        ]
    );
}

#[test]
fn test_for_layout_puts_step_before_body() {
    let program = compile("main { int i; for (i = 0; i < 2; i = i + 1) { } }").unwrap();
    assert_eq!(
        ops(&program),
        vec![
            (Op::Jump, 1),
            (Op::PushInt, 0),      // 1: init
            (Op::StoreVar, 0),     // 2
            (Op::LoadVar, 0),      // 3: condition
            (Op::PushInt, 2),      // 4
            (Op::CmpLt, 0),        // 5
            (Op::JumpIfFalse, 14), // 6: exit
            (Op::Jump, 13),        // 7: skip the step on entry
            (Op::LoadVar, 0),      // 8: step
            (Op::PushInt, 1),      // 9
            (Op::Add, 0),          // 10
            (Op::StoreVar, 0),     // 11
            (Op::Jump, 3),         // 12: step back to condition
            (Op::Jump, 8),         // 13: (empty) body into the step
            (Op::Halt, 0),         // 14
        ]
    );
}

#[test]
fn test_every_jump_and_call_resolves() {
    let source = "declare int fib(int);\n\
                  int fib(int n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }\n\
                  main { int i; for (i = 0; i < 8; i = i + 1) { print(fib(i)); } }";
    let program = compile(source).unwrap();

    let len = program.len() as i32;
    for instr in program.code() {
        match instr.op {
            Op::Jump | Op::JumpIfFalse => {
                assert!(
                    instr.arg1 >= 0 && instr.arg1 < len,
                    "unresolved jump target {}",
                    instr.arg1
                );
            }
            Op::Call => {
                let func = program.function(instr.arg1 as usize);
                assert!(func.entry_ip >= 0, "call to undefined {}", func.name);
                assert!(func.entry_ip < len);
            }
            _ => {}
        }
    }
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "declare float f(float);\n\
                  float f(float x) { return x * 0.5; }\n\
                  main { int i; i = 0; while (i < 3) { print(f(2.0)); i = i + 1; } \
                  print(\"done\"); }";
    let first = compile(source).unwrap();
    let second = compile(source).unwrap();

    assert_eq!(first.code(), second.code());
    assert_eq!(first.dump().unwrap(), second.dump().unwrap());
}

#[test]
fn test_dump_listing() {
    let program = compile("main { print(\"hi\"); }").unwrap();
    let dump = program.dump().unwrap();

    let mut lines = dump.lines();
    assert_eq!(lines.next(), Some("0:\tJUMP 1"));
    assert_eq!(lines.next(), Some("1:\tPUSH_STRING 0"));
    assert_eq!(lines.next(), Some("2:\tPRINT"));
    assert_eq!(lines.next(), Some("3:\tHALT"));
    assert!(dump.contains("--- String pool ---"));
    assert!(dump.contains("0: \"hi\""));
    assert!(dump.contains("--- Functions ---"));
}

#[test]
fn test_string_pool_in_dump() {
    let program = compile("main { print(\"a\"); print(\"b\"); print(\"a\"); }").unwrap();
    let dump = program.dump().unwrap();
    // "a" is interned once.
    assert!(dump.contains("0: \"a\""));
    assert!(dump.contains("1: \"b\""));
    assert!(!dump.contains("2: \"a\""));
}

#[test]
fn test_keyword_table_controls_spellings() {
    // A table missing `while` makes the word an ordinary identifier, so
    // the loop no longer parses.
    let crippled = KeywordTable::from_words(
        "int char bool float void if elif else for return break continue print read \
         true false declare main"
            .split_whitespace(),
    );
    let source = "main { int i; i = 0; while (i < 3) { i = i + 1; } }";
    assert!(compile_with_keywords(source, crippled).is_err());

    let full = KeywordTable::default();
    assert!(compile_with_keywords(source, full).is_ok());
}
