use stilt::prelude::*;

#[test]
fn test_fib_program() {
    let source = include_str!("fib.stilt");
    let program = compile(source).unwrap_or_else(|err| panic!("compile error:\n{err}"));

    let mut out = Vec::new();
    StiltVm::new(&program, ReaderBuffer::new(&b""[..]), &mut out)
        .run()
        .unwrap_or_else(|err| panic!("runtime error: {err}"));

    let output = String::from_utf8(out).unwrap();
    let expected = "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n";
    assert_eq!(output, expected);
}
