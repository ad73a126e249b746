//! Entrypoint for CLI
use std::{env, fs, process::ExitCode};

use log::info;
use stilt::{
    compile_with_keywords,
    lang::{KeywordTable, Lexer, TokenKind},
    prelude::*,
    IMPL_VERSION,
};

static USAGE: &str = r#"
usage: stilt CMD [OPTIONS] FILE...

commands:
    run     Compile and execute each source file in order
    dump    Compile the target file and print its bytecode listing
    lex     Print the token stream of the target file

options:
    --keywords FILE    Load keyword spellings from FILE

examples:
    stilt run demo.stilt
    stilt run --keywords keywords.txt demo.stilt
    stilt dump demo.stilt
"#;

enum Cmd {
    /// Compile then execute each file, stopping at the first failure.
    Run,
    /// Compile and print the bytecode listing.
    Dump,
    /// Print the token table, for troubleshooting the lexer.
    Lex,
}

struct Invocation {
    cmd: Cmd,
    keyword_file: Option<String>,
    files: Vec<String>,
}

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let invocation = match parse_args() {
        Some(invocation) => invocation,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            return ExitCode::from(64);
        }
    };

    let result = match invocation.cmd {
        Cmd::Run => run_files(&invocation),
        Cmd::Dump => dump_file(&invocation),
        Cmd::Lex => lex_file(&invocation),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn load_keywords(invocation: &Invocation) -> StiltResult<KeywordTable> {
    match &invocation.keyword_file {
        Some(path) => {
            let text = read_source(path)?;
            Ok(KeywordTable::from_words(text.split_whitespace()))
        }
        None => Ok(KeywordTable::default()),
    }
}

fn read_source(path: &str) -> StiltResult<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8(bytes)?)
}

fn run_files(invocation: &Invocation) -> StiltResult<()> {
    let keywords = load_keywords(invocation)?;

    for path in &invocation.files {
        info!("compiling {path}");
        let source = read_source(path)?;
        let program = compile_with_keywords(&source, keywords.clone())?;

        info!("running {path}");
        execute(&program)?;
    }

    Ok(())
}

fn dump_file(invocation: &Invocation) -> StiltResult<()> {
    let keywords = load_keywords(invocation)?;
    let path = &invocation.files[0];

    let source = read_source(path)?;
    let program = compile_with_keywords(&source, keywords)?;
    print!("{}", program.dump()?);

    Ok(())
}

fn lex_file(invocation: &Invocation) -> StiltResult<()> {
    let keywords = load_keywords(invocation)?;
    let path = &invocation.files[0];
    let source = read_source(path)?;

    println!("line:col | token                | lexeme");
    for result in Lexer::with_keywords(&source, keywords) {
        let token = result?;
        let pos = format!("{}", token.pos);
        let kind = format!("{:?}", token.kind);
        println!("{pos:8} | {kind:20} | {:?}", token.lexeme.as_str());

        if token.kind == TokenKind::Eof {
            break;
        }
    }

    Ok(())
}

fn parse_args() -> Option<Invocation> {
    let mut args = env::args().skip(1);

    let cmd = match args.next()?.as_str() {
        "run" => Cmd::Run,
        "dump" => Cmd::Dump,
        "lex" => Cmd::Lex,
        _ => return None,
    };

    let mut keyword_file = None;
    let mut files = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--keywords" {
            keyword_file = Some(args.next()?);
        } else {
            files.push(arg);
        }
    }

    if files.is_empty() {
        return None;
    }
    // dump and lex work on a single file.
    if !matches!(cmd, Cmd::Run) && files.len() != 1 {
        return None;
    }

    Some(Invocation {
        cmd,
        keyword_file,
        files,
    })
}

fn print_usage() {
    println!("stilt v{IMPL_VERSION}");
    println!("{USAGE}");
}
