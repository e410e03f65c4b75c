use crate::{
    compile_to_string, compile_tree, compiler::CompilerConfig, run, vm::TestingDevice, Error,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

const INCREMENT: &str = include_str!("../../demos/increment.json");
const DIVIDE: &str = include_str!("../../demos/divide.json");

fn run_with(listing: &str, input: Vec<i64>) -> anyhow::Result<Vec<i64>> {
    let outcome = run(listing, TestingDevice::new(input), None)?;
    Ok(outcome.device.output)
}

#[test]
fn increment_demo_compiles_to_listing() -> anyhow::Result<()> {
    let listing = compile_to_string(INCREMENT, None)?;

    assert_eq!(
        listing,
        indoc! {"
            JUMP 7
            SET 1
            STORE 6
            LOADI 4
            ADD 6
            STOREI 4
            RTRN 3
            SET 0
            STORE 5
            SET 5
            STORE 4
            SET 14
            STORE 3
            JUMP -12
            LOAD 5
            PUT 0
            HALT
        "}
    );

    Ok(())
}

#[test]
fn debug_listing_still_runs() -> anyhow::Result<()> {
    let listing = compile_to_string(INCREMENT, Some(CompilerConfig { debug: true }))?;

    assert!(listing.contains("#call inc"));
    assert_eq!(run_with(&listing, vec![])?, vec![1]);

    Ok(())
}

#[test]
fn divide_demo_floors() -> anyhow::Result<()> {
    let listing = compile_to_string(DIVIDE, None)?;

    assert_eq!(run_with(&listing, vec![7, 2])?, vec![7, 3]);
    assert_eq!(run_with(&listing, vec![7, -2])?, vec![7, -4]);
    assert_eq!(run_with(&listing, vec![-7, 2])?, vec![-7, -4]);
    assert_eq!(run_with(&listing, vec![5, 0])?, vec![5, 0]);

    Ok(())
}

#[test]
fn compile_errors_surface_with_their_line() {
    let json = r#"
    {
        "main": {
            "declarations": [],
            "commands": [ { "line": 4, "node": { "Read": { "Scalar": "n" } } } ]
        }
    }
    "#;

    match compile_to_string(json, None) {
        Err(Error::Compile(err)) => {
            assert_eq!(err.line(), Some(4));
            assert_eq!(err.to_string(), "line 4: `n` is not declared.");
        }
        other => panic!("Expected a compile error, got {:?}", other),
    }
}

#[test]
fn malformed_tree_is_rejected() {
    let result = compile_tree(r#"{ "procedures": [] }"#, None);

    assert!(matches!(result, Err(Error::Tree(_))));
}

#[test]
fn runtime_errors_are_wrapped() {
    let result = run("GET 0\nHALT\n", TestingDevice::default(), None);

    assert!(matches!(result, Err(Error::Runtime(vm::Error::InputExhausted))));
}
