use crate::*;
use indoc::indoc;
use pretty_assertions::assert_eq;

fn run(listing: &str, input: Vec<i64>) -> Result<Vec<i64>, Error> {
    let outcome = run_listing(listing, TestingDevice::new(input), None)?;
    Ok(outcome.device.output)
}

#[test]
fn reads_adds_and_writes() -> anyhow::Result<()> {
    let output = run(
        indoc! {"
            GET 3
            GET 4
            LOAD 3
            ADD 4
            STORE 5
            PUT 5
            HALT
        "},
        vec![2, 5],
    )?;

    assert_eq!(output, vec![7]);

    Ok(())
}

#[test]
fn cell_zero_is_the_accumulator() -> anyhow::Result<()> {
    let output = run(
        indoc! {"
            SET 21
            ADD 0 # doubles
            PUT 0
            SET 10
            STORE 1
            SET 42
            STOREI 1
            SET 10
            LOADI 0
            PUT 0
            HALT
        "},
        vec![],
    )?;

    assert_eq!(output, vec![42, 42]);

    Ok(())
}

#[test]
fn half_rounds_toward_negative_infinity() -> anyhow::Result<()> {
    let output = run(
        indoc! {"
            SET -5
            HALF
            PUT 0
            SET 5
            HALF
            PUT 0
            HALT
        "},
        vec![],
    )?;

    assert_eq!(output, vec![-3, 2]);

    Ok(())
}

#[test]
fn unwritten_cells_read_as_zero() -> anyhow::Result<()> {
    let output = run("LOAD 100\nPUT 0\nHALT\n", vec![])?;

    assert_eq!(output, vec![0]);

    Ok(())
}

#[test]
fn relative_jumps_drive_a_countdown() -> anyhow::Result<()> {
    let output = run(
        indoc! {"
            SET 3
            STORE 3
            LOAD 3
            JZERO 6
            PUT 3
            SET -1
            ADD 3
            STORE 3
            JUMP -6
            HALT
        "},
        vec![],
    )?;

    assert_eq!(output, vec![3, 2, 1]);

    Ok(())
}

#[test]
fn return_jumps_to_an_absolute_index() -> anyhow::Result<()> {
    let program = il::parse_listing(indoc! {"
        SET 3
        STORE 3
        JUMP 2
        HALT
        RTRN 3
    "})?;

    let outcome = Machine::new(TestingDevice::default(), None).run(&program)?;

    assert_eq!(outcome.steps, 5);

    Ok(())
}

#[test]
fn running_out_of_input_is_an_error() {
    let result = run("GET 3\nHALT\n", vec![]);

    assert!(matches!(result, Err(Error::InputExhausted)));
}

#[test]
fn step_limit_stops_a_spinning_program() {
    let result = run_listing(
        "JUMP 0\n",
        TestingDevice::default(),
        Some(Config {
            step_limit: Some(100),
        }),
    );

    assert!(matches!(result, Err(Error::StepLimit(100))));
}

#[test]
fn jumping_outside_the_program_is_an_error() {
    let result = run("JUMP 5\nHALT\n", vec![]);
    assert!(matches!(result, Err(Error::CounterOutOfRange(0, 5))));

    let result = run("SET 1\n", vec![]);
    assert!(matches!(result, Err(Error::CounterOutOfRange(0, 1))));

    let result = run("SET 0\nJUMP 9223372036854775807\nHALT\n", vec![]);
    assert!(matches!(result, Err(Error::CounterOutOfRange(1, i64::MAX))));

    let result = run("SET 0\nJZERO -9223372036854775808\nHALT\n", vec![]);
    assert!(matches!(result, Err(Error::CounterOutOfRange(1, _))));
}

#[test]
fn unresolved_jumps_are_rejected() {
    let program = vec![Instruction::Jump(Target::Unresolved), Instruction::Halt];
    let result = Machine::new(TestingDevice::default(), None).run(&program);

    assert!(matches!(result, Err(Error::UnresolvedJump(0))));
}
