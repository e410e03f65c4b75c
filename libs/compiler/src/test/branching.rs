use super::{block, program};
use ast::{Command, Comparison, Condition, Declaration, Identifier, Program};
use pretty_assertions::assert_eq;

const OPERATORS: [Comparison; 6] = [
    Comparison::Equal,
    Comparison::NotEqual,
    Comparison::Less,
    Comparison::Greater,
    Comparison::LessOrEqual,
    Comparison::GreaterOrEqual,
];

const PAIRS: [(i64, i64); 5] = [(1, 2), (2, 2), (3, 2), (-5, 5), (0, -1)];

fn holds(left: i64, operator: Comparison, right: i64) -> bool {
    match operator {
        Comparison::Equal => left == right,
        Comparison::NotEqual => left != right,
        Comparison::Less => left < right,
        Comparison::Greater => left > right,
        Comparison::LessOrEqual => left <= right,
        Comparison::GreaterOrEqual => left >= right,
    }
}

fn var(name: &str) -> Identifier {
    Identifier::scalar(name)
}

fn with_inputs(commands: Vec<Command>) -> Program {
    let mut all = vec![Command::read(var("a")), Command::read(var("b"))];
    all.extend(commands);
    program(vec![], vec![Declaration::scalar("a"), Declaration::scalar("b")], all)
}

#[test]
fn if_else_takes_the_right_branch_for_every_operator() -> anyhow::Result<()> {
    for operator in OPERATORS {
        // IF a <op> b THEN WRITE 1; ELSE WRITE 0; ENDIF WRITE 9;
        let source = with_inputs(vec![
            Command::if_else(
                Condition::new(var("a"), operator, var("b")),
                block(vec![Command::write(1_i64)]),
                block(vec![Command::write(0_i64)]),
            ),
            Command::write(9_i64),
        ]);

        for (a, b) in PAIRS {
            let expected = if holds(a, operator, b) { 1 } else { 0 };
            assert_eq!(compile!(run source, vec![a, b]), vec![expected, 9], "{a} {operator} {b}");
        }
    }

    Ok(())
}

#[test]
fn if_without_else_for_every_operator() -> anyhow::Result<()> {
    for operator in OPERATORS {
        let source = with_inputs(vec![
            Command::if_then(
                Condition::new(var("a"), operator, var("b")),
                block(vec![Command::write(1_i64), Command::write(2_i64)]),
            ),
            Command::write(9_i64),
        ]);

        for (a, b) in PAIRS {
            let expected = if holds(a, operator, b) { vec![1, 2, 9] } else { vec![9] };
            assert_eq!(compile!(run source, vec![a, b]), expected, "{a} {operator} {b}");
        }
    }

    Ok(())
}

#[test]
fn empty_branches_fall_through() -> anyhow::Result<()> {
    for operator in OPERATORS {
        let source = with_inputs(vec![
            Command::if_else(Condition::new(var("a"), operator, var("b")), vec![], vec![]),
            Command::write(9_i64),
        ]);

        assert_eq!(compile!(run source, vec![1, 2]), vec![9]);
    }

    Ok(())
}

#[test]
fn nested_conditionals() -> anyhow::Result<()> {
    // sign of a: -1, 0 or 1
    let source = with_inputs(vec![Command::if_else(
        Condition::new(var("a"), Comparison::GreaterOrEqual, 0_i64),
        block(vec![Command::if_else(
            Condition::new(var("a"), Comparison::NotEqual, 0_i64),
            block(vec![Command::write(1_i64)]),
            block(vec![Command::write(0_i64)]),
        )]),
        block(vec![Command::write(-1_i64)]),
    )]);

    assert_eq!(compile!(run source, vec![12, 0]), vec![1]);
    assert_eq!(compile!(run source, vec![0, 0]), vec![0]);
    assert_eq!(compile!(run source, vec![-12, 0]), vec![-1]);

    Ok(())
}

#[test]
fn conditions_compare_literals_and_variables() -> anyhow::Result<()> {
    let source = with_inputs(vec![
        Command::if_then(
            Condition::new(5_i64, Comparison::Less, var("a")),
            block(vec![Command::write(var("a"))]),
        ),
        Command::if_then(
            Condition::new(3_i64, Comparison::Equal, 3_i64),
            block(vec![Command::write(var("b"))]),
        ),
    ]);

    assert_eq!(compile!(run source, vec![6, 7]), vec![6, 7]);
    assert_eq!(compile!(run source, vec![5, 7]), vec![7]);

    Ok(())
}
