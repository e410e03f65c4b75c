use crate::*;
use indoc::indoc;
use pretty_assertions::assert_eq;

fn increment_program() -> Program {
    let inc = Procedure::new(
        "inc".to_string().at(1),
        vec![Parameter::scalar("x")],
        vec![],
        vec![
            Command::assign(
                Identifier::scalar("x"),
                Expression::binary(Value::var("x"), BinaryOperator::Add, 1i64),
            )
            .at(2),
        ],
    );

    Program::new(
        vec![inc],
        Main::new(
            vec![Declaration::scalar("a").at(4), Declaration::array("t", 1, 3).at(4)],
            vec![
                Command::assign(Identifier::scalar("a"), 0i64).at(6),
                Command::call("inc", ["a"]).at(7),
                Command::write(Identifier::element("t", 2)).at(8),
            ],
        ),
    )
}

#[test]
fn program_renders_as_source() {
    let rendered = increment_program().to_string();

    assert_eq!(
        rendered,
        indoc! {"
            PROCEDURE inc(x) IS BEGIN x := x + 1; END
            PROGRAM IS a, t[1:3] BEGIN a := 0; inc(a); WRITE t[2]; END"
        }
    );
}

#[test]
fn nested_commands_render_inline() {
    let command = Command::if_else(
        Condition::new(
            Value::var("a"),
            Comparison::LessOrEqual,
            Identifier::indexed_by("t", "i"),
        ),
        vec![Command::write(1i64).at(2)],
        vec![
            Command::for_down_to(
                "i",
                5i64,
                1i64,
                vec![Command::read(Identifier::scalar("b")).at(4)],
            )
            .at(3),
        ],
    );

    assert_eq!(
        command.to_string(),
        "IF a <= t[i] THEN WRITE 1; ELSE FOR i FROM 5 DOWNTO 1 DO READ b; ENDFOR ENDIF"
    );
}

#[test]
fn spanned_nodes_deref_to_their_payload() {
    let spanned = Declaration::array("t", -2, 2).at(9);

    assert_eq!(spanned.line, 9);
    assert_eq!(spanned.name(), "t");
}

#[test]
fn program_deserializes_from_json() -> anyhow::Result<()> {
    let json = r#"
    {
        "main": {
            "declarations": [ { "line": 1, "node": { "Scalar": "n" } } ],
            "commands": [
                { "line": 2, "node": { "Read": { "Scalar": "n" } } },
                { "line": 3, "node": { "Write": { "Identifier": { "Scalar": "n" } } } }
            ]
        }
    }
    "#;

    let program: Program = serde_json::from_str(json)?;

    assert!(program.procedures.is_empty());
    assert_eq!(program.main.declarations[0].node, Declaration::scalar("n"));
    assert_eq!(program.main.commands[1].node, Command::write(Value::var("n")));

    Ok(())
}
