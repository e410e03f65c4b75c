use crate::*;
use std::io::BufWriter;
use indoc::indoc;
use pretty_assertions::assert_eq;

#[test]
fn patched_jumps_are_relative_to_themselves() -> anyhow::Result<()> {
    let mut instructions = Instructions::default();
    let forward =
        instructions.emit(InstructionNode::new(Instruction::Jump(Target::Unresolved), None));
    instructions.emit(InstructionNode::new(Instruction::Set(7), Some(3)));
    let backward =
        instructions.emit(InstructionNode::new(Instruction::JumpZero(Target::Unresolved), None));
    instructions.emit(InstructionNode::new(Instruction::Halt, None));

    instructions.patch(forward, 3)?;
    instructions.patch(backward, 1)?;

    assert_eq!(instructions[forward].instruction, Instruction::Jump(Target::Offset(3)));
    assert_eq!(instructions[backward].instruction, Instruction::JumpZero(Target::Offset(-1)));
    assert_eq!(instructions.first_unresolved(), None);

    Ok(())
}

#[test]
fn patching_a_non_jump_is_rejected() {
    let mut instructions = Instructions::default();
    instructions.emit(InstructionNode::new(Instruction::Halt, None));

    assert!(matches!(instructions.patch(0, 0), Err(Error::NotAJump(0))));
    assert!(matches!(instructions.patch(5, 0), Err(Error::NotAJump(5))));
}

#[test]
fn listing_refuses_unresolved_jumps() {
    let mut instructions = Instructions::default();
    instructions.emit(InstructionNode::new(Instruction::Set(1), None));
    instructions.emit(InstructionNode::new(Instruction::JumpPositive(Target::Unresolved), None));

    let mut writer = BufWriter::new(Vec::new());

    assert!(matches!(instructions.write(&mut writer), Err(Error::UnresolvedJump(1))));
}

#[test]
fn listing_includes_debug_comments() -> anyhow::Result<()> {
    let mut instructions = Instructions::default();
    let mut store = InstructionNode::new(Instruction::Store(3), Some(1));
    store.comment = Some("a".into());
    instructions.emit(InstructionNode::new(Instruction::Get(0), Some(1)));
    instructions.emit(store);
    instructions.emit(InstructionNode::new(Instruction::LoadIndirect(4), Some(2)));
    instructions.emit(InstructionNode::new(Instruction::Halt, None));

    let mut writer = BufWriter::new(Vec::new());
    instructions.write(&mut writer)?;
    let output = String::from_utf8(writer.into_inner()?)?;

    assert_eq!(
        output,
        indoc! {"
            GET 0
            STORE 3 #a
            LOADI 4
            HALT
        "}
    );
    assert_eq!(instructions.source_map().get(&2), Some(&2));
    assert_eq!(instructions.source_map().get(&3), None);

    Ok(())
}

#[test]
fn parse_listing_skips_comments_and_blank_lines() -> anyhow::Result<()> {
    let program = parse_listing(indoc! {"
        # prologue
        SET -12
        STOREI 2 #through the scratch cell

        JNEG -3
        HALF
        RTRN 9
        HALT
    "})?;

    assert_eq!(
        program,
        vec![
            Instruction::Set(-12),
            Instruction::StoreIndirect(2),
            Instruction::JumpNegative(Target::Offset(-3)),
            Instruction::Half,
            Instruction::Return(9),
            Instruction::Halt,
        ]
    );

    Ok(())
}

#[test]
fn parse_listing_reports_line_numbers() {
    let result = parse_listing("SET 1\nLOAD\nHALT\n");
    assert!(matches!(result, Err(Error::Parse(2, _))));

    let result = parse_listing("HALT 3");
    assert!(matches!(result, Err(Error::Parse(1, _))));

    let result = parse_listing("MUL 3");
    assert!(matches!(result, Err(Error::Parse(1, _))));
}
