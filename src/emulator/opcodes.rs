//! Implemented operations for the LC-3.
//!
//! Every handler is self-contained: it reads its operand fields, mutates
//! registers or memory and updates the condition flags if and only if it
//! wrote a general register. All address arithmetic wraps modulo the 16-bit
//! address space.
use crate::emulator::instruction::Instruction;
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;

/// Operation selector in bits 15-12 of every instruction word.
///
/// `Rti` and `Reserved` have no handler, executing them faults the machine.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enumn::N)]
pub enum Opcode {
    Br = 0,
    Add = 1,
    Ld = 2,
    St = 3,
    Jsr = 4,
    And = 5,
    Ldr = 6,
    Str = 7,
    Rti = 8,
    Not = 9,
    Ldi = 10,
    Sti = 11,
    Jmp = 12,
    Reserved = 13,
    Lea = 14,
    Trap = 15,
}

/// ADD: Mathematical addition in 2 variants
/// - DR is set with result of SR 1 + SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn add(i: Instruction, r: &mut Registers) {
    let operand = if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2_number())
    };
    r.set(i.dr_number(), r.get(i.sr1_number()).wrapping_add(operand));
    r.update_condition(i.dr_number());
}

/// AND: bit-wise AND in 2 variants
/// - DR is set with result of SR 1 AND SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(i: Instruction, r: &mut Registers) {
    let operand = if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2_number())
    };
    r.set(i.dr_number(), r.get(i.sr1_number()) & operand);
    r.update_condition(i.dr_number());
}

/// NOT: bit-wise complement of the value in SR 1
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR | SR1 | 11111 |
///  --------------------------
/// ```
pub fn not(i: Instruction, r: &mut Registers) {
    r.set(i.dr_number(), !r.get(i.sr1_number()));
    r.update_condition(i.dr_number());
}

/// BR: Conditional Branch
/// Adds the sign extended offset to PC if the current [`ConditionFlag`] is
/// contained in the `nzp` mask. A mask of zero never branches.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
/// [`ConditionFlag`]: crate::hardware::registers::ConditionFlag
pub fn br(i: Instruction, r: &mut Registers) {
    if i.condition_mask() & r.condition().as_mask() != 0 {
        r.set_pc(address_by_pc_offset(i, r));
    }
}

/// JSR: Jump to Sub-Routine.
/// Two variants:
/// - JSR to `PCOffset11`
/// ```text
///  15__12__11_10_________0
/// | 0100 | 1 | PCOffset11 |
///  -----------------------
/// ```
/// - JSRR: JSR to location in `BaseR`
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// The former PC is saved in R7.
pub fn jsr(i: Instruction, r: &mut Registers) {
    let return_address = r.pc();
    r.set_pc(if i.is_long_jump() {
        r.pc().wrapping_add(i.offset(11))
    } else {
        r.get(i.base_register_number())
    });
    r.set(7, return_address);
}

/// JMP or RET operation.
/// - JMP sets the PC to the value of register `BaseR`
/// ```text
///  15__12__11_9___8_6____5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// - RET same as JMP, but special case for returning from JSR where former PC is saved in R7.
/// ```text
///  15__12__11_9__8_6___5____0_
/// | 1100 | 000 | 111 | 000000 |
///  ---------------------------
/// ```
pub fn jmp_or_ret(i: Instruction, r: &mut Registers) {
    r.set_pc(r.get(i.base_register_number()));
}

/// LD: Loads content of memory address of PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let value = memory.read(address_by_pc_offset(i, r));
    r.set(i.dr_number(), value);
    r.update_condition(i.dr_number());
}

/// LDI: Load indirect.
/// Calculates memory address of PC + sign extended offset and reads another address from there,
/// the content of the memory at that indirectly loaded address is put into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ldi(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let value_address = memory.read(address_by_pc_offset(i, r));
    let value = memory.read(value_address);
    r.set(i.dr_number(), value);
    r.update_condition(i.dr_number());
}

/// LDR: Load address from base register and adds sign extended offset to load the memory content
/// from there into DR.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let value = memory.read(address_by_base_offset(i, r));
    r.set(i.dr_number(), value);
    r.update_condition(i.dr_number());
}

/// LEA: Load Effective Address loads PC + sign extended offset into DR, no memory access.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(i: Instruction, r: &mut Registers) {
    r.set(i.dr_number(), address_by_pc_offset(i, r));
    r.update_condition(i.dr_number());
}

/// ST: Store. The contents of the SR are written to memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(i: Instruction, r: &Registers, memory: &mut Memory) {
    memory.write(address_by_pc_offset(i, r), r.get(i.dr_number()));
}

/// STI: Store Indirect. The contents of the SR are written to the address which is loaded from
/// memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(i: Instruction, r: &Registers, memory: &mut Memory) {
    let store_address = memory.read(address_by_pc_offset(i, r));
    memory.write(store_address, r.get(i.dr_number()));
}

/// STR: Store contents of SR to memory address of base register plus sign extended offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(i: Instruction, r: &Registers, memory: &mut Memory) {
    memory.write(address_by_base_offset(i, r), r.get(i.dr_number()));
}

fn address_by_pc_offset(i: Instruction, r: &Registers) -> u16 {
    r.pc().wrapping_add(i.offset(9))
}
fn address_by_base_offset(i: Instruction, r: &Registers) -> u16 {
    r.get(i.base_register_number()).wrapping_add(i.offset(6))
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use super::not;
    use crate::emulator::test_helpers::create_memory;
    use crate::hardware::registers::ConditionFlag;
    use crate::numbers::twos_complement_to_decimal;
    use googletest::prelude::*;

    #[gtest]
    fn test_opcode_add() {
        let mut regs = Registers::new();
        regs.set(0, 22);
        regs.set(1, 128);
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: 128 => R2: 150
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        // Add: DR: 3, SR1: 2: 150, Immediate: true, imm5: 14 => R3: 164
        add(0b0001_011_010_1_01110.into(), &mut regs);
        expect_that!(regs.get(0), eq(22));
        expect_that!(regs.get(1), eq(128));
        expect_that!(regs.get(2), eq(150));
        expect_that!(regs.get(3), eq(164));
        expect_that!(regs.condition(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    fn test_opcode_add_negative_immediate() {
        let mut regs = Registers::new();
        regs.set(1, 3);
        // Add: DR: 0, SR1: 1: 3, Immediate: true, imm5: 0b11110 = -2 => R0: 1
        add(0b0001_000_001_1_11110.into(), &mut regs);
        expect_that!(regs.get(0), eq(1));
        expect_that!(regs.condition(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    fn test_opcode_add_wraps_into_negative() {
        let mut regs = Registers::new();
        regs.set(0, 0x7FFF); // largest positive number in 2's complement
        regs.set(1, 1);
        // Add: DR: 2, SR1: 0, Immediate: false, SR2: 1 => R2: 0x8000
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(0x8000));
        expect_that!(twos_complement_to_decimal(regs.get(2)), eq(i16::MIN));
        expect_that!(regs.condition(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    fn test_opcode_add_result_zero() {
        let mut regs = Registers::new();
        regs.set(0, 0x7FFF);
        regs.set(1, !0x7FFF + 1);
        regs.set(2, 1); // to be sure opcode was executed
        // Add: DR: 2, SR1: 0, Immediate: false, SR2: 1 => R2: 0
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(0));
        expect_that!(regs.condition(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    fn test_opcode_and() {
        let mut regs = Registers::new();
        regs.set(0, 0b1101_1001_0111_0101);
        regs.set(1, 0b0100_1010_0010_1001);
        // And: DR: 2, SR1: 0, Immediate: false, SR2: 1
        and(0b0101_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(0b0100_1000_0010_0001));
        expect_that!(regs.condition(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    fn test_opcode_and_immediate() {
        let mut regs = Registers::new();
        regs.set(0, 0b1101_1001_0111_0101);
        // And: DR: 2, SR1: 0, Immediate: true, imm5: 0b10101
        // Immediate sign extended: 0b1111_1111_1111_0101
        and(0b0101_010_000_1_10101.into(), &mut regs);
        expect_that!(regs.get(2), eq(0b1101_1001_0111_0101));
        expect_that!(regs.condition(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    fn test_opcode_and_immediate_zero_clears() {
        let mut regs = Registers::new();
        regs.set(5, 0xFFFF);
        // And: DR: 5, SR1: 5, Immediate: true, imm5: 0
        and(0b0101_101_101_1_00000.into(), &mut regs);
        expect_that!(regs.get(5), eq(0));
        expect_that!(regs.condition(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    fn test_opcode_not() {
        let mut regs = Registers::new();
        regs.set(0, 0x7FFF);
        // Not: DR: 1, SR1: 0 => R1: 0x8000
        not(0b1001_001_000_111111.into(), &mut regs);
        expect_that!(regs.get(0), eq(0x7FFF));
        expect_that!(regs.get(1), eq(0x8000));
        expect_that!(regs.condition(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    fn test_opcode_br_taken_on_matching_flag() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        regs.set(0, 0);
        regs.update_condition(0); // flags: Zero
        // BR: nzp: 010, PCoffset9: 0x10
        br(0b0000_010_000010000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3011));
    }
    #[gtest]
    fn test_opcode_br_not_taken_on_other_flag() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        regs.set(0, 1);
        regs.update_condition(0); // flags: Pos
        // BR: nzp: 010, PCoffset9: 0x10
        br(0b0000_010_000010000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3001));
    }
    #[gtest]
    fn test_opcode_br_never_taken_on_empty_mask() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        // BR: nzp: 000, PCoffset9: 0x10
        br(0b0000_000_000010000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3001));
    }
    #[gtest]
    fn test_opcode_br_backwards() {
        let mut regs = Registers::new();
        regs.set_pc(0x3005);
        regs.set(0, 0x8000);
        regs.update_condition(0); // flags: Neg
        // BR: nzp: 100, PCoffset9: -4
        br(0b0000_100_111111100.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3001));
    }
    #[gtest]
    fn test_opcode_jsr_long_backwards() {
        let mut regs = Registers::new();
        regs.set_pc(0x3000);
        // JSR: PCoffset11: -1
        jsr(0b0100_1_11111111111.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x2FFF));
        expect_that!(regs.get(7), eq(0x3000));
    }
    #[gtest]
    fn test_opcode_jsr_long_forwards() {
        let mut regs = Registers::new();
        regs.set_pc(0x3099);
        // JSR: PCoffset11: 0x1A1
        jsr(0b0100_1_00110100001.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x323A));
        expect_that!(regs.get(7), eq(0x3099));
    }
    #[gtest]
    fn test_opcode_jsrr() {
        let mut regs = Registers::new();
        regs.set_pc(0x3100);
        regs.set(6, 0x3456);
        // JSRR: BaseR: 6
        jsr(0b0100_000_110_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3456));
        expect_that!(regs.get(7), eq(0x3100));
    }
    #[gtest]
    fn test_opcode_jmp() {
        let mut regs = Registers::new();
        regs.set_pc(0x3020);
        regs.set(1, 0x3022);
        // JMP: BaseR: 1
        jmp_or_ret(0b1100_000_001_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3022));
    }
    #[gtest]
    fn test_opcode_ret() {
        let mut regs = Registers::new();
        regs.set_pc(0x3050);
        regs.set(7, 0x3023);
        // RET = JMP BaseR: 7
        jmp_or_ret(0b1100_000_111_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3023));
    }
    #[gtest]
    fn test_opcode_ld() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        memory.write(0x3010, 4711);
        regs.set_pc(0x3001);
        // LD: DR: 4, PCoffset9: 0xF
        ld(0b0010_100_000001111.into(), &mut regs, &mut memory);
        expect_that!(regs.get(4), eq(4711));
        expect_that!(regs.condition(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    fn test_opcode_ld_negative_offset() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        memory.write(0x2FFF, 0xFFF6); // -10
        regs.set_pc(0x3001);
        // LD: DR: 4, PCoffset9: -2
        ld(0b0010_100_111111110.into(), &mut regs, &mut memory);
        expect_that!(regs.get(4), eq(0xFFF6));
        expect_that!(regs.condition(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    fn test_opcode_ldi() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        memory.write(0x3005, 0x3103); // address of the value
        memory.write(0x3103, 0xFFF6); // -10
        regs.set_pc(0x3001);
        // LDI: DR: 1, PCoffset9: 4
        ldi(0b1010_001_000000100.into(), &mut regs, &mut memory);
        expect_that!(regs.get(1), eq(0xFFF6));
        expect_that!(regs.condition(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    fn test_opcode_ldr() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        memory.write(0x3005, 0xFFF6); // -10
        regs.set(6, 0x3025);
        // LDR: DR: 2, BaseR: 6, offset6: -32
        ldr(0b0110_010_110_100000.into(), &mut regs, &mut memory);
        expect_that!(regs.get(2), eq(0xFFF6));
        expect_that!(regs.condition(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    fn test_opcode_lea() {
        let mut regs = Registers::new();
        regs.set_pc(0x3045);
        // LEA: DR: 3, PCoffset9: 0x55
        lea(0b1110_011_0_0101_0101.into(), &mut regs);
        expect_that!(regs.get(3), eq(0x3045 + 0b0_0101_0101));
        expect_that!(regs.condition(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    fn test_opcode_st() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        regs.set(5, 4760);
        regs.set_pc(0x3065);
        // ST: SR: 5, PCoffset9: -95
        st(0b0011_101_110100001.into(), &regs, &mut memory);
        expect_that!(memory.read(0x3006), eq(4760));
    }
    #[gtest]
    fn test_opcode_sti() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        memory.write(0x300A, 0x3006);
        regs.set(7, 1234);
        regs.set_pc(0x3067);
        // STI: SR: 7, PCoffset9: -93
        sti(0b1011_111_110100011.into(), &regs, &mut memory);
        expect_that!(memory.read(0x3006), eq(1234));
    }
    #[gtest]
    fn test_opcode_str() {
        let mut regs = Registers::new();
        let mut memory = create_memory("");
        regs.set(2, 2345);
        regs.set(6, 0x3005);
        // STR: SR: 2, BaseR: 6, offset6: 1
        str(0b0111_010_110_000001.into(), &regs, &mut memory);
        expect_that!(memory.read(0x3006), eq(2345));
    }
    #[gtest]
    fn test_address_arithmetic_wraps() {
        let mut regs = Registers::new();
        regs.set_pc(0xFFFF);
        // LEA: DR: 0, PCoffset9: 2 => wraps to 0x0001
        lea(0b1110_000_000000010.into(), &mut regs);
        expect_that!(regs.get(0), eq(0x0001));
    }
}
