/*!

  The VM uses a 32 bit word size. Code is a vector of words: every instruction is one
  instruction word followed by its operand words. The instruction word packs the opcode and
  the shapes of (up to) two operands:

    [OpCode:8][Shape 2:8][Shape 1:8][Reserved:8]

  Bits 8 through 23 taken together are the dispatch key. The first operand's shape sits
  above the second's, so `u1v1` (uniform float with varying float) and `v1u1` are different
  keys. A shape byte is a storage flag (0x10 uniform, 0x20 varying) ored with an element
  count of 1 to 4. Instructions that only need one shape leave the high shape byte zero.

  Operand words are either `Address`es, absolute code offsets (jumps), or small immediate
  values (`call`'s function id and argument count, `convert`'s target type). The number of
  operand words is fixed per opcode except for `call`, whose layout is

    [Call][Function][Result][Argument Count][Argument]...

  The opcode and the dispatch key together select one specialized kernel, so the cost of
  choosing a kernel is paid once per instruction per grid rather than once per shading point.
  Only the code generator (or the assembler in `assembly`) emits instructions, and it only
  emits key combinations that are valid for the opcode; the machine treats anything else as
  a broken invariant rather than a user error.

*/

mod assembly;
mod binary;
mod instruction;
mod shape;

pub use assembly::{assemble, disassemble};
pub use binary::{encode_instruction, try_decode_instruction, instruction_size, Word,
                 OPCODE_MASK, KEY_SHIFT};
pub use instruction::{Instruction, Opcode};
pub use shape::{DispatchKey, Shape, Width};
