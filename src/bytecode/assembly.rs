/*!
  The human readable textual form of bytecode is called assembly. This module assembles text
  into a `Shader` and disassembles a `Shader` back into text, leveraging the `strum` derives of
  the instruction related enums for mnemonics.

  Assembly is line oriented. A `;` starts a comment. Each line holds an optional label
  (`name:`) and then a directive or an instruction:

  ```text
  .shader surface tint                       ; kind and name of the shader
  .global varying color Ci                   ; global | parameter | variable
  .parameter uniform float Kd 0.5            ; optional default
  .constant float 0, 1, 2                    ; appends #0, #1, #2
  .constant string "world"

          greater.v1u1 %0, @x, #0            ; opcode.key operands...
          generate_mask %0
          jump_empty done                    ; jump targets are labels
          call normalize %1, @N              ; function, result, arguments...
          convert.v3v1 %2, @x, color         ; result, operand, type
  done:   clear_mask
  ```

  Operands are `#i` constants, `%i` temporaries, and `@name` or `@i` symbols. Operands may be
  separated by commas or spaces.
*/

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::str::FromStr;

use glam::{Mat4, Vec3};
use num_enum::TryFromPrimitive;
use nom::{
  IResult,
  branch::alt,
  bytes::complete::{take_while, take_while1},
  character::complete::{
    alphanumeric1,
    char as one_char,
    digit1,
    space0,
    space1
  },
  combinator::{all_consuming, map, map_res, opt, recognize},
  multi::separated_list,
  number::complete::recognize_float,
  sequence::{
    delimited,
    pair,
    preceded,
    terminated,
    tuple
  },
};

use crate::address::{Address, AddressNumberType};
use crate::bytecode::{
  encode_instruction,
  instruction_size,
  try_decode_instruction,
  DispatchKey,
  Instruction,
  Opcode,
  Word
};
use crate::error::AssemblyError;
use crate::kernels::Function;
use crate::shader::{Shader, ShaderKind};
use crate::symboltable::{Symbol, SymbolKind};
use crate::types::{Storage, ValueType};
use crate::value::Value;

// region Syntax

#[derive(Clone, Debug, PartialEq)]
enum Operand<'a> {
  Constant(AddressNumberType),
  Temporary(AddressNumberType),
  SymbolIndex(AddressNumberType),
  SymbolName(&'a str),
  /// A label, function, or type name.
  Name(&'a str),
}

#[derive(Clone, Debug, PartialEq)]
enum Token<'a> {
  Word(&'a str),
  Number(f32),
  Text(&'a str),
}

#[derive(Clone, Debug, PartialEq)]
enum Statement<'a> {
  Directive {
    name      : &'a str,
    arguments : Vec<Token<'a>>,
  },
  Operation {
    mnemonic : &'a str,
    key      : Option<&'a str>,
    operands : Vec<Operand<'a>>,
  },
}

#[derive(Clone, Debug, PartialEq)]
struct Line<'a> {
  label     : Option<&'a str>,
  statement : Option<Statement<'a>>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(pair(
    take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
    take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
  ))(input)
}

fn index(input: &str) -> IResult<&str, AddressNumberType> {
  map_res(digit1, |text: &str| text.parse::<AddressNumberType>())(input)
}

fn separator(input: &str) -> IResult<&str, &str> {
  alt((delimited(space0, recognize(one_char(',')), space0), space1))(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
  alt((
    map(preceded(one_char('#'), index), Operand::Constant),
    map(preceded(one_char('%'), index), Operand::Temporary),
    map(preceded(one_char('@'), index), Operand::SymbolIndex),
    map(preceded(one_char('@'), identifier), Operand::SymbolName),
    map(identifier, Operand::Name),
  ))(input)
}

fn token(input: &str) -> IResult<&str, Token> {
  alt((
    map(delimited(one_char('"'), take_while(|c: char| c != '"'), one_char('"')), Token::Text),
    map(map_res(recognize_float, |text: &str| text.parse::<f32>()), Token::Number),
    map(identifier, Token::Word),
  ))(input)
}

fn directive(input: &str) -> IResult<&str, Statement> {
  map(
    pair(
      preceded(one_char('.'), identifier),
      opt(preceded(space1, separated_list(separator, token))),
    ),
    |(name, arguments)| Statement::Directive { name, arguments: arguments.unwrap_or_default() },
  )(input)
}

fn operation(input: &str) -> IResult<&str, Statement> {
  map(
    tuple((
      identifier,
      opt(preceded(one_char('.'), alphanumeric1)),
      opt(preceded(space1, separated_list(separator, operand))),
    )),
    |(mnemonic, key, operands)| Statement::Operation {
      mnemonic,
      key,
      operands: operands.unwrap_or_default(),
    },
  )(input)
}

fn label(input: &str) -> IResult<&str, &str> {
  terminated(identifier, tuple((space0, one_char(':'), space0)))(input)
}

fn line(input: &str) -> IResult<&str, Line> {
  all_consuming(map(
    delimited(space0, pair(opt(label), opt(alt((directive, operation)))), space0),
    |(label, statement)| Line { label, statement },
  ))(input)
}

/// The text of a line before any comment. A `;` inside a string literal is not a comment.
fn strip_comment(text: &str) -> &str {
  let mut quoted = false;
  for (i, c) in text.char_indices() {
    match c {
      '"'            => quoted = !quoted,
      ';' if !quoted => return &text[..i],
      _              => {}
    }
  }
  text
}

// endregion

// region Assembly

/// A uniform value of type `ty` from its literal components.
fn value_from(line: usize, ty: ValueType, numbers: &[f32]) -> Result<Value, AssemblyError> {
  match (ty, numbers.len()) {
    (ValueType::Float, 1)              => Ok(Value::uniform_float(numbers[0])),
    (ty, 1) if ty.is_triple()          => Ok(Value::uniform_vec3(ty, Vec3::splat(numbers[0]))),
    (ty, 3) if ty.is_triple()          => Ok(Value::uniform_vec3(ty, Vec3::from_slice(numbers))),
    (ValueType::Matrix, 16)            => {
      let mut columns = [0.0f32; 16];
      columns.copy_from_slice(numbers);
      Ok(Value::uniform_matrix(Mat4::from_cols_array(&columns)))
    }
    (ty, count) => Err(AssemblyError::InvalidDirective {
      line,
      message: format!("a {} cannot be made from {} numbers", ty, count),
    }),
  }
}

fn numbers(line: usize, tokens: &[Token]) -> Result<Vec<f32>, AssemblyError> {
  tokens.iter()
        .map(|token| match token {
          Token::Number(number) => Ok(*number),
          Token::Word(text) | Token::Text(text) => Err(AssemblyError::InvalidDirective {
            line,
            message: format!("expected a number but found `{}`", text),
          }),
        })
        .collect()
}

fn word<'a>(line: usize, tokens: &[Token<'a>], n: usize, what: &str) -> Result<&'a str, AssemblyError> {
  match tokens.get(n) {
    Some(Token::Word(text)) => Ok(*text),
    _ => Err(AssemblyError::InvalidDirective { line, message: format!("expected {}", what) }),
  }
}

fn parse_word<T: FromStr>(line: usize, text: &str, what: &str) -> Result<T, AssemblyError> {
  text.parse::<T>().map_err(|_| AssemblyError::InvalidDirective {
    line,
    message: format!("`{}` is not {}", text, what),
  })
}

struct Assembler<'a> {
  shader      : Shader,
  labels      : HashMap<&'a str, usize>,
  /// Jump operands waiting for their label: (code offset, label, line).
  fixups      : Vec<(usize, &'a str, usize)>,
  temporaries : usize,
}

impl<'a> Assembler<'a> {

  fn new() -> Assembler<'a> {
    Assembler {
      shader      : Shader::new(ShaderKind::Surface, "main"),
      labels      : HashMap::new(),
      fixups      : Vec::new(),
      temporaries : 0,
    }
  }

  fn label(&mut self, line: usize, name: &'a str) -> Result<(), AssemblyError> {
    match self.labels.insert(name, self.shader.code.len()) {
      None    => Ok(()),
      Some(_) => Err(AssemblyError::Redefinition { line, name: name.to_string() }),
    }
  }

  fn directive(&mut self, line: usize, name: &str, arguments: &[Token<'a>])
    -> Result<(), AssemblyError>
  {
    match name {

      "shader" => {
        self.shader.kind = parse_word(line, word(line, arguments, 0, "a shader kind")?, "a shader kind")?;
        self.shader.name = word(line, arguments, 1, "a shader name")?.to_string();
      }

      "global" | "parameter" | "variable" => {
        let kind = match name {
          "global"    => SymbolKind::Global,
          "parameter" => SymbolKind::Parameter,
          _           => SymbolKind::Variable,
        };
        let storage: Storage = parse_word(line, word(line, arguments, 0, "a storage class")?, "a storage class")?;
        let ty: ValueType = parse_word(line, word(line, arguments, 1, "a type")?, "a type")?;
        let symbol_name = word(line, arguments, 2, "a symbol name")?;

        let mut symbol = Symbol::new(symbol_name, kind, ty, storage);
        let defaults = &arguments[3..];
        if !defaults.is_empty() {
          let default = match (ty, defaults) {
            (ValueType::String, [Token::Text(text)]) => Value::uniform_string(text),
            _ => value_from(line, ty, &numbers(line, defaults)?)?,
          };
          symbol = symbol.with_default(default);
        }
        if self.shader.symbols.insert(symbol).is_err() {
          return Err(AssemblyError::Redefinition { line, name: symbol_name.to_string() });
        }
      }

      "constant" => {
        let ty: ValueType = parse_word(line, word(line, arguments, 0, "a type")?, "a type")?;
        let literals = &arguments[1..];
        if ty == ValueType::String {
          for literal in literals {
            match literal {
              Token::Text(text) => self.shader.constants.push(Value::uniform_string(text)),
              _ => return Err(AssemblyError::InvalidDirective {
                line,
                message: "string constants must be quoted".to_string(),
              }),
            }
          }
          return Ok(());
        }

        let numbers = numbers(line, literals)?;
        let components = ty.components();
        if numbers.is_empty() || numbers.len() % components != 0 {
          return Err(AssemblyError::InvalidDirective {
            line,
            message: format!("{} numbers do not make whole {} constants", numbers.len(), ty),
          });
        }
        for element in numbers.chunks(components) {
          self.shader.constants.push(value_from(line, ty, element)?);
        }
      }

      _ => {
        return Err(AssemblyError::InvalidDirective {
          line,
          message: format!("unknown directive `.{}`", name),
        });
      }

    }
    Ok(())
  }

  fn address(&mut self, line: usize, operand: &Operand) -> Result<Address, AssemblyError> {
    match operand {
      Operand::Constant(i) if (*i as usize) < self.shader.constants.len() => Ok(Address::Constant(*i)),
      Operand::Constant(i) => Err(AssemblyError::UnknownSymbol { line, name: format!("#{}", i) }),
      Operand::Temporary(i) => {
        self.temporaries = self.temporaries.max(*i as usize + 1);
        Ok(Address::Temporary(*i))
      }
      Operand::SymbolIndex(i) if (*i as usize) < self.shader.symbols.len() => Ok(Address::Symbol(*i)),
      Operand::SymbolIndex(i) => Err(AssemblyError::UnknownSymbol { line, name: format!("@{}", i) }),
      Operand::SymbolName(name) => match self.shader.symbols.get_slot(name) {
        Some(slot) => Ok(Address::Symbol(slot as AddressNumberType)),
        None       => Err(AssemblyError::UnknownSymbol { line, name: name.to_string() }),
      },
      Operand::Name(name) => Err(AssemblyError::UnexpectedOperand {
        line,
        expected : "an address",
        found    : name.to_string(),
      }),
    }
  }

  fn name(line: usize, operand: &Operand<'a>, expected: &'static str) -> Result<&'a str, AssemblyError> {
    match operand {
      Operand::Name(name) => Ok(*name),
      other => Err(AssemblyError::UnexpectedOperand { line, expected, found: format!("{:?}", other) }),
    }
  }

  fn key(line: usize, opcode: Opcode, key: Option<&str>) -> Result<DispatchKey, AssemblyError> {
    let text = match (opcode.requires_key(), key) {
      (false, None)       => return Ok(DispatchKey::NONE),
      (false, Some(text)) => return Err(AssemblyError::InvalidKey { line, text: text.to_string() }),
      (true, None)        => return Err(AssemblyError::MissingKey { line, operation: opcode }),
      (true, Some(text))  => text,
    };
    let invalid = || AssemblyError::InvalidKey { line, text: text.to_string() };
    let key: DispatchKey = text.parse().map_err(|_| invalid())?;
    match (opcode.has_single_shape(), key.shape().is_some()) {
      (true, true) | (false, false) => Ok(key),
      _                             => Err(invalid()),
    }
  }

  fn operation(&mut self, line: usize, mnemonic: &str, key: Option<&str>, operands: &[Operand<'a>])
    -> Result<(), AssemblyError>
  {
    let opcode = Opcode::from_str(mnemonic)
      .map_err(|_| AssemblyError::NotAnOperation { line, name: mnemonic.to_string() })?;
    let key = Assembler::key(line, opcode, key)?;

    let expected = match opcode.operand_count() {
      Some(count) => count,
      None        => operands.len().max(2),
    };
    if operands.len() != expected {
      return Err(AssemblyError::WrongArity { line, operation: opcode, expected, actual: operands.len() });
    }

    self.shader.code.push(encode_instruction(Instruction::new(opcode, key)));
    match opcode {

      _ if opcode.is_jump() => {
        let target = Assembler::name(line, &operands[0], "a label")?;
        self.fixups.push((self.shader.code.len(), target, line));
        self.shader.code.push(0);
      }

      Opcode::Call => {
        let name = Assembler::name(line, &operands[0], "a function")?;
        let function = Function::from_str(name).map_err(|_| AssemblyError::UnexpectedOperand {
          line,
          expected : "a function",
          found    : name.to_string(),
        })?;
        let count = operands.len() - 2;
        let (least, most) = function.arity();
        if count < least || count > most {
          return Err(AssemblyError::WrongArity {
            line,
            operation : opcode,
            expected  : if count < least { least + 2 } else { most + 2 },
            actual    : operands.len(),
          });
        }
        let result = self.address(line, &operands[1])?;
        self.shader.code.push(function.code() as Word);
        self.shader.code.push(result.encode());
        self.shader.code.push(count as Word);
        for argument in &operands[2..] {
          let address = self.address(line, argument)?;
          self.shader.code.push(address.encode());
        }
      }

      Opcode::Convert => {
        for operand in &operands[..2] {
          let address = self.address(line, operand)?;
          self.shader.code.push(address.encode());
        }
        let name = Assembler::name(line, &operands[2], "a type")?;
        let ty = ValueType::from_str(name).map_err(|_| AssemblyError::UnexpectedOperand {
          line,
          expected : "a type",
          found    : name.to_string(),
        })?;
        self.shader.code.push(ty.code() as Word);
      }

      _ => {
        for operand in operands {
          let address = self.address(line, operand)?;
          self.shader.code.push(address.encode());
        }
      }

    }
    Ok(())
  }

  fn finish(mut self) -> Result<Shader, AssemblyError> {
    for (offset, label, line) in self.fixups.iter() {
      match self.labels.get(label) {
        Some(target) => self.shader.code[*offset] = *target as Word,
        None => return Err(AssemblyError::UnknownLabel { line: *line, name: label.to_string() }),
      }
    }
    self.shader.temporaries = self.temporaries;
    Ok(self.shader)
  }
}

/// Assembles `text` into a shader. Without a `.shader` directive the shader is a surface
/// shader named `main`.
pub fn assemble(text: &str) -> Result<Shader, AssemblyError> {
  let mut assembler = Assembler::new();

  for (n, source) in text.lines().enumerate() {
    let number = n + 1;
    let parsed = match line(strip_comment(source)) {
      Ok((_, parsed)) => parsed,
      Err(_e)         => {
        return Err(AssemblyError::Syntax { line: number, text: source.trim().to_string() });
      }
    };

    if let Some(name) = parsed.label {
      assembler.label(number, name)?;
    }
    match parsed.statement {
      Some(Statement::Directive { name, arguments }) => {
        assembler.directive(number, name, &arguments)?;
      }
      Some(Statement::Operation { mnemonic, key, operands }) => {
        assembler.operation(number, mnemonic, key, &operands)?;
      }
      None => {}
    }
  }

  assembler.finish()
}

// endregion

// region Disassembly

fn literal(value: &Value) -> String {
  match value.ty() {
    ValueType::String => format!("\"{}\"", value.string()),
    _ => value.floats()
              .iter()
              .map(f32::to_string)
              .collect::<Vec<String>>()
              .join(", "),
  }
}

/// Writes `shader` as assembly that assembles back to the same shader.
pub fn disassemble(shader: &Shader) -> String {
  let mut text = String::new();
  let code = &shader.code;

  // `write!` into a `String` cannot fail.
  let _ = writeln!(text, ".shader {} {}", shader.kind, shader.name);
  for symbol in shader.symbols.iter() {
    let kind = match symbol.kind {
      SymbolKind::Global    => "global",
      SymbolKind::Parameter => "parameter",
      SymbolKind::Variable  => "variable",
    };
    let _ = write!(text, ".{} {} {} {}", kind, symbol.storage, symbol.ty, symbol.name);
    if let Some(default) = &symbol.default {
      let _ = write!(text, " {}", literal(default));
    }
    text.push('\n');
  }
  for constant in shader.constants.iter() {
    let _ = writeln!(text, ".constant {} {}", constant.ty(), literal(constant));
  }

  // Decode once to find the jump targets, which become labels.
  let mut instructions = Vec::new();
  let mut ip = 0;
  while ip < code.len() {
    let instruction = match try_decode_instruction(code[ip]) {
      Ok(instruction) => instruction,
      Err(error) => {
        let _ = writeln!(text, "; {} at offset {}", error, ip);
        return text;
      }
    };
    instructions.push((ip, instruction));
    ip += instruction_size(code, ip, instruction.opcode);
  }
  let targets: Vec<usize> =
    instructions.iter()
                .filter(|(_, instruction)| instruction.opcode.is_jump())
                .map(|(ip, _)| code[ip + 1] as usize)
                .collect();

  let address = |word: Word| match Address::decode(word) {
    Some(Address::Symbol(i)) => match shader.symbols.get_name(i as usize) {
      Some(name) => format!("@{}", name),
      None       => format!("@{}", i),
    },
    Some(address) => format!("{}", address),
    None          => format!("{:#010x}", word),
  };

  for (ip, instruction) in instructions.iter() {
    let ip = *ip;
    if targets.contains(&ip) {
      let _ = writeln!(text, "L{}:", ip);
    }
    let operands: Vec<String> = match instruction.opcode {
      opcode if opcode.is_jump() => vec![format!("L{}", code[ip + 1])],
      Opcode::Call => {
        let function = Function::try_from_primitive(code[ip + 1] as u8)
          .map(|function| function.to_string())
          .unwrap_or_else(|_| format!("{}", code[ip + 1]));
        let count = code[ip + 3] as usize;
        let mut operands = vec![function, address(code[ip + 2])];
        operands.extend(code[ip + 4..ip + 4 + count].iter().map(|word| address(*word)));
        operands
      }
      Opcode::Convert => {
        let ty = ValueType::try_from_primitive(code[ip + 3] as u8)
          .map(|ty| ty.to_string())
          .unwrap_or_else(|_| format!("{}", code[ip + 3]));
        vec![address(code[ip + 1]), address(code[ip + 2]), ty]
      }
      opcode => {
        let count = opcode.operand_count().unwrap_or(0);
        code[ip + 1..ip + 1 + count].iter().map(|word| address(*word)).collect()
      }
    };
    match operands.is_empty() {
      true  => { let _ = writeln!(text, "  {}", instruction); }
      false => { let _ = writeln!(text, "  {} {}", instruction, operands.join(", ")); }
    }
  }
  // A jump may target the end of the code.
  if targets.contains(&code.len()) {
    let _ = writeln!(text, "L{}:", code.len());
  }

  text
}

// endregion


#[cfg(test)]
mod tests {
  use super::*;

  const IF_STATEMENT: &str = "
    .global varying float x
    .global varying float y
    .constant float 0, 1, 2

          greater.v1u1 %0, @x, #0       ; if ( x > 0 )
          generate_mask %0
          jump_empty end
          multiply.u1v1 %1, #2, @x      ;   y = 1 - 2 * x
          subtract.u1v1 %2, #1, %1
          assign.v1v1 @y, %2
    end:  clear_mask
  ";

  #[test]
  fn lines_parse_into_labels_and_statements() {
    let (_, parsed) = line("end:  clear_mask").unwrap();
    assert_eq!(parsed.label, Some("end"));
    assert_eq!(
      parsed.statement,
      Some(Statement::Operation { mnemonic: "clear_mask", key: None, operands: vec![] })
    );

    let (_, parsed) = line("add.v3u1 %1, @P #0").unwrap();
    assert_eq!(
      parsed.statement,
      Some(Statement::Operation {
        mnemonic : "add",
        key      : Some("v3u1"),
        operands : vec![Operand::Temporary(1), Operand::SymbolName("P"), Operand::Constant(0)],
      })
    );

    let (_, parsed) = line(".constant color 1, 0.5, -2").unwrap();
    assert_eq!(
      parsed.statement,
      Some(Statement::Directive {
        name      : "constant",
        arguments : vec![
          Token::Word("color"), Token::Number(1.0), Token::Number(0.5), Token::Number(-2.0)
        ],
      })
    );
  }

  #[test]
  fn comments_respect_strings() {
    assert_eq!(strip_comment("halt ; stop"), "halt ");
    assert_eq!(strip_comment(".constant string \"a;b\" ; c"), ".constant string \"a;b\" ");
  }

  #[test]
  fn assembles_an_if_statement() {
    let shader = assemble(IF_STATEMENT).unwrap();
    assert_eq!(shader.symbols.len(), 2);
    assert_eq!(shader.constants.len(), 3);
    assert_eq!(shader.temporaries, 3);

    let jump = 4 + 2;
    assert_eq!(try_decode_instruction(shader.code[jump]).unwrap().opcode, Opcode::JumpEmpty);
    let end = shader.code.len() - 1;
    assert_eq!(shader.code[jump + 1] as usize, end);
  }

  #[test]
  fn disassembly_assembles_to_the_same_code() {
    let shader = assemble(IF_STATEMENT).unwrap();
    let text = disassemble(&shader);
    assert!(text.contains("greater.v1u1 %0, @x, #0"));
    let again = assemble(&text).unwrap();
    assert_eq!(again.code, shader.code);
    assert_eq!(again.constants, shader.constants);
  }

  #[test]
  fn calls_and_conversions() {
    let shader = assemble("
      .global varying normal N
      .global varying float x
      .global varying color Ci
      call normalize %0, @N
      convert.v3v1 %1, @x, color
      assign.v3v3 @Ci, %1
    ").unwrap();
    assert_eq!(shader.code[1], Function::Normalize.code() as Word);
    assert_eq!(shader.code[3], 1);
    assert_eq!(shader.code[5 + 3], ValueType::Color.code() as Word);
    let text = disassemble(&shader);
    assert!(text.contains("call normalize, %0, @N"));
    assert!(text.contains("convert.v3v1 %1, @x, color"));
  }

  #[test]
  fn errors_name_their_line() {
    assert_eq!(
      assemble("halt\nfrobnicate %0").unwrap_err(),
      AssemblyError::NotAnOperation { line: 2, name: "frobnicate".to_string() }
    );
    assert_eq!(
      assemble("add %0, %1, %2").unwrap_err(),
      AssemblyError::MissingKey { line: 1, operation: Opcode::Add }
    );
    assert_eq!(
      assemble("negate.v1v1 %0, %1").unwrap_err(),
      AssemblyError::InvalidKey { line: 1, text: "v1v1".to_string() }
    );
    assert_eq!(
      assemble("jump nowhere").unwrap_err(),
      AssemblyError::UnknownLabel { line: 1, name: "nowhere".to_string() }
    );
    assert_eq!(
      assemble("assign.v1v1 @y, %0").unwrap_err(),
      AssemblyError::UnknownSymbol { line: 1, name: "y".to_string() }
    );
    assert!(matches!(
      assemble("clear_mask %0").unwrap_err(),
      AssemblyError::WrongArity { line: 1, expected: 0, actual: 1, .. }
    ));
    assert!(matches!(assemble("halt )").unwrap_err(), AssemblyError::Syntax { line: 1, .. }));
    assert!(matches!(
      assemble(".global varying float x\n.global uniform float x").unwrap_err(),
      AssemblyError::Redefinition { line: 2, .. }
    ));
  }

  #[test]
  fn defaults_and_constants_by_type() {
    let shader = assemble("
      .parameter uniform color tint 1 0.5 0
      .parameter uniform string space \"world\"
      .constant point 0 0 0 1 1 1
    ").unwrap();
    let tint = shader.symbols.lookup("tint").unwrap().default.clone().unwrap();
    assert_eq!(tint.vec3(0), Vec3::new(1.0, 0.5, 0.0));
    let space = shader.symbols.lookup("space").unwrap().default.clone().unwrap();
    assert_eq!(space.string(), "world");
    assert_eq!(shader.constants.len(), 2);
    assert_eq!(shader.constants[1].vec3(0), Vec3::ONE);
  }
}
