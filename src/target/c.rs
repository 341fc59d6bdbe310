//! Objetivo C.
//!
//! La estructura de bloques de C coincide con la de la fuente, así que
//! las declaraciones se emiten en su lugar y sin renombrar, salvo por
//! los nombres que son palabras clave de C.

use crate::{
    codegen::indent,
    ir::{BinOp, Block, Expr, Factor, Function, Item, Program, Type},
};

use std::fmt::{self, Display};

const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "typedef", "union", "unsigned", "void", "volatile", "while",
];

pub struct Emitter {
    first: bool,
}

impl super::Emitter for Emitter {
    fn new(_program: &Program) -> Self {
        Emitter { first: true }
    }

    fn prologue(&mut self, _fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }

    fn function(&mut self, fmt: &mut fmt::Formatter<'_>, function: &Function) -> fmt::Result {
        self.separate(fmt)?;

        let name = Name(function.name.as_ref());
        writeln!(fmt, "{} {}(void)", TypeName(function.returns), name)?;
        body(fmt, &function.body)
    }

    fn main(&mut self, fmt: &mut fmt::Formatter<'_>, main: &Block) -> fmt::Result {
        self.separate(fmt)?;

        writeln!(fmt, "int main(void)")?;
        body(fmt, main)
    }
}

impl Emitter {
    /// Las funciones se separan por una línea en blanco.
    fn separate(&mut self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !std::mem::replace(&mut self.first, false) {
            writeln!(fmt)?;
        }

        Ok(())
    }
}

fn body(fmt: &mut fmt::Formatter<'_>, block: &Block) -> fmt::Result {
    writeln!(fmt, "{{")?;
    items(fmt, block, 1)?;
    writeln!(fmt, "}}")
}

fn items(fmt: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    for item in &block.items {
        indent(fmt, depth)?;

        match item {
            Item::Declaration(declaration) => {
                let variable = &declaration.variable;
                write!(fmt, "{} {}", TypeName(variable.typ), Name(variable.name.as_ref()))?;

                for size in &declaration.dimensions {
                    write!(fmt, "[{}]", Integer(size))?;
                }

                writeln!(fmt, ";")?;
            }

            Item::Assignment(target, value) => {
                write!(fmt, "{} = ", Name(target.name.as_ref()))?;
                expr(fmt, value)?;
                writeln!(fmt, ";")?;
            }

            Item::Block(inner) => {
                writeln!(fmt, "{{")?;
                items(fmt, inner, depth + 1)?;
                indent(fmt, depth)?;
                writeln!(fmt, "}}")?;
            }
        }
    }

    Ok(())
}

fn expr(fmt: &mut fmt::Formatter<'_>, value: &Expr) -> fmt::Result {
    for (op, factor) in value.factors() {
        if let Some(op) = op {
            let op = match op {
                BinOp::Add => "+",
                BinOp::Sub => "-",
                BinOp::Mul => "*",
                BinOp::Div | BinOp::IntegerDiv => "/",
            };

            write!(fmt, " {} ", op)?;
        }

        match factor {
            Factor::Integer(lexeme) => write!(fmt, "{}", Integer(lexeme))?,
            Factor::Real(lexeme) => fmt.write_str(lexeme)?,
            Factor::Read(variable) => write!(fmt, "{}", Name(variable.name.as_ref()))?,
        }
    }

    Ok(())
}

struct TypeName(Type);

impl Display for TypeName {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Type::Int => fmt.write_str("int"),
            Type::Real => fmt.write_str("double"),
        }
    }
}

/// Identificador de la fuente, con `_` al final si es palabra clave de C.
///
/// Los identificadores de la fuente no contienen `_`, así que esto
/// no puede colisionar con otro nombre.
struct Name<'a>(&'a str);

impl Display for Name<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.0)?;
        if KEYWORDS.contains(&self.0) {
            fmt.write_str("_")?;
        }

        Ok(())
    }
}

/// Literal entero sin ceros a la izquierda, que C leería como octal.
struct Integer<'a>(&'a str);

impl Display for Integer<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.trim_start_matches('0') {
            "" => fmt.write_str("0"),
            digits => fmt.write_str(digits),
        }
    }
}
