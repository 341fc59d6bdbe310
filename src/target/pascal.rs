//! Objetivo Pascal.
//!
//! Pascal no admite declaraciones dentro de bloques anidados, así que
//! todas las variables de un subprograma se elevan a su sección `var`.
//! Una variable del bloque `n` (distinto del cuerpo) se renombra como
//! `nombre_n`. Además, Pascal no distingue mayúsculas de minúsculas y
//! reserva varias palabras que la fuente sí permite como identificadores,
//! por lo que cada nombre se reclama en un espacio de nombres que resuelve
//! colisiones agregando `_k`.
//!
//! Las variables del bloque principal se declaran antes que las funciones,
//! como exige Pascal ISO.

use crate::{
    codegen::indent,
    ir::{BinOp, Block, Declaration, Expr, Factor, Function, Item, Program, Type, Variable},
    lex::Identifier,
};

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display},
};

use unicase::Ascii;

/// Palabras que no pueden usarse como nombres en la salida.
const RESERVED: &[&str] = &[
    "and", "array", "begin", "case", "const", "div", "do", "downto", "else", "end",
    "file", "for", "function", "goto", "if", "in", "integer", "label", "mod", "nil",
    "not", "of", "or", "packed", "procedure", "program", "real", "record", "repeat",
    "set", "then", "to", "type", "until", "var", "while", "with",
];

pub struct Emitter {
    globals: Namespace,
    variables: Vec<String>,
}

impl super::Emitter for Emitter {
    fn new(program: &Program) -> Self {
        let mut globals = Namespace::new();
        globals.claim("main");

        // Las variables del programa preceden a las funciones
        let variables = declarations(&mut globals, &program.main);

        Emitter { globals, variables }
    }

    fn prologue(&mut self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "program main;")?;
        var_section(fmt, &self.variables)
    }

    fn function(&mut self, fmt: &mut fmt::Formatter<'_>, function: &Function) -> fmt::Result {
        let name = self.globals.claim(function.name.as_ref());

        writeln!(fmt)?;
        writeln!(fmt, "function {}: {};", name, TypeName(function.returns))?;

        // El nombre de la función es su variable de retorno
        let mut locals = Namespace::new();
        locals.claim(&name);

        let variables = declarations(&mut locals, &function.body);
        var_section(fmt, &variables)?;

        body(fmt, &locals, &function.body)?;
        writeln!(fmt, "end;")
    }

    fn main(&mut self, fmt: &mut fmt::Formatter<'_>, main: &Block) -> fmt::Result {
        writeln!(fmt)?;
        body(fmt, &self.globals, main)?;
        writeln!(fmt, "end.")
    }
}

/// Nombres ya utilizados en un ámbito de Pascal.
struct Namespace {
    taken: HashSet<Ascii<String>>,
    bound: HashMap<(Identifier, u32), String>,
}

impl Namespace {
    fn new() -> Self {
        Namespace {
            taken: RESERVED
                .iter()
                .map(|word| Ascii::new(word.to_string()))
                .collect(),
            bound: HashMap::new(),
        }
    }

    /// Reserva el primer nombre libre de la forma `base`, `base_1`, `base_2`, ...
    fn claim(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;

        while !self.taken.insert(Ascii::new(name.clone())) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }

        name
    }

    /// Asigna un nombre de salida a una variable declarada.
    fn bind(&mut self, variable: &Variable) -> String {
        let base = match variable.block {
            0 => variable.name.to_string(),
            block => format!("{}_{}", variable.name, block),
        };

        let name = self.claim(&base);
        self.bound
            .insert((variable.name.clone(), variable.block), name.clone());

        name
    }

    fn resolve<'a>(&'a self, variable: &'a Variable) -> &'a str {
        self.bound
            .get(&(variable.name.clone(), variable.block))
            .map_or(variable.name.as_ref(), String::as_str)
    }
}

/// Nombra y describe todas las variables de un subprograma.
fn declarations(names: &mut Namespace, body: &Block) -> Vec<String> {
    let mut hoisted = Vec::new();
    hoist(names, body, &mut hoisted);

    hoisted
        .into_iter()
        .map(|(name, declaration)| format!("{}: {}", name, Declared(declaration)))
        .collect()
}

fn var_section(fmt: &mut fmt::Formatter<'_>, variables: &[String]) -> fmt::Result {
    if !variables.is_empty() {
        writeln!(fmt, "var")?;
        for variable in variables {
            writeln!(fmt, "  {};", variable)?;
        }
    }

    Ok(())
}

/// Emite el cuerpo de un subprograma, sin el `end` final.
fn body(fmt: &mut fmt::Formatter<'_>, names: &Namespace, block: &Block) -> fmt::Result {
    writeln!(fmt, "begin")?;
    statements(fmt, names, block, 1)
}

/// Recolecta en preorden las declaraciones de un bloque y sus anidados.
fn hoist<'a>(names: &mut Namespace, block: &'a Block, into: &mut Vec<(String, &'a Declaration)>) {
    for item in &block.items {
        match item {
            Item::Declaration(declaration) => {
                into.push((names.bind(&declaration.variable), declaration))
            }

            Item::Block(inner) => hoist(names, inner, into),
            Item::Assignment(..) => (),
        }
    }
}

fn statements(
    fmt: &mut fmt::Formatter<'_>,
    names: &Namespace,
    block: &Block,
    depth: usize,
) -> fmt::Result {
    for item in &block.items {
        match item {
            Item::Declaration(_) => (),

            Item::Assignment(target, value) => {
                indent(fmt, depth)?;
                write!(fmt, "{} := ", names.resolve(target))?;
                expr(fmt, names, value)?;
                writeln!(fmt, ";")?;
            }

            Item::Block(inner) => {
                indent(fmt, depth)?;
                writeln!(fmt, "begin")?;
                statements(fmt, names, inner, depth + 1)?;
                indent(fmt, depth)?;
                writeln!(fmt, "end;")?;
            }
        }
    }

    Ok(())
}

fn expr(fmt: &mut fmt::Formatter<'_>, names: &Namespace, value: &Expr) -> fmt::Result {
    for (op, factor) in value.factors() {
        if let Some(op) = op {
            let op = match op {
                BinOp::Add => "+",
                BinOp::Sub => "-",
                BinOp::Mul => "*",
                BinOp::Div => "/",
                BinOp::IntegerDiv => "div",
            };

            write!(fmt, " {} ", op)?;
        }

        match factor {
            Factor::Integer(lexeme) | Factor::Real(lexeme) => fmt.write_str(lexeme)?,
            Factor::Read(variable) => fmt.write_str(names.resolve(variable))?,
        }
    }

    Ok(())
}

struct TypeName(Type);

impl Display for TypeName {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Type::Int => fmt.write_str("integer"),
            Type::Real => fmt.write_str("real"),
        }
    }
}

/// Tipo de una declaración, ya sea escalar o arreglo.
struct Declared<'a>(&'a Declaration);

impl Display for Declared<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Declaration {
            variable,
            dimensions,
        } = self.0;

        if !dimensions.is_empty() {
            fmt.write_str("array [")?;
            for (i, size) in dimensions.iter().enumerate() {
                if i > 0 {
                    fmt.write_str(", ")?;
                }

                write!(fmt, "1..{}", size)?;
            }

            fmt.write_str("] of ")?;
        }

        TypeName(variable.typ).fmt(fmt)
    }
}
