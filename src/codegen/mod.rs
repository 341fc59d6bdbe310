//! Generación de código.
//!
//! El parser alimenta a un [`Generator`] conforme acepta constructos. El
//! generador únicamente acumula representación intermedia; el texto final
//! solo existe al llamar a [`Generator::materialize()`], lo cual ocurre
//! cuando toda la entrada fue aceptada.

use crate::{
    ir::{Block, Declaration, Expr, Function, Item, Program, Type, Variable},
    lex::Identifier,
    target::{Emitter, Target},
};

use std::{
    fmt::{self, Display},
    mem,
};

/// Subprograma que se está generando actualmente.
enum Heading {
    Function { name: Identifier, returns: Type },
    Main,
}

/// Búfer de generación de código.
pub struct Generator {
    program: Program,
    heading: Heading,
    current: Block,
    enclosing: Vec<Block>,
}

impl Default for Generator {
    fn default() -> Self {
        Generator {
            program: Program::default(),
            heading: Heading::Main,
            current: Block::default(),
            enclosing: Vec::new(),
        }
    }
}

impl Generator {
    /// Comienza una función. Su cuerpo es el siguiente bloque que se abra.
    pub fn begin_function(&mut self, name: Identifier, returns: Type) {
        self.heading = Heading::Function { name, returns };
    }

    /// Comienza el bloque principal.
    pub fn begin_main(&mut self) {
        self.heading = Heading::Main;
    }

    /// Abre un bloque dentro del subprograma actual.
    pub fn open_block(&mut self) {
        let outer = mem::take(&mut self.current);
        self.enclosing.push(outer);
    }

    /// Cierra el bloque más interno.
    ///
    /// Si se trata del cuerpo de un subprograma, este queda completo.
    pub fn close_block(&mut self) {
        let outer = self.enclosing.pop().unwrap_or_default();
        let block = mem::replace(&mut self.current, outer);

        if !self.enclosing.is_empty() {
            self.current.items.push(Item::Block(block));
            return;
        }

        match mem::replace(&mut self.heading, Heading::Main) {
            Heading::Function { name, returns } => {
                log::debug!("generated function `{}`", name);
                self.program.functions.push(Function {
                    name,
                    returns,
                    body: block,
                })
            }

            Heading::Main => {
                log::debug!("generated main block");
                self.program.main = block;
            }
        }
    }

    /// Emite una declaración en el bloque actual.
    pub fn declare(&mut self, declaration: Declaration) {
        self.current.items.push(Item::Declaration(declaration));
    }

    /// Emite una asignación en el bloque actual.
    pub fn assign(&mut self, target: Variable, value: Expr) {
        self.current.items.push(Item::Assignment(target, value));
    }

    /// Programa acumulado hasta el momento.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Produce el texto del programa para un objetivo.
    pub fn materialize(self, target: Target) -> String {
        log::debug!("materializing for target {}", target);

        Listing {
            program: &self.program,
            target,
        }
        .to_string()
    }
}

/// Un programa visto como texto de un objetivo en particular.
pub struct Listing<'a> {
    program: &'a Program,
    target: Target,
}

impl Display for Listing<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch_target!(E: self.target => emit::<E>(self.program, fmt))
    }
}

/// Emite un programa completo con un emisor dado.
fn emit<E: Emitter>(program: &Program, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut emitter = E::new(program);

    emitter.prologue(fmt)?;
    for function in &program.functions {
        emitter.function(fmt, function)?;
    }

    emitter.main(fmt, &program.main)
}

/// Escribe `depth` niveles de sangría.
pub(crate) fn indent(fmt: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    write!(fmt, "{:width$}", "", width = 2 * depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Factor, Term};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn variable(name: &str, block: u32, typ: Type) -> Variable {
        Variable {
            name: Identifier::from(name),
            block,
            typ,
        }
    }

    fn one() -> Expr {
        Expr::from(Term::from(Factor::Integer(Rc::from("1"))))
    }

    #[test]
    fn blocks_nest_inside_their_subprogram() {
        let mut generator = Generator::default();

        generator.begin_function(Identifier::from("f"), Type::Real);
        generator.open_block();
        generator.declare(Declaration {
            variable: variable("a", 0, Type::Int),
            dimensions: Vec::new(),
        });
        generator.open_block();
        generator.assign(variable("a", 0, Type::Int), one());
        generator.close_block();
        generator.close_block();

        generator.begin_main();
        generator.open_block();
        generator.close_block();

        let program = generator.program();
        assert_eq!(program.functions.len(), 1);

        let function = &program.functions[0];
        assert_eq!(function.name, Identifier::from("f"));
        assert_eq!(function.returns, Type::Real);
        assert!(matches!(
            function.body.items.as_slice(),
            [Item::Declaration(_), Item::Block(inner)] if inner.items.len() == 1
        ));

        assert!(program.main.items.is_empty());
    }

    #[test]
    fn materialization_is_deterministic() {
        let build = || {
            let mut generator = Generator::default();
            generator.begin_main();
            generator.open_block();
            generator.declare(Declaration {
                variable: variable("x", 0, Type::Int),
                dimensions: vec![Rc::from("4")],
            });
            generator.close_block();
            generator
        };

        for target in [Target::Pascal, Target::C] {
            assert_eq!(build().materialize(target), build().materialize(target));
        }
    }
}
