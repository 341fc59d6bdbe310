//! Análisis semántico.
//!
//! El parser invoca estas verificaciones en el mismo momento en que
//! reconoce cada declaración o uso. La tabla de símbolos es una pila de
//! ámbitos: el primero es global y contiene a las funciones, luego cada
//! bloque agrega uno propio mientras está abierto.

use indexmap::IndexMap;
use thiserror::Error;

use std::rc::Rc;

use crate::{
    ir::{Declaration, Expr, Type, Variable},
    lex::Identifier,
    source::Located,
};

pub type Semantic<T> = Result<T, Located<SemanticError>>;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("'{0}' no ha sido declarado")]
    Undeclared(Identifier),

    #[error("'{0}' no es una variable")]
    NotAVariable(Identifier),

    #[error("'{0}' ya existe en este ambito")]
    Redeclared(Identifier),

    #[error("'{0}' debe ser de tipo real")]
    ExpectedReal(Identifier),

    #[error("'{0}' debe ser mayor que cero")]
    NonPositiveSize(Rc<str>),
}

/// Clase de un símbolo declarado.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    Variable,
    Array,
    Function,
}

/// Un nombre declarado.
///
/// Nunca cambia luego de insertarse, y desaparece junto a su ámbito.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Identifier,
    pub kind: Kind,
    pub typ: Type,
    pub block: u32,
}

struct Scope {
    block: u32,
    symbols: IndexMap<Identifier, Symbol>,
}

impl Scope {
    fn new(block: u32) -> Self {
        Scope {
            block,
            symbols: IndexMap::new(),
        }
    }
}

/// Pila de ámbitos de una traducción en curso.
pub struct Scopes {
    scopes: Vec<Scope>,
    blocks: u32,
}

impl Default for Scopes {
    fn default() -> Self {
        Scopes::new()
    }
}

impl Scopes {
    /// Crea una pila que contiene únicamente el ámbito global.
    pub fn new() -> Self {
        Scopes {
            scopes: vec![Scope::new(0)],
            blocks: 0,
        }
    }

    /// Cantidad de ámbitos abiertos, incluyendo el global.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Abre un ámbito nuevo y retorna su ordinal de bloque.
    ///
    /// El cuerpo de un subprograma es el bloque 0; los bloques anidados
    /// en él se numeran a partir de 1 en orden de apertura.
    pub fn push(&mut self) -> u32 {
        let block = if self.scopes.len() == 1 {
            self.blocks = 0;
            0
        } else {
            self.blocks += 1;
            self.blocks
        };

        log::trace!("opening scope {} (block {})", self.scopes.len(), block);
        self.scopes.push(Scope::new(block));

        block
    }

    /// Cierra el ámbito más interno. El ámbito global nunca se cierra.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            if let Some(scope) = self.scopes.pop() {
                log::trace!(
                    "closing scope {} (block {}): {:?}",
                    self.scopes.len(),
                    scope.block,
                    scope.symbols.keys().map(|name| -> &str { name.as_ref() }).collect::<Vec<_>>()
                );
            }
        }
    }

    /// Busca un nombre desde el ámbito más interno hacia afuera.
    pub fn lookup(&self, name: &Identifier) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    /// Falla si el nombre ya existe en el ámbito actual.
    ///
    /// Que exista en un ámbito exterior no es un error.
    pub fn check_undeclared(&self, name: &Located<Identifier>) -> Semantic<()> {
        let exists = self
            .current()
            .map_or(false, |scope| scope.symbols.contains_key(name.as_ref()));

        if exists {
            Err(Located::at(
                SemanticError::Redeclared(name.as_ref().clone()),
                name.position(),
            ))
        } else {
            Ok(())
        }
    }

    /// Inserta un símbolo en el ámbito actual.
    pub fn declare(&mut self, name: &Located<Identifier>, kind: Kind, typ: Type) -> Semantic<&Symbol> {
        self.check_undeclared(name)?;

        let current = self.scopes.len() - 1;
        let scope = &mut self.scopes[current];

        let symbol = Symbol {
            name: name.as_ref().clone(),
            kind,
            typ,
            block: scope.block,
        };

        log::trace!("declared {:?}", symbol);

        let entry = scope.symbols.entry(name.as_ref().clone());
        Ok(entry.or_insert(symbol))
    }

    /// Declara una variable o arreglo y construye su declaración de IR.
    pub fn declare_variable(
        &mut self,
        name: &Located<Identifier>,
        typ: Type,
        dimensions: Vec<Rc<str>>,
    ) -> Semantic<Declaration> {
        let kind = if dimensions.is_empty() {
            Kind::Variable
        } else {
            Kind::Array
        };

        let symbol = self.declare(name, kind, typ)?;
        Ok(Declaration {
            variable: Variable {
                name: symbol.name.clone(),
                block: symbol.block,
                typ,
            },
            dimensions,
        })
    }

    /// Resuelve un uso que debe ser una variable simple.
    pub fn variable(&self, name: &Located<Identifier>) -> Semantic<Variable> {
        let fail = |error: fn(Identifier) -> SemanticError| {
            Err(Located::at(error(name.as_ref().clone()), name.position()))
        };

        match self.lookup(name.as_ref()) {
            None => fail(SemanticError::Undeclared),
            Some(Symbol {
                kind: Kind::Variable,
                typ,
                block,
                ..
            }) => Ok(Variable {
                name: name.as_ref().clone(),
                block: *block,
                typ: *typ,
            }),

            Some(_) => fail(SemanticError::NotAVariable),
        }
    }

    fn current(&self) -> Option<&Scope> {
        self.scopes.last()
    }
}

/// Verifica que el tamaño de un arreglo sea mayor que cero.
///
/// El lexema es una secuencia de dígitos, por lo que basta con que
/// alguno sea distinto de `0`. Así no hay límite de magnitud.
pub fn check_array_size(size: &Located<Rc<str>>) -> Semantic<()> {
    if size.as_ref().chars().any(|digit| digit != '0') {
        Ok(())
    } else {
        Err(Located::at(
            SemanticError::NonPositiveSize(size.as_ref().clone()),
            size.position(),
        ))
    }
}

/// Verifica que el valor asignado quepa en el destino.
///
/// Un entero se promueve a real, pero un real no puede asignarse a un entero.
pub fn check_assignment(target: &Located<Identifier>, variable: &Variable, value: &Expr) -> Semantic<()> {
    match (variable.typ, value.typ) {
        (Type::Int, Type::Real) => Err(Located::at(
            SemanticError::ExpectedReal(target.as_ref().clone()),
            target.position(),
        )),

        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{Factor, Term},
        source::Position,
    };
    use pretty_assertions::assert_eq;

    fn at(name: &str, line: u32, column: u32) -> Located<Identifier> {
        Located::at(Identifier::from(name), Position::new(line, column))
    }

    #[test]
    fn redeclaration_in_same_scope_fails_at_second_occurrence() {
        let mut scopes = Scopes::new();
        scopes.push();
        scopes.declare(&at("var", 2, 6), Kind::Variable, Type::Int).unwrap();

        let error = scopes
            .declare(&at("var", 5, 9), Kind::Variable, Type::Real)
            .unwrap_err();

        assert_eq!(error.position(), Position::new(5, 9));
        assert_eq!(error.val().to_string(), "'var' ya existe en este ambito");
    }

    #[test]
    fn shadowing_resolves_to_innermost() {
        let mut scopes = Scopes::new();
        scopes.push();
        scopes.declare(&at("a", 2, 6), Kind::Variable, Type::Int).unwrap();

        scopes.push();
        scopes.declare(&at("a", 4, 10), Kind::Variable, Type::Real).unwrap();

        let inner = scopes.variable(&at("a", 5, 3)).unwrap();
        assert_eq!(inner.typ, Type::Real);
        assert_eq!(inner.block, 1);

        scopes.pop();
        let outer = scopes.variable(&at("a", 7, 2)).unwrap();
        assert_eq!(outer.typ, Type::Int);
        assert_eq!(outer.block, 0);
    }

    #[test]
    fn block_ordinals_restart_per_subprogram() {
        let mut scopes = Scopes::new();
        assert_eq!(scopes.push(), 0);
        assert_eq!(scopes.push(), 1);
        scopes.pop();
        assert_eq!(scopes.push(), 2);
        scopes.pop();
        scopes.pop();

        assert_eq!(scopes.push(), 0);
        assert_eq!(scopes.push(), 1);
        assert_eq!(scopes.depth(), 3);
    }

    #[test]
    fn global_scope_is_never_popped() {
        let mut scopes = Scopes::new();
        scopes.declare(&at("f", 1, 5), Kind::Function, Type::Int).unwrap();
        scopes.pop();

        assert_eq!(scopes.depth(), 1);
        assert!(scopes.lookup(&Identifier::from("f")).is_some());
    }

    #[test]
    fn uses_of_functions_and_arrays_are_not_variables() {
        let mut scopes = Scopes::new();
        scopes.declare(&at("funcion", 1, 5), Kind::Function, Type::Int).unwrap();
        scopes.push();
        scopes
            .declare_variable(&at("v", 3, 6), Type::Int, vec![Rc::from("3")])
            .unwrap();
        assert_eq!(
            scopes.lookup(&Identifier::from("v")).map(|symbol| &symbol.kind),
            Some(&Kind::Array)
        );

        let error = scopes.variable(&at("funcion", 5, 11)).unwrap_err();
        assert_eq!(error.val().to_string(), "'funcion' no es una variable");

        let error = scopes.variable(&at("v", 6, 2)).unwrap_err();
        assert_eq!(error.val().to_string(), "'v' no es una variable");

        let error = scopes.variable(&at("c", 15, 7)).unwrap_err();
        assert_eq!(error.position(), Position::new(15, 7));
        assert_eq!(error.val().to_string(), "'c' no ha sido declarado");
    }

    #[test]
    fn zero_sizes_are_rejected_with_their_lexeme() {
        let ok = Located::at(Rc::from("10"), Position::new(1, 1));
        assert!(check_array_size(&ok).is_ok());

        let zero = Located::at(Rc::from("000"), Position::new(12, 9));
        let error = check_array_size(&zero).unwrap_err();
        assert_eq!(error.val().to_string(), "'000' debe ser mayor que cero");
    }

    #[test]
    fn real_value_needs_real_target() {
        let target = at("a", 8, 3);
        let int = Variable {
            name: Identifier::from("a"),
            block: 0,
            typ: Type::Int,
        };

        let real = Expr::from(Term::from(Factor::Real(Rc::from("1.5"))));
        let error = check_assignment(&target, &int, &real).unwrap_err();
        assert_eq!(error.val().to_string(), "'a' debe ser de tipo real");

        let widened = Variable { typ: Type::Real, ..int.clone() };
        let whole = Expr::from(Term::from(Factor::Integer(Rc::from("1"))));
        assert!(check_assignment(&target, &widened, &whole).is_ok());
        assert!(check_assignment(&target, &int, &whole).is_ok());
    }
}
