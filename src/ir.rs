//! Representación intermedia.
//!
//! Es lo que el generador de código acumula conforme el parser acepta
//! constructos. Conserva el orden de la fuente y la estructura de bloques,
//! pero ya con nombres resueltos a su declaración, tipos calculados y la
//! división entera distinguida de la real. Cada objetivo en [`crate::target`]
//! la traduce a texto.

use crate::lex::Identifier;
use std::rc::Rc;

/// Tipo primitivo.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Real,
}

impl Type {
    /// Tipo resultante de operar dos valores. Un entero se promueve a real.
    pub fn join(self, other: Type) -> Type {
        match (self, other) {
            (Type::Int, Type::Int) => Type::Int,
            _ => Type::Real,
        }
    }
}

#[derive(Debug, Default)]
pub struct Program {
    pub functions: Vec<Function>,
    pub main: Block,
}

#[derive(Debug)]
pub struct Function {
    pub name: Identifier,
    pub returns: Type,
    pub body: Block,
}

#[derive(Debug, Default)]
pub struct Block {
    pub items: Vec<Item>,
}

#[derive(Debug)]
pub enum Item {
    Declaration(Declaration),
    Assignment(Variable, Expr),
    Block(Block),
}

/// Declaración de una variable simple o de un arreglo.
///
/// `dimensions` contiene el lexema de cada tamaño, en orden.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub variable: Variable,
    pub dimensions: Vec<Rc<str>>,
}

/// Referencia a una variable ya resuelta.
///
/// `block` es el ordinal del bloque que la declara dentro de su
/// subprograma: 0 para el cuerpo, luego 1, 2, ... en orden de apertura.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: Identifier,
    pub block: u32,
    pub typ: Type,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    IntegerDiv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Factor {
    Integer(Rc<str>),
    Real(Rc<str>),
    Read(Variable),
}

impl Factor {
    pub fn typ(&self) -> Type {
        match self {
            Factor::Integer(_) => Type::Int,
            Factor::Real(_) => Type::Real,
            Factor::Read(variable) => variable.typ,
        }
    }
}

/// Producto de factores, `head (op factor)*`.
#[derive(Debug, Clone)]
pub struct Term {
    pub typ: Type,
    pub head: Factor,
    pub tail: Vec<(BinOp, Factor)>,
}

/// Suma de términos, `head (op term)*`.
///
/// Ni los términos ni las expresiones se anidan, por lo que no hace
/// falta recursión para recorrerlos.
#[derive(Debug, Clone)]
pub struct Expr {
    pub typ: Type,
    pub head: Term,
    pub tail: Vec<(BinOp, Term)>,
}

impl From<Factor> for Term {
    fn from(head: Factor) -> Self {
        Term {
            typ: head.typ(),
            head,
            tail: Vec::new(),
        }
    }
}

impl From<Term> for Expr {
    fn from(head: Term) -> Self {
        Expr {
            typ: head.typ,
            head,
            tail: Vec::new(),
        }
    }
}

impl Term {
    /// Agrega un factor con `*` o `/`.
    ///
    /// La división es entera solo si ambos lados hasta este punto son enteros.
    pub fn push(&mut self, divide: bool, factor: Factor) {
        let typ = factor.typ();
        let op = match (divide, self.typ, typ) {
            (false, _, _) => BinOp::Mul,
            (true, Type::Int, Type::Int) => BinOp::IntegerDiv,
            (true, _, _) => BinOp::Div,
        };

        self.typ = self.typ.join(typ);
        self.tail.push((op, factor));
    }
}

impl Expr {
    /// Agrega un término con `+` o `-`.
    pub fn push(&mut self, op: BinOp, term: Term) {
        self.typ = self.typ.join(term.typ);
        self.tail.push((op, term));
    }

    /// Itera sobre todos los factores junto al operador que los precede.
    pub fn factors(&self) -> impl Iterator<Item = (Option<BinOp>, &Factor)> {
        std::iter::once((None, &self.head))
            .chain(self.tail.iter().map(|(op, term)| (Some(*op), term)))
            .flat_map(|(op, term)| {
                std::iter::once((op, &term.head))
                    .chain(term.tail.iter().map(|(op, factor)| (Some(*op), factor)))
            })
    }
}
