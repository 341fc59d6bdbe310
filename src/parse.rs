//! Análisis sintáctico y traducción dirigida por la sintaxis.
//!
//! El parser es descendente recursivo y predictivo, con un único token
//! de lookahead. No construye un árbol: conforme reconoce cada regla
//! invoca las verificaciones de [`crate::semantic`] y alimenta al
//! [`Generator`]. La primera falla de cualquier fase termina el análisis.
//!
//! # Gramática
//! ```text
//! Programa    → Funcion* Principal EOF
//! Funcion     → Tipo id ( ) Bloque
//! Principal   → main ( ) Bloque
//! Tipo        → int | double
//! Bloque      → { Elemento* }
//! Elemento    → Bloque | Declaracion | Asignacion
//! Declaracion → Tipo Variable ( , Variable )* ;
//! Variable    → id ( [ entero ] )*
//! Asignacion  → id = Expr ;
//! Expr        → Term ( addop Term )*
//! Term        → Factor ( mulop Factor )*
//! Factor      → entero | id | real
//! ```
//!
//! # Errores
//! Ante un token inesperado se reporta el conjunto completo de tokens
//! válidos en ese punto: los FIRST de las alternativas y, cuando hay una
//! alternativa vacía, los FOLLOW de la regla.

use bitflags::bitflags;
use std::{
    fmt::{self, Display},
    rc::Rc,
};
use thiserror::Error;

use crate::{
    codegen::Generator,
    error::Diagnostic,
    ir::{BinOp, Expr, Factor, Term, Type},
    lex::{Identifier, Keyword, Lexer, Token},
    semantic::{self, Scopes},
    source::{InputStream, Located, Position},
};

/// Profundidad máxima de bloques anidados.
pub const MAX_NESTING: u32 = 256;

bitflags! {
    /// Conjunto de clases de token esperadas.
    ///
    /// El orden de los bits es el orden en que se enumeran en un mensaje.
    pub struct Expected: u32 {
        const OPEN_PAREN   = 1 << 0;
        const CLOSE_PAREN  = 1 << 1;
        const MUL_OP       = 1 << 2;
        const ADD_OP       = 1 << 3;
        const SEMICOLON    = 1 << 4;
        const COMMA        = 1 << 5;
        const OPEN_SQUARE  = 1 << 6;
        const CLOSE_SQUARE = 1 << 7;
        const ASSIGN       = 1 << 8;
        const OPEN_CURLY   = 1 << 9;
        const CLOSE_CURLY  = 1 << 10;
        const DOUBLE       = 1 << 11;
        const INT          = 1 << 12;
        const MAIN         = 1 << 13;
        const INTEGER      = 1 << 14;
        const ID           = 1 << 15;
        const REAL         = 1 << 16;
        const EOF          = 1 << 17;

        const TYPE         = Self::DOUBLE.bits | Self::INT.bits;
        const FACTOR       = Self::INTEGER.bits | Self::ID.bits | Self::REAL.bits;
    }
}

impl Expected {
    /// Clase a la que pertenece un token.
    pub fn of(token: &Token) -> Expected {
        match token {
            Token::OpenParen => Expected::OPEN_PAREN,
            Token::CloseParen => Expected::CLOSE_PAREN,
            Token::Times | Token::Slash => Expected::MUL_OP,
            Token::Plus | Token::Minus => Expected::ADD_OP,
            Token::Semicolon => Expected::SEMICOLON,
            Token::Comma => Expected::COMMA,
            Token::OpenSquare => Expected::OPEN_SQUARE,
            Token::CloseSquare => Expected::CLOSE_SQUARE,
            Token::Assign => Expected::ASSIGN,
            Token::OpenCurly => Expected::OPEN_CURLY,
            Token::CloseCurly => Expected::CLOSE_CURLY,
            Token::Keyword(Keyword::Double) => Expected::DOUBLE,
            Token::Keyword(Keyword::Int) => Expected::INT,
            Token::Keyword(Keyword::Main) => Expected::MAIN,
            Token::Integer(_) => Expected::INTEGER,
            Token::Id(_) => Expected::ID,
            Token::Real(_) => Expected::REAL,
            Token::Eof => Expected::EOF,
        }
    }
}

impl Display for Expected {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SPELLINGS: &[(Expected, &str)] = &[
            (Expected::OPEN_PAREN,   "("),
            (Expected::CLOSE_PAREN,  ")"),
            (Expected::MUL_OP,       "* /"),
            (Expected::ADD_OP,       "+ -"),
            (Expected::SEMICOLON,    ";"),
            (Expected::COMMA,        ","),
            (Expected::OPEN_SQUARE,  "["),
            (Expected::CLOSE_SQUARE, "]"),
            (Expected::ASSIGN,       "="),
            (Expected::OPEN_CURLY,   "{"),
            (Expected::CLOSE_CURLY,  "}"),
            (Expected::DOUBLE,       "'double'"),
            (Expected::INT,          "'int'"),
            (Expected::MAIN,         "'main'"),
            (Expected::INTEGER,      "numero entero"),
            (Expected::ID,           "identificador"),
            (Expected::REAL,         "numero real"),
            (Expected::EOF,          "fin de fichero"),
        ];

        for (class, spelling) in SPELLINGS {
            if self.contains(*class) {
                write!(fmt, "{} ", spelling)?;
            }
        }

        Ok(())
    }
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("encontrado {found}, esperaba {expected}")]
    UnexpectedToken { found: Token, expected: Expected },

    #[error("anidamiento de bloques excesivo (maximo {MAX_NESTING})")]
    TooDeep,
}

impl ParserError {
    /// Determina si el error ocurrió al encontrar el fin de la entrada.
    pub fn at_eof(&self) -> bool {
        matches!(
            self,
            ParserError::UnexpectedToken {
                found: Token::Eof,
                ..
            }
        )
    }
}

/// Analiza un programa completo.
///
/// Retorna el generador con todo el programa acumulado únicamente si la
/// entrada completa fue aceptada.
pub fn parse<S: InputStream>(lexer: Lexer<S>) -> Result<Generator, Diagnostic> {
    let mut parser = Parser {
        lexer,
        lookahead: Located::at(Token::Eof, Position::default()),
        scopes: Scopes::new(),
        generator: Generator::default(),
        nesting: 0,
    };

    parser.advance()?;
    parser.program()?;

    Ok(parser.generator)
}

struct Parser<S: Iterator> {
    lexer: Lexer<S>,
    lookahead: Located<Token>,
    scopes: Scopes,
    generator: Generator,
    nesting: u32,
}

type Parse<T> = Result<T, Diagnostic>;

impl<S: InputStream> Parser<S> {
    fn program(&mut self) -> Parse<()> {
        loop {
            match self.lookahead.val() {
                Token::Keyword(Keyword::Int | Keyword::Double) => self.function()?,
                Token::Keyword(Keyword::Main) => break,
                _ => return self.fail(Expected::TYPE | Expected::MAIN),
            }
        }

        self.main()?;

        // Nada puede seguir al bloque principal
        match self.lookahead.val() {
            Token::Eof => Ok(()),
            _ => self.fail(Expected::EOF),
        }
    }

    fn function(&mut self) -> Parse<()> {
        let returns = self.typ()?;

        let name = self.id()?;
        self.scopes
            .declare(&name, semantic::Kind::Function, returns)?;

        self.expect(Expected::OPEN_PAREN)?;
        self.expect(Expected::CLOSE_PAREN)?;

        log::debug!("function `{}` at {}", name.val(), name.position());
        self.generator.begin_function(name.into_inner(), returns);
        self.block()
    }

    fn main(&mut self) -> Parse<()> {
        self.expect(Expected::MAIN)?;
        self.expect(Expected::OPEN_PAREN)?;
        self.expect(Expected::CLOSE_PAREN)?;

        log::debug!("main block");
        self.generator.begin_main();
        self.block()
    }

    fn block(&mut self) -> Parse<()> {
        let open = self.expect(Expected::OPEN_CURLY)?;
        if self.nesting == MAX_NESTING {
            return Err(Located::at(ParserError::TooDeep, open.position()).into());
        }

        self.nesting += 1;
        self.scopes.push();
        self.generator.open_block();

        loop {
            match self.lookahead.val() {
                Token::OpenCurly => self.block()?,
                Token::CloseCurly => break,
                Token::Keyword(Keyword::Int | Keyword::Double) => self.declaration()?,
                Token::Id(_) => self.assignment()?,

                _ => {
                    let expected = Expected::OPEN_CURLY | Expected::CLOSE_CURLY | Expected::TYPE | Expected::ID;
                    return self.fail(expected);
                }
            }
        }

        self.advance()?;

        self.generator.close_block();
        self.scopes.pop();
        self.nesting -= 1;

        Ok(())
    }

    fn declaration(&mut self) -> Parse<()> {
        let typ = self.typ()?;

        self.variable(typ)?;
        while let Token::Comma = self.lookahead.val() {
            self.advance()?;
            self.variable(typ)?;
        }

        self.expect(Expected::SEMICOLON)?;
        Ok(())
    }

    fn variable(&mut self, typ: Type) -> Parse<()> {
        let name = self.id()?;
        self.scopes.check_undeclared(&name)?;

        let mut dimensions = Vec::new();
        loop {
            match self.lookahead.val() {
                Token::OpenSquare => {
                    self.advance()?;

                    let size = self.literal(Expected::INTEGER)?;
                    semantic::check_array_size(&size)?;
                    dimensions.push(size.into_inner());

                    self.expect(Expected::CLOSE_SQUARE)?;
                }

                Token::Semicolon | Token::Comma => break,
                _ => return self.fail(Expected::SEMICOLON | Expected::COMMA | Expected::OPEN_SQUARE),
            }
        }

        let declaration = self.scopes.declare_variable(&name, typ, dimensions)?;
        self.generator.declare(declaration);

        Ok(())
    }

    fn assignment(&mut self) -> Parse<()> {
        let name = self.id()?;
        let target = self.scopes.variable(&name)?;

        self.expect(Expected::ASSIGN)?;
        let value = self.expr()?;
        semantic::check_assignment(&name, &target, &value)?;
        self.expect(Expected::SEMICOLON)?;

        self.generator.assign(target, value);
        Ok(())
    }

    fn expr(&mut self) -> Parse<Expr> {
        let mut expr = Expr::from(self.term()?);

        loop {
            let op = match self.lookahead.val() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                Token::Semicolon => break Ok(expr),
                _ => return self.fail(Expected::ADD_OP | Expected::SEMICOLON),
            };

            self.advance()?;
            expr.push(op, self.term()?);
        }
    }

    fn term(&mut self) -> Parse<Term> {
        let mut term = Term::from(self.factor()?);

        loop {
            let divide = match self.lookahead.val() {
                Token::Times => false,
                Token::Slash => true,

                // FOLLOW(Term)
                Token::Plus | Token::Minus | Token::Semicolon => break Ok(term),
                _ => return self.fail(Expected::MUL_OP | Expected::ADD_OP | Expected::SEMICOLON),
            };

            self.advance()?;
            term.push(divide, self.factor()?);
        }
    }

    fn factor(&mut self) -> Parse<Factor> {
        let factor = match self.lookahead.val() {
            Token::Integer(lexeme) => Factor::Integer(lexeme.clone()),
            Token::Real(lexeme) => Factor::Real(lexeme.clone()),
            Token::Id(_) => {
                let name = self.id()?;
                return Ok(Factor::Read(self.scopes.variable(&name)?));
            }

            _ => return self.fail(Expected::FACTOR),
        };

        self.advance()?;
        Ok(factor)
    }

    fn typ(&mut self) -> Parse<Type> {
        let typ = match self.lookahead.val() {
            Token::Keyword(Keyword::Int) => Type::Int,
            Token::Keyword(Keyword::Double) => Type::Real,
            _ => return self.fail(Expected::TYPE),
        };

        self.advance()?;
        Ok(typ)
    }

    fn id(&mut self) -> Parse<Located<Identifier>> {
        let (position, token) = self.expect(Expected::ID)?.split();
        match token {
            Token::Id(id) => Ok(Located::at(id, position)),
            _ => unreachable!(),
        }
    }

    /// Consume un literal numérico de la clase indicada.
    fn literal(&mut self, class: Expected) -> Parse<Located<Rc<str>>> {
        let (position, token) = self.expect(class)?.split();
        match token {
            Token::Integer(lexeme) | Token::Real(lexeme) => Ok(Located::at(lexeme, position)),
            _ => unreachable!(),
        }
    }

    /// Consume el token actual si pertenece a alguna de las clases indicadas.
    fn expect(&mut self, expected: Expected) -> Parse<Located<Token>> {
        if expected.intersects(Expected::of(self.lookahead.val())) {
            self.advance()
        } else {
            self.fail(expected)
        }
    }

    /// Avanza al siguiente token, retornando el que era actual.
    fn advance(&mut self) -> Parse<Located<Token>> {
        let next = match self.lexer.next() {
            Some(result) => result?,
            None => Located::at(Token::Eof, self.lexer.position()),
        };

        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn fail<T>(&self, expected: Expected) -> Parse<T> {
        let found = self.lookahead.val().clone();
        let error = ParserError::UnexpectedToken { found, expected };

        Err(Located::at(error, self.lookahead.position()).into())
    }
}
