//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del traductor. Descompone un [`InputStream`]
//! (flujo de caracteres) en unidades léxicas denominadas tokens. Los espacios
//! en blanco y los comentarios se descartan durante esta operación. Cada
//! token emitido está asociado a la posición de su primer carácter en el
//! código fuente original.
//!
//! # Contenido de un token
//! Los operadores, la puntuación y las palabras clave se identifican por el
//! hecho de lo que son. Los identificadores y las constantes literales
//! preservan su lexema original, ya que tanto los mensajes de error como la
//! generación de código lo necesitan tal cual aparece en la fuente.
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores comienzan con una letra y siguen con letras o dígitos.
//! - El lenguaje es case-sensitive: `Main` es un identificador.
//! - Los comentarios tienen la forma `/* ... */` y no se anidan.
//! - Un literal real requiere dígitos a ambos lados del punto.
//!
//! # Errores
//! El lexer no se recupera de errores. El primer error termina el
//! análisis, ya que el parser lo propaga inmediatamente.

use crate::source::{InputStream, Located, Position};
use std::{
    fmt::{self, Display},
    iter::Peekable,
    rc::Rc,
    str::FromStr,
};

use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("caracter '{0}' incorrecto")]
    BadChar(char),

    /// La entrada terminó dentro de un comentario.
    #[error("fin de fichero inesperado")]
    UnexpectedEof,
}

/// Un identificador.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Rc<str>);

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier(Rc::from(name))
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Objeto resultante del análisis léxico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal entero, con su lexema.
    Integer(Rc<str>),

    /// Literal real, con su lexema.
    Real(Rc<str>),

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `*`
    Times,

    /// `/`
    Slash,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `;`
    Semicolon,

    /// `,`
    Comma,

    /// `[`
    OpenSquare,

    /// `]`
    CloseSquare,

    /// `=`
    Assign,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// Fin de la entrada.
    Eof,
}

/// Se muestra tal como lo exige un mensaje `encontrado ...`.
impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        let lexeme = match self {
            Id(id) => id.as_ref(),
            Keyword(keyword) => return write!(fmt, "'{}'", keyword),
            Integer(lexeme) | Real(lexeme) => lexeme,
            OpenParen => "(",
            CloseParen => ")",
            Times => "*",
            Slash => "/",
            Plus => "+",
            Minus => "-",
            Semicolon => ";",
            Comma => ",",
            OpenSquare => "[",
            CloseSquare => "]",
            Assign => "=",
            OpenCurly => "{",
            CloseCurly => "}",
            Eof => return fmt.write_str("fin de fichero"),
        };

        write!(fmt, "'{}'", lexeme)
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Int,
    Double,
    Main,
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Keyword::Int    => "int",
            Keyword::Double => "double",
            Keyword::Main   => "main",
        };

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        const KEYWORDS: &[(&str, Keyword)] = &[
            ("int",    Keyword::Int),
            ("double", Keyword::Double),
            ("main",   Keyword::Main),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en el flujo de entrada.
pub struct Lexer<S: Iterator> {
    source: Peekable<S>,
    state: State,
    start: Position,
    next: Position,
    deferred: Option<Located<LexerError>>,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido
    /// sin consumir la entrada actual.
    Complete(Token),

    /// Se encontró `/`.
    ///
    /// Si sigue `*` se entra en un comentario, de lo contrario es división.
    Slash,

    /// Dentro de un comentario.
    Comment,

    /// Dentro de un comentario, inmediatamente después de `*`.
    CommentStar,

    /// Constante entera.
    Integer(String),

    /// Constante entera seguida de `.`, cuya posición se recuerda.
    ///
    /// Solo un dígito a continuación la convierte en real.
    Fraction(String, Position),

    /// Constante real.
    Real(String),

    /// Término que puede ser un identificador o una palabra clave.
    Word(String),
}

impl<S: InputStream> Lexer<S> {
    /// Crea un lexer en estado inicial a partir de un flujo.
    pub fn new(source: S) -> Self {
        Lexer {
            source: source.peekable(),
            state: State::Start,
            start: Position::default(),
            next: Position::default(),
            deferred: None,
        }
    }

    /// Posición inmediatamente posterior al último carácter consumido.
    pub fn position(&self) -> Position {
        self.next
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Result<Option<Token>, Located<LexerError>> {
        use State::*;

        let token = loop {
            let (next_char, here) = match self.source.peek() {
                Some(&(c, position)) => (Some(c), position),
                None => (None, self.next),
            };

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                self.start = here;
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                // Tokens triviales
                (Start, None) => return Ok(None),
                (Start, Some('(')) => self.state = Complete(Token::OpenParen),
                (Start, Some(')')) => self.state = Complete(Token::CloseParen),
                (Start, Some('*')) => self.state = Complete(Token::Times),
                (Start, Some('+')) => self.state = Complete(Token::Plus),
                (Start, Some('-')) => self.state = Complete(Token::Minus),
                (Start, Some(';')) => self.state = Complete(Token::Semicolon),
                (Start, Some(',')) => self.state = Complete(Token::Comma),
                (Start, Some('[')) => self.state = Complete(Token::OpenSquare),
                (Start, Some(']')) => self.state = Complete(Token::CloseSquare),
                (Start, Some('=')) => self.state = Complete(Token::Assign),
                (Start, Some('{')) => self.state = Complete(Token::OpenCurly),
                (Start, Some('}')) => self.state = Complete(Token::CloseCurly),
                (Start, Some('/')) => self.state = Slash,

                // Identificadores y palabras clave. No se consume el
                // carácter, ya que el caso de extensión de términos
                // se encarga de ello.
                (Start, Some(c)) if c.is_ascii_alphabetic() => {
                    self.state = Word(String::new());
                    continue;
                }

                // Inicio de una constante numérica, de igual manera
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(String::new());
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(' ' | '\t' | '\r' | '\n')) => (),
                (Start, Some(c)) => return Err(Located::at(LexerError::BadChar(c), here)),

                // Emisión retardada de tokens cualesquiera
                (Complete(_), _) => match std::mem::replace(&mut self.state, Start) {
                    Complete(token) => break token,
                    _ => unreachable!(),
                },

                // `/*` inicia un comentario, `/` por sí solo es división
                (Slash, Some('*')) => self.state = Comment,
                (Slash, _) => break Token::Slash,

                // Los comentarios terminan únicamente con `*/`
                (Comment, Some('*')) => self.state = CommentStar,
                (Comment, Some(_)) => (),
                (CommentStar, Some('/')) => self.state = Start,
                (CommentStar, Some('*')) => (),
                (CommentStar, Some(_)) => self.state = Comment,
                (Comment | CommentStar, None) => {
                    return Err(Located::at(LexerError::UnexpectedEof, here))
                }

                // Acumulación dígito por dígito de constantes
                (Integer(digits), Some(digit)) if digit.is_ascii_digit() => digits.push(digit),
                (Integer(digits), Some('.')) => self.state = Fraction(std::mem::take(digits), here),
                (Integer(digits), _) => break Token::Integer(Rc::from(std::mem::take(digits))),

                (Fraction(digits, _), Some(digit)) if digit.is_ascii_digit() => {
                    let mut digits = std::mem::take(digits);
                    digits.push('.');
                    digits.push(digit);

                    self.state = Real(digits);
                }

                // El punto no forma parte del entero; se reporta como
                // carácter incorrecto al solicitar el siguiente token
                (Fraction(digits, period), _) => {
                    self.deferred = Some(Located::at(LexerError::BadChar('.'), *period));
                    break Token::Integer(Rc::from(std::mem::take(digits)));
                }

                (Real(digits), Some(digit)) if digit.is_ascii_digit() => digits.push(digit),
                (Real(digits), _) => break Token::Real(Rc::from(std::mem::take(digits))),

                // Extensión de términos
                (Word(word), Some(c)) if c.is_ascii_alphanumeric() => word.push(c),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word(word), _) => match Keyword::from_str(word) {
                    Ok(keyword) => break Token::Keyword(keyword),
                    Err(()) => break Token::Id(Identifier(Rc::from(std::mem::take(word)))),
                },
            }

            // Si no hubo `break` ni `continue`, aquí se consume el carácter
            // que se observó con lookahead anteriormente
            if let Some((c, position)) = self.source.next() {
                self.next = position.after(c);
            }
        };

        Ok(Some(token))
    }
}

impl<S: InputStream> Iterator for Lexer<S> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.deferred.take() {
            return Some(Err(error));
        }

        match self.lex() {
            Ok(None) => None,
            Ok(Some(token)) => {
                self.state = State::Start;
                log::trace!("token {} at {}", token, self.start);

                Some(Ok(Located::at(token, self.start)))
            }

            Err(error) => Some(Err(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source;
    use pretty_assertions::assert_eq;

    fn tokens(text: &str) -> Result<Vec<(u32, u32, String)>, Located<LexerError>> {
        Lexer::new(source::consume(text))
            .map(|result| {
                result.map(|token| {
                    let (position, token) = token.split();
                    (position.line(), position.column(), token.to_string())
                })
            })
            .collect()
    }

    fn owned(expected: &[(u32, u32, &str)]) -> Vec<(u32, u32, String)> {
        expected
            .iter()
            .map(|&(line, column, text)| (line, column, text.to_string()))
            .collect()
    }

    #[test]
    fn scans_a_declaration_with_positions() {
        let scanned = tokens("int a[10];\n  b = 2.5 / c;").unwrap();

        assert_eq!(
            scanned,
            owned(&[
                (1, 1, "'int'"),
                (1, 5, "'a'"),
                (1, 6, "'['"),
                (1, 7, "'10'"),
                (1, 9, "']'"),
                (1, 10, "';'"),
                (2, 3, "'b'"),
                (2, 5, "'='"),
                (2, 7, "'2.5'"),
                (2, 11, "'/'"),
                (2, 13, "'c'"),
                (2, 14, "';'"),
            ])
        );
    }

    #[test]
    fn comments_are_skipped() {
        let scanned = tokens("/* uno ** dos */main/**/(\n/*\n*/)").unwrap();
        assert_eq!(
            scanned,
            owned(&[(1, 17, "'main'"), (1, 25, "'('"), (3, 3, "')'")])
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let scanned: Vec<_> = Lexer::new(source::consume("Main main int2"))
            .map(|token| token.unwrap().into_inner())
            .collect();

        assert_eq!(
            scanned,
            vec![
                Token::Id(Identifier::from("Main")),
                Token::Keyword(Keyword::Main),
                Token::Id(Identifier::from("int2")),
            ]
        );
    }

    #[test]
    fn bad_character_reports_its_own_position() {
        let error = tokens("main.").unwrap_err();
        assert_eq!(error, Located::at(LexerError::BadChar('.'), Position::new(1, 5)));

        let error = tokens("a = b :").unwrap_err();
        assert_eq!(error, Located::at(LexerError::BadChar(':'), Position::new(1, 7)));
    }

    #[test]
    fn trailing_period_is_not_part_of_a_literal() {
        let mut lexer = Lexer::new(source::consume("12.a"));

        let first = lexer.next().unwrap().unwrap();
        assert_eq!(first.val(), &Token::Integer(Rc::from("12")));

        let error = lexer.next().unwrap().unwrap_err();
        assert_eq!(error, Located::at(LexerError::BadChar('.'), Position::new(1, 3)));
    }

    #[test]
    fn unterminated_comment_is_unexpected_eof() {
        let error = tokens("main /* sin cierre *").unwrap_err();
        assert_eq!(error.into_inner(), LexerError::UnexpectedEof);
    }

    #[test]
    fn lone_slash_is_division() {
        let scanned = tokens("a/b").unwrap();
        assert_eq!(scanned, owned(&[(1, 1, "'a'"), (1, 2, "'/'"), (1, 3, "'b'")]));
    }

    #[test]
    fn messages_match_vocabulary() {
        assert_eq!(LexerError::BadChar('$').to_string(), "caracter '$' incorrecto");
        assert_eq!(LexerError::UnexpectedEof.to_string(), "fin de fichero inesperado");
    }
}
