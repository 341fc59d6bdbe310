//! Diagnóstico único de una traducción.
//!
//! Cualquier fase puede fallar, pero la primera falla termina la traducción.
//! Los errores de cada fase viajan como [`Located`] y se convierten en un
//! [`Diagnostic`], el cual sabe presentarse con el formato exacto
//! `Error <fase> (<fila>,<columna>): <mensaje>`.

use crate::{
    lex::LexerError,
    parse::ParserError,
    semantic::SemanticError,
    source::{Located, Position},
};

use std::{
    error::Error,
    fmt::{self, Display},
};

mod sealed {
    pub trait Sealed {}
}

/// Fase del traductor en la que se originó un error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntactic,
    Semantic,
}

impl Display for Phase {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lexical => "lexico",
            Phase::Syntactic => "sintactico",
            Phase::Semantic => "semantico",
        };

        fmt.write_str(name)
    }
}

/// Error que pertenece a una fase en particular.
pub trait PhaseError: sealed::Sealed + Error + 'static {
    /// Fase que origina este tipo de error.
    const PHASE: Phase;

    /// Determina si el mensaje debe incluir fila y columna.
    ///
    /// Los errores causados por el fin de la entrada no las incluyen.
    fn positioned(&self) -> bool {
        true
    }
}

impl sealed::Sealed for LexerError {}

impl PhaseError for LexerError {
    const PHASE: Phase = Phase::Lexical;

    fn positioned(&self) -> bool {
        !matches!(self, LexerError::UnexpectedEof)
    }
}

impl sealed::Sealed for ParserError {}

impl PhaseError for ParserError {
    const PHASE: Phase = Phase::Syntactic;

    fn positioned(&self) -> bool {
        !self.at_eof()
    }
}

impl sealed::Sealed for SemanticError {}

impl PhaseError for SemanticError {
    const PHASE: Phase = Phase::Semantic;
}

/// El único error reportado por una traducción fallida.
#[derive(Debug)]
pub struct Diagnostic {
    phase: Phase,
    position: Option<Position>,
    error: Box<dyn Error>,
}

impl Diagnostic {
    /// Fase que produjo el error.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Posición reportada, si el error la incluye.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Error original, útil para hacer downcast a su tipo de fase.
    pub fn error(&self) -> &(dyn Error + 'static) {
        self.error.as_ref()
    }
}

impl<E: PhaseError> From<Located<E>> for Diagnostic {
    fn from(error: Located<E>) -> Self {
        let (position, error) = error.split();
        let position = if error.positioned() {
            Some(position)
        } else {
            None
        };

        Diagnostic {
            phase: E::PHASE,
            position,
            error: Box::new(error),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Error {}", self.phase)?;
        if let Some(position) = self.position {
            write!(fmt, " {}", position)?;
        }

        write!(fmt, ": {}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Identifier;
    use pretty_assertions::assert_eq;

    #[test]
    fn positioned_diagnostic() {
        let error = Located::at(LexerError::BadChar('.'), Position::new(1, 5));
        let diagnostic = Diagnostic::from(error);

        assert_eq!(diagnostic.phase(), Phase::Lexical);
        assert_eq!(diagnostic.to_string(), "Error lexico (1,5): caracter '.' incorrecto");
    }

    #[test]
    fn eof_diagnostic_has_no_position() {
        let error = Located::at(LexerError::UnexpectedEof, Position::new(9, 2));
        let diagnostic = Diagnostic::from(error);

        assert_eq!(diagnostic.position(), None);
        assert_eq!(diagnostic.to_string(), "Error lexico: fin de fichero inesperado");
    }

    #[test]
    fn original_error_can_be_recovered() {
        let name = Identifier::from("c");
        let error = Located::at(SemanticError::Undeclared(name.clone()), Position::new(15, 7));
        let diagnostic = Diagnostic::from(error);

        assert_eq!(
            diagnostic.error().downcast_ref::<SemanticError>(),
            Some(&SemanticError::Undeclared(name))
        );
        assert_eq!(
            diagnostic.to_string(),
            "Error semantico (15,7): 'c' no ha sido declarado"
        );
    }
}
