//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el traductor construye
//! deben llevar cuenta de la posición donde inician en el código
//! fuente original, lo cual permite reportar un punto exacto
//! (fila y columna) en donde ocurre un error de cualquier fase.

use std::fmt::{self, Debug, Display, Formatter};

/// Un flujo de entrada, carácter por carácter.
///
/// Cada carácter se acompaña de su propia posición.
pub trait InputStream: Iterator<Item = (char, Position)> {}

impl<I: Iterator<Item = (char, Position)>> InputStream for I {}

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    position: Position,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la posición.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Descarta la posición y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Position, T) {
        (self.position, self.value)
    }

    /// Construye a partir de un valor y una posición.
    pub fn at(value: T, position: Position) -> Self {
        Located { value, position }
    }

    /// Transforma el valor con la misma posición.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            position: self.position,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Una posición fila-columna en un archivo, ambas a partir de 1.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Construye una posición arbitraria.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Posición que sigue a un carácter dado que se encuentra aquí.
    ///
    /// Todo carácter ocupa exactamente una columna, incluyendo `'\t'`.
    pub fn after(self, c: char) -> Position {
        match c {
            '\n' => self.newline(),
            _ => self.advance(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "({},{})", self.line, self.column)
    }
}

impl Debug for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Transforma un texto fuente en un flujo que itera por carácter.
///
/// La posición que acompaña a cada carácter es la que le corresponde
/// a ese mismo carácter.
pub fn consume(text: &str) -> impl InputStream + '_ {
    text.chars().scan(Position::default(), |next, c| {
        let here = *next;
        *next = here.after(c);

        Some((c, here))
    })
}
