//! Detalles específicos para cada lenguaje objetivo.
//!
//! Este módulo expone la interfaz de emisión de texto que
//! implementan sus propios submódulos. En general, debe utilizarse
//! la macro `dispatch_target!()` para acceder a estas
//! implementaciones.

use crate::ir::{Block, Function, Program};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Lenguaje objetivo de la traducción.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Pascal,
    C,
}

mod c;
mod pascal;

pub use c::Emitter as C;
pub use pascal::Emitter as Pascal;

impl Display for Target {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Pascal => fmt.write_str("pascal"),
            Target::C => fmt.write_str("c"),
        }
    }
}

impl FromStr for Target {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "pascal" => Ok(Target::Pascal),
            "c" => Ok(Target::C),
            _ => Err(()),
        }
    }
}

/// Emisión de texto para un programa.
///
/// Los tipos que implementan este trait traducen la representación
/// intermedia completa a su lenguaje. Se invocan en orden: prólogo,
/// cada función en orden de declaración y finalmente el bloque principal.
pub trait Emitter: Sized {
    /// Construir a partir del programa que se va a emitir.
    ///
    /// El emisor puede examinar el programa completo antes del prólogo,
    /// por ejemplo para declarar variables antes que las funciones.
    fn new(program: &Program) -> Self;

    /// Texto que precede a todo lo demás.
    fn prologue(&mut self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Emite una función completa.
    fn function(&mut self, fmt: &mut fmt::Formatter<'_>, function: &Function) -> fmt::Result;

    /// Emite el bloque principal, terminando el listado.
    fn main(&mut self, fmt: &mut fmt::Formatter<'_>, main: &Block) -> fmt::Result;
}
