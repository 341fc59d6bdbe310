//! Traductor de un lenguaje imperativo pequeño.
//!
//! # Front end
//! Cada programa deriva de un único texto fuente. Este texto se somete
//! primero a análisis léxico en [`lex`], de lo cual se obtiene un flujo
//! de tokens. El parser en [`parse`] consume ese flujo con un único token
//! de lookahead y, conforme reconoce cada construcción, invoca las
//! verificaciones de [`semantic`] y alimenta al generador de código. No
//! existe un árbol sintáctico: la traducción es dirigida por la sintaxis.
//!
//! # Back end
//! El generador en [`codegen`] acumula una representación intermedia
//! descrita en [`ir`]. Solo cuando la entrada completa fue aceptada se
//! materializa como texto de alguno de los lenguajes en [`target`].
//!
//! # Errores
//! La primera falla de cualquier fase termina la traducción y se reporta
//! como un único [`error::Diagnostic`]. En ese caso no se produce salida.

#[macro_use]
mod macros;

pub mod codegen;
pub mod error;
pub mod ir;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;
pub mod target;

use crate::{error::Diagnostic, lex::Lexer, target::Target};

/// Traduce un programa completo.
///
/// Retorna el texto para `target` o el diagnóstico del primer error.
pub fn translate(source: &str, target: Target) -> Result<String, Diagnostic> {
    let lexer = Lexer::new(source::consume(source));
    let generator = parse::parse(lexer)?;

    Ok(generator.materialize(target))
}
