//! Compilador para el lenguaje de reglas de automatización ObsAct.
//!
//! # Front end
//! Cada programa deriva de un único texto de código fuente.
//! Este texto se somete primero a análisis léxico en [`lex`], de
//! lo cual se obtiene un flujo de tokens. El flujo de tokens se
//! dispone en un AST por medio de análisis sintáctico en [`parse`].
//! El árbol sintáctico es procesado por análisis semántico en
//! [`semantic`], que recolecta dispositivos y variables y verifica
//! que toda referencia a un dispositivo corresponda a uno declarado.
//!
//! # Back end
//! El recorrido de generación en [`codegen`] es común a todos los
//! lenguajes objetivo. La sintaxis concreta de cada uno se encuentra
//! en las implementaciones de [`backend`]. El resultado es el texto
//! completo de un programa ejecutable, incluyendo las primitivas
//! `turn_on`, `turn_off`, `alert` y `alert_with_var`.
//!
//! Cualquier error en una fase detiene la compilación; los errores
//! se reportan como [`Diagnostics`].

#[macro_use]
mod macros;

pub mod backend;
pub mod codegen;
pub mod error;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;

pub use backend::Backend;
pub use error::{Diagnostic, Diagnostics, Phase};

use log::debug;

/// Nombre de fuente que se utiliza en diagnósticos si no se indica otro.
const ANONYMOUS_SOURCE: &str = "<input>";

/// Compila un programa completo.
pub fn compile(source: &str, backend: Backend) -> Result<String, Diagnostics> {
    compile_named(source, ANONYMOUS_SOURCE, backend)
}

/// Compila un programa completo, identificando la fuente como `name`
/// en los diagnósticos.
///
/// Esta función es pura: el mismo texto produce siempre la misma salida.
pub fn compile_named(source: &str, name: &str, backend: Backend) -> Result<String, Diagnostics> {
    let (start, stream) = source::consume(source, name);

    let tokens = lex::Lexer::new(start.clone(), stream)
        .try_exhaustive()
        .map_err(|errors| Diagnostics::collect(error::Phase::Lexical, errors))?;

    debug!("{}: {} tokens", name, tokens.len());

    let ast = parse::parse(tokens.iter(), start)
        .map_err(|error| Diagnostics::collect(error::Phase::Syntax, std::iter::once(error)))?;

    let symbols = ast
        .resolve()
        .map_err(|errors| Diagnostics::collect(error::Phase::Semantic, errors))?;

    let mut output = String::new();
    codegen::emit(&ast, &symbols, backend, &mut output)
        .expect("writing to a String cannot fail");

    debug!("{}: generated {} bytes of {}", name, output.len(), backend);
    Ok(output)
}
