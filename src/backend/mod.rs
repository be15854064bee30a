//! Detalles específicos para cada lenguaje objetivo.
//!
//! Este módulo expone la interfaz de sintaxis concreta que implementan
//! sus propios submódulos. En general, debe utilizarse la macro
//! `dispatch_backend!()` para acceder a estas implementaciones.

use crate::{
    codegen::{quote, Context, Primitive},
    lex::Identifier,
    semantic::Symbols,
};

use std::{
    fmt::{self, Display, Write},
    str::FromStr,
};

/// Lenguaje objetivo de la generación de código.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// C imperativo, con el programa dentro de `main()`.
    C,

    /// Python, con variables predeclaradas y lista de dispositivos.
    Python,
}

impl Backend {
    /// Archivo de salida que se utiliza si no se indica otro.
    pub fn default_output(self) -> &'static str {
        match self {
            Backend::C => "saida.c",
            Backend::Python => "saida.py",
        }
    }
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "c" => Ok(Backend::C),
            "python" => Ok(Backend::Python),
            _ => Err(()),
        }
    }
}

impl Display for Backend {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::C => fmt.write_str("c"),
            Backend::Python => fmt.write_str("python"),
        }
    }
}

mod c;
mod python;

pub use c::Emitter as C;
pub use python::Emitter as Python;

/// Emisión de sintaxis concreta.
///
/// Los tipos que implementan este trait traducen las construcciones
/// del árbol a sentencias del lenguaje objetivo. No guardan estado;
/// todo lo que necesitan se encuentra en el [`Context`].
pub trait Emitter {
    /// Literal canónico de verdadero.
    const TRUE: &'static str;

    /// Literal canónico de falso.
    const FALSE: &'static str;

    /// Operador de conjunción con cortocircuito.
    const AND: &'static str;

    /// Emite las primitivas de soporte y todo lo que precede al
    /// primer comando traducido.
    fn prologue<W: Write>(cx: &mut Context<'_, W>, symbols: &Symbols) -> fmt::Result;

    /// Cierra el programa luego del último comando.
    fn epilogue<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result;

    /// Asigna un valor ya traducido a una variable.
    ///
    /// `first` indica si es la primera asignación de ese nombre en el programa.
    fn assign<W: Write>(
        cx: &mut Context<'_, W>,
        name: &Identifier,
        value: &str,
        first: bool,
    ) -> fmt::Result;

    /// Abre una condicional con una condición ya traducida.
    fn begin_if<W: Write>(cx: &mut Context<'_, W>, condition: &str) -> fmt::Result;

    /// Pasa de la rama verdadera a la falsa.
    fn begin_else<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result;

    /// Cierra la condicional abierta más recientemente.
    fn end_if<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result;

    /// Invoca a una primitiva con argumentos ya traducidos.
    fn call<W: Write>(cx: &mut Context<'_, W>, primitive: Primitive, args: &[&str])
        -> fmt::Result;

    /// Envía una alerta a cada dispositivo, en el orden dado.
    ///
    /// Cada dispositivo recibe exactamente una llamada a `alert` o, si hay
    /// variable, a `alert_with_var`. Las llamadas se desenrollan; no se
    /// introducen nombres auxiliares en el programa generado.
    fn broadcast<W: Write>(
        cx: &mut Context<'_, W>,
        message: &str,
        variable: Option<&Identifier>,
        devices: &[&Identifier],
    ) -> fmt::Result {
        for device in devices {
            let device = quote(device.as_ref());

            match variable {
                None => Self::call(cx, Primitive::Alert, &[device.as_str(), message])?,
                Some(variable) => Self::call(
                    cx,
                    Primitive::AlertWithVar,
                    &[device.as_str(), message, variable.as_ref()],
                )?,
            }
        }

        Ok(())
    }
}
